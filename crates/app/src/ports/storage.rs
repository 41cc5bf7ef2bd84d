//! Storage port: repository traits for the durable registry.

use std::future::Future;

use homepilot_domain::device::Device;
use homepilot_domain::error::HomePilotError;
use homepilot_domain::id::{DeviceId, RoomId, RoutineId, ZoneId};
use homepilot_domain::room::Room;
use homepilot_domain::routine::Routine;
use homepilot_domain::zone::Zone;

/// Repository for persisting and querying [`Device`]s.
pub trait DeviceRepository: Send + Sync {
    /// Insert a new device; the store assigns its id.
    fn create(&self, device: Device) -> impl Future<Output = Result<Device, HomePilotError>> + Send;

    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HomePilotError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HomePilotError>> + Send;

    /// Find the device bound to a hub entity.
    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Device>, HomePilotError>> + Send;

    /// Devices whose room reference points at `room_id`.
    fn find_by_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, HomePilotError>> + Send;

    /// Overwrite every field of an existing device.
    fn update(&self, device: Device) -> impl Future<Output = Result<Device, HomePilotError>> + Send;

    fn delete(&self, id: DeviceId) -> impl Future<Output = Result<(), HomePilotError>> + Send;
}

/// Repository for [`Room`]s.
///
/// Reads fill in the derived `device_count`.
pub trait RoomRepository: Send + Sync {
    fn create(&self, room: Room) -> impl Future<Output = Result<Room, HomePilotError>> + Send;

    fn get_by_id(
        &self,
        id: RoomId,
    ) -> impl Future<Output = Result<Option<Room>, HomePilotError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Room>, HomePilotError>> + Send;

    /// Find the room bound to a hub area.
    fn find_by_area_id(
        &self,
        area_id: &str,
    ) -> impl Future<Output = Result<Option<Room>, HomePilotError>> + Send;

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Room>, HomePilotError>> + Send;

    fn find_by_zone(
        &self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<Vec<Room>, HomePilotError>> + Send;

    /// Overwrite a room and, atomically, the legacy room label of every
    /// device pointing at it.
    fn update(&self, room: Room) -> impl Future<Output = Result<Room, HomePilotError>> + Send;

    /// Delete a room; devices pointing at it are unassigned in the same
    /// transaction.
    fn delete(&self, id: RoomId) -> impl Future<Output = Result<(), HomePilotError>> + Send;
}

/// Repository for [`Zone`]s.
pub trait ZoneRepository: Send + Sync {
    fn create(&self, zone: Zone) -> impl Future<Output = Result<Zone, HomePilotError>> + Send;

    fn get_by_id(
        &self,
        id: ZoneId,
    ) -> impl Future<Output = Result<Option<Zone>, HomePilotError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Zone>, HomePilotError>> + Send;

    fn update(&self, zone: Zone) -> impl Future<Output = Result<Zone, HomePilotError>> + Send;

    /// Delete a zone; its rooms are detached, never deleted.
    fn delete(&self, id: ZoneId) -> impl Future<Output = Result<(), HomePilotError>> + Send;
}

/// Repository for [`Routine`]s, actions and triggers included.
pub trait RoutineRepository: Send + Sync {
    fn create(&self, routine: Routine)
    -> impl Future<Output = Result<Routine, HomePilotError>> + Send;

    fn get_by_id(
        &self,
        id: RoutineId,
    ) -> impl Future<Output = Result<Option<Routine>, HomePilotError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Routine>, HomePilotError>> + Send;

    fn update(&self, routine: Routine)
    -> impl Future<Output = Result<Routine, HomePilotError>> + Send;

    fn delete(&self, id: RoutineId) -> impl Future<Output = Result<(), HomePilotError>> + Send;
}

macro_rules! forward_to_arc {
    ($trait:ident { $( fn $name:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty; )* }) => {
        impl<T: $trait> $trait for std::sync::Arc<T> {
            $(
                fn $name(&self $(, $arg: $ty)*) -> impl Future<Output = $ret> + Send {
                    (**self).$name($($arg),*)
                }
            )*
        }
    };
}

forward_to_arc!(DeviceRepository {
    fn create(&self, device: Device) -> Result<Device, HomePilotError>;
    fn get_by_id(&self, id: DeviceId) -> Result<Option<Device>, HomePilotError>;
    fn get_all(&self) -> Result<Vec<Device>, HomePilotError>;
    fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Device>, HomePilotError>;
    fn find_by_room(&self, room_id: RoomId) -> Result<Vec<Device>, HomePilotError>;
    fn update(&self, device: Device) -> Result<Device, HomePilotError>;
    fn delete(&self, id: DeviceId) -> Result<(), HomePilotError>;
});

forward_to_arc!(RoomRepository {
    fn create(&self, room: Room) -> Result<Room, HomePilotError>;
    fn get_by_id(&self, id: RoomId) -> Result<Option<Room>, HomePilotError>;
    fn get_all(&self) -> Result<Vec<Room>, HomePilotError>;
    fn find_by_area_id(&self, area_id: &str) -> Result<Option<Room>, HomePilotError>;
    fn find_by_name(&self, name: &str) -> Result<Option<Room>, HomePilotError>;
    fn find_by_zone(&self, zone_id: ZoneId) -> Result<Vec<Room>, HomePilotError>;
    fn update(&self, room: Room) -> Result<Room, HomePilotError>;
    fn delete(&self, id: RoomId) -> Result<(), HomePilotError>;
});

forward_to_arc!(ZoneRepository {
    fn create(&self, zone: Zone) -> Result<Zone, HomePilotError>;
    fn get_by_id(&self, id: ZoneId) -> Result<Option<Zone>, HomePilotError>;
    fn get_all(&self) -> Result<Vec<Zone>, HomePilotError>;
    fn update(&self, zone: Zone) -> Result<Zone, HomePilotError>;
    fn delete(&self, id: ZoneId) -> Result<(), HomePilotError>;
});

forward_to_arc!(RoutineRepository {
    fn create(&self, routine: Routine) -> Result<Routine, HomePilotError>;
    fn get_by_id(&self, id: RoutineId) -> Result<Option<Routine>, HomePilotError>;
    fn get_all(&self) -> Result<Vec<Routine>, HomePilotError>;
    fn update(&self, routine: Routine) -> Result<Routine, HomePilotError>;
    fn delete(&self, id: RoutineId) -> Result<(), HomePilotError>;
});
