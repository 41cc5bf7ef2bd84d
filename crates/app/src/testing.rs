//! In-memory fakes shared by the app-layer tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use homepilot_domain::device::{Attributes, Device};
use homepilot_domain::error::{HomePilotError, HubError};
use homepilot_domain::hub::{HubArea, HubState, ServiceCall};
use homepilot_domain::id::{DeviceId, RoomId, RoutineId, ZoneId};
use homepilot_domain::mutation::DeviceMutation;
use homepilot_domain::room::Room;
use homepilot_domain::routine::Routine;
use homepilot_domain::zone::Zone;

use crate::ports::{
    DeviceRepository, HubClient, MutationObserver, RoomRepository, RoutineRepository,
    ZoneRepository,
};

/// Registry fake implementing every repository port over one shared store,
/// so room cascades and device counts behave like the real store.
#[derive(Default)]
pub struct InMemoryRegistry {
    next_id: AtomicI64,
    devices: Mutex<BTreeMap<DeviceId, Device>>,
    rooms: Mutex<BTreeMap<RoomId, Room>>,
    zones: Mutex<BTreeMap<ZoneId, Zone>>,
    routines: Mutex<BTreeMap<RoutineId, Routine>>,
    rejected_rooms: Mutex<HashSet<String>>,
}

impl InMemoryRegistry {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn with_device_count(&self, mut room: Room) -> Room {
        let devices = self.devices.lock().unwrap();
        room.device_count = u32::try_from(
            devices
                .values()
                .filter(|d| d.room_id == Some(room.id))
                .count(),
        )
        .unwrap();
        room
    }

    pub fn device(&self, id: DeviceId) -> Option<Device> {
        self.devices.lock().unwrap().get(&id).cloned()
    }

    /// Make room inserts named `name` fail like a constraint violation.
    pub fn reject_room(&self, name: &str) {
        self.rejected_rooms.lock().unwrap().insert(name.to_string());
    }
}

/// Device store over an [`InMemoryRegistry`] with scripted slowness and
/// devices deleted right after a listing or lookup returned them.
#[derive(Clone)]
pub struct ScriptedDevices {
    registry: Arc<InMemoryRegistry>,
    update_delay: Duration,
    vanishing: Arc<Mutex<HashSet<DeviceId>>>,
}

impl ScriptedDevices {
    pub fn new(registry: Arc<InMemoryRegistry>) -> Self {
        Self {
            registry,
            update_delay: Duration::ZERO,
            vanishing: Arc::default(),
        }
    }

    /// Sleep for `delay` inside every device update, before the write lands.
    #[must_use]
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    /// Delete `id` from the store as soon as a read hands it out.
    pub fn vanish_after_read(&self, id: DeviceId) {
        self.vanishing.lock().unwrap().insert(id);
    }

    fn reap(&self, devices: &[Device]) {
        let mut vanishing = self.vanishing.lock().unwrap();
        let mut store = self.registry.devices.lock().unwrap();
        for device in devices {
            if vanishing.remove(&device.id) {
                store.remove(&device.id);
            }
        }
    }
}

impl DeviceRepository for ScriptedDevices {
    async fn create(&self, device: Device) -> Result<Device, HomePilotError> {
        DeviceRepository::create(&*self.registry, device).await
    }

    async fn get_by_id(&self, id: DeviceId) -> Result<Option<Device>, HomePilotError> {
        DeviceRepository::get_by_id(&*self.registry, id).await
    }

    async fn get_all(&self) -> Result<Vec<Device>, HomePilotError> {
        let devices = DeviceRepository::get_all(&*self.registry).await?;
        self.reap(&devices);
        Ok(devices)
    }

    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Device>, HomePilotError> {
        let device = self.registry.find_by_entity_id(entity_id).await?;
        self.reap(device.as_slice());
        Ok(device)
    }

    async fn find_by_room(&self, room_id: RoomId) -> Result<Vec<Device>, HomePilotError> {
        self.registry.find_by_room(room_id).await
    }

    async fn update(&self, device: Device) -> Result<Device, HomePilotError> {
        if !self.update_delay.is_zero() {
            tokio::time::sleep(self.update_delay).await;
        }
        DeviceRepository::update(&*self.registry, device).await
    }

    async fn delete(&self, id: DeviceId) -> Result<(), HomePilotError> {
        DeviceRepository::delete(&*self.registry, id).await
    }
}

impl DeviceRepository for InMemoryRegistry {
    async fn create(&self, mut device: Device) -> Result<Device, HomePilotError> {
        device.id = DeviceId::new(self.next_id());
        self.devices
            .lock()
            .unwrap()
            .insert(device.id, device.clone());
        Ok(device)
    }

    async fn get_by_id(&self, id: DeviceId) -> Result<Option<Device>, HomePilotError> {
        Ok(self.devices.lock().unwrap().get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Device>, HomePilotError> {
        Ok(self.devices.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_entity_id(&self, entity_id: &str) -> Result<Option<Device>, HomePilotError> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .values()
            .find(|d| d.entity_id.as_deref() == Some(entity_id))
            .cloned())
    }

    async fn find_by_room(&self, room_id: RoomId) -> Result<Vec<Device>, HomePilotError> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.room_id == Some(room_id))
            .cloned()
            .collect())
    }

    async fn update(&self, device: Device) -> Result<Device, HomePilotError> {
        self.devices
            .lock()
            .unwrap()
            .insert(device.id, device.clone());
        Ok(device)
    }

    async fn delete(&self, id: DeviceId) -> Result<(), HomePilotError> {
        self.devices.lock().unwrap().remove(&id);
        Ok(())
    }
}

impl RoomRepository for InMemoryRegistry {
    async fn create(&self, mut room: Room) -> Result<Room, HomePilotError> {
        if self.rejected_rooms.lock().unwrap().contains(&room.name) {
            return Err(HomePilotError::Storage(
                format!("UNIQUE constraint failed for room {}", room.name).into(),
            ));
        }
        room.id = RoomId::new(self.next_id());
        self.rooms.lock().unwrap().insert(room.id, room.clone());
        Ok(self.with_device_count(room))
    }

    async fn get_by_id(&self, id: RoomId) -> Result<Option<Room>, HomePilotError> {
        let room = self.rooms.lock().unwrap().get(&id).cloned();
        Ok(room.map(|r| self.with_device_count(r)))
    }

    async fn get_all(&self) -> Result<Vec<Room>, HomePilotError> {
        let rooms: Vec<Room> = self.rooms.lock().unwrap().values().cloned().collect();
        Ok(rooms.into_iter().map(|r| self.with_device_count(r)).collect())
    }

    async fn find_by_area_id(&self, area_id: &str) -> Result<Option<Room>, HomePilotError> {
        let room = self
            .rooms
            .lock()
            .unwrap()
            .values()
            .find(|r| r.ha_area_id.as_deref() == Some(area_id))
            .cloned();
        Ok(room.map(|r| self.with_device_count(r)))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Room>, HomePilotError> {
        let room = self
            .rooms
            .lock()
            .unwrap()
            .values()
            .find(|r| r.name == name)
            .cloned();
        Ok(room.map(|r| self.with_device_count(r)))
    }

    async fn find_by_zone(&self, zone_id: ZoneId) -> Result<Vec<Room>, HomePilotError> {
        let rooms: Vec<Room> = self
            .rooms
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.zone_id == Some(zone_id))
            .cloned()
            .collect();
        Ok(rooms.into_iter().map(|r| self.with_device_count(r)).collect())
    }

    async fn update(&self, room: Room) -> Result<Room, HomePilotError> {
        self.rooms.lock().unwrap().insert(room.id, room.clone());
        Ok(self.with_device_count(room))
    }

    async fn delete(&self, id: RoomId) -> Result<(), HomePilotError> {
        self.rooms.lock().unwrap().remove(&id);
        for device in self.devices.lock().unwrap().values_mut() {
            if device.room_id == Some(id) {
                device.assign_room(None);
            }
        }
        Ok(())
    }
}

impl ZoneRepository for InMemoryRegistry {
    async fn create(&self, mut zone: Zone) -> Result<Zone, HomePilotError> {
        zone.id = ZoneId::new(self.next_id());
        self.zones.lock().unwrap().insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn get_by_id(&self, id: ZoneId) -> Result<Option<Zone>, HomePilotError> {
        Ok(self.zones.lock().unwrap().get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Zone>, HomePilotError> {
        Ok(self.zones.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, zone: Zone) -> Result<Zone, HomePilotError> {
        self.zones.lock().unwrap().insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn delete(&self, id: ZoneId) -> Result<(), HomePilotError> {
        self.zones.lock().unwrap().remove(&id);
        for room in self.rooms.lock().unwrap().values_mut() {
            if room.zone_id == Some(id) {
                room.zone_id = None;
            }
        }
        Ok(())
    }
}

impl RoutineRepository for InMemoryRegistry {
    async fn create(&self, mut routine: Routine) -> Result<Routine, HomePilotError> {
        routine.id = RoutineId::new(self.next_id());
        self.routines
            .lock()
            .unwrap()
            .insert(routine.id, routine.clone());
        Ok(routine)
    }

    async fn get_by_id(&self, id: RoutineId) -> Result<Option<Routine>, HomePilotError> {
        Ok(self.routines.lock().unwrap().get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Routine>, HomePilotError> {
        Ok(self.routines.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, routine: Routine) -> Result<Routine, HomePilotError> {
        self.routines
            .lock()
            .unwrap()
            .insert(routine.id, routine.clone());
        Ok(routine)
    }

    async fn delete(&self, id: RoutineId) -> Result<(), HomePilotError> {
        self.routines.lock().unwrap().remove(&id);
        Ok(())
    }
}

/// A request the spy hub received.
#[derive(Debug, Clone, PartialEq)]
pub enum HubCall {
    Invoke(ServiceCall),
    Rename { entity_id: String, name: String },
    SetState(HubState),
}

/// Scriptable hub fake that records every write it receives.
#[derive(Default)]
pub struct SpyHub {
    states: Mutex<Vec<HubState>>,
    areas: Mutex<Vec<HubArea>>,
    area_entities: Mutex<HashMap<String, Vec<String>>>,
    calls: Mutex<Vec<HubCall>>,
    unreachable: AtomicBool,
    reject_rename: AtomicBool,
    failing_entities: Mutex<HashSet<String>>,
}

fn down() -> HubError {
    HubError::Unreachable("hub is down".into())
}

impl SpyHub {
    pub fn set_states(&self, states: Vec<HubState>) {
        *self.states.lock().unwrap() = states;
    }

    pub fn add_area(&self, area_id: &str, name: &str, entities: &[&str]) {
        self.areas.lock().unwrap().push(HubArea {
            area_id: area_id.to_string(),
            name: name.to_string(),
        });
        self.area_entities.lock().unwrap().insert(
            area_id.to_string(),
            entities.iter().map(ToString::to_string).collect(),
        );
    }

    pub fn go_down(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    pub fn reject_renames(&self) {
        self.reject_rename.store(true, Ordering::SeqCst);
    }

    /// Make service calls targeting `entity_id` fail.
    pub fn fail_entity(&self, entity_id: &str) {
        self.failing_entities
            .lock()
            .unwrap()
            .insert(entity_id.to_string());
    }

    pub fn calls(&self) -> Vec<HubCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn invoked(&self) -> Vec<ServiceCall> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HubCall::Invoke(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    fn check_up(&self) -> Result<(), HubError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(down())
        } else {
            Ok(())
        }
    }
}

impl HubClient for SpyHub {
    async fn fetch_states(&self) -> Result<Vec<HubState>, HubError> {
        self.check_up()?;
        Ok(self.states.lock().unwrap().clone())
    }

    async fn fetch_state(&self, entity_id: &str) -> Result<Option<HubState>, HubError> {
        self.check_up()?;
        Ok(self
            .states
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.entity_id == entity_id)
            .cloned())
    }

    async fn invoke_action(&self, call: &ServiceCall) -> Result<(), HubError> {
        self.check_up()?;
        if self
            .failing_entities
            .lock()
            .unwrap()
            .contains(&call.entity_id)
        {
            return Err(HubError::Rejected { status: 500 });
        }
        self.calls.lock().unwrap().push(HubCall::Invoke(call.clone()));
        Ok(())
    }

    async fn fetch_areas(&self) -> Result<Vec<HubArea>, HubError> {
        self.check_up()?;
        Ok(self.areas.lock().unwrap().clone())
    }

    async fn fetch_entities_in_area(&self, area_id: &str) -> Result<Vec<String>, HubError> {
        self.check_up()?;
        Ok(self
            .area_entities
            .lock()
            .unwrap()
            .get(area_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn rename_entity(&self, entity_id: &str, name: &str) -> Result<(), HubError> {
        self.check_up()?;
        if self.reject_rename.load(Ordering::SeqCst) {
            return Err(HubError::Rejected { status: 404 });
        }
        self.calls.lock().unwrap().push(HubCall::Rename {
            entity_id: entity_id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn set_state(&self, state: &HubState) -> Result<(), HubError> {
        self.check_up()?;
        self.calls
            .lock()
            .unwrap()
            .push(HubCall::SetState(state.clone()));
        Ok(())
    }
}

/// Observer that keeps every mutation it sees.
#[derive(Default)]
pub struct RecordingObserver {
    mutations: Mutex<Vec<DeviceMutation>>,
}

impl RecordingObserver {
    pub fn mutations(&self) -> Vec<DeviceMutation> {
        self.mutations.lock().unwrap().clone()
    }
}

impl MutationObserver for RecordingObserver {
    async fn on_device_mutation(&self, mutation: &DeviceMutation) {
        self.mutations.lock().unwrap().push(mutation.clone());
    }
}

pub fn hub_state(entity_id: &str, state: &str) -> HubState {
    HubState {
        entity_id: entity_id.to_string(),
        state: state.to_string(),
        attributes: Attributes::new(),
    }
}

pub fn bound_device(name: &str, entity_id: &str) -> Device {
    Device::builder()
        .name(name)
        .entity_id(entity_id)
        .build()
        .unwrap()
}
