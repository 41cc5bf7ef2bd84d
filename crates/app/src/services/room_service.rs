//! Room service: rooms, zones and synchronisation with hub areas.

use std::collections::BTreeMap;

use homepilot_domain::device::Device;
use homepilot_domain::error::{HomePilotError, NotFoundError};
use homepilot_domain::hub::HubArea;
use homepilot_domain::id::{RoomId, ZoneId};
use homepilot_domain::room::{Room, icon_for_area_name};
use homepilot_domain::sync::AreaSyncReport;
use homepilot_domain::zone::Zone;

use crate::ports::{DeviceRepository, HubClient, MutationObserver, RoomRepository, ZoneRepository};
use crate::services::device_service::DeviceService;
use crate::services::room_group::{GroupToggle, RoomGroupResolver};

/// Changes to apply to a room. Renames cascade to the devices' room label.
#[derive(Debug, Clone, Default)]
pub struct RoomPatch {
    pub name: Option<String>,
    /// `Some(None)` detaches the room from its zone.
    pub zone_id: Option<Option<ZoneId>>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: Option<i32>,
}

fn room_not_found(id: RoomId) -> HomePilotError {
    NotFoundError {
        entity: "Room",
        id: id.to_string(),
    }
    .into()
}

fn zone_not_found(id: ZoneId) -> HomePilotError {
    NotFoundError {
        entity: "Zone",
        id: id.to_string(),
    }
    .into()
}

/// Application service for rooms and zones.
pub struct RoomService<RR, ZR, DR, O, H> {
    rooms: RR,
    zones: ZR,
    devices: DeviceService<DR, O>,
    groups: RoomGroupResolver<DR, O>,
    hub: H,
}

impl<RR, ZR, DR, O, H> RoomService<RR, ZR, DR, O, H>
where
    RR: RoomRepository,
    ZR: ZoneRepository,
    DR: DeviceRepository + Clone,
    O: MutationObserver + Clone,
    H: HubClient,
{
    pub fn new(rooms: RR, zones: ZR, devices: DeviceService<DR, O>, hub: H) -> Self {
        let groups = RoomGroupResolver::new(devices.clone());
        Self {
            rooms,
            zones,
            devices,
            groups,
            hub,
        }
    }

    async fn ensure_zone(&self, zone_id: Option<ZoneId>) -> Result<(), HomePilotError> {
        if let Some(zone_id) = zone_id {
            self.get_zone(zone_id).await?;
        }
        Ok(())
    }

    /// Create a room after validating it and its zone reference.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] for an empty name,
    /// [`HomePilotError::NotFound`] for an unknown zone, or a storage error.
    #[tracing::instrument(skip(self, room), fields(room_name = %room.name))]
    pub async fn create_room(&self, room: Room) -> Result<Room, HomePilotError> {
        room.validate()?;
        self.ensure_zone(room.zone_id).await?;
        self.rooms.create(room).await
    }

    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when no room with `id` exists.
    pub async fn get_room(&self, id: RoomId) -> Result<Room, HomePilotError> {
        self.rooms
            .get_by_id(id)
            .await?
            .ok_or_else(|| room_not_found(id))
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, HomePilotError> {
        self.rooms.get_all().await
    }

    /// Devices assigned to a room.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the room does not exist.
    pub async fn devices_in_room(&self, id: RoomId) -> Result<Vec<Device>, HomePilotError> {
        self.get_room(id).await?;
        self.devices.list_in_room(id).await
    }

    /// Apply `patch` to a room. A new name is then copied to every device of
    /// the room, each through its own locked device write.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] for an unknown room or zone,
    /// [`HomePilotError::Validation`] for an empty name, or a storage error.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_room(&self, id: RoomId, patch: RoomPatch) -> Result<Room, HomePilotError> {
        let mut room = self.get_room(id).await?;
        let previous_name = room.name.clone();
        if let Some(name) = patch.name {
            room.name = name;
        }
        if let Some(zone_id) = patch.zone_id {
            self.ensure_zone(zone_id).await?;
            room.zone_id = zone_id;
        }
        if let Some(icon) = patch.icon {
            room.icon = icon;
        }
        if let Some(color) = patch.color {
            room.color = color;
        }
        if let Some(order) = patch.order {
            room.order = order;
        }
        room.validate()?;
        let renamed = room.name != previous_name;
        let room = self.rooms.update(room).await?;
        if renamed {
            self.relabel_devices(&room).await?;
        }
        Ok(room)
    }

    async fn relabel_devices(&self, room: &Room) -> Result<(), HomePilotError> {
        for device in self.devices.list_in_room(room.id).await? {
            if let Err(err) = self.devices.assign_room(device.id, Some(room)).await {
                tracing::warn!(device_id = %device.id, room_id = %room.id, error = %err, "could not relabel device");
            }
        }
        Ok(())
    }

    /// Rename a room, cascading to its devices' room label.
    ///
    /// # Errors
    ///
    /// See [`update_room`](Self::update_room).
    pub async fn rename_room(
        &self,
        id: RoomId,
        name: impl Into<String>,
    ) -> Result<Room, HomePilotError> {
        self.update_room(
            id,
            RoomPatch {
                name: Some(name.into()),
                ..RoomPatch::default()
            },
        )
        .await
    }

    /// Delete a room; its devices become unassigned.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the room does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_room(&self, id: RoomId) -> Result<(), HomePilotError> {
        self.get_room(id).await?;
        for device in self.devices.list_in_room(id).await? {
            if let Err(err) = self.devices.assign_room(device.id, None).await {
                tracing::warn!(device_id = %device.id, room_id = %id, error = %err, "could not unassign device");
            }
        }
        self.rooms.delete(id).await
    }

    /// Switch every device of a room.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the room does not exist.
    pub async fn toggle_room(&self, id: RoomId, is_on: bool) -> Result<GroupToggle, HomePilotError> {
        let room = self.get_room(id).await?;
        let updated = self.groups.set_all(&room, is_on).await?;
        Ok(GroupToggle { updated, is_on })
    }

    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] for an empty name, or a storage
    /// error.
    #[tracing::instrument(skip(self, zone), fields(zone_name = %zone.name))]
    pub async fn create_zone(&self, zone: Zone) -> Result<Zone, HomePilotError> {
        zone.validate()?;
        self.zones.create(zone).await
    }

    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when no zone with `id` exists.
    pub async fn get_zone(&self, id: ZoneId) -> Result<Zone, HomePilotError> {
        self.zones
            .get_by_id(id)
            .await?
            .ok_or_else(|| zone_not_found(id))
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_zones(&self) -> Result<Vec<Zone>, HomePilotError> {
        self.zones.get_all().await
    }

    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the zone does not exist,
    /// [`HomePilotError::Validation`] for an empty name, or a storage error.
    pub async fn update_zone(&self, zone: Zone) -> Result<Zone, HomePilotError> {
        self.get_zone(zone.id).await?;
        zone.validate()?;
        self.zones.update(zone).await
    }

    /// Delete a zone; its rooms are kept and detached.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the zone does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_zone(&self, id: ZoneId) -> Result<(), HomePilotError> {
        self.get_zone(id).await?;
        self.zones.delete(id).await
    }

    /// Switch every device in every room of a zone.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the zone does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_zone(&self, id: ZoneId, is_on: bool) -> Result<GroupToggle, HomePilotError> {
        self.get_zone(id).await?;
        let mut updated = 0;
        for room in self.rooms.find_by_zone(id).await? {
            match self.groups.set_all(&room, is_on).await {
                Ok(count) => updated += count,
                Err(err) => tracing::warn!(room_id = %room.id, error = %err, "zone toggle skipped room"),
            }
        }
        Ok(GroupToggle { updated, is_on })
    }

    /// Mirror hub areas as rooms and assign the devices the hub places in them.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Hub`] when the area list cannot be fetched.
    /// Failures on a single area are logged and skipped.
    #[tracing::instrument(skip(self))]
    pub async fn sync_areas(&self) -> Result<AreaSyncReport, HomePilotError> {
        let areas = self.hub.fetch_areas().await?;
        tracing::debug!(count = areas.len(), "fetched hub areas");

        let mut report = AreaSyncReport::default();
        for area in areas {
            if area.area_id.is_empty() {
                tracing::debug!(name = %area.name, "skipping area without id");
                continue;
            }
            if let Err(err) = self.sync_area(&area, &mut report).await {
                tracing::warn!(area_id = %area.area_id, error = %err, "area sync failed");
            }
        }
        Ok(report)
    }

    async fn sync_area(
        &self,
        area: &HubArea,
        report: &mut AreaSyncReport,
    ) -> Result<(), HomePilotError> {
        let room = match self.rooms.find_by_area_id(&area.area_id).await? {
            None => {
                let room = Room::builder()
                    .name(&area.name)
                    .icon(icon_for_area_name(&area.name))
                    .ha_area_id(&area.area_id)
                    .build()?;
                let room = self.rooms.create(room).await?;
                report.created += 1;
                room
            }
            Some(mut room) if room.name != area.name => {
                room.name.clone_from(&area.name);
                room.icon = icon_for_area_name(&area.name).to_string();
                let room = self.rooms.update(room).await?;
                report.updated += 1;
                self.relabel_devices(&room).await?;
                room
            }
            Some(room) => {
                report.unchanged += 1;
                room
            }
        };

        let entity_ids = match self.hub.fetch_entities_in_area(&area.area_id).await {
            Ok(entity_ids) => entity_ids,
            Err(err) => {
                tracing::warn!(area_id = %area.area_id, error = %err, "could not list area entities");
                return Ok(());
            }
        };
        for entity_id in entity_ids {
            let Some(device) = self.devices.find_by_entity_id(&entity_id).await? else {
                continue;
            };
            if device.room_id != Some(room.id) {
                self.assign_to(&device, &room, report).await;
            }
        }
        Ok(())
    }

    /// Point `device` at `room`, logging and skipping a failed write.
    async fn assign_to(&self, device: &Device, room: &Room, report: &mut AreaSyncReport) {
        match self.devices.assign_room(device.id, Some(room)).await {
            Ok(_) => report.devices_assigned += 1,
            Err(err) => {
                tracing::warn!(device_id = %device.id, room_id = %room.id, error = %err, "room assignment skipped device");
            }
        }
    }

    /// Create rooms from the legacy room labels stored on devices and point
    /// those devices at them.
    ///
    /// # Errors
    ///
    /// Returns a storage error if devices or rooms cannot be read or written.
    #[tracing::instrument(skip(self))]
    pub async fn adopt_legacy_rooms(&self) -> Result<AreaSyncReport, HomePilotError> {
        let mut groups: BTreeMap<String, Vec<Device>> = BTreeMap::new();
        for device in self.devices.list_devices().await? {
            let label = device.room.trim();
            if !label.is_empty() {
                groups.entry(label.to_string()).or_default().push(device);
            }
        }

        let mut report = AreaSyncReport::default();
        for (name, devices) in groups {
            let room = if let Some(room) = self.rooms.find_by_name(&name).await? {
                report.unchanged += 1;
                room
            } else {
                let room = self
                    .rooms
                    .create(Room::builder().name(&name).build()?)
                    .await?;
                report.created += 1;
                room
            };
            for device in devices {
                if device.room_id != Some(room.id) {
                    self.assign_to(&device, &room, &mut report).await;
                }
            }
        }
        Ok(report)
    }

    /// Area sync, falling back to legacy adoption when it touched no room.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the legacy adoption.
    pub async fn sync_with_hub(&self) -> Result<AreaSyncReport, HomePilotError> {
        match self.sync_areas().await {
            Ok(report) if report.touched_rooms() => return Ok(report),
            Ok(_) => tracing::info!("no hub areas applied, adopting legacy room labels"),
            Err(err) => tracing::warn!(error = %err, "area sync failed, adopting legacy room labels"),
        }
        self.adopt_legacy_rooms().await
    }
}
