//! Room group resolver: switches every device of a room at once.

use homepilot_domain::error::HomePilotError;
use homepilot_domain::room::Room;

use crate::ports::{DeviceRepository, MutationObserver};
use crate::services::device_service::DeviceService;

/// Outcome of a group toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupToggle {
    /// Devices whose power state actually changed.
    pub updated: usize,
    pub is_on: bool,
}

/// Applies the device toggle contract to every device of a room.
pub struct RoomGroupResolver<R, O> {
    devices: DeviceService<R, O>,
}

impl<R: Clone, O: Clone> Clone for RoomGroupResolver<R, O> {
    fn clone(&self) -> Self {
        Self {
            devices: self.devices.clone(),
        }
    }
}

impl<R: DeviceRepository, O: MutationObserver> RoomGroupResolver<R, O> {
    pub fn new(devices: DeviceService<R, O>) -> Self {
        Self { devices }
    }

    /// Switch every device assigned to `room`, continuing past per-device
    /// failures. Returns how many devices changed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the room's devices cannot be listed.
    #[tracing::instrument(skip(self, room), fields(room_id = %room.id))]
    pub async fn set_all(&self, room: &Room, is_on: bool) -> Result<usize, HomePilotError> {
        let mut updated = 0;
        for device in self.devices.list_in_room(room.id).await? {
            match self.devices.toggle(device.id, is_on).await {
                Ok(change) if change.changed => updated += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(device_id = %device.id, error = %err, "room toggle skipped device");
                }
            }
        }
        tracing::info!(room = %room.name, updated, is_on, "toggled room");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::outbound::OutboundDispatcher;
    use crate::ports::RoomRepository;
    use crate::testing::{InMemoryRegistry, SpyHub, bound_device};

    #[tokio::test]
    async fn should_switch_every_device_in_room_and_count_changes() {
        let registry = Arc::new(InMemoryRegistry::default());
        let hub = Arc::new(SpyHub::default());
        let devices = DeviceService::new(
            Arc::clone(&registry),
            OutboundDispatcher::new(Arc::clone(&hub)),
        );
        let resolver = RoomGroupResolver::new(devices.clone());
        let room = RoomRepository::create(
            &*registry,
            Room::builder().name("Kitchen").build().unwrap(),
        )
        .await
        .unwrap();
        let elsewhere = devices
            .create_device(bound_device("Hall", "light.hall"))
            .await
            .unwrap();
        for (name, entity_id) in [("A", "light.a"), ("B", "switch.b"), ("C", "sensor.c")] {
            let device = devices
                .create_device(bound_device(name, entity_id))
                .await
                .unwrap();
            devices.assign_room(device.id, Some(&room)).await.unwrap();
        }

        let updated = resolver.set_all(&room, true).await.unwrap();

        assert_eq!(updated, 3);
        assert!(!registry.device(elsewhere.id).unwrap().is_on);
        let services: Vec<_> = hub.invoked().into_iter().map(|c| c.entity_id).collect();
        assert_eq!(services.len(), 2);
        assert!(services.contains(&"light.a".to_string()));
        assert!(services.contains(&"switch.b".to_string()));
    }

    #[tokio::test]
    async fn should_report_zero_when_room_already_in_target_state() {
        let registry = Arc::new(InMemoryRegistry::default());
        let devices = DeviceService::new(
            Arc::clone(&registry),
            crate::ports::mutation::NoopObserver,
        );
        let resolver = RoomGroupResolver::new(devices.clone());
        let room = RoomRepository::create(
            &*registry,
            Room::builder().name("Kitchen").build().unwrap(),
        )
        .await
        .unwrap();
        let device = devices
            .create_device(bound_device("A", "light.a"))
            .await
            .unwrap();
        devices.assign_room(device.id, Some(&room)).await.unwrap();

        assert_eq!(resolver.set_all(&room, false).await.unwrap(), 0);
    }
}
