//! Device service: use-cases for managing devices.
//!
//! Every read-modify-write of a device runs under that device's lock, and the
//! [`MutationObserver`] is notified before the lock is released. A local
//! toggle and a reconciliation pass racing on the same device therefore never
//! interleave, and the origin tag travels with the write it describes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::TimeDelta;
use homepilot_domain::device::Device;
use homepilot_domain::error::{HomePilotError, NotFoundError, ValidationError};
use homepilot_domain::hub::HubState;
use homepilot_domain::id::{DeviceId, RoomId};
use homepilot_domain::mutation::{DeviceMutation, MutationOrigin};
use homepilot_domain::room::Room;
use homepilot_domain::sync::SyncOutcome;
use homepilot_domain::time::{Timestamp, now};
use tokio::sync::OwnedMutexGuard;

use crate::ports::{DeviceRepository, MutationObserver};

/// One async lock per device id.
#[derive(Debug, Default)]
struct DeviceLocks {
    inner: Mutex<HashMap<DeviceId, Arc<tokio::sync::Mutex<()>>>>,
}

impl DeviceLocks {
    async fn acquire(&self, id: DeviceId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(id).or_default())
        };
        lock.lock_owned().await
    }

    fn forget(&self, id: DeviceId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// Local changes to apply to a device in one locked write.
#[derive(Debug, Clone, Default)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub is_on: Option<bool>,
    /// `Some(None)` unassigns the device.
    pub room: Option<Option<Room>>,
}

impl DevicePatch {
    #[must_use]
    pub fn power(is_on: bool) -> Self {
        Self {
            is_on: Some(is_on),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn room(room: Option<Room>) -> Self {
        Self {
            room: Some(room),
            ..Self::default()
        }
    }

    /// Apply to `device`, returning whether anything changed.
    fn apply(self, device: &mut Device, at: Timestamp) -> bool {
        let mut changed = false;
        if let Some(name) = self.name
            && device.name != name
        {
            device.rename(name);
            changed = true;
        }
        if let Some(is_on) = self.is_on {
            changed |= device.set_power(is_on, at);
        }
        if let Some(room) = self.room {
            let target = room.as_ref().map(|room| (room.id, room.name.as_str()));
            let current = device.room_id.map(|id| (id, device.room.as_str()));
            if target != current {
                device.assign_room(room.as_ref());
                changed = true;
            }
        }
        changed
    }
}

/// Result of a locked device write.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceChange {
    pub device: Device,
    pub changed: bool,
}

/// Application service for device operations.
pub struct DeviceService<R, O> {
    repo: R,
    observer: O,
    locks: Arc<DeviceLocks>,
}

impl<R: Clone, O: Clone> Clone for DeviceService<R, O> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            observer: self.observer.clone(),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<R: DeviceRepository, O: MutationObserver> DeviceService<R, O> {
    /// Create a new service backed by the given repository, notifying
    /// `observer` of every committed update.
    pub fn new(repo: R, observer: O) -> Self {
        Self {
            repo,
            observer,
            locks: Arc::default(),
        }
    }

    /// Create a new device after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, device), fields(device_name = %device.name))]
    pub async fn create_device(&self, mut device: Device) -> Result<Device, HomePilotError> {
        device.validate()?;
        device.sync_friendly_name();
        self.repo.create(device).await
    }

    /// Look up a device by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when no device with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_device(&self, id: DeviceId) -> Result<Device, HomePilotError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all devices.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_devices(&self) -> Result<Vec<Device>, HomePilotError> {
        self.repo.get_all().await
    }

    /// List the devices assigned to a room.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_in_room(&self, room_id: RoomId) -> Result<Vec<Device>, HomePilotError> {
        self.repo.find_by_room(room_id).await
    }

    /// Find the device bound to a hub entity.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> Result<Option<Device>, HomePilotError> {
        self.repo.find_by_entity_id(entity_id).await
    }

    /// Delete a device by id.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the device does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_device(&self, id: DeviceId) -> Result<(), HomePilotError> {
        {
            let _guard = self.locks.acquire(id).await;
            self.get_device(id).await?;
            self.repo.delete(id).await?;
        }
        self.locks.forget(id);
        Ok(())
    }

    /// Apply a local change and notify the observer with origin `Local`.
    ///
    /// A power change stamps `last_user_command`, arming the reconciliation
    /// grace period. Nothing is written when the patch changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] for an unknown device,
    /// [`HomePilotError::Validation`] for an empty name, or a storage error.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_device(
        &self,
        id: DeviceId,
        patch: DevicePatch,
    ) -> Result<DeviceChange, HomePilotError> {
        if patch
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(ValidationError::EmptyName.into());
        }
        let at = now();
        self.mutate(id, MutationOrigin::Local, move |device| {
            patch.apply(device, at)
        })
        .await
    }

    /// Switch a device on or off on behalf of a user.
    ///
    /// # Errors
    ///
    /// See [`update_device`](Self::update_device).
    pub async fn toggle(&self, id: DeviceId, is_on: bool) -> Result<DeviceChange, HomePilotError> {
        self.update_device(id, DevicePatch::power(is_on)).await
    }

    /// Rename a device; the hub is told about it by the observer.
    ///
    /// # Errors
    ///
    /// See [`update_device`](Self::update_device).
    pub async fn rename(
        &self,
        id: DeviceId,
        name: impl Into<String>,
    ) -> Result<DeviceChange, HomePilotError> {
        self.update_device(id, DevicePatch::rename(name)).await
    }

    /// Move a device into `room`, or unassign it.
    ///
    /// # Errors
    ///
    /// See [`update_device`](Self::update_device).
    pub async fn assign_room(
        &self,
        id: DeviceId,
        room: Option<&Room>,
    ) -> Result<DeviceChange, HomePilotError> {
        self.update_device(id, DevicePatch::room(room.cloned())).await
    }

    /// Toggle several devices, continuing past individual failures.
    ///
    /// Returns the devices that were processed, in request order.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn batch_toggle(&self, ids: &[DeviceId], is_on: bool) -> Vec<Device> {
        let mut processed = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.toggle(id, is_on).await {
                Ok(change) => processed.push(change.device),
                Err(err) => tracing::warn!(device_id = %id, error = %err, "batch toggle skipped device"),
            }
        }
        processed
    }

    /// Mirror a hub snapshot onto a device, tagged with origin `HubSync`.
    ///
    /// The grace-period check runs under the device lock, so a concurrent
    /// local toggle is either fully visible (and protects the device) or
    /// happens entirely after this write.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the device vanished, or a
    /// storage error.
    #[tracing::instrument(skip(self, state), fields(entity_id = %state.entity_id))]
    pub async fn apply_hub_state(
        &self,
        id: DeviceId,
        state: &HubState,
        grace: TimeDelta,
    ) -> Result<SyncOutcome, HomePilotError> {
        let at = now();
        let mut skipped = false;
        let change = self
            .mutate(id, MutationOrigin::HubSync, |device| {
                if device.in_grace_period(at, grace) {
                    skipped = true;
                    return false;
                }
                let projection = state.project(&device.name);
                device.apply_projection(projection)
            })
            .await?;
        Ok(if skipped {
            SyncOutcome::Skipped
        } else if change.changed {
            SyncOutcome::Updated
        } else {
            SyncOutcome::Unchanged
        })
    }

    /// Insert a device mirroring a hub entity. Returns `None` for domains the
    /// registry does not mirror.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn create_from_hub(&self, state: &HubState) -> Result<Option<Device>, HomePilotError> {
        match Device::from_hub_state(state) {
            Some(device) => self.repo.create(device).await.map(Some),
            None => Ok(None),
        }
    }

    async fn mutate<F>(
        &self,
        id: DeviceId,
        origin: MutationOrigin,
        change: F,
    ) -> Result<DeviceChange, HomePilotError>
    where
        F: FnOnce(&mut Device) -> bool + Send,
    {
        let _guard = self.locks.acquire(id).await;
        let before = self.get_device(id).await?;
        let mut after = before.clone();
        if !change(&mut after) {
            return Ok(DeviceChange {
                device: before,
                changed: false,
            });
        }
        after.sync_friendly_name();
        after.validate()?;
        let after = self.repo.update(after).await?;
        self.observer
            .on_device_mutation(&DeviceMutation::new(origin, before, after.clone()))
            .await;
        Ok(DeviceChange {
            device: after,
            changed: true,
        })
    }
}
