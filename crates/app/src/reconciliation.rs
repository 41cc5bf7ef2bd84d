//! Reconciliation engine: merges hub-reported state into the registry.
//!
//! Devices whose last local command is younger than the grace period are
//! left untouched, so an optimistic toggle is not undone by a stale poll.
//! All writes go through [`DeviceService::apply_hub_state`] and are therefore
//! tagged as hub-originated.

use std::collections::{HashMap, HashSet};

use chrono::TimeDelta;
use homepilot_domain::error::HomePilotError;
use homepilot_domain::hub::{self, HubState};
use homepilot_domain::id::DeviceId;
use homepilot_domain::sync::{SyncOutcome, SyncReport};

use crate::ports::{DeviceRepository, HubClient, MutationObserver};
use crate::services::device_service::DeviceService;

/// Default protection window after a local command, in seconds.
pub const DEFAULT_GRACE_PERIOD_SECS: i64 = 5;

/// Hub states keyed by entity id.
pub type HubSnapshot = HashMap<String, HubState>;

pub struct ReconciliationEngine<R, O, H> {
    devices: DeviceService<R, O>,
    hub: H,
    grace: TimeDelta,
}

impl<R, O, H> ReconciliationEngine<R, O, H>
where
    R: DeviceRepository,
    O: MutationObserver,
    H: HubClient,
{
    pub fn new(devices: DeviceService<R, O>, hub: H) -> Self {
        Self {
            devices,
            hub,
            grace: TimeDelta::seconds(DEFAULT_GRACE_PERIOD_SECS),
        }
    }

    #[must_use]
    pub fn with_grace_period(mut self, grace: TimeDelta) -> Self {
        self.grace = grace;
        self
    }

    async fn snapshot(&self) -> Result<HubSnapshot, HomePilotError> {
        let states = self.hub.fetch_states().await?;
        Ok(states
            .into_iter()
            .map(|state| (state.entity_id.clone(), state))
            .collect())
    }

    /// Fetch the hub snapshot and reconcile known devices against it.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Hub`] when the hub cannot be read; nothing is
    /// written in that case.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) -> Result<SyncReport, HomePilotError> {
        let snapshot = self.snapshot().await?;
        self.reconcile(&snapshot).await
    }

    /// Update every bound device present in `snapshot`.
    ///
    /// Devices absent from the snapshot, or inside their grace period, are
    /// counted as skipped. A failure on one device is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the device list cannot be read.
    #[tracing::instrument(skip(self, snapshot), fields(states = snapshot.len()))]
    pub async fn reconcile(&self, snapshot: &HubSnapshot) -> Result<SyncReport, HomePilotError> {
        let mut report = SyncReport::default();
        for device in self.devices.list_devices().await? {
            let Some(entity_id) = device.entity_id.as_deref() else {
                continue;
            };
            let Some(state) = snapshot.get(entity_id) else {
                report.record(SyncOutcome::Skipped);
                continue;
            };
            report.record(self.apply(device.id, state).await);
        }
        if report.has_changes() {
            tracing::info!(updated = report.updated, "reconciled devices from hub");
        }
        Ok(report)
    }

    /// Full registry sync: reconcile, create devices for new hub entities of
    /// supported domains, and delete devices whose entity disappeared.
    ///
    /// New devices are created unassigned; hub areas are not applied here.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Hub`] when the hub cannot be read, or a
    /// storage error if the device list cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn full_sync(&self) -> Result<SyncReport, HomePilotError> {
        let snapshot = self.snapshot().await?;
        let existing: HashMap<String, _> = self
            .devices
            .list_devices()
            .await?
            .into_iter()
            .filter_map(|device| Some((device.entity_id.clone()?, device.id)))
            .collect();

        let mut report = SyncReport::default();
        for (entity_id, state) in &snapshot {
            if !state.domain().is_some_and(hub::is_supported_domain) {
                continue;
            }
            if let Some(&id) = existing.get(entity_id) {
                report.record(self.apply(id, state).await);
                continue;
            }
            match self.devices.create_from_hub(state).await {
                Ok(Some(device)) => {
                    tracing::debug!(entity_id, device_id = %device.id, "created device from hub");
                    report.record(SyncOutcome::Created);
                }
                Ok(None) => {}
                Err(err) => tracing::warn!(entity_id, error = %err, "could not create device"),
            }
        }

        let present: HashSet<&str> = snapshot.keys().map(String::as_str).collect();
        for (entity_id, id) in &existing {
            if present.contains(entity_id.as_str()) {
                continue;
            }
            match self.devices.delete_device(*id).await {
                Ok(()) => report.record(SyncOutcome::Removed),
                Err(err) => tracing::warn!(entity_id, error = %err, "could not remove device"),
            }
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            removed = report.removed,
            "full hub sync finished"
        );
        Ok(report)
    }

    async fn apply(&self, id: DeviceId, state: &HubState) -> SyncOutcome {
        match self.devices.apply_hub_state(id, state, self.grace).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(device_id = %id, error = %err, "skipping device during reconciliation");
                SyncOutcome::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use homepilot_domain::device::{Device, DeviceType};
    use serde_json::json;

    use crate::testing::{InMemoryRegistry, RecordingObserver, SpyHub, bound_device, hub_state};

    type Engine = ReconciliationEngine<Arc<InMemoryRegistry>, Arc<RecordingObserver>, Arc<SpyHub>>;

    struct Fixture {
        engine: Engine,
        devices: DeviceService<Arc<InMemoryRegistry>, Arc<RecordingObserver>>,
        registry: Arc<InMemoryRegistry>,
        hub: Arc<SpyHub>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(InMemoryRegistry::default());
        let hub = Arc::new(SpyHub::default());
        let devices = DeviceService::new(
            Arc::clone(&registry),
            Arc::new(RecordingObserver::default()),
        );
        let engine = ReconciliationEngine::new(devices.clone(), Arc::clone(&hub));
        Fixture {
            engine,
            devices,
            registry,
            hub,
        }
    }

    async fn add(fx: &Fixture, name: &str, entity_id: &str) -> DeviceId {
        fx.devices
            .create_device(bound_device(name, entity_id))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn should_mark_off_like_states_as_off() {
        let fx = fixture();
        let mut cases = Vec::new();
        for (i, state) in ["off", "unavailable", "unknown", "closed", "locked"]
            .into_iter()
            .enumerate()
        {
            let entity_id = format!("switch.s{i}");
            let id = add(&fx, "S", &entity_id).await;
            cases.push((id, entity_id, state));
        }
        let on: HubSnapshot = cases
            .iter()
            .map(|(_, e, _)| (e.clone(), hub_state(e, "on")))
            .collect();
        let off: HubSnapshot = cases
            .iter()
            .map(|(_, e, s)| (e.clone(), hub_state(e, s)))
            .collect();

        fx.engine.reconcile(&on).await.unwrap();
        fx.engine.reconcile(&off).await.unwrap();

        for (id, _, state) in cases {
            assert!(!fx.registry.device(id).unwrap().is_on, "{state} should be off");
        }
    }

    #[tokio::test]
    async fn should_mark_other_states_as_on_and_copy_value_and_unit() {
        let fx = fixture();
        let id = add(&fx, "Living Temp", "sensor.living_temp").await;
        let mut state = hub_state("sensor.living_temp", "21.5");
        state.attributes.insert("unit_of_measurement".into(), json!("°C"));
        state.attributes.insert("friendly_name".into(), json!("Hub Name"));
        let snapshot = HubSnapshot::from([(state.entity_id.clone(), state)]);

        let report = fx.engine.reconcile(&snapshot).await.unwrap();

        assert_eq!(report.updated, 1);
        let device = fx.registry.device(id).unwrap();
        assert!(device.is_on);
        assert_eq!(device.value.as_deref(), Some("21.5"));
        assert_eq!(device.unit.as_deref(), Some("°C"));
        assert_eq!(device.attributes["friendly_name"], json!("Living Temp"));
        assert_eq!(device.name, "Living Temp");
    }

    #[tokio::test]
    async fn should_be_idempotent_for_the_same_snapshot() {
        let fx = fixture();
        add(&fx, "Desk", "light.desk").await;
        let snapshot = HubSnapshot::from([("light.desk".to_string(), hub_state("light.desk", "on"))]);

        let first = fx.engine.reconcile(&snapshot).await.unwrap();
        let second = fx.engine.reconcile(&snapshot).await.unwrap();

        assert_eq!(first.updated, 1);
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 1);
    }

    #[tokio::test]
    async fn should_leave_device_untouched_during_grace_period() {
        let fx = fixture();
        let id = add(&fx, "Desk", "light.desk").await;
        fx.devices.toggle(id, true).await.unwrap();
        let before = fx.registry.device(id).unwrap();
        let snapshot = HubSnapshot::from([("light.desk".to_string(), hub_state("light.desk", "off"))]);

        let report = fx.engine.reconcile(&snapshot).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(fx.registry.device(id).unwrap(), before);
    }

    #[tokio::test]
    async fn should_apply_hub_state_once_grace_period_elapsed() {
        let fx = fixture();
        let id = add(&fx, "Desk", "light.desk").await;
        fx.devices.toggle(id, true).await.unwrap();
        let engine = ReconciliationEngine::new(fx.devices.clone(), Arc::clone(&fx.hub))
            .with_grace_period(TimeDelta::zero());
        let snapshot = HubSnapshot::from([("light.desk".to_string(), hub_state("light.desk", "off"))]);

        engine.reconcile(&snapshot).await.unwrap();

        assert!(!fx.registry.device(id).unwrap().is_on);
    }

    #[tokio::test]
    async fn should_abort_without_writes_when_hub_unreachable() {
        let fx = fixture();
        let id = add(&fx, "Desk", "light.desk").await;
        let before = fx.registry.device(id).unwrap();
        fx.hub.go_down();

        let result = fx.engine.refresh().await;

        assert!(matches!(result, Err(HomePilotError::Hub(_))));
        assert_eq!(fx.registry.device(id).unwrap(), before);
    }

    #[tokio::test]
    async fn should_create_and_remove_devices_on_full_sync() {
        let fx = fixture();
        let stale = add(&fx, "Old", "light.old").await;
        let kept = add(&fx, "Desk", "light.desk").await;
        let local = fx
            .devices
            .create_device(
                Device::builder()
                    .name("Local Fan")
                    .device_type(DeviceType::Switch)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        fx.hub.set_states(vec![
            hub_state("light.desk", "on"),
            hub_state("binary_sensor.door", "off"),
            hub_state("media_player.tv", "playing"),
        ]);

        let report = fx.engine.full_sync().await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.removed, 1);
        assert!(fx.registry.device(stale).is_none());
        assert!(fx.registry.device(kept).unwrap().is_on);
        assert!(fx.registry.device(local.id).is_some());

        let door = DeviceRepository::find_by_entity_id(&*fx.registry, "binary_sensor.door")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(door.device_type, DeviceType::Sensor);
        assert!(door.room_id.is_none());
        assert!(door.room.is_empty());
    }

    #[tokio::test]
    async fn should_never_dispatch_hub_commands_while_reconciling() {
        let registry = Arc::new(InMemoryRegistry::default());
        let hub = Arc::new(SpyHub::default());
        let devices = DeviceService::new(
            Arc::clone(&registry),
            Arc::new(crate::outbound::OutboundDispatcher::new(Arc::clone(&hub))),
        );
        devices
            .create_device(bound_device("Desk", "light.desk"))
            .await
            .unwrap();
        hub.set_states(vec![hub_state("light.desk", "on")]);
        let engine = ReconciliationEngine::new(devices, Arc::clone(&hub));

        let report = engine.refresh().await.unwrap();

        assert_eq!(report.updated, 1);
        assert!(hub.invoked().is_empty());
    }
}
