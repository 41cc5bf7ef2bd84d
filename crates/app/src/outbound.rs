//! Outbound dispatcher: pushes local device intent to the hub.
//!
//! Hub-originated mutations are ignored here, which is what keeps a mirrored
//! hub state from being echoed back as a command. Every hub call is
//! fire-and-forget: failures are logged and the local write stands.

use homepilot_domain::device::FRIENDLY_NAME;
use homepilot_domain::hub::ServiceCall;
use homepilot_domain::mutation::DeviceMutation;

use crate::ports::{HubClient, MutationObserver};

/// [`MutationObserver`] translating local device changes into hub calls.
#[derive(Debug, Clone)]
pub struct OutboundDispatcher<H> {
    hub: H,
}

impl<H: HubClient> OutboundDispatcher<H> {
    pub fn new(hub: H) -> Self {
        Self { hub }
    }

    /// Send the power command for `is_on`, if the domain is actuated.
    async fn push_power(&self, domain: &str, entity_id: &str, is_on: bool) {
        let Some(call) = ServiceCall::power(domain, entity_id, is_on) else {
            tracing::debug!(entity_id, domain, "domain not actuated, no command sent");
            return;
        };
        match self.hub.invoke_action(&call).await {
            Ok(()) => tracing::info!(%call, "sent power command to hub"),
            Err(err) => tracing::warn!(%call, error = %err, "hub power command failed"),
        }
    }

    /// Rename on the hub: permanent registry update first, then an ephemeral
    /// state patch carrying the new `friendly_name`.
    async fn push_rename(&self, entity_id: &str, name: &str) {
        let err = match self.hub.rename_entity(entity_id, name).await {
            Ok(()) => {
                tracing::info!(entity_id, name, "renamed entity in hub registry");
                return;
            }
            Err(err) => err,
        };
        tracing::debug!(entity_id, error = %err, "registry rename failed, patching state instead");

        let mut state = match self.hub.fetch_state(entity_id).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::warn!(entity_id, "entity unknown to hub, rename dropped");
                return;
            }
            Err(err) => {
                tracing::warn!(entity_id, error = %err, "could not read entity for rename");
                return;
            }
        };
        state.attributes.insert(
            FRIENDLY_NAME.to_string(),
            serde_json::Value::String(name.to_string()),
        );
        if let Err(err) = self.hub.set_state(&state).await {
            tracing::warn!(entity_id, error = %err, "state patch rename failed");
        }
    }
}

impl<H: HubClient> MutationObserver for OutboundDispatcher<H> {
    async fn on_device_mutation(&self, mutation: &DeviceMutation) {
        if !mutation.origin.is_local() {
            return;
        }
        let device = &mutation.after;
        let Some(entity_id) = device.entity_id.as_deref() else {
            return;
        };

        if mutation.power_changed()
            && let Some(domain) = device.domain()
        {
            self.push_power(domain, entity_id, device.is_on).await;
        }
        if mutation.name_changed() {
            self.push_rename(entity_id, &device.name).await;
        }
    }
}
