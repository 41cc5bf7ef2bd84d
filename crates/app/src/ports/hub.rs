//! Hub port: the operations the bridge needs from the external hub.
//!
//! Implementations enforce their own per-call timeout. Timeouts, transport
//! failures and non-success statuses all surface as [`HubError`].

use std::future::Future;

use homepilot_domain::error::HubError;
use homepilot_domain::hub::{HubArea, HubState, ServiceCall};

pub trait HubClient: Send + Sync {
    /// Current state of every hub entity.
    fn fetch_states(&self) -> impl Future<Output = Result<Vec<HubState>, HubError>> + Send;

    /// Current state of one entity, `None` when the hub does not know it.
    fn fetch_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<HubState>, HubError>> + Send;

    /// Fire a service on an entity.
    fn invoke_action(&self, call: &ServiceCall)
    -> impl Future<Output = Result<(), HubError>> + Send;

    /// Every area defined on the hub.
    fn fetch_areas(&self) -> impl Future<Output = Result<Vec<HubArea>, HubError>> + Send;

    /// Entity ids assigned to `area_id`.
    fn fetch_entities_in_area(
        &self,
        area_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, HubError>> + Send;

    /// Permanently rename an entity in the hub registry.
    fn rename_entity(
        &self,
        entity_id: &str,
        name: &str,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Overwrite an entity's state object until the hub next refreshes it.
    fn set_state(&self, state: &HubState) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: HubClient> HubClient for std::sync::Arc<T> {
    fn fetch_states(&self) -> impl Future<Output = Result<Vec<HubState>, HubError>> + Send {
        (**self).fetch_states()
    }

    fn fetch_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<HubState>, HubError>> + Send {
        (**self).fetch_state(entity_id)
    }

    fn invoke_action(
        &self,
        call: &ServiceCall,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).invoke_action(call)
    }

    fn fetch_areas(&self) -> impl Future<Output = Result<Vec<HubArea>, HubError>> + Send {
        (**self).fetch_areas()
    }

    fn fetch_entities_in_area(
        &self,
        area_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, HubError>> + Send {
        (**self).fetch_entities_in_area(area_id)
    }

    fn rename_entity(
        &self,
        entity_id: &str,
        name: &str,
    ) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).rename_entity(entity_id, name)
    }

    fn set_state(&self, state: &HubState) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).set_state(state)
    }
}
