//! Routine steps and the hub calls they turn into.

use serde::{Deserialize, Serialize};

use crate::device::Attributes;
use crate::error::ValidationError;
use crate::hub::{self, ServiceCall};

/// One step of a routine; steps run in ascending `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineAction {
    #[serde(default)]
    pub order: i32,
    #[serde(flatten)]
    pub kind: ActionKind,
}

/// What a routine step does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Suspend the routine for `seconds`.
    Delay { seconds: u64 },
    /// Invoke `service` on a hub entity; the domain is the entity id prefix.
    Service {
        entity_id: String,
        service: String,
        #[serde(default)]
        data: Attributes,
    },
}

impl RoutineAction {
    #[must_use]
    pub fn delay(order: i32, seconds: u64) -> Self {
        Self {
            order,
            kind: ActionKind::Delay { seconds },
        }
    }

    #[must_use]
    pub fn service(order: i32, entity_id: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            order,
            kind: ActionKind::Service {
                entity_id: entity_id.into(),
                service: service.into(),
                data: Attributes::new(),
            },
        }
    }

    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a service step targets a malformed
    /// entity id or names no service.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.kind {
            ActionKind::Delay { .. } => Ok(()),
            ActionKind::Service {
                entity_id, service, ..
            } => {
                if hub::domain_of(entity_id).is_none() {
                    return Err(ValidationError::InvalidEntityId(entity_id.clone()));
                }
                if service.trim().is_empty() {
                    return Err(ValidationError::InvalidIdentifier(service.clone()));
                }
                Ok(())
            }
        }
    }

    /// The hub call this step makes, or `None` for a delay.
    #[must_use]
    pub fn service_call(&self) -> Option<ServiceCall> {
        match &self.kind {
            ActionKind::Delay { .. } => None,
            ActionKind::Service {
                entity_id,
                service,
                data,
            } => {
                let domain = hub::domain_of(entity_id).unwrap_or_default();
                Some(
                    ServiceCall::new(domain, service.clone(), entity_id.clone())
                        .with_data(data.clone()),
                )
            }
        }
    }
}

/// Result of one executed routine step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionOutcome {
    Delayed { order: i32, seconds: u64 },
    Invoked {
        order: i32,
        entity_id: String,
        service: String,
    },
}
