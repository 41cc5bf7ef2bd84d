//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HomePilotError`] via `#[from]`.

use crate::id::RoutineId;
use crate::routine::ActionOutcome;

/// Boxed error used for adapter-specific sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error shared by every layer.
#[derive(Debug, thiserror::Error)]
pub enum HomePilotError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    #[error("{0}")]
    Hub(#[from] HubError),

    #[error("{0}")]
    Routine(#[from] RoutineExecutionError),

    #[error("storage error")]
    Storage(#[source] BoxError),

    #[error("internal error: {0}")]
    Internal(#[source] BoxError),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("entity id {0:?} is not of the form <domain>.<object_id>")]
    InvalidEntityId(String),

    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("hub domain {ha_domain:?} does not match entity id {entity_id:?}")]
    DomainMismatch {
        entity_id: String,
        ha_domain: String,
    },
}

/// A record addressed by id does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure talking to the hub.
///
/// Timeouts, transport failures and non-success statuses are all treated as
/// the hub being unreachable or rejecting the request.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("hub unreachable: {0}")]
    Unreachable(#[source] BoxError),

    #[error("hub rejected request with status {status}")]
    Rejected { status: u16 },

    #[error("invalid hub response: {0}")]
    InvalidResponse(#[source] BoxError),
}

/// A routine stopped at its first failing action.
///
/// Actions that ran before the failure are not rolled back; they are listed
/// in [`completed`](Self::completed).
#[derive(Debug, thiserror::Error)]
#[error("routine {routine_id} failed at action {action_index}: {source}")]
pub struct RoutineExecutionError {
    pub routine_id: RoutineId,
    pub action_index: usize,
    pub completed: Vec<ActionOutcome>,
    #[source]
    pub source: HubError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Room",
            id: "7".to_string(),
        };
        assert_eq!(err.to_string(), "Room not found: 7");
    }

    #[test]
    fn should_pass_not_found_message_through_top_level_error() {
        let err: HomePilotError = NotFoundError {
            entity: "Device",
            id: "42".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Device not found: 42");
    }

    #[test]
    fn should_render_rejected_status() {
        let err = HubError::Rejected { status: 503 };
        assert_eq!(err.to_string(), "hub rejected request with status 503");
    }

    #[test]
    fn should_convert_hub_error_into_top_level_error() {
        let err: HomePilotError = HubError::Rejected { status: 401 }.into();
        assert!(matches!(err, HomePilotError::Hub(HubError::Rejected { status: 401 })));
    }

    #[test]
    fn should_render_routine_failure_with_cause() {
        let err = RoutineExecutionError {
            routine_id: RoutineId::new(4),
            action_index: 1,
            completed: Vec::new(),
            source: HubError::Rejected { status: 500 },
        };
        assert_eq!(
            err.to_string(),
            "routine 4 failed at action 1: hub rejected request with status 500"
        );
    }
}
