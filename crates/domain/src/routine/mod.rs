//! Routine: a stored, ordered list of actions run on demand.

mod action;
mod trigger;

pub use action::{ActionKind, ActionOutcome, RoutineAction};
pub use trigger::RoutineTrigger;

use serde::{Deserialize, Serialize};

use crate::error::{HomePilotError, ValidationError};
use crate::id::RoutineId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: RoutineId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Alternate spoken names.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub actions: Vec<RoutineAction>,
    #[serde(default)]
    pub triggers: Vec<RoutineTrigger>,
}

fn default_icon() -> String {
    "Play".to_string()
}

fn default_color() -> String {
    "blue".to_string()
}

const fn active_by_default() -> bool {
    true
}

impl Routine {
    /// Create an unsaved routine with no actions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoutineId::UNASSIGNED,
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            icon: default_icon(),
            color: default_color(),
            is_active: true,
            actions: Vec::new(),
            triggers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_actions(mut self, actions: Vec<RoutineAction>) -> Self {
        self.actions = actions;
        self
    }

    #[must_use]
    pub fn with_triggers(mut self, triggers: Vec<RoutineTrigger>) -> Self {
        self.triggers = triggers;
        self
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] when `name` is empty or an
    /// action is malformed.
    pub fn validate(&self) -> Result<(), HomePilotError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }

    /// Actions sorted by ascending `order`, stable for equal orders.
    #[must_use]
    pub fn ordered_actions(&self) -> Vec<&RoutineAction> {
        let mut actions: Vec<_> = self.actions.iter().collect();
        actions.sort_by_key(|action| action.order);
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_order_actions_by_ascending_order() {
        let routine = Routine::new("Good night").with_actions(vec![
            RoutineAction::service(2, "lock.front", "lock"),
            RoutineAction::delay(1, 5),
            RoutineAction::service(0, "light.hall", "turn_off"),
        ]);

        let orders: Vec<i32> = routine.ordered_actions().iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn should_return_validation_error_when_action_is_malformed() {
        let routine =
            Routine::new("Broken").with_actions(vec![RoutineAction::service(0, "nope", "turn_on")]);
        assert!(matches!(
            routine.validate(),
            Err(HomePilotError::Validation(ValidationError::InvalidEntityId(_)))
        ));
    }

    #[test]
    fn should_fill_defaults_when_deserializing_minimal_routine() {
        let routine: Routine =
            serde_json::from_value(serde_json::json!({"id": 4, "name": "Movie"})).unwrap();
        assert_eq!(routine.id, RoutineId::new(4));
        assert!(routine.is_active);
        assert!(routine.actions.is_empty());
    }
}
