//! Stored routine triggers.

use serde::{Deserialize, Serialize};

/// Declarative description of when a routine should run.
///
/// Triggers are stored and served back to clients; nothing in the bridge
/// schedules them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutineTrigger {
    /// Wall-clock time (`HH:MM`) on the given days (`daily`, `weekdays`, …).
    Time {
        at: String,
        #[serde(default = "every_day")]
        days: String,
    },
    /// A hub entity's state compared against a value.
    DeviceState {
        entity_id: String,
        condition: String,
        value: String,
    },
    /// Sun position event such as `sunrise` or `sunset`.
    Sun { event: String },
}

fn every_day() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_default_time_trigger_days_to_daily() {
        let trigger: RoutineTrigger =
            serde_json::from_value(json!({"type": "time", "at": "07:30"})).unwrap();
        assert_eq!(
            trigger,
            RoutineTrigger::Time {
                at: "07:30".into(),
                days: "daily".into()
            }
        );
    }

    #[test]
    fn should_parse_device_state_trigger() {
        let trigger: RoutineTrigger = serde_json::from_value(json!({
            "type": "device_state",
            "entity_id": "binary_sensor.door",
            "condition": "==",
            "value": "on"
        }))
        .unwrap();
        assert!(matches!(trigger, RoutineTrigger::DeviceState { .. }));
    }
}
