//! Discovery endpoints advertised to the voice assistant.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::device::{Device, DeviceType};
use crate::room::Room;
use crate::routine::Routine;

use super::PAYLOAD_VERSION;
use super::target::{room_endpoint_id, routine_endpoint_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayCategory {
    Light,
    Smartlock,
    Switch,
    SceneTrigger,
}

impl From<DeviceType> for DisplayCategory {
    fn from(device_type: DeviceType) -> Self {
        match device_type {
            DeviceType::Light => Self::Light,
            DeviceType::Lock => Self::Smartlock,
            _ => Self::Switch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityProperties {
    pub supported: Vec<SupportedProperty>,
    pub proactively_reported: bool,
    pub retrievable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedProperty {
    pub name: &'static str,
}

/// An interface an endpoint implements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub interface: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<CapabilityProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_deactivation: Option<bool>,
}

impl Capability {
    fn interface(interface: &'static str) -> Self {
        Self {
            kind: "AlexaInterface",
            interface,
            version: PAYLOAD_VERSION,
            properties: None,
            supports_deactivation: None,
        }
    }

    /// The base `Alexa` interface every endpoint declares.
    #[must_use]
    pub fn base() -> Self {
        Self::interface("Alexa")
    }

    #[must_use]
    pub fn power_controller(proactively_reported: bool) -> Self {
        Self {
            properties: Some(CapabilityProperties {
                supported: vec![SupportedProperty { name: "powerState" }],
                proactively_reported,
                retrievable: true,
            }),
            ..Self::interface("Alexa.PowerController")
        }
    }

    #[must_use]
    pub fn scene_controller() -> Self {
        Self {
            supports_deactivation: Some(false),
            ..Self::interface("Alexa.SceneController")
        }
    }
}

/// One entry of a `Discover.Response`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryEndpoint {
    pub endpoint_id: String,
    pub manufacturer_name: String,
    pub friendly_name: String,
    pub description: String,
    pub display_categories: Vec<DisplayCategory>,
    pub cookie: Map<String, Value>,
    pub capabilities: Vec<Capability>,
}

impl DiscoveryEndpoint {
    /// A single device, addressed by its raw numeric id.
    #[must_use]
    pub fn for_device(device: &Device, manufacturer: &str) -> Self {
        let mut cookie = Map::new();
        cookie.insert(
            "entity_id".to_string(),
            device
                .entity_id
                .clone()
                .map_or(Value::Null, Value::String),
        );
        Self {
            endpoint_id: device.id.to_string(),
            manufacturer_name: manufacturer.to_string(),
            friendly_name: device.name.clone(),
            description: format!("{} in {}", device.device_type, device.room),
            display_categories: vec![device.device_type.into()],
            cookie,
            capabilities: vec![Capability::base(), Capability::power_controller(true)],
        }
    }

    /// A routine, exposed as a scene trigger.
    #[must_use]
    pub fn for_routine(routine: &Routine, manufacturer: &str) -> Self {
        let mut cookie = Map::new();
        cookie.insert(
            "routine_id".to_string(),
            Value::String(routine.id.to_string()),
        );
        Self {
            endpoint_id: routine_endpoint_id(routine.id),
            manufacturer_name: manufacturer.to_string(),
            friendly_name: routine.name.clone(),
            description: routine
                .description
                .clone()
                .filter(|description| !description.is_empty())
                .unwrap_or_else(|| "Routine".to_string()),
            display_categories: vec![DisplayCategory::SceneTrigger],
            cookie,
            capabilities: vec![Capability::base(), Capability::scene_controller()],
        }
    }

    /// A room, exposed as a switch controlling all its devices.
    ///
    /// Returns `None` for empty rooms.
    #[must_use]
    pub fn for_room(room: &Room, manufacturer: &str) -> Option<Self> {
        if room.device_count == 0 {
            return None;
        }
        let mut cookie = Map::new();
        cookie.insert("room_id".to_string(), Value::String(room.id.to_string()));
        cookie.insert("type".to_string(), Value::String("room".to_string()));
        Some(Self {
            endpoint_id: room_endpoint_id(room.id),
            manufacturer_name: manufacturer.to_string(),
            friendly_name: room.name.clone(),
            description: format!("Room with {} devices", room.device_count),
            display_categories: vec![DisplayCategory::Switch],
            cookie,
            capabilities: vec![Capability::base(), Capability::power_controller(false)],
        })
    }
}
