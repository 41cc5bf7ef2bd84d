//! Hub snapshots: what the external hub reports and what we ask of it.
//!
//! The hub identifies things by a string entity id of the form
//! `<domain>.<object_id>` (e.g. `light.kitchen`). The domain prefix decides
//! how an entity is mapped onto a [`Device`](crate::device::Device) and which
//! service verbs it understands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::{Attributes, FRIENDLY_NAME};

/// Hub domains mirrored into the registry by a full sync.
pub const SUPPORTED_DOMAINS: &[&str] = &[
    "light",
    "switch",
    "sensor",
    "binary_sensor",
    "climate",
    "lock",
];

/// Domains that accept power commands from the outbound dispatcher.
pub const ACTUATED_DOMAINS: &[&str] = &["light", "switch", "lock"];

/// Attribute key carrying a sensor's unit.
pub const UNIT_OF_MEASUREMENT: &str = "unit_of_measurement";

const OFF_STATES: &[&str] = &["off", "unavailable", "unknown", "closed", "locked"];
const OFFLINE_STATES: &[&str] = &["unavailable", "unknown"];

/// Extract the domain prefix from an entity id.
///
/// Returns `None` unless both the domain and the object id are non-empty.
#[must_use]
pub fn domain_of(entity_id: &str) -> Option<&str> {
    let (domain, object_id) = entity_id.split_once('.')?;
    (!domain.is_empty() && !object_id.is_empty()).then_some(domain)
}

/// Whether a full sync creates devices for this domain.
#[must_use]
pub fn is_supported_domain(domain: &str) -> bool {
    SUPPORTED_DOMAINS.contains(&domain)
}

/// Current state of a single hub entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Attributes,
}

impl HubState {
    /// Domain prefix of the entity id.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        domain_of(&self.entity_id)
    }

    /// Anything but `unavailable` / `unknown` counts as reachable.
    #[must_use]
    pub fn is_online(&self) -> bool {
        !OFFLINE_STATES.contains(&self.state.as_str())
    }

    /// Anything but `off`, `unavailable`, `unknown`, `closed`, `locked` counts as on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        !OFF_STATES.contains(&self.state.as_str())
    }

    /// The hub-side display name, if any.
    #[must_use]
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get(FRIENDLY_NAME).and_then(|v| v.as_str())
    }

    /// The sensor unit reported by the hub, if any.
    #[must_use]
    pub fn unit(&self) -> Option<String> {
        self.attributes
            .get(UNIT_OF_MEASUREMENT)
            .and_then(|v| v.as_str())
            .map(ToString::to_string)
    }

    /// Derive the device fields this snapshot implies.
    ///
    /// `friendly_name` in the projected attributes is forced to `local_name`:
    /// the hub never renames a device locally.
    #[must_use]
    pub fn project(&self, local_name: &str) -> DeviceProjection {
        let mut attributes = self.attributes.clone();
        attributes.insert(
            FRIENDLY_NAME.to_string(),
            serde_json::Value::String(local_name.to_string()),
        );
        DeviceProjection {
            is_online: self.is_online(),
            is_on: self.is_on(),
            value: Some(self.state.clone()),
            unit: self.unit(),
            attributes,
        }
    }
}

/// Device fields derived from a [`HubState`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProjection {
    pub is_online: bool,
    pub is_on: bool,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub attributes: Attributes,
}

/// An area (room-like grouping) defined on the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubArea {
    #[serde(alias = "id")]
    pub area_id: String,
    pub name: String,
}

/// A service invocation sent to the hub (`POST services/{domain}/{service}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: String,
    #[serde(default)]
    pub data: Attributes,
}

impl ServiceCall {
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            entity_id: entity_id.into(),
            data: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Attributes) -> Self {
        self.data = data;
        self
    }

    /// Build the power command for an actuated domain.
    ///
    /// Locks are inverted: "on" means unlocked. Returns `None` for domains
    /// that are not actuated this way (sensors, climate, …).
    #[must_use]
    pub fn power(domain: &str, entity_id: &str, is_on: bool) -> Option<Self> {
        if !ACTUATED_DOMAINS.contains(&domain) {
            return None;
        }
        let service = match (domain, is_on) {
            ("lock", true) => "unlock",
            ("lock", false) => "lock",
            (_, true) => "turn_on",
            (_, false) => "turn_off",
        };
        Some(Self::new(domain, service, entity_id))
    }

    /// JSON body posted to the hub: the extra data plus `entity_id`.
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        let mut body = self.data.clone();
        body.insert(
            "entity_id".to_string(),
            serde_json::Value::String(self.entity_id.clone()),
        );
        serde_json::Value::Object(body)
    }
}

impl fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.domain, self.service, self.entity_id)
    }
}
