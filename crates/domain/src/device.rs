//! Device: a hub-bound or purely local thing that can be switched or read.
//!
//! A device may be bound to a hub entity through [`Device::entity_id`]. When
//! bound, its power/online/value fields are mirrored from the hub by
//! reconciliation, and local power or name changes are pushed back to the hub.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{HomePilotError, ValidationError};
use crate::hub::{self, DeviceProjection, HubState};
use crate::id::{DeviceId, RoomId};
use crate::room::Room;
use crate::time::Timestamp;

/// Opaque key/value map mirrored from the hub.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Attribute key that always mirrors [`Device::name`].
pub const FRIENDLY_NAME: &str = "friendly_name";

/// Kind of device, which drives its voice-protocol category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Light,
    Switch,
    Sensor,
    Climate,
    Lock,
}

impl DeviceType {
    /// Map a hub domain onto a device type (`binary_sensor` becomes a sensor).
    #[must_use]
    pub fn from_hub_domain(domain: &str) -> Option<Self> {
        match domain {
            "light" => Some(Self::Light),
            "switch" => Some(Self::Switch),
            "sensor" | "binary_sensor" => Some(Self::Sensor),
            "climate" => Some(Self::Climate),
            "lock" => Some(Self::Lock),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Switch => "switch",
            Self::Sensor => "sensor",
            Self::Climate => "climate",
            Self::Lock => "lock",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "switch" => Ok(Self::Switch),
            "sensor" => Ok(Self::Sensor),
            "climate" => Ok(Self::Climate),
            "lock" => Ok(Self::Lock),
            other => Err(ValidationError::InvalidIdentifier(other.to_string())),
        }
    }
}

/// A device known to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Denormalised name of the assigned room, empty when unassigned.
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(rename = "isOn", default)]
    pub is_on: bool,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(rename = "isOnline", default = "online_by_default")]
    pub is_online: bool,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub ha_domain: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    /// Anchor of the reconciliation grace period.
    #[serde(default)]
    pub last_user_command: Option<Timestamp>,
}

const fn online_by_default() -> bool {
    true
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Create an unsaved device mirroring a hub entity.
    ///
    /// Returns `None` when the entity's domain is not one the registry mirrors.
    /// The room is left unassigned.
    #[must_use]
    pub fn from_hub_state(state: &HubState) -> Option<Self> {
        let domain = state.domain()?;
        let device_type = DeviceType::from_hub_domain(domain)?;
        let name = state
            .friendly_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(state.entity_id.as_str())
            .to_string();
        let mut device = Self {
            id: DeviceId::UNASSIGNED,
            name,
            device_type,
            room: String::new(),
            room_id: None,
            is_on: false,
            value: None,
            unit: None,
            is_online: true,
            entity_id: Some(state.entity_id.clone()),
            ha_domain: Some(domain.to_string()),
            attributes: Attributes::new(),
            last_user_command: None,
        };
        let projection = state.project(&device.name);
        device.apply_projection(projection);
        Some(device)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] when `name` is empty, when
    /// `entity_id` is set but not of the form `<domain>.<object_id>`, or when
    /// a non-empty `ha_domain` disagrees with the entity id prefix.
    pub fn validate(&self) -> Result<(), HomePilotError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let Some(entity_id) = &self.entity_id else {
            return Ok(());
        };
        let Some(prefix) = hub::domain_of(entity_id) else {
            return Err(ValidationError::InvalidEntityId(entity_id.clone()).into());
        };
        if let Some(ha_domain) = self.ha_domain.as_deref()
            && !ha_domain.is_empty()
            && ha_domain != prefix
        {
            return Err(ValidationError::DomainMismatch {
                entity_id: entity_id.clone(),
                ha_domain: ha_domain.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// The hub domain used for outbound commands.
    ///
    /// Falls back to the entity id prefix when `ha_domain` is not stored.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.ha_domain
            .as_deref()
            .filter(|domain| !domain.is_empty())
            .or_else(|| self.entity_id.as_deref().and_then(hub::domain_of))
    }

    /// Force `attributes.friendly_name` to the current name.
    pub fn sync_friendly_name(&mut self) {
        self.attributes.insert(
            FRIENDLY_NAME.to_string(),
            serde_json::Value::String(self.name.clone()),
        );
    }

    /// Change the display name, keeping the mirrored attribute in step.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.sync_friendly_name();
    }

    /// Point the device at `room` (or unassign it), updating the legacy label.
    pub fn assign_room(&mut self, room: Option<&Room>) {
        match room {
            Some(room) => {
                self.room_id = Some(room.id);
                self.room.clone_from(&room.name);
            }
            None => {
                self.room_id = None;
                self.room.clear();
            }
        }
    }

    /// Apply a local power change.
    ///
    /// Only an actual change stamps `last_user_command`; returns whether the
    /// state changed.
    pub fn set_power(&mut self, is_on: bool, at: Timestamp) -> bool {
        if self.is_on == is_on {
            return false;
        }
        self.is_on = is_on;
        self.last_user_command = Some(at);
        true
    }

    /// Whether a local command issued less than `grace` ago protects this
    /// device from hub overwrites.
    #[must_use]
    pub fn in_grace_period(&self, now: Timestamp, grace: TimeDelta) -> bool {
        self.last_user_command
            .is_some_and(|at| now.signed_duration_since(at) < grace)
    }

    /// Overwrite mirrored fields from a hub projection; returns whether
    /// anything changed.
    pub fn apply_projection(&mut self, projection: DeviceProjection) -> bool {
        let DeviceProjection {
            is_online,
            is_on,
            value,
            unit,
            attributes,
        } = projection;

        let mut changed = false;
        if self.is_online != is_online {
            self.is_online = is_online;
            changed = true;
        }
        if self.is_on != is_on {
            self.is_on = is_on;
            changed = true;
        }
        if self.value != value {
            self.value = value;
            changed = true;
        }
        if self.unit != unit {
            self.unit = unit;
            changed = true;
        }
        if self.attributes != attributes {
            self.attributes = attributes;
            changed = true;
        }
        changed
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    device_type: Option<DeviceType>,
    room: Option<String>,
    room_id: Option<RoomId>,
    is_on: bool,
    value: Option<String>,
    unit: Option<String>,
    is_online: Option<bool>,
    entity_id: Option<String>,
    ha_domain: Option<String>,
    attributes: Attributes,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn room_id(mut self, room_id: RoomId) -> Self {
        self.room_id = Some(room_id);
        self
    }

    #[must_use]
    pub fn is_on(mut self, is_on: bool) -> Self {
        self.is_on = is_on;
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn is_online(mut self, is_online: bool) -> Self {
        self.is_online = Some(is_online);
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn ha_domain(mut self, ha_domain: impl Into<String>) -> Self {
        self.ha_domain = Some(ha_domain.into());
        self
    }

    #[must_use]
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// `ha_domain` defaults to the entity id prefix and the device type
    /// defaults to the type implied by that domain (or `switch`).
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] if `name` is missing or empty,
    /// or if `entity_id` is malformed.
    pub fn build(self) -> Result<Device, HomePilotError> {
        let ha_domain = self.ha_domain.or_else(|| {
            self.entity_id
                .as_deref()
                .and_then(hub::domain_of)
                .map(ToString::to_string)
        });
        let device_type = self
            .device_type
            .or_else(|| ha_domain.as_deref().and_then(DeviceType::from_hub_domain))
            .unwrap_or(DeviceType::Switch);

        let mut device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            device_type,
            room: self.room.unwrap_or_default(),
            room_id: self.room_id,
            is_on: self.is_on,
            value: self.value,
            unit: self.unit,
            is_online: self.is_online.unwrap_or(true),
            entity_id: self.entity_id,
            ha_domain,
            attributes: self.attributes,
            last_user_command: None,
        };
        device.validate()?;
        device.sync_friendly_name();
        Ok(device)
    }
}
