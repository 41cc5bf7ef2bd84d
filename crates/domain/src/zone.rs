//! Zone: a logical grouping of rooms (a floor, the outdoors, …).

use serde::{Deserialize, Serialize};

use crate::error::{HomePilotError, ValidationError};
use crate::id::ZoneId;

pub const DEFAULT_ZONE_ICON: &str = "home";
pub const DEFAULT_ZONE_COLOR: &str = "#3b82f6";

/// A named set of rooms. Zones carry no hub binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub icon: String,
    pub color: String,
    #[serde(default)]
    pub order: i32,
    /// Number of rooms in this zone, derived at read time.
    #[serde(default)]
    pub room_count: u32,
}

impl Zone {
    /// Create a zone with default icon and color.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] when `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, HomePilotError> {
        let zone = Self {
            id: ZoneId::UNASSIGNED,
            name: name.into(),
            icon: DEFAULT_ZONE_ICON.to_string(),
            color: DEFAULT_ZONE_COLOR.to_string(),
            order: 0,
            room_count: 0,
        };
        zone.validate()?;
        Ok(zone)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), HomePilotError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}
