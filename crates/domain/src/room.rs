//! Room: a physical room grouping devices, optionally bound to a hub area.

use serde::{Deserialize, Serialize};

use crate::error::{HomePilotError, ValidationError};
use crate::id::{RoomId, ZoneId};

pub const DEFAULT_ROOM_ICON: &str = "door-open";
pub const DEFAULT_ROOM_COLOR: &str = "#6366f1";

/// Keyword table used to pick an icon from an area or room name.
///
/// Exact matches win; otherwise the first keyword contained in the name.
const ICON_KEYWORDS: &[(&str, &str)] = &[
    ("living room", "sofa"),
    ("living", "sofa"),
    ("sala", "sofa"),
    ("lounge", "sofa"),
    ("bedroom", "bed"),
    ("master bedroom", "bed"),
    ("dormitorio", "bed"),
    ("cuarto", "bed"),
    ("habitacion", "bed"),
    ("kitchen", "utensils"),
    ("cocina", "utensils"),
    ("bathroom", "bath"),
    ("baño", "bath"),
    ("bath", "bath"),
    ("office", "lightbulb"),
    ("oficina", "lightbulb"),
    ("study", "lightbulb"),
    ("estudio", "lightbulb"),
    ("media room", "tv"),
    ("tv room", "tv"),
    ("theater", "tv"),
    ("garage", "car"),
    ("garaje", "car"),
    ("laundry", "warehouse"),
    ("lavanderia", "warehouse"),
    ("garden", "trees"),
    ("jardin", "trees"),
    ("patio", "trees"),
    ("yard", "trees"),
    ("hallway", "door-open"),
    ("hall", "door-open"),
    ("pasillo", "door-open"),
    ("corridor", "door-open"),
    ("gym", "dumbbell"),
    ("gimnasio", "dumbbell"),
    ("exercise", "dumbbell"),
];

/// Pick an icon name for a room called `name`.
#[must_use]
pub fn icon_for_area_name(name: &str) -> &'static str {
    let name = name.trim().to_lowercase();
    ICON_KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == name)
        .or_else(|| {
            ICON_KEYWORDS
                .iter()
                .find(|(keyword, _)| name.contains(keyword))
        })
        .map_or(DEFAULT_ROOM_ICON, |(_, icon)| *icon)
}

/// A room in the house.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(rename = "zone", default)]
    pub zone_id: Option<ZoneId>,
    pub icon: String,
    pub color: String,
    #[serde(default)]
    pub order: i32,
    /// Bound hub area, unique across rooms.
    #[serde(default)]
    pub ha_area_id: Option<String>,
    /// Number of devices pointing at this room, derived at read time.
    #[serde(default)]
    pub device_count: u32,
}

impl Room {
    /// Create a builder for constructing a [`Room`].
    #[must_use]
    pub fn builder() -> RoomBuilder {
        RoomBuilder::default()
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

    #[must_use]
    pub fn is_synced_with_hub(&self) -> bool {
        self.ha_area_id.is_some()
    }
}

/// Step-by-step builder for [`Room`].
#[derive(Debug, Default)]
pub struct RoomBuilder {
    id: Option<RoomId>,
    name: Option<String>,
    zone_id: Option<ZoneId>,
    icon: Option<String>,
    color: Option<String>,
    order: i32,
    ha_area_id: Option<String>,
}

impl RoomBuilder {
    #[must_use]
    pub fn id(mut self, id: RoomId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn zone_id(mut self, zone_id: ZoneId) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn ha_area_id(mut self, ha_area_id: impl Into<String>) -> Self {
        self.ha_area_id = Some(ha_area_id.into());
        self
    }

    /// Consume the builder, validate, and return a [`Room`].
    ///
    /// The icon defaults to the one matching the room name.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Room, HomePilotError> {
        let name = self.name.unwrap_or_default();
        let icon = self
            .icon
            .unwrap_or_else(|| icon_for_area_name(&name).to_string());
        let room = Room {
            id: self.id.unwrap_or_default(),
            name,
            zone_id: self.zone_id,
            icon,
            color: self.color.unwrap_or_else(|| DEFAULT_ROOM_COLOR.to_string()),
            order: self.order,
            ha_area_id: self.ha_area_id,
            device_count: 0,
        };
        room.validate()?;
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_icon_exactly_when_name_is_a_keyword() {
        assert_eq!(icon_for_area_name("Kitchen"), "utensils");
        assert_eq!(icon_for_area_name("  garage "), "car");
    }

    #[test]
    fn should_match_icon_by_containment_when_no_exact_keyword() {
        assert_eq!(icon_for_area_name("Master Bedroom 2"), "bed");
        assert_eq!(icon_for_area_name("Back Garden"), "trees");
    }

    #[test]
    fn should_default_icon_when_nothing_matches() {
        assert_eq!(icon_for_area_name("Attic"), DEFAULT_ROOM_ICON);
    }

    #[test]
    fn should_derive_icon_from_name_when_not_given() {
        let room = Room::builder().name("Living Room").build().unwrap();
        assert_eq!(room.icon, "sofa");
        assert_eq!(room.color, DEFAULT_ROOM_COLOR);
        assert!(!room.is_synced_with_hub());
    }

    #[test]
    fn should_return_validation_error_when_name_is_blank() {
        let result = Room::builder().name("   ").build();
        assert!(matches!(
            result,
            Err(HomePilotError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_serialize_with_camel_case_keys() {
        let room = Room::builder()
            .name("Kitchen")
            .ha_area_id("kitchen")
            .zone_id(ZoneId::new(2))
            .build()
            .unwrap();
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["haAreaId"], "kitchen");
        assert_eq!(json["zone"], 2);
        assert_eq!(json["deviceCount"], 0);
    }
}
