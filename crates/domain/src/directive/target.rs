//! Endpoint id scheme, including alias suffixes.

use crate::id::{DeviceId, RoomId, RoutineId};

use super::request::Endpoint;

const ROOM_PREFIX: &str = "room_";
const ROUTINE_PREFIX: &str = "routine_";
const ALIAS_SEPARATOR: &str = "_alias_";

/// What a directive endpoint resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointTarget {
    Room(RoomId),
    Routine(RoutineId),
    Device(DeviceId),
    /// Nothing recognisable; carries the raw endpoint id for the error message.
    Unknown(String),
}

/// Endpoint id advertised for a room group.
#[must_use]
pub fn room_endpoint_id(id: RoomId) -> String {
    format!("{ROOM_PREFIX}{id}")
}

/// Endpoint id advertised for a routine.
#[must_use]
pub fn routine_endpoint_id(id: RoutineId) -> String {
    format!("{ROUTINE_PREFIX}{id}")
}

fn strip_alias(raw: &str) -> &str {
    raw.split_once(ALIAS_SEPARATOR).map_or(raw, |(id, _)| id)
}

impl Endpoint {
    fn raw_id(&self) -> String {
        self.endpoint_id.clone().unwrap_or_default()
    }

    /// Room addressed by this endpoint.
    ///
    /// A `room_id` cookie only counts when the cookie also carries
    /// `type = "room"`; the `room_` prefix is consulted only without a cookie.
    fn room_target(&self) -> Option<EndpointTarget> {
        let raw = match self.cookie_str("room_id") {
            Some(room_id) => {
                if self.cookie_str("type").as_deref() != Some("room") {
                    return None;
                }
                room_id
            }
            None => self
                .endpoint_id
                .as_deref()?
                .strip_prefix(ROOM_PREFIX)?
                .to_string(),
        };
        Some(
            raw.parse()
                .map_or_else(|_| EndpointTarget::Unknown(self.raw_id()), EndpointTarget::Room),
        )
    }

    /// Routine addressed by this endpoint: cookie first, then the
    /// `routine_{id}` / `routine_{id}_alias_{n}` endpoint id.
    fn routine_target(&self) -> Option<EndpointTarget> {
        let raw = match self.cookie_str("routine_id") {
            Some(routine_id) => routine_id,
            None => strip_alias(self.endpoint_id.as_deref()?.strip_prefix(ROUTINE_PREFIX)?)
                .to_string(),
        };
        Some(
            raw.parse()
                .map_or_else(|_| EndpointTarget::Unknown(self.raw_id()), EndpointTarget::Routine),
        )
    }

    /// Resolve the target of a power directive: room, then routine, then a
    /// raw device id.
    #[must_use]
    pub fn power_target(&self) -> EndpointTarget {
        if let Some(target) = self.room_target() {
            return target;
        }
        if let Some(target) = self.routine_target() {
            return target;
        }
        let raw = self.raw_id();
        raw.parse()
            .map_or_else(|_| EndpointTarget::Unknown(raw.clone()), EndpointTarget::Device)
    }

    /// Resolve the routine a scene directive activates.
    #[must_use]
    pub fn scene_target(&self) -> EndpointTarget {
        self.routine_target()
            .unwrap_or_else(|| EndpointTarget::Unknown(self.raw_id()))
    }
}
