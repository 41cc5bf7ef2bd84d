//! Typed identifier newtypes backed by store-assigned integers.
//!
//! The numeric value is part of the directive protocol: device endpoints are
//! addressed by the raw id, rooms and routines by `room_{id}` / `routine_{id}`.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Placeholder carried by records that have not been persisted yet.
            pub const UNASSIGNED: Self = Self(0);

            /// Wrap an existing numeric identifier.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Access the inner value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Whether the store has assigned this identifier.
            #[must_use]
            pub const fn is_assigned(self) -> bool {
                self.0 > 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`Device`](crate::device::Device).
    DeviceId
);

define_id!(
    /// Unique identifier for a [`Room`](crate::room::Room).
    RoomId
);

define_id!(
    /// Unique identifier for a [`Zone`](crate::zone::Zone).
    ZoneId
);

define_id!(
    /// Unique identifier for a [`Routine`](crate::routine::Routine).
    RoutineId
);
