//! Device mutation records.
//!
//! Every committed device write is described by a [`DeviceMutation`] that
//! carries its [`MutationOrigin`]. The origin is decided by the caller that
//! performs the write, so an observer can tell local intent from hub echoes
//! without any ambient flag.

use serde::Serialize;

use crate::device::Device;

/// Who caused a device write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationOrigin {
    /// A user or API caller changed the device.
    Local,
    /// Reconciliation mirrored hub state onto the device.
    HubSync,
}

impl MutationOrigin {
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

/// A committed change to a device, with its state before and after.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMutation {
    pub origin: MutationOrigin,
    pub before: Device,
    pub after: Device,
}

impl DeviceMutation {
    #[must_use]
    pub fn new(origin: MutationOrigin, before: Device, after: Device) -> Self {
        Self {
            origin,
            before,
            after,
        }
    }

    #[must_use]
    pub fn power_changed(&self) -> bool {
        self.before.is_on != self.after.is_on
    }

    #[must_use]
    pub fn name_changed(&self) -> bool {
        self.before.name != self.after.name
    }
}
