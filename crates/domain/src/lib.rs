//! # homepilot-domain
//!
//! Pure domain model for the homepilot bridge between a local device
//! registry, an external smart-home hub and a voice-assistant protocol.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (hub-bound or local things that can be switched or read)
//! - Define **Rooms** and **Zones** (logical groupings of devices and rooms)
//! - Define **Routines** (ordered action lists run on demand)
//! - Define **hub snapshots** and the projection of hub state onto a device
//! - Define **mutation records** carrying the origin of every device write
//! - Define the **directive protocol**: request parsing, endpoint resolution,
//!   discovery endpoints and response envelopes
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod directive;
pub mod hub;
pub mod mutation;
pub mod room;
pub mod routine;
pub mod sync;
pub mod zone;
