//! Voice-assistant directive protocol (payload version 3).
//!
//! Inbound envelopes are parsed once into a [`Directive`]; responses are
//! built as typed [`ResponseEnvelope`]s so every reply, success or error,
//! has a well-formed shape.

mod discovery;
mod request;
mod response;
mod target;

pub use discovery::{
    Capability, CapabilityProperties, DiscoveryEndpoint, DisplayCategory, SupportedProperty,
};
pub use request::{Directive, DirectiveRequest, Endpoint, Header, PowerState, Scope};
pub use response::{
    Cause, Context, ContextProperty, ErrorType, Event, EventEndpoint, EventHeader, Payload,
    ResponseEnvelope, ResponseScope,
};
pub use target::{EndpointTarget, room_endpoint_id, routine_endpoint_id};

/// Version string carried by every response header.
pub const PAYLOAD_VERSION: &str = "3";
