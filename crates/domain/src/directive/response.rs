//! Response envelopes sent back for inbound directives.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::time::{Timestamp, to_protocol_string};

use super::PAYLOAD_VERSION;
use super::discovery::DiscoveryEndpoint;
use super::request::{Endpoint, Header, PowerState};

const UNCERTAINTY_MS: u32 = 500;

/// Error categories reported inside an `ErrorResponse` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    InvalidDirective,
    NoSuchEndpoint,
    InternalError,
}

/// Top-level response object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    pub event: Event,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Context {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ContextProperty>,
}

/// A reported property such as `powerState`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextProperty {
    pub namespace: &'static str,
    pub name: &'static str,
    pub value: Value,
    pub time_of_sample: String,
    pub uncertainty_in_milliseconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub header: EventHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EventEndpoint>,
    pub payload: Payload,
}

/// Event header. `correlationToken` is always written, as `null` when the
/// directive carried none, except on a `Discover.Response` which never has one.
#[derive(Debug, Clone, PartialEq)]
pub struct EventHeader {
    pub namespace: &'static str,
    pub name: &'static str,
    pub payload_version: &'static str,
    pub message_id: String,
    pub correlation_token: Option<String>,
    omit_correlation_token: bool,
}

impl Serialize for EventHeader {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.omit_correlation_token { 4 } else { 5 };
        let mut header = serializer.serialize_struct("EventHeader", len)?;
        header.serialize_field("namespace", self.namespace)?;
        header.serialize_field("name", self.name)?;
        header.serialize_field("payloadVersion", self.payload_version)?;
        header.serialize_field("messageId", &self.message_id)?;
        if self.omit_correlation_token {
            header.skip_field("correlationToken")?;
        } else {
            header.serialize_field("correlationToken", &self.correlation_token)?;
        }
        header.end()
    }
}

impl EventHeader {
    /// Reply header echoing the inbound ids; a missing message id is replaced
    /// by a fresh one.
    fn reply(namespace: &'static str, name: &'static str, to: &Header) -> Self {
        Self {
            namespace,
            name,
            payload_version: PAYLOAD_VERSION,
            message_id: to
                .message_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            correlation_token: to.correlation_token.clone(),
            omit_correlation_token: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEndpoint {
    pub scope: ResponseScope,
    pub endpoint_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseScope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub token: Option<String>,
}

impl From<&Endpoint> for EventEndpoint {
    fn from(endpoint: &Endpoint) -> Self {
        Self {
            scope: ResponseScope {
                kind: "BearerToken",
                token: endpoint.token().map(ToString::to_string),
            },
            endpoint_id: endpoint.endpoint_id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cause {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Event payload; the variant decides the JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Discovery {
        endpoints: Vec<DiscoveryEndpoint>,
    },
    Error {
        #[serde(rename = "type")]
        error_type: ErrorType,
        message: String,
    },
    Activation {
        cause: Cause,
        timestamp: String,
    },
    Empty {},
}

impl ResponseEnvelope {
    /// `Alexa.ErrorResponse` replying to `header`.
    #[must_use]
    pub fn error(header: &Header, error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            context: None,
            event: Event {
                header: EventHeader::reply("Alexa", "ErrorResponse", header),
                endpoint: None,
                payload: Payload::Error {
                    error_type,
                    message: message.into(),
                },
            },
        }
    }

    /// `Alexa.Response` reporting the resulting power state.
    ///
    /// Routine endpoints additionally report `EndpointHealth.connectivity`.
    #[must_use]
    pub fn power(
        header: &Header,
        endpoint: &Endpoint,
        state: PowerState,
        report_health: bool,
        at: Timestamp,
    ) -> Self {
        let time_of_sample = to_protocol_string(at);
        let mut properties = vec![ContextProperty {
            namespace: "Alexa.PowerController",
            name: "powerState",
            value: Value::String(state.as_str().to_string()),
            time_of_sample: time_of_sample.clone(),
            uncertainty_in_milliseconds: UNCERTAINTY_MS,
        }];
        if report_health {
            properties.push(ContextProperty {
                namespace: "Alexa.EndpointHealth",
                name: "connectivity",
                value: json!({"value": "OK"}),
                time_of_sample,
                uncertainty_in_milliseconds: UNCERTAINTY_MS,
            });
        }
        Self {
            context: Some(Context { properties }),
            event: Event {
                header: EventHeader::reply("Alexa", "Response", header),
                endpoint: Some(endpoint.into()),
                payload: Payload::Empty {},
            },
        }
    }

    /// `SceneController.ActivationStarted` for a voice-triggered scene.
    #[must_use]
    pub fn activation_started(header: &Header, endpoint: &Endpoint, at: Timestamp) -> Self {
        Self {
            context: Some(Context::default()),
            event: Event {
                header: EventHeader::reply("Alexa.SceneController", "ActivationStarted", header),
                endpoint: Some(endpoint.into()),
                payload: Payload::Activation {
                    cause: Cause {
                        kind: "VOICE_INTERACTION",
                    },
                    timestamp: to_protocol_string(at),
                },
            },
        }
    }

    /// `Discover.Response` listing every endpoint.
    #[must_use]
    pub fn discovery(header: &Header, endpoints: Vec<DiscoveryEndpoint>) -> Self {
        let mut event_header = EventHeader::reply("Alexa.Discovery", "Discover.Response", header);
        event_header.correlation_token = None;
        event_header.omit_correlation_token = true;
        Self {
            context: None,
            event: Event {
                header: event_header,
                endpoint: None,
                payload: Payload::Discovery { endpoints },
            },
        }
    }

    /// The error category when this is an error response.
    #[must_use]
    pub fn error_type(&self) -> Option<ErrorType> {
        match &self.event.payload {
            Payload::Error { error_type, .. } => Some(*error_type),
            _ => None,
        }
    }
}
