//! Inbound directive envelopes and their parsed [`Directive`] form.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

const DISCOVERY: &str = "Alexa.Discovery";
const POWER_CONTROLLER: &str = "Alexa.PowerController";
const SCENE_CONTROLLER: &str = "Alexa.SceneController";

/// Header shared by every inbound directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Header {
    pub namespace: String,
    pub name: String,
    pub message_id: Option<String>,
    pub correlation_token: Option<String>,
}

/// Authorisation scope attached to an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scope {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub token: Option<String>,
}

/// The endpoint a directive is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoint {
    #[serde(deserialize_with = "string_or_number")]
    pub endpoint_id: Option<String>,
    pub cookie: Map<String, Value>,
    pub scope: Option<Scope>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        Some(Value::Number(value)) => Some(value.to_string()),
        _ => None,
    })
}

impl Endpoint {
    /// Read a cookie entry as a string, accepting numeric values too.
    #[must_use]
    pub fn cookie_str(&self, key: &str) -> Option<String> {
        match self.cookie.get(key)? {
            Value::String(value) if !value.is_empty() => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.scope.as_ref().and_then(|scope| scope.token.as_deref())
    }
}

/// Target power state of a `PowerController` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl From<bool> for PowerState {
    fn from(is_on: bool) -> Self {
        if is_on { Self::On } else { Self::Off }
    }
}

/// The operation a directive asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveRequest {
    Discover,
    Power(PowerState),
    ActivateScene,
    Unsupported { reason: &'static str },
}

impl DirectiveRequest {
    fn classify(header: &Header) -> Self {
        match (header.namespace.as_str(), header.name.as_str()) {
            (DISCOVERY, "Discover") => Self::Discover,
            (POWER_CONTROLLER, "TurnOn") => Self::Power(PowerState::On),
            (POWER_CONTROLLER, "TurnOff") => Self::Power(PowerState::Off),
            (SCENE_CONTROLLER, "Activate") => Self::ActivateScene,
            (SCENE_CONTROLLER, _) => Self::Unsupported {
                reason: "Only Activate is supported for scenes",
            },
            _ => Self::Unsupported {
                reason: "Directive not supported",
            },
        }
    }
}

/// A parsed inbound directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub header: Header,
    pub endpoint: Endpoint,
    pub request: DirectiveRequest,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawDirective {
    header: Header,
    endpoint: Endpoint,
}

impl Directive {
    /// Parse an envelope, with or without the outer `{"directive": …}` wrapper.
    ///
    /// # Errors
    ///
    /// Returns the decoding error when the header or endpoint has the wrong
    /// shape.
    pub fn parse(envelope: &Value) -> Result<Self, serde_json::Error> {
        let inner = envelope.get("directive").unwrap_or(envelope);
        let raw = RawDirective::deserialize(inner)?;
        let request = DirectiveRequest::classify(&raw.header);
        Ok(Self {
            header: raw.header,
            endpoint: raw.endpoint,
            request,
        })
    }
}
