//! Hub connection configuration.

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_HUB_URL: &str = "http://homeassistant.local:8123";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Where the hub lives and how to talk to it.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Base URL of the hub, without the `/api` suffix.
    pub url: String,
    /// Long-lived access token sent as a bearer token.
    pub token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_HUB_URL.to_string(),
            token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConfig")
            .field("url", &self.url)
            .field("token", &"[redacted]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HubConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Absolute URL of an API endpoint, e.g. `api_url("states")`.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.url.trim_end_matches('/'))
    }
}
