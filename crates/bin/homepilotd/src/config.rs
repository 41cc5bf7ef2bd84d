//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `homepilot.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use homepilot_adapter_hub_http::HubConfig;
use homepilot_app::reconciliation::DEFAULT_GRACE_PERIOD_SECS;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Hub connection. Its `Debug` output never shows the token.
    pub hub: HubConfig,
    /// Reconciliation settings.
    pub sync: SyncConfig,
    /// Voice endpoint settings.
    pub voice: VoiceConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds during which hub state may not overwrite a local command.
    pub grace_period_secs: i64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Manufacturer reported for every discovered endpoint.
    pub manufacturer_name: String,
}

impl Config {
    /// Load configuration from `homepilot.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homepilot.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides from `lookup`, which resolves an environment variable
    /// name to its value. Unparsable numbers are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("HOMEPILOT_HOST") {
            self.server.host = val;
        }
        if let Some(port) = lookup("HOMEPILOT_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = lookup("HOMEPILOT_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("HOMEPILOT_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("HOMEPILOT_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("HOMEPILOT_HUB_URL") {
            self.hub.url = val;
        }
        if let Some(val) = lookup("HOMEPILOT_HUB_TOKEN") {
            self.hub.token = val;
        }
        if let Some(secs) = lookup("HOMEPILOT_HUB_TIMEOUT_SECS").and_then(|val| val.parse().ok()) {
            self.hub.timeout_secs = secs;
        }
        if let Some(secs) = lookup("HOMEPILOT_GRACE_PERIOD_SECS").and_then(|val| val.parse().ok())
        {
            self.sync.grace_period_secs = secs;
        }
        if let Some(val) = lookup("HOMEPILOT_MANUFACTURER") {
            self.voice.manufacturer_name = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.hub.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "hub timeout must be non-zero".to_string(),
            ));
        }
        if self.sync.grace_period_secs < 0 {
            return Err(ConfigError::Validation(
                "grace period must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:homepilot.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homepilotd=info,homepilot=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            manufacturer_name: "HomePilot".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
