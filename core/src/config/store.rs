//! Configuration Store
//!
//! Loads and saves the skill's TOML configuration file. Credentials have no
//! defaults here; they come from the file or from environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ConfigError;
use crate::places::PlaceBook;
use crate::providers::traffic::BoundingBox;

/// Unified Plan My Trip configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Skill application identifier the host stamps on every event
    #[serde(default)]
    pub app_id: String,

    /// Outbound HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Traffic incidents provider
    #[serde(default)]
    pub traffic: TrafficConfig,

    /// Directions provider
    #[serde(default)]
    pub routing: RoutingConfig,

    /// SMS provider (optional; reminders apologize when absent)
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Place-name to street-address table
    #[serde(default)]
    pub places: PlaceBook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficConfig {
    #[serde(default = "default_traffic_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// `lat,lon,lat,lon`
    #[serde(default = "default_bounding_box")]
    pub bounding_box: String,
    #[serde(default = "default_filters")]
    pub filters: String,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            endpoint: default_traffic_endpoint(),
            api_key: String::new(),
            bounding_box: default_bounding_box(),
            filters: default_filters(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_routing_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Fixed trip origin
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_routing_endpoint(),
            api_key: String::new(),
            origin: default_origin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default = "default_messaging_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub from_number: String,
    #[serde(default)]
    pub to_number: String,
    #[serde(default = "default_reminder_body")]
    pub body: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            base_url: default_messaging_base_url(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            body: default_reminder_body(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from an explicit `path`, or from the default location when one
    /// exists, then apply environment overrides.
    ///
    /// An explicit path must exist. Only the default location may be absent,
    /// in which case built-in defaults are used.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::load(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("plan-my-trip").join("config.toml"))
    }

    /// Whether every credential needed for SMS reminders is present
    pub fn messaging_ready(&self) -> bool {
        let m = &self.messaging;
        !(m.account_sid.is_empty()
            || m.auth_token.is_empty()
            || m.from_number.is_empty()
            || m.to_number.is_empty())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::MissingValue("app_id".to_string()));
        }
        if self.traffic.api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("traffic.api_key".to_string()));
        }
        if self.routing.api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("routing.api_key".to_string()));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "http.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "http.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if let Err(e) = self.traffic.bounding_box.parse::<BoundingBox>() {
            return Err(ConfigError::InvalidValue(format!("traffic.bounding_box: {}", e)));
        }
        if self.routing.origin.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "routing.origin cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy with every credential masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in [
            &mut copy.traffic.api_key,
            &mut copy.routing.api_key,
            &mut copy.messaging.account_sid,
            &mut copy.messaging.auth_token,
        ] {
            if !secret.is_empty() {
                *secret = "********".to_string();
            }
        }
        copy
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_traffic_endpoint() -> String {
    "https://www.mapquestapi.com/traffic/v2/incidents".to_string()
}

fn default_routing_endpoint() -> String {
    "https://www.mapquestapi.com/directions/v2/route".to_string()
}

fn default_messaging_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_bounding_box() -> String {
    "37.00,-122.00,38.00,-123.00".to_string()
}

fn default_filters() -> String {
    "construction,congestion".to_string()
}

fn default_origin() -> String {
    "Pier 48, San Francisco, CA".to_string()
}

fn default_reminder_body() -> String {
    "Time to leave! Check Plan My Trip for the latest road conditions.".to_string()
}
