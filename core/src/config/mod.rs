//! Configuration management
//!
//! File-backed settings plus `PLAN_MY_TRIP_*` environment overrides.
//! Credentials are only ever read from one of those two places.

pub mod store;

pub use store::{Config, HttpConfig, MessagingConfig, RoutingConfig, TrafficConfig};

use std::env;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error occurred while reading/writing config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// Required value absent
    #[error("missing required configuration: {0}")]
    MissingValue(String),
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Environment variables recognised as overrides, with the field they set
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PLAN_MY_TRIP_APP_ID", "app_id"),
    ("PLAN_MY_TRIP_TRAFFIC_API_KEY", "traffic.api_key"),
    ("PLAN_MY_TRIP_ROUTING_API_KEY", "routing.api_key"),
    ("PLAN_MY_TRIP_TWILIO_ACCOUNT_SID", "messaging.account_sid"),
    ("PLAN_MY_TRIP_TWILIO_AUTH_TOKEN", "messaging.auth_token"),
    ("PLAN_MY_TRIP_SMS_FROM", "messaging.from_number"),
    ("PLAN_MY_TRIP_SMS_TO", "messaging.to_number"),
];

impl Config {
    /// Apply environment variable overrides
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a value from the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, field) in ENV_OVERRIDES {
            let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let slot = match *field {
                "app_id" => &mut self.app_id,
                "traffic.api_key" => &mut self.traffic.api_key,
                "routing.api_key" => &mut self.routing.api_key,
                "messaging.account_sid" => &mut self.messaging.account_sid,
                "messaging.auth_token" => &mut self.messaging.auth_token,
                "messaging.from_number" => &mut self.messaging.from_number,
                "messaging.to_number" => &mut self.messaging.to_number,
                _ => continue,
            };
            *slot = value.trim().to_string();
            tracing::debug!("Config field {} overridden by {}", field, var);
        }
    }
}
