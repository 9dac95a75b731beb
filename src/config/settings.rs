use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::identity::AuthMode;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Realtime server base URL. Required; an empty endpoint makes
    /// acquire fail fast instead of connecting nowhere.
    #[serde(default)]
    pub endpoint: String,
    /// Whether connections authenticate by bearer token or raw user id
    #[serde(default = "default_auth_mode")]
    pub auth_mode: AuthMode,
    /// Application-level ping interval in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier for exponential growth
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

fn default_auth_mode() -> AuthMode {
    AuthMode::Token
}

fn default_heartbeat_interval() -> u64 {
    30 // 30 seconds
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000 // 30 seconds
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter_factor() -> f64 {
    0.1 // 10% jitter
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("realtime.endpoint", "")?
            .set_default("realtime.auth_mode", "token")?
            .set_default("realtime.heartbeat_interval", 30)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // REALTIME_ENDPOINT, REALTIME_AUTH_MODE, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            auth_mode: default_auth_mode(),
            heartbeat_interval: default_heartbeat_interval(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let realtime = RealtimeConfig::default();
        assert!(realtime.endpoint.is_empty());
        assert_eq!(realtime.auth_mode, AuthMode::Token);
        assert_eq!(realtime.heartbeat_interval, 30);
    }

    #[test]
    fn test_reconnect_defaults() {
        let reconnect = ReconnectConfig::default();
        assert_eq!(reconnect.initial_delay_ms, 500);
        assert_eq!(reconnect.max_delay_ms, 30_000);
        assert_eq!(reconnect.multiplier, 2.0);
        assert_eq!(reconnect.jitter_factor, 0.1);
    }
}
