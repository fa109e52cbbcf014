//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::env;

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file
    pub database_path: String,

    /// Connection pool size
    pub database_max_connections: u32,

    /// Queue broker host
    pub queue_host: String,

    /// Queue broker port
    pub queue_port: u16,

    /// Consumer group shared by every instance
    pub queue_consumer_group: String,

    /// Consumer name of this instance
    pub queue_consumer_name: String,

    /// Administrator address for the daily report (optional)
    pub admin_email: Option<String>,

    /// Daily report time, UTC
    pub report_time: NaiveTime,

    /// HTTP mail relay; unset means reports are only logged
    pub mail_relay_url: Option<String>,

    /// Sender address on outgoing mail
    pub mail_from: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = ServiceConfig {
            database_path: var("DATABASE_PATH", "./tally.db"),

            database_max_connections: var("DATABASE_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string()))?,

            queue_host: var("QUEUE_HOST", "127.0.0.1"),

            queue_port: var("QUEUE_PORT", "6379")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("QUEUE_PORT".to_string()))?,

            queue_consumer_group: var("QUEUE_CONSUMER_GROUP", "tally-mailer"),

            queue_consumer_name: var("QUEUE_CONSUMER_NAME", "tally-service"),

            admin_email: optional("ADMIN_EMAIL"),

            report_time: NaiveTime::parse_from_str(&var("REPORT_TIME", "12:00"), "%H:%M")
                .map_err(|_| ConfigError::InvalidValue("REPORT_TIME".to_string()))?,

            mail_relay_url: optional("MAIL_RELAY_URL"),

            mail_from: var("MAIL_FROM", "reports@tally.local"),
        };

        if config.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
