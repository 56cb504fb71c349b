use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:18789";
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_WEBHOOK_SECRET: &str = "default-secret-change-in-production";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub gateway_url: String,
    pub gateway_timeout: Duration,
    pub wake_url: Option<String>,
    pub wake_password: Option<String>,
    pub webhook_secret: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            mongodb_uri: None,
            mongodb_database: "backoffice".to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_timeout: Duration::from_millis(DEFAULT_GATEWAY_TIMEOUT_MS),
            wake_url: None,
            wake_password: None,
            webhook_secret: DEFAULT_WEBHOOK_SECRET.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name: "PORT",
                value: v,
            })?,
            None => defaults.port,
        };

        let timeout_ms = match get("OPENCLAW_TIMEOUT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name: "OPENCLAW_TIMEOUT",
                value: v,
            })?,
            None => DEFAULT_GATEWAY_TIMEOUT_MS,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            mongodb_uri: get("MONGODB_URI"),
            mongodb_database: get("MONGODB_DATABASE").unwrap_or(defaults.mongodb_database),
            gateway_url: get("OPENCLAW_GATEWAY_URL").unwrap_or(defaults.gateway_url),
            gateway_timeout: Duration::from_millis(timeout_ms),
            wake_url: get("OPENCLAW_WEBHOOK_URL"),
            wake_password: get("OPENCLAW_WEBHOOK_PASSWORD"),
            webhook_secret: get("BACKOFFICE_WEBHOOK_SECRET").unwrap_or(defaults.webhook_secret),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_default_webhook_secret(&self) -> bool {
        self.webhook_secret == DEFAULT_WEBHOOK_SECRET
    }
}
