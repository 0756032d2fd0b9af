//! Listener configuration shared by the HTTP services
//!
//! Values come from built-in defaults overridden by environment variables
//! carrying a per-service prefix, e.g. `AUTH_PORT=4000` or
//! `API_ENVIRONMENT=production`.

use crate::error::ConfigError;
use config::{Config, Environment};
use serde::Deserialize;

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deployment environment name; `production` enables secure cookies
    pub environment: String,
}

impl ServerConfig {
    /// Load settings for the service identified by `prefix`
    pub fn load(prefix: &str, default_port: u16) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .set_default("environment", "development")?
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        if config.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "host",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Socket address string for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
