//! Server configuration
//!
//! Values come from `PASSPORT_*` environment variables layered over
//! built-in defaults. Database settings are read separately by
//! [`common::database::DatabaseConfig`].

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

/// Which record store backend to open at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (`PASSPORT_HOST`, default 0.0.0.0)
    pub host: String,
    /// Port to bind (`PASSPORT_PORT`, default 6000)
    pub port: u16,
    /// Budget for each request's store calls (`PASSPORT_REQUEST_TIMEOUT_SECS`, default 10)
    pub request_timeout_secs: u64,
    /// Store backend (`PASSPORT_STORE_BACKEND`, `postgres` or `memory`)
    pub store_backend: StoreBackend,
}

impl ServerConfig {
    /// Load the configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 6000)?
            .set_default("request_timeout_secs", 10)?
            .set_default("store_backend", "postgres")?
            .add_source(Environment::with_prefix("PASSPORT").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// `host:port` to bind the listener on
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
