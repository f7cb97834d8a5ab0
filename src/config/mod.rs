//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `PROPOSAL_DESK` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use proposal_desk::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Retention: {} days", config.notifications.expired_retention_days);
//! ```

mod database;
mod error;
mod gateway;
mod notifications;
mod retry;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use notifications::NotificationsConfig;
pub use retry::RetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the proposal workflow core.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Notification subsystem configuration (retention window)
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Submission retry driver configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Submission gateway client configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PROPOSAL_DESK` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PROPOSAL_DESK__DATABASE__URL=...` -> `database.url = ...`
    /// - `PROPOSAL_DESK__RETRY__MAX_ATTEMPTS=5` -> `retry.max_attempts = 5`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PROPOSAL_DESK")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.notifications.validate()?;
        self.retry.validate()?;
        // the gateway section is only needed by client deployments
        if !self.gateway.base_url.is_empty() {
            self.gateway.validate()?;
        }
        Ok(())
    }
}
