//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Retention window must be between 1 and 365 days")]
    InvalidRetentionWindow,

    #[error("Retry attempts must be between 1 and 10")]
    InvalidRetryAttempts,

    #[error("Attempt timeout must be between 1 and 300 seconds")]
    InvalidAttemptTimeout,

    #[error("Unknown backoff kind (expected 'linear' or 'exponential')")]
    InvalidBackoffKind,

    #[error("Gateway base URL must start with http:// or https://")]
    InvalidGatewayUrl,
}
