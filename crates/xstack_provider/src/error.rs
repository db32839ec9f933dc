//! Error types for provider calls.

use thiserror::Error;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised by provider sessions.
///
/// Only [`ProviderError::NotFound`] carries a meaning the lookup engine acts
/// on; every other variant is surfaced to the caller as is.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Resource not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Transient provider error: {0}")]
    Transient(String),

    #[error("Provider API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected response from {api}: {message}")]
    UnexpectedResponse { api: String, message: String },

    #[error("Invalid ARN pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ProviderError {
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    pub fn unexpected(api: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            api: api.into(),
            message: message.into(),
        }
    }
}
