//! Error types for template construction.

use thiserror::Error;

/// Result type alias for template operations.
pub type CfnResult<T> = Result<T, CfnError>;

/// Errors that can occur while building templates.
#[derive(Error, Debug)]
pub enum CfnError {
    #[error("Invalid logical id '{0}': only alphanumeric characters are allowed")]
    InvalidTitle(String),

    #[error("Duplicate resource '{title}' in template")]
    DuplicateResource { title: String },

    #[error("Unknown condition '{0}'")]
    UnknownCondition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
