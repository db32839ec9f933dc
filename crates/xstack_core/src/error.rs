//! Error types for the resolution engine.

use thiserror::Error;

use xstack_cfn::CfnError;
use xstack_provider::ProviderError;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while resolving resources and composing stacks.
///
/// None of these are recovered from inside the engine: they propagate to
/// the run driver, which aborts the run.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed resource name, conflicting `Lookup`/`Use` hints or an
    /// unusable `Lookup` block.
    #[error("{family}.{name} - {message}")]
    Validation {
        family: String,
        name: String,
        message: String,
    },

    #[error("{family}.{name} - lookup matched {count} resource(s), exactly one is required")]
    LookupAmbiguity {
        family: String,
        name: String,
        count: usize,
    },

    #[error("{family}.{name} - resource {identifier} not found")]
    ResourceNotFound {
        family: String,
        name: String,
        identifier: String,
    },

    #[error("Missing mandatory attribute '{field}' at path '{path}'")]
    MissingAttribute { field: String, path: String },

    #[error("{family}.{name} - no lookup mapping registered")]
    MissingMapping { family: String, name: String },

    #[error("Unknown resource family: {0}")]
    UnknownFamily(String),

    #[error("{family}.{name} - template builder did not honour its contract: {message}")]
    BuilderContract {
        family: String,
        name: String,
        message: String,
    },

    #[error("Invalid stack tree: {0}")]
    InvalidStack(String),

    #[error("Invalid compose document: {0}")]
    InvalidDocument(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Template error: {0}")]
    Template(#[from] CfnError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn validation(family: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            family: family.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn builder_contract(family: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BuilderContract {
            family: family.into(),
            name: name.into(),
            message: message.into(),
        }
    }
}
