//! Provider session and client factory contracts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProviderError, ProviderResult};

pub const DEFAULT_REGION: &str = "us-east-1";

/// Tag filter for the resource tagging query.
///
/// An empty `values` list matches any resource carrying the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Values", default)]
    pub values: Vec<String>,
}

impl TagFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: vec![value.into()],
        }
    }

    pub fn key_only(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: Vec::new(),
        }
    }

    /// Check the filter against a resource's tags.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        match tags.get(&self.key) {
            Some(value) => self.values.is_empty() || self.values.iter().any(|v| v == value),
            None => false,
        }
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.values.join("|"))
    }
}

/// Scope a session is opened for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderContext {
    /// Resource family the session serves.
    pub family: String,
    pub region: String,
    pub account_id: Option<String>,
    /// Role to assume, for resources living in another account.
    pub role_arn: Option<String>,
}

impl ProviderContext {
    pub fn new(family: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            region: region.into(),
            account_id: None,
            role_arn: None,
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_role(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }
}

/// Live connection to the provider API.
///
/// Calls are made one at a time by the lookup engine; implementations do not
/// need to support concurrent use beyond `Send + Sync`.
#[async_trait]
pub trait ProviderSession: Send + Sync {
    /// Call a describe-style API for one resource and return the raw response.
    ///
    /// `api` names the call (for example `dynamodb:DescribeTable`).
    /// A missing resource must be reported as [`ProviderError::NotFound`].
    async fn describe(&self, api: &str, identifier: &str) -> ProviderResult<Value>;

    /// Query the resource tagging API for ARNs of `resource_type` matching
    /// every filter.
    async fn search_by_tag(&self, resource_type: &str, filters: &[TagFilter]) -> ProviderResult<Vec<String>>;
}

/// Opens provider sessions for a given scope.
pub trait ClientFactory: Send + Sync {
    fn session(&self, context: &ProviderContext) -> ProviderResult<Arc<dyn ProviderSession>>;
}

/// Factory used when no provider access is configured.
///
/// Every call fails with [`ProviderError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct OfflineFactory;

struct OfflineSession {
    family: String,
}

#[async_trait]
impl ProviderSession for OfflineSession {
    async fn describe(&self, api: &str, identifier: &str) -> ProviderResult<Value> {
        Err(ProviderError::Unavailable(format!(
            "{} - cannot call {} for {} without provider access",
            self.family, api, identifier
        )))
    }

    async fn search_by_tag(&self, resource_type: &str, _filters: &[TagFilter]) -> ProviderResult<Vec<String>> {
        Err(ProviderError::Unavailable(format!(
            "{} - cannot search {} without provider access",
            self.family, resource_type
        )))
    }
}

impl ClientFactory for OfflineFactory {
    fn session(&self, context: &ProviderContext) -> ProviderResult<Arc<dyn ProviderSession>> {
        Ok(Arc::new(OfflineSession {
            family: context.family.clone(),
        }))
    }
}
