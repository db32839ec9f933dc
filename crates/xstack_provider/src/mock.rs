//! Mock provider for testing.
//!
//! Provides a configurable in-memory implementation of [`ProviderSession`]
//! and [`ClientFactory`] so that lookups can be exercised without reaching a
//! real provider API.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::arn::ArnParts;
use crate::error::{ProviderError, ProviderResult};
use crate::session::{ClientFactory, ProviderContext, ProviderSession, TagFilter};

/// A resource known to the mock provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockResource {
    pub arn: String,
    /// Tagging API resource type, for example `dynamodb:table`.
    pub resource_type: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Raw response returned by describe calls for this resource.
    #[serde(default)]
    pub record: Value,
}

impl MockResource {
    pub fn new(arn: impl Into<String>, resource_type: impl Into<String>, record: Value) -> Self {
        Self {
            arn: arn.into(),
            resource_type: resource_type.into(),
            tags: BTreeMap::new(),
            record,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Whether `identifier` designates this resource, by ARN or resource id.
    fn is_identified_by(&self, identifier: &str) -> bool {
        if self.arn == identifier {
            return true;
        }
        ArnParts::parse(&self.arn).map_or(false, |parts| parts.resource_id == identifier)
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedCall {
    pub method: String,
    pub target: String,
    pub filters: Vec<TagFilter>,
}

/// Mock provider.
///
/// Clones share state, so a test can keep a handle to inspect calls after
/// handing the provider to the lookup engine.
#[derive(Clone, Default)]
pub struct MockProvider {
    resources: Arc<RwLock<Vec<MockResource>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    contexts: Arc<RwLock<Vec<ProviderContext>>>,
    /// Simulated transient failure for every call.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource.
    pub fn add_resource(self, resource: MockResource) -> Self {
        self.resources.write().push(resource);
        self
    }

    pub fn with_resources(self, resources: Vec<MockResource>) -> Self {
        *self.resources.write() = resources;
        self
    }

    /// Make every call fail with a transient error.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls.read().iter().any(|c| c.method == method)
    }

    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Scopes sessions were opened for.
    pub fn get_contexts(&self) -> Vec<ProviderContext> {
        self.contexts.read().clone()
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn check_failure(&self) -> ProviderResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(ProviderError::Transient(msg));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderSession for MockProvider {
    async fn describe(&self, api: &str, identifier: &str) -> ProviderResult<Value> {
        self.record_call(CapturedCall {
            method: api.to_string(),
            target: identifier.to_string(),
            filters: Vec::new(),
        });
        self.check_failure()?;

        self.resources
            .read()
            .iter()
            .find(|r| r.is_identified_by(identifier))
            .map(|r| r.record.clone())
            .ok_or_else(|| ProviderError::not_found(identifier))
    }

    async fn search_by_tag(&self, resource_type: &str, filters: &[TagFilter]) -> ProviderResult<Vec<String>> {
        self.record_call(CapturedCall {
            method: "search_by_tag".to_string(),
            target: resource_type.to_string(),
            filters: filters.to_vec(),
        });
        self.check_failure()?;

        let arns: Vec<String> = self
            .resources
            .read()
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .filter(|r| filters.iter().all(|f| f.matches(&r.tags)))
            .map(|r| r.arn.clone())
            .collect();
        debug!("Mock tag search on {} matched {} resource(s)", resource_type, arns.len());
        Ok(arns)
    }
}

impl ClientFactory for MockProvider {
    fn session(&self, context: &ProviderContext) -> ProviderResult<Arc<dyn ProviderSession>> {
        self.contexts.write().push(context.clone());
        Ok(Arc::new(self.clone()))
    }
}
