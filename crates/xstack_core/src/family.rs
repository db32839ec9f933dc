//! Resource family descriptors.
//!
//! A family is described by data plus a few strategy values instead of a
//! type hierarchy: how to find its resources through the provider, how to
//! build templates for NEW ones and which outputs they expose.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use xstack_cfn::{Parameter, Template};
use xstack_provider::{ArnParts, ArnPattern, ProviderResult, ProviderSession};

use crate::context::RunContext;
use crate::declaration::SECTION_PREFIX;
use crate::error::CoreResult;
use crate::mapper::AttributeMapping;
use crate::outputs::OutputBinding;
use crate::resource::{CfnConstruct, ResolvedResource, StackRef};

/// Fetches the live configuration of one resource.
///
/// Returns `Ok(None)` when the provider answers but the resource is absent.
#[async_trait]
pub trait Describer: Send + Sync {
    async fn describe(&self, session: &dyn ProviderSession, arn: &ArnParts) -> ProviderResult<Option<Value>>;
}

/// Populates a family template with the constructs of its NEW resources.
///
/// Implementations must call [`ResolvedResource::set_cfn_resource`] for every
/// resource they are given, and must add that construct to `template`.
pub trait TemplateBuilder: Send + Sync {
    fn build(
        &self,
        template: &mut Template,
        resources: &mut [ResolvedResource],
        context: &RunContext,
        stack: &StackRef,
    ) -> CoreResult<()>;
}

/// Declares the output bindings of a NEW resource once its construct exists.
pub type OutputsFn = fn(&ResolvedResource, &CfnConstruct) -> Vec<OutputBinding>;

/// How the provider is queried for one kind of resource.
#[derive(Clone)]
pub struct LookupDescriptor {
    /// Resource type filter of the tagging query, e.g. `dynamodb:table`.
    pub tagging_api_id: String,
    pub arn_pattern: ArnPattern,
    /// Mapping field that always receives the matched ARN.
    pub arn_field: String,
    pub attribute_mapping: AttributeMapping,
    pub describer: Arc<dyn Describer>,
}

impl LookupDescriptor {
    pub fn new(
        tagging_api_id: impl Into<String>,
        arn_pattern: ArnPattern,
        arn_field: impl Into<String>,
        attribute_mapping: AttributeMapping,
        describer: Arc<dyn Describer>,
    ) -> Self {
        Self {
            tagging_api_id: tagging_api_id.into(),
            arn_pattern,
            arn_field: arn_field.into(),
            attribute_mapping,
            describer,
        }
    }
}

impl fmt::Debug for LookupDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupDescriptor")
            .field("tagging_api_id", &self.tagging_api_id)
            .field("arn_pattern", &self.arn_pattern)
            .field("arn_field", &self.arn_field)
            .field("attribute_mapping", &self.attribute_mapping)
            .finish()
    }
}

/// Everything the engine needs to know about one family.
#[derive(Clone)]
pub struct FamilyDescriptor {
    /// Family identifier, also the declarations' `module_name`.
    pub key: String,
    /// Document section holding the declarations, e.g. `x-dynamodb`.
    pub section: String,
    /// Top-level key of the family in template `Mappings`.
    pub mappings_key: String,
    /// Title of the family sub-stack.
    pub stack_title: String,
    pub description: String,
    pub resource_type: String,
    pub supports_use: bool,
    pub lookup: Option<LookupDescriptor>,
    /// Associated resource resolved with the main one when requested.
    pub secondary: Option<LookupDescriptor>,
    pub builder: Arc<dyn TemplateBuilder>,
    pub outputs: OutputsFn,
    /// Parameters the family template declares besides the shared ones.
    pub parameters: Vec<Parameter>,
}

impl FamilyDescriptor {
    pub fn new(
        key: impl Into<String>,
        resource_type: impl Into<String>,
        builder: Arc<dyn TemplateBuilder>,
        outputs: OutputsFn,
    ) -> Self {
        let key = key.into();
        Self {
            section: format!("{}{}", SECTION_PREFIX, key),
            mappings_key: key.clone(),
            stack_title: key.clone(),
            description: format!("{} resources", key),
            resource_type: resource_type.into(),
            supports_use: false,
            lookup: None,
            secondary: None,
            builder,
            outputs,
            parameters: Vec::new(),
            key,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn with_stack_title(mut self, title: impl Into<String>) -> Self {
        self.stack_title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_use_support(mut self, supported: bool) -> Self {
        self.supports_use = supported;
        self
    }

    pub fn with_lookup(mut self, lookup: LookupDescriptor) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_secondary(mut self, secondary: LookupDescriptor) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

impl fmt::Debug for FamilyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyDescriptor")
            .field("key", &self.key)
            .field("section", &self.section)
            .field("resource_type", &self.resource_type)
            .field("supports_use", &self.supports_use)
            .field("lookup", &self.lookup)
            .field("secondary", &self.secondary)
            .finish()
    }
}
