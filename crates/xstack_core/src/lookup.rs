//! Lookup engine.
//!
//! Resolves LOOKUP resources against the provider:
//!
//! 1. find the resource ARN, either given directly and matching the family's
//!    ARN pattern, or through a tag search that must match exactly one ARN
//! 2. describe the resource and project the response through the family's
//!    attribute mapping
//! 3. resolve the secondary resource the same way when one is requested
//! 4. store the mapping in the run-wide mapping table
//!
//! Calls are made one at a time and failures are never retried.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use xstack_provider::{ArnParts, ClientFactory, ProviderContext, ProviderError};

use crate::context::RunContext;
use crate::declaration::LookupTarget;
use crate::error::{CoreError, CoreResult};
use crate::family::{FamilyDescriptor, LookupDescriptor};
use crate::mapper::LookupMapping;
use crate::resource::ResolvedResource;

pub struct LookupEngine {
    factory: Arc<dyn ClientFactory>,
}

impl LookupEngine {
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self { factory }
    }

    /// Resolve every LOOKUP resource of a family and commit the results.
    ///
    /// Nothing is written to the mapping table unless every resource of the
    /// family resolves.
    pub async fn run_lookup(
        &self,
        family: &FamilyDescriptor,
        resources: &mut [ResolvedResource],
        context: &mut RunContext,
    ) -> CoreResult<()> {
        let mut staged = Vec::with_capacity(resources.len());
        for resource in resources.iter() {
            staged.push(self.resolve(family, resource, context).await?);
        }

        for (resource, mapping) in resources.iter_mut().zip(staged) {
            context
                .mappings
                .insert(&family.mappings_key, resource.logical_name(), mapping.clone());
            resource.set_mappings(mapping)?;
        }
        Ok(())
    }

    /// Resolve one LOOKUP resource without recording anything.
    pub async fn resolve(
        &self,
        family: &FamilyDescriptor,
        resource: &ResolvedResource,
        context: &RunContext,
    ) -> CoreResult<LookupMapping> {
        let invalid = |message: &str| CoreError::validation(&family.key, resource.name(), message);

        let descriptor = family
            .lookup
            .as_ref()
            .ok_or_else(|| invalid("lookup is not supported for this family"))?;
        let spec = resource
            .lookup_spec()
            .ok_or_else(|| invalid("resource is not declared for lookup"))?;
        let role_arn = spec.role_arn.as_deref();

        let mut mapping = self
            .fetch(family, descriptor, resource, &spec.target, role_arn, context)
            .await?;

        if let Some(secret) = &spec.secret {
            let secondary = family
                .secondary
                .as_ref()
                .ok_or_else(|| invalid("this family has no secondary resource to look up"))?;
            let secret_mapping = self
                .fetch(family, secondary, resource, secret, role_arn, context)
                .await?;
            mapping.extend(secret_mapping);
        }
        Ok(mapping)
    }

    async fn fetch(
        &self,
        family: &FamilyDescriptor,
        descriptor: &LookupDescriptor,
        resource: &ResolvedResource,
        target: &LookupTarget,
        role_arn: Option<&str>,
        context: &RunContext,
    ) -> CoreResult<LookupMapping> {
        let arn = self
            .resolve_identifier(family, descriptor, resource, target, role_arn, context)
            .await?;
        info!("{}.{} - Matched to {}", family.key, resource.name(), arn.arn);

        let session = self
            .factory
            .session(&provider_context(family, Some(&arn), role_arn, context))?;
        let not_found = || CoreError::ResourceNotFound {
            family: family.key.clone(),
            name: resource.name().to_string(),
            identifier: arn.arn.clone(),
        };
        let record = match descriptor.describer.describe(session.as_ref(), &arn).await {
            Ok(Some(record)) => record,
            Ok(None) | Err(ProviderError::NotFound { .. }) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        let mut mapping = descriptor
            .attribute_mapping
            .project(&record)
            .inspect_err(|e| warn!("{}.{} - {} in {}", family.key, resource.name(), e, arn.arn))?;
        mapping.insert_missing(descriptor.arn_field.clone(), Value::String(arn.arn.clone()));
        debug!(
            "{}.{} - Resolved {} attribute(s) from {}",
            family.key,
            resource.name(),
            mapping.len(),
            descriptor.tagging_api_id
        );
        Ok(mapping)
    }

    async fn resolve_identifier(
        &self,
        family: &FamilyDescriptor,
        descriptor: &LookupDescriptor,
        resource: &ResolvedResource,
        target: &LookupTarget,
        role_arn: Option<&str>,
        context: &RunContext,
    ) -> CoreResult<ArnParts> {
        if let Some(identifier) = &target.identifier {
            if let Some(parts) = descriptor.arn_pattern.matches(identifier) {
                return Ok(parts);
            }
            if target.tags.is_empty() {
                return Err(CoreError::validation(
                    &family.key,
                    resource.name(),
                    format!("{} is not a valid {} ARN", identifier, descriptor.tagging_api_id),
                ));
            }
            warn!(
                "{}.{} - {} is not a valid {} ARN, searching by tags",
                family.key,
                resource.name(),
                identifier,
                descriptor.tagging_api_id
            );
        }

        let filters = target.tag_filters();
        debug!(
            "{}.{} - Searching {} with {} tag filter(s)",
            family.key,
            resource.name(),
            descriptor.tagging_api_id,
            filters.len()
        );
        let session = self
            .factory
            .session(&provider_context(family, None, role_arn, context))?;
        let candidates = session
            .search_by_tag(&descriptor.tagging_api_id, &filters)
            .await?;

        let mut matched: Vec<ArnParts> = candidates
            .iter()
            .filter_map(|arn| descriptor.arn_pattern.matches(arn))
            .collect();
        let count = matched.len();
        match (matched.pop(), count) {
            (Some(parts), 1) => Ok(parts),
            _ => Err(CoreError::LookupAmbiguity {
                family: family.key.clone(),
                name: resource.name().to_string(),
                count,
            }),
        }
    }
}

/// Session scope: a known ARN pins region and account, otherwise the run
/// settings apply.
fn provider_context(
    family: &FamilyDescriptor,
    arn: Option<&ArnParts>,
    role_arn: Option<&str>,
    context: &RunContext,
) -> ProviderContext {
    let region = arn
        .map(|a| a.region.as_str())
        .filter(|r| !r.is_empty())
        .unwrap_or(context.settings.region.as_str());
    let mut scope = ProviderContext::new(&family.key, region);

    let account = arn
        .map(|a| a.account_id.as_str())
        .filter(|a| !a.is_empty())
        .or(context.settings.account_id.as_deref());
    if let Some(account) = account {
        scope = scope.with_account(account);
    }
    if let Some(role_arn) = role_arn {
        scope = scope.with_role(role_arn);
    }
    scope
}
