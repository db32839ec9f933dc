//! Lifecycle classification of declared resources.

use serde_json::Value;
use tracing::{debug, info};

use crate::context::RunContext;
use crate::declaration::{LookupSpec, ResourceDeclaration, UseSpec, LOOKUP_KEY, USE_KEY};
use crate::diagnostics::DiagnosticKind;
use crate::error::{CoreError, CoreResult};
use crate::family::FamilyDescriptor;
use crate::naming::validate_resource_title;
use crate::resource::{Lifecycle, ResolvedResource, ResourceKind};

/// The declarations of one family split by lifecycle.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedResources {
    pub new: Vec<ResolvedResource>,
    pub lookup: Vec<ResolvedResource>,
    pub use_: Vec<ResolvedResource>,
}

impl ClassifiedResources {
    pub fn len(&self) -> usize {
        self.new.len() + self.lookup.len() + self.use_.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket(&self, lifecycle: Lifecycle) -> &[ResolvedResource] {
        match lifecycle {
            Lifecycle::New => &self.new,
            Lifecycle::Lookup => &self.lookup,
            Lifecycle::Use => &self.use_,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedResource> {
        self.new.iter().chain(self.lookup.iter()).chain(self.use_.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ResolvedResource> {
        self.new
            .iter_mut()
            .chain(self.lookup.iter_mut())
            .chain(self.use_.iter_mut())
    }

    /// Find a resource of any lifecycle by declared name.
    pub fn find(&self, name: &str) -> Option<&ResolvedResource> {
        self.iter().find(|r| r.name() == name)
    }
}

/// Classify the declarations of one family into NEW, LOOKUP and USE.
///
/// Every name is validated before any declaration is classified. A USE
/// declaration on a family without USE support is reported to the
/// diagnostics sink and dropped.
pub fn resolve_resources(
    declarations: &[ResourceDeclaration],
    family: &FamilyDescriptor,
    context: &mut RunContext,
) -> CoreResult<ClassifiedResources> {
    for declaration in declarations {
        validate_resource_title(&declaration.name, &family.key)?;
    }

    let mut classified = ClassifiedResources::default();
    for declaration in declarations {
        match (&declaration.lookup, &declaration.use_spec) {
            (Some(_), Some(_)) => {
                return Err(CoreError::validation(
                    &family.key,
                    &declaration.name,
                    format!("{} and {} are mutually exclusive", LOOKUP_KEY, USE_KEY),
                ))
            }
            (Some(lookup), None) => {
                let spec = parse_lookup(lookup, declaration, family)?;
                debug!("{}.{} - classified as LOOKUP", family.key, declaration.name);
                classified.lookup.push(ResolvedResource::new(
                    declaration,
                    ResourceKind::Lookup { spec, mapping: None },
                ));
            }
            (None, Some(use_spec)) => {
                if !family.supports_use {
                    context.diagnostics.warn(
                        DiagnosticKind::UnsupportedLifecycle,
                        &family.key,
                        Some(declaration.name.as_str()),
                        format!("{} is not supported for this family, declaration ignored", USE_KEY),
                    );
                    continue;
                }
                let reference = parse_use(use_spec, declaration, family)?;
                debug!("{}.{} - classified as USE", family.key, declaration.name);
                classified
                    .use_
                    .push(ResolvedResource::new(declaration, ResourceKind::Use { reference }));
            }
            (None, None) => {
                debug!("{}.{} - classified as NEW", family.key, declaration.name);
                classified
                    .new
                    .push(ResolvedResource::new(declaration, ResourceKind::New { construct: None }));
            }
        }
    }

    info!(
        "{} - {} new, {} lookup, {} use",
        family.key,
        classified.new.len(),
        classified.lookup.len(),
        classified.use_.len()
    );
    Ok(classified)
}

fn parse_lookup(
    value: &Value,
    declaration: &ResourceDeclaration,
    family: &FamilyDescriptor,
) -> CoreResult<LookupSpec> {
    let invalid = |message: String| CoreError::validation(&family.key, &declaration.name, message);

    if family.lookup.is_none() {
        return Err(invalid(format!("{} is not supported for this family", LOOKUP_KEY)));
    }
    let spec: LookupSpec = serde_json::from_value(value.clone())
        .map_err(|e| invalid(format!("invalid {} definition: {}", LOOKUP_KEY, e)))?;
    if spec.target.tags.is_empty() && spec.target.identifier.is_none() {
        return Err(invalid(format!("{} requires Tags or Arn", LOOKUP_KEY)));
    }
    if let Some(secret) = &spec.secret {
        if family.secondary.is_none() {
            return Err(invalid("this family has no secondary resource to look up".to_string()));
        }
        if secret.tags.is_empty() && secret.identifier.is_none() {
            return Err(invalid("secret lookup requires Tags or Arn".to_string()));
        }
    }
    Ok(spec)
}

fn parse_use(value: &Value, declaration: &ResourceDeclaration, family: &FamilyDescriptor) -> CoreResult<String> {
    let spec: UseSpec = serde_json::from_value(value.clone()).map_err(|e| {
        CoreError::validation(
            &family.key,
            &declaration.name,
            format!("invalid {} definition: {}", USE_KEY, e),
        )
    })?;
    Ok(spec.identifier().to_string())
}
