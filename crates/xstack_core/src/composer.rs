//! Stack composer.
//!
//! Drives a run in a fixed order: classify the declarations of every family,
//! resolve every LOOKUP resource, build the templates of families with NEW
//! resources, then attach every family node to the root.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use xstack_cfn::build_template;
use xstack_provider::ClientFactory;

use crate::context::RunContext;
use crate::declaration::{ComposeDocument, ResourceDeclaration};
use crate::diagnostics::DiagnosticKind;
use crate::error::{CoreError, CoreResult};
use crate::family::FamilyDescriptor;
use crate::lookup::LookupEngine;
use crate::registry::FamilyRegistry;
use crate::resolver::{resolve_resources, ClassifiedResources};
use crate::resource::StackRef;
use crate::stack::StackNode;

/// A family's node together with its resolved resources.
#[derive(Debug)]
pub struct FamilyStack {
    pub node: StackNode,
    pub resources: ClassifiedResources,
}

/// Result of a full run.
#[derive(Debug)]
pub struct Composition {
    pub root: StackNode,
    /// Resolved resources keyed by family.
    pub resources: BTreeMap<String, ClassifiedResources>,
}

impl Composition {
    pub fn family(&self, key: &str) -> Option<&ClassifiedResources> {
        self.resources.get(key)
    }
}

pub struct StackComposer {
    registry: FamilyRegistry,
    lookup: LookupEngine,
}

impl StackComposer {
    pub fn new(registry: FamilyRegistry, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            registry,
            lookup: LookupEngine::new(factory),
        }
    }

    pub fn registry(&self) -> &FamilyRegistry {
        &self.registry
    }

    pub fn lookup_engine(&self) -> &LookupEngine {
        &self.lookup
    }

    /// Classify the declarations of every registered family present in the
    /// document. No provider call is made.
    pub fn classify(
        &self,
        document: &ComposeDocument,
        context: &mut RunContext,
    ) -> CoreResult<Vec<(Arc<FamilyDescriptor>, ClassifiedResources)>> {
        for section in document.family_sections() {
            if self.registry.by_section(section).is_none() {
                context.diagnostics.warn(
                    DiagnosticKind::UnknownSection,
                    section,
                    None,
                    "no registered family owns this section",
                );
            }
        }

        let mut families = Vec::new();
        for family in self.registry.iter() {
            if !document.has_section(&family.section) {
                continue;
            }
            let declarations = document.declarations(&family.section, &family.key)?;
            let classified = resolve_resources(&declarations, family, context)?;
            families.push((Arc::clone(family), classified));
        }
        Ok(families)
    }

    /// Compose a whole document under a root stack titled `title`.
    pub async fn compose(
        &self,
        title: &str,
        document: &ComposeDocument,
        context: &mut RunContext,
    ) -> CoreResult<Composition> {
        let mut families = self.classify(document, context)?;

        for (family, classified) in families.iter_mut() {
            if !classified.lookup.is_empty() {
                self.lookup
                    .run_lookup(family, &mut classified.lookup, context)
                    .await?;
            }
        }

        let mut children = Vec::with_capacity(families.len());
        for (family, classified) in families.iter_mut() {
            children.push(self.build_family(family, classified, context)?);
        }

        let mut root = StackNode::root(title, &context.settings);
        if let Some(template) = root.template_mut() {
            context.mappings.render_into(template);
        }
        for child in children {
            root.attach(child, &context.settings)?;
        }
        info!(
            "Composed {} with {} family stack(s), {} lookup mapping(s)",
            title,
            root.children().len(),
            context.mappings.len()
        );

        let resources = families
            .into_iter()
            .map(|(family, classified)| (family.key.clone(), classified))
            .collect();
        Ok(Composition { root, resources })
    }

    /// Run one family on its own: classify, look up, then build its node.
    ///
    /// Only mappings already in the context are visible to the family's
    /// template, so families referencing other families' lookups should be
    /// composed through [`StackComposer::compose`].
    pub async fn compose_family(
        &self,
        family_key: &str,
        declarations: &[ResourceDeclaration],
        context: &mut RunContext,
    ) -> CoreResult<FamilyStack> {
        let family = self.registry.get_required(family_key)?;
        let mut resources = resolve_resources(declarations, &family, context)?;
        if !resources.lookup.is_empty() {
            self.lookup
                .run_lookup(&family, &mut resources.lookup, context)
                .await?;
        }
        let node = self.build_family(&family, &mut resources, context)?;
        Ok(FamilyStack { node, resources })
    }

    fn build_family(
        &self,
        family: &FamilyDescriptor,
        resources: &mut ClassifiedResources,
        context: &RunContext,
    ) -> CoreResult<StackNode> {
        let node = if resources.new.is_empty() {
            debug!("{} - no NEW resource, stack is void", family.key);
            StackNode::void(&family.stack_title, &family.key)
        } else {
            let stack_ref = StackRef::new(&family.stack_title);
            let mut template = build_template(Some(&family.description), family.parameters.clone());
            context.mappings.render_into(&mut template);

            family
                .builder
                .build(&mut template, &mut resources.new, context, &stack_ref)?;

            for resource in resources.new.iter_mut() {
                let construct = resource.cfn_resource().cloned().ok_or_else(|| {
                    CoreError::builder_contract(&family.key, resource.name(), "no template construct was set")
                })?;
                if template.resource(&construct.title).is_none() {
                    return Err(CoreError::builder_contract(
                        &family.key,
                        resource.name(),
                        format!("construct {} is missing from the template", construct.title),
                    ));
                }
                for binding in (family.outputs)(resource, &construct) {
                    resource.outputs_mut().register(binding);
                }
                resource.outputs().render(&mut template)?;
            }
            info!(
                "{} - rendered {} NEW resource(s)",
                family.key,
                resources.new.len()
            );
            StackNode::with_template(&family.stack_title, &family.key, template)
        };

        let stack_ref = node.stack_ref();
        for resource in resources.iter_mut() {
            resource.set_stack(stack_ref.clone());
        }
        Ok(node)
    }
}
