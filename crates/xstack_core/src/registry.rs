//! Family registry.

use std::sync::Arc;

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::family::FamilyDescriptor;

/// Registered families, kept in registration order so that runs are
/// deterministic.
#[derive(Default)]
pub struct FamilyRegistry {
    families: Vec<Arc<FamilyDescriptor>>,
}

impl FamilyRegistry {
    pub fn new() -> Self {
        Self { families: Vec::new() }
    }

    /// Register a family. A family with the same key is replaced in place.
    pub fn register(&mut self, family: FamilyDescriptor) {
        debug!("Registering family: {}", family.key);
        let family = Arc::new(family);
        match self.families.iter_mut().find(|f| f.key == family.key) {
            Some(existing) => *existing = family,
            None => self.families.push(family),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<FamilyDescriptor>> {
        self.families.iter().find(|f| f.key == key).cloned()
    }

    /// Get a family by key, returning an error if not found.
    pub fn get_required(&self, key: &str) -> CoreResult<Arc<FamilyDescriptor>> {
        self.get(key).ok_or_else(|| CoreError::UnknownFamily(key.to_string()))
    }

    /// Find the family owning a document section.
    pub fn by_section(&self, section: &str) -> Option<Arc<FamilyDescriptor>> {
        self.families.iter().find(|f| f.section == section).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.families.iter().any(|f| f.key == key)
    }

    pub fn names(&self) -> Vec<&str> {
        self.families.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<FamilyDescriptor>> {
        self.families.iter()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl std::fmt::Debug for FamilyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyRegistry")
            .field("families", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use crate::family::TemplateBuilder;
    use crate::outputs::OutputBinding;
    use crate::resource::{CfnConstruct, ResolvedResource, StackRef};
    use xstack_cfn::Template;

    struct NoopBuilder;

    impl TemplateBuilder for NoopBuilder {
        fn build(
            &self,
            _template: &mut Template,
            _resources: &mut [ResolvedResource],
            _context: &RunContext,
            _stack: &StackRef,
        ) -> CoreResult<()> {
            Ok(())
        }
    }

    fn no_outputs(_resource: &ResolvedResource, _construct: &CfnConstruct) -> Vec<OutputBinding> {
        Vec::new()
    }

    fn family(key: &str) -> FamilyDescriptor {
        FamilyDescriptor::new(key, "AWS::Test::Thing", Arc::new(NoopBuilder), no_outputs)
    }

    #[test]
    fn test_registry_register() {
        let mut registry = FamilyRegistry::new();
        assert!(registry.is_empty());

        registry.register(family("queues"));
        registry.register(family("tables"));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("queues"));
        assert_eq!(registry.names(), vec!["queues", "tables"]);
    }

    #[test]
    fn test_registry_replaces_same_key() {
        let mut registry = FamilyRegistry::new();
        registry.register(family("tables"));
        registry.register(family("tables").with_description("replaced"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("tables").unwrap().description, "replaced");
    }

    #[test]
    fn test_registry_get_required() {
        let mut registry = FamilyRegistry::new();
        registry.register(family("tables"));

        assert!(registry.get_required("tables").is_ok());
        assert!(matches!(
            registry.get_required("queues"),
            Err(CoreError::UnknownFamily(_))
        ));
        assert_eq!(registry.by_section("x-tables").unwrap().key, "tables");
    }
}
