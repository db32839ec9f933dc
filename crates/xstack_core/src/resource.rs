//! Resolved resources and their lifecycle.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::declaration::{LookupSpec, ResourceDeclaration, PROPERTIES_KEY, SETTINGS_KEY};
use crate::error::{CoreError, CoreResult};
use crate::mapper::LookupMapping;
use crate::naming::logical_name;
use crate::outputs::OutputRegistry;

/// How a declared resource comes to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Created by the emitted template.
    New,
    /// Discovered through the provider and referenced by its attributes.
    Lookup,
    /// Externally supplied identifier taken as is.
    Use,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::New => write!(f, "NEW"),
            Lifecycle::Lookup => write!(f, "LOOKUP"),
            Lifecycle::Use => write!(f, "USE"),
        }
    }
}

/// Back-reference from a resource to the stack that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackRef {
    pub title: String,
}

impl StackRef {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

/// Template construct created for a NEW resource.
///
/// `title` is the logical id of the main resource. Companion constructs
/// (a generated secret, a security group, ...) are keyed by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfnConstruct {
    pub title: String,
    pub resource_type: String,
    pub companions: BTreeMap<String, String>,
}

impl CfnConstruct {
    pub fn new(title: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            resource_type: resource_type.into(),
            companions: BTreeMap::new(),
        }
    }

    pub fn with_companion(mut self, role: impl Into<String>, title: impl Into<String>) -> Self {
        self.companions.insert(role.into(), title.into());
        self
    }

    pub fn companion(&self, role: &str) -> Option<&str> {
        self.companions.get(role).map(|s| s.as_str())
    }
}

/// Lifecycle-specific state. Exactly one of construct, mapping or reference
/// is carried, matching the lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceKind {
    New { construct: Option<CfnConstruct> },
    Lookup { spec: LookupSpec, mapping: Option<LookupMapping> },
    Use { reference: String },
}

impl ResourceKind {
    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            ResourceKind::New { .. } => Lifecycle::New,
            ResourceKind::Lookup { .. } => Lifecycle::Lookup,
            ResourceKind::Use { .. } => Lifecycle::Use,
        }
    }
}

/// Runtime view of one declaration for the duration of a run.
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    name: String,
    logical_name: String,
    family: String,
    definition: Value,
    kind: ResourceKind,
    stack: Option<StackRef>,
    outputs: OutputRegistry,
}

impl ResolvedResource {
    pub fn new(declaration: &ResourceDeclaration, kind: ResourceKind) -> Self {
        Self {
            name: declaration.name.clone(),
            logical_name: logical_name(&declaration.name),
            family: declaration.module_name.clone(),
            definition: declaration.definition.clone(),
            kind,
            stack: None,
            outputs: OutputRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn definition(&self) -> &Value {
        &self.definition
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.kind.lifecycle()
    }

    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.definition.get(PROPERTIES_KEY).and_then(Value::as_object)
    }

    pub fn settings(&self) -> Option<&Map<String, Value>> {
        self.definition.get(SETTINGS_KEY).and_then(Value::as_object)
    }

    pub fn cfn_resource(&self) -> Option<&CfnConstruct> {
        match &self.kind {
            ResourceKind::New { construct } => construct.as_ref(),
            _ => None,
        }
    }

    /// Record the construct a template builder created for this resource.
    pub fn set_cfn_resource(&mut self, construct: CfnConstruct) -> CoreResult<()> {
        match &mut self.kind {
            ResourceKind::New { construct: slot } => {
                *slot = Some(construct);
                Ok(())
            }
            other => Err(CoreError::builder_contract(
                &self.family,
                &self.name,
                format!("cannot attach a construct to a {} resource", other.lifecycle()),
            )),
        }
    }

    pub fn mappings(&self) -> Option<&LookupMapping> {
        match &self.kind {
            ResourceKind::Lookup { mapping, .. } => mapping.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn set_mappings(&mut self, resolved: LookupMapping) -> CoreResult<()> {
        match &mut self.kind {
            ResourceKind::Lookup { mapping, .. } => {
                *mapping = Some(resolved);
                Ok(())
            }
            other => Err(CoreError::validation(
                &self.family,
                &self.name,
                format!("cannot store lookup attributes on a {} resource", other.lifecycle()),
            )),
        }
    }

    pub fn lookup_spec(&self) -> Option<&LookupSpec> {
        match &self.kind {
            ResourceKind::Lookup { spec, .. } => Some(spec),
            _ => None,
        }
    }

    pub fn use_reference(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::Use { reference } => Some(reference),
            _ => None,
        }
    }

    pub fn stack(&self) -> Option<&StackRef> {
        self.stack.as_ref()
    }

    pub fn set_stack(&mut self, stack: StackRef) {
        self.stack = Some(stack);
    }

    pub fn outputs(&self) -> &OutputRegistry {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut OutputRegistry {
        &mut self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declaration() -> ResourceDeclaration {
        ResourceDeclaration::new(
            "orders",
            "dynamodb",
            json!({ "Properties": { "BillingMode": "PAY_PER_REQUEST" }, "Settings": { "Ttl": 3 } }),
        )
    }

    #[test]
    fn test_new_resource_accepts_construct() {
        let mut resource = ResolvedResource::new(&declaration(), ResourceKind::New { construct: None });
        assert_eq!(resource.lifecycle(), Lifecycle::New);
        assert!(resource.cfn_resource().is_none());

        resource
            .set_cfn_resource(CfnConstruct::new("orders", "AWS::DynamoDB::Table"))
            .unwrap();

        assert_eq!(resource.cfn_resource().unwrap().title, "orders");
        assert!(resource.mappings().is_none());
        assert!(resource.use_reference().is_none());
        assert_eq!(resource.properties().unwrap()["BillingMode"], "PAY_PER_REQUEST");
        assert_eq!(resource.settings().unwrap()["Ttl"], 3);
    }

    #[test]
    fn test_use_resource_rejects_construct() {
        let mut resource = ResolvedResource::new(
            &declaration(),
            ResourceKind::Use {
                reference: "arn:aws:dynamodb:us-east-1:123456789012:table/orders".to_string(),
            },
        );

        let err = resource
            .set_cfn_resource(CfnConstruct::new("orders", "AWS::DynamoDB::Table"))
            .unwrap_err();
        assert!(matches!(err, CoreError::BuilderContract { .. }));
        assert!(resource.use_reference().is_some());
    }

    #[test]
    fn test_lookup_resource_holds_mapping() {
        let mut resource = ResolvedResource::new(
            &declaration(),
            ResourceKind::Lookup {
                spec: LookupSpec::default(),
                mapping: None,
            },
        );
        let mut mapping = LookupMapping::new();
        mapping.insert("TableName", json!("orders"));
        resource.set_mappings(mapping).unwrap();

        assert_eq!(resource.mappings().unwrap().get_str("TableName"), Some("orders"));
        assert!(resource.cfn_resource().is_none());
    }

    #[test]
    fn test_companions() {
        let construct = CfnConstruct::new("docs", "AWS::DocDB::DBCluster").with_companion("secret", "docsSecret");
        assert_eq!(construct.companion("secret"), Some("docsSecret"));
        assert_eq!(construct.companion("sg"), None);
    }
}
