//! Output bindings of NEW resources.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use xstack_cfn::intrinsic::{get_att, reference, sub};
use xstack_cfn::{exported_output, Template};

use crate::error::CoreResult;

/// How a binding's value is expressed in the emitted template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `Ref` to the construct.
    Ref,
    /// `Fn::GetAtt` of the named attribute.
    GetAtt(String),
    /// `Fn::Sub` of the given string template.
    Sub(String),
}

/// One exported attribute of a NEW resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBinding {
    /// Semantic field, e.g. `name`, `arn`, `port`.
    pub field: String,
    /// Title of the template output.
    pub output_name: String,
    /// Logical id of the construct the value is read from.
    pub construct: String,
    pub kind: ReferenceKind,
}

impl OutputBinding {
    pub fn reference(field: impl Into<String>, output_name: impl Into<String>, construct: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            output_name: output_name.into(),
            construct: construct.into(),
            kind: ReferenceKind::Ref,
        }
    }

    pub fn attribute(
        field: impl Into<String>,
        output_name: impl Into<String>,
        construct: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            output_name: output_name.into(),
            construct: construct.into(),
            kind: ReferenceKind::GetAtt(attribute.into()),
        }
    }

    pub fn substitution(
        field: impl Into<String>,
        output_name: impl Into<String>,
        construct: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            output_name: output_name.into(),
            construct: construct.into(),
            kind: ReferenceKind::Sub(template.into()),
        }
    }

    /// Template expression producing the bound value.
    pub fn value(&self) -> Value {
        match &self.kind {
            ReferenceKind::Ref => reference(&self.construct),
            ReferenceKind::GetAtt(attribute) => get_att(&self.construct, attribute),
            ReferenceKind::Sub(template) => sub(template.clone()),
        }
    }
}

/// Output bindings of one resource, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputRegistry {
    bindings: BTreeMap<String, OutputBinding>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding, replacing any earlier binding of the same field.
    pub fn register(&mut self, binding: OutputBinding) {
        debug!("Registering output {} as {}", binding.field, binding.output_name);
        self.bindings.insert(binding.field.clone(), binding);
    }

    pub fn get(&self, field: &str) -> Option<&OutputBinding> {
        self.bindings.get(field)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputBinding> {
        self.bindings.values()
    }

    /// Add every binding to the template's `Outputs`, exported.
    pub fn render(&self, template: &mut Template) -> CoreResult<()> {
        for binding in self.bindings.values() {
            template.set_output(
                binding.output_name.clone(),
                exported_output(&binding.output_name, binding.value()),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use xstack_cfn::build_template;

    #[test]
    fn test_binding_values() {
        assert_eq!(
            OutputBinding::reference("name", "orders", "orders").value(),
            json!({ "Ref": "orders" })
        );
        assert_eq!(
            OutputBinding::attribute("arn", "ordersArn", "orders", "Arn").value(),
            json!({ "Fn::GetAtt": ["orders", "Arn"] })
        );
        assert_eq!(
            OutputBinding::substitution("arn", "docsArn", "docs", "arn:${AWS::Partition}:rds:${docs}").value(),
            json!({ "Fn::Sub": "arn:${AWS::Partition}:rds:${docs}" })
        );
    }

    #[test]
    fn test_register_overwrites_same_field() {
        let mut registry = OutputRegistry::new();
        registry.register(OutputBinding::reference("name", "orders", "orders"));
        registry.register(OutputBinding::reference("name", "ordersName", "orders"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("name").unwrap().output_name, "ordersName");
    }

    #[test]
    fn test_render_exports_outputs() {
        let mut template = build_template(None, vec![]);
        let mut registry = OutputRegistry::new();
        registry.register(OutputBinding::reference("name", "orders", "orders"));
        registry.register(OutputBinding::attribute("arn", "ordersArn", "orders", "Arn"));

        registry.render(&mut template).unwrap();

        let value = template.to_value().unwrap();
        assert_eq!(value["Outputs"]["orders"]["Value"], json!({ "Ref": "orders" }));
        assert!(value["Outputs"]["ordersArn"]["Export"]["Fn::If"].is_array());
    }
}
