//! Template model.
//!
//! A [`Template`] is the body of one stack in the emitted tree. Sections are
//! kept in `BTreeMap`s so that rendering is deterministic for a given input.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{CfnError, CfnResult};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
pub const DEFAULT_DESCRIPTION: &str = "Template generated by xstack";

/// Check that a logical id only holds alphanumeric characters.
pub fn validate_title(title: &str) -> CfnResult<()> {
    if title.is_empty() || !title.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CfnError::InvalidTitle(title.to_string()));
    }
    Ok(())
}

/// Template parameter.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Parameter {
    /// Logical name, used as the key in the `Parameters` section.
    #[serde(skip)]
    pub title: String,
    #[serde(rename = "Type")]
    pub param_type: String,
    #[serde(rename = "Default", skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "AllowedValues", skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn new(title: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            param_type: param_type.into(),
            default: None,
            allowed_values: Vec::new(),
            description: None,
        }
    }

    pub fn string(title: impl Into<String>) -> Self {
        Self::new(title, "String")
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_allowed_values(mut self, values: &[&str]) -> Self {
        self.allowed_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A resource entry of the `Resources` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    #[serde(rename = "Properties", default, skip_serializing_if = "Value::is_null")]
    pub properties: Value,
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: Value::Null,
            depends_on: Vec::new(),
            condition: None,
        }
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn depends_on(mut self, title: impl Into<String>) -> Self {
        self.depends_on.push(title.into());
        self
    }
}

/// An entry of the `Outputs` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Output {
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Value")]
    pub value: Value,
    #[serde(rename = "Export", default, skip_serializing_if = "Option::is_none")]
    pub export: Option<Value>,
    #[serde(rename = "Condition", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Output {
    pub fn new(value: Value) -> Self {
        Self {
            description: None,
            value,
            export: None,
            condition: None,
        }
    }

    pub fn with_export(mut self, export: Value) -> Self {
        self.export = Some(export);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of a single stack.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Metadata", skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    #[serde(rename = "Parameters", skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Conditions", skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, Value>,
    #[serde(rename = "Mappings", skip_serializing_if = "BTreeMap::is_empty")]
    pub mappings: BTreeMap<String, Value>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Template {
    /// Create an empty template stamped with its generation date.
    pub fn new(description: Option<&str>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("GeneratedOn".to_string(), json!(Utc::now().to_rfc3339()));

        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: Some(description.unwrap_or(DEFAULT_DESCRIPTION).to_string()),
            metadata,
            parameters: BTreeMap::new(),
            conditions: BTreeMap::new(),
            mappings: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Add a parameter unless one with the same title is already declared.
    ///
    /// Returns `true` when the parameter was added.
    pub fn add_parameter(&mut self, parameter: Parameter) -> bool {
        if self.parameters.contains_key(&parameter.title) {
            return false;
        }
        debug!("Adding parameter {}", parameter.title);
        self.parameters.insert(parameter.title.clone(), parameter);
        true
    }

    /// Add a condition unless one with the same name is already declared.
    pub fn add_condition(&mut self, name: impl Into<String>, condition: Value) -> bool {
        let name = name.into();
        if self.conditions.contains_key(&name) {
            return false;
        }
        self.conditions.insert(name, condition);
        true
    }

    /// Set a top-level mapping, replacing any previous content for that key.
    pub fn set_mapping(&mut self, name: impl Into<String>, mapping: Value) {
        self.mappings.insert(name.into(), mapping);
    }

    /// Add a resource. Titles must be valid logical ids and unique.
    pub fn add_resource(&mut self, title: impl Into<String>, resource: Resource) -> CfnResult<()> {
        let title = title.into();
        validate_title(&title)?;
        if self.resources.contains_key(&title) {
            return Err(CfnError::DuplicateResource { title });
        }
        debug!("Adding resource {} ({})", title, resource.resource_type);
        self.resources.insert(title, resource);
        Ok(())
    }

    /// Add or replace an output.
    pub fn set_output(&mut self, title: impl Into<String>, output: Output) -> CfnResult<()> {
        let title = title.into();
        validate_title(&title)?;
        if let Some(condition) = &output.condition {
            if !self.conditions.contains_key(condition) {
                return Err(CfnError::UnknownCondition(condition.clone()));
            }
        }
        self.outputs.insert(title, output);
        Ok(())
    }

    pub fn has_parameter(&self, title: &str) -> bool {
        self.parameters.contains_key(title)
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    pub fn resource(&self, title: &str) -> Option<&Resource> {
        self.resources.get(title)
    }

    /// A template with no resources has nothing to render.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> CfnResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> CfnResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Write the rendered template to `path`.
    pub fn write_to(&self, path: &Path) -> CfnResult<()> {
        fs::write(path, self.to_json()?)?;
        debug!("Wrote template to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_template_has_version_and_metadata() {
        let template = Template::new(Some("Tables"));
        let value = template.to_value().unwrap();

        assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(value["Description"], "Tables");
        assert!(value["Metadata"]["GeneratedOn"].is_string());
        assert!(value.get("Outputs").is_none());
    }

    #[test]
    fn test_add_parameter_keeps_first() {
        let mut template = Template::default();
        assert!(template.add_parameter(Parameter::string("VpcId").with_default("vpc-1")));
        assert!(!template.add_parameter(Parameter::string("VpcId").with_default("vpc-2")));

        assert_eq!(template.parameters["VpcId"].default, Some(json!("vpc-1")));
    }

    #[test]
    fn test_add_resource_rejects_duplicates_and_bad_titles() {
        let mut template = Template::default();
        template
            .add_resource("orders", Resource::new("AWS::DynamoDB::Table"))
            .unwrap();

        assert!(matches!(
            template.add_resource("orders", Resource::new("AWS::DynamoDB::Table")),
            Err(CfnError::DuplicateResource { .. })
        ));
        assert!(matches!(
            template.add_resource("my-table", Resource::new("AWS::DynamoDB::Table")),
            Err(CfnError::InvalidTitle(_))
        ));
    }

    #[test]
    fn test_set_output_overwrites() {
        let mut template = Template::default();
        template.set_output("ordersArn", Output::new(json!("a"))).unwrap();
        template.set_output("ordersArn", Output::new(json!("b"))).unwrap();

        assert_eq!(template.outputs.len(), 1);
        assert_eq!(template.outputs["ordersArn"].value, json!("b"));
    }

    #[test]
    fn test_parameter_serialization_skips_title() {
        let parameter = Parameter::string("UseCfnExports")
            .with_default("True")
            .with_allowed_values(&["True", "False"]);
        let value = serde_json::to_value(&parameter).unwrap();

        assert_eq!(value, json!({
            "Type": "String",
            "Default": "True",
            "AllowedValues": ["True", "False"]
        }));
    }
}
