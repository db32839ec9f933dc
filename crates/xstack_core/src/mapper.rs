//! Attribute mapper.
//!
//! Projects a raw provider record onto a fixed set of semantic fields, so that
//! downstream template logic does not depend on the shape of provider
//! responses.
//!
//! Source paths are `::`-delimited. A numeric segment indexes into a list,
//! any other segment reads a field, e.g. `VpcSecurityGroups::0::VpcSecurityGroupId`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};

pub const PATH_SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// A parsed source path into a provider record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl AttributePath {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split(PATH_SEPARATOR)
            .map(|segment| match segment.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(segment.to_string()),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Walk `record` along the path. `null` counts as absent.
    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let mut current = record;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
                (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                _ => return None,
            };
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeField {
    name: String,
    path: AttributePath,
    required: bool,
}

/// Declared `{output_field: source_path}` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMapping {
    fields: Vec<AttributeField>,
}

impl AttributeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an optional field; absent paths are left out of the result.
    pub fn field(mut self, name: impl Into<String>, path: &str) -> Self {
        self.push(name.into(), path, false);
        self
    }

    /// Declare a field that must be present in every projected record.
    pub fn required(mut self, name: impl Into<String>, path: &str) -> Self {
        self.push(name.into(), path, true);
        self
    }

    fn push(&mut self, name: String, path: &str, required: bool) {
        self.fields.retain(|f| f.name != name);
        self.fields.push(AttributeField {
            name,
            path: AttributePath::parse(path),
            required,
        });
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names with their source paths, in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &AttributePath)> {
        self.fields.iter().map(|f| (f.name.as_str(), &f.path))
    }

    /// Project `record` onto the declared fields.
    pub fn project(&self, record: &Value) -> CoreResult<LookupMapping> {
        let mut mapping = LookupMapping::new();
        for field in &self.fields {
            match field.path.resolve(record) {
                Some(value) => {
                    mapping.insert(field.name.clone(), value.clone());
                }
                None if field.required => {
                    return Err(CoreError::MissingAttribute {
                        field: field.name.clone(),
                        path: field.path.to_string(),
                    })
                }
                None => {}
            }
        }
        Ok(mapping)
    }
}

/// Resolved `{field: value}` record of a looked-up resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupMapping {
    values: BTreeMap<String, Value>,
}

impl LookupMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(field.into(), value)
    }

    /// Insert only when the field is not already set.
    pub fn insert_missing(&mut self, field: impl Into<String>, value: Value) {
        self.values.entry(field.into()).or_insert(value);
    }

    pub fn extend(&mut self, other: LookupMapping) {
        self.values.extend(other.values);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Render for a template `Mappings` section, which only holds strings
    /// and lists of strings.
    pub fn to_cfn(&self) -> Value {
        let entries: Map<String, Value> = self
            .values
            .iter()
            .map(|(field, value)| (field.clone(), cfn_mapping_value(value)))
            .collect();
        Value::Object(entries)
    }
}

fn cfn_mapping_value(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        Value::Array(items) => Value::Array(items.iter().map(cfn_mapping_value).collect()),
        other => Value::String(other.to_string()),
    }
}

/// Project `record` through `mapping`.
pub fn attributes_to_mapping(record: &Value, mapping: &AttributeMapping) -> CoreResult<LookupMapping> {
    mapping.project(record)
}
