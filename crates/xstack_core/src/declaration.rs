//! User-authored resource declarations and the compose document holding them.
//!
//! Each resource family owns one top-level section of the document
//! (`x-dynamodb`, `x-docdb`, ...). Every key of a section declares one
//! resource:
//!
//! ```yaml
//! x-dynamodb:
//!   orders:
//!     Properties:
//!       BillingMode: PAY_PER_REQUEST
//!   legacy:
//!     Lookup:
//!       Tags:
//!         - Key: env
//!           Value: prod
//!   shared:
//!     Use:
//!       Identifier: arn:aws:dynamodb:us-east-1:123456789012:table/shared
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use xstack_provider::TagFilter;

use crate::error::{CoreError, CoreResult};

pub const LOOKUP_KEY: &str = "Lookup";
pub const USE_KEY: &str = "Use";
pub const PROPERTIES_KEY: &str = "Properties";
pub const SETTINGS_KEY: &str = "Settings";

/// Prefix of the document sections owned by resource families.
pub const SECTION_PREFIX: &str = "x-";

/// One entry of a `Tags` list.
///
/// Both `{Key: env, Value: prod}` and the shorthand `{env: prod}` are
/// accepted; a shorthand map may hold several pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagEntry {
    Explicit {
        #[serde(rename = "Key")]
        key: String,
        #[serde(rename = "Value")]
        value: String,
    },
    Pairs(BTreeMap<String, String>),
}

/// How to find one provider resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupTarget {
    #[serde(rename = "Tags", default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagEntry>,
    /// Identifier supplied directly, used as is when it is a valid ARN.
    #[serde(rename = "Arn", alias = "Identifier", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl LookupTarget {
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(TagEntry::Explicit {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Flatten the declared tags into tagging-query filters.
    pub fn tag_filters(&self) -> Vec<TagFilter> {
        self.tags
            .iter()
            .flat_map(|entry| match entry {
                TagEntry::Explicit { key, value } => vec![TagFilter::new(key, value)],
                TagEntry::Pairs(pairs) => pairs
                    .iter()
                    .map(|(key, value)| TagFilter::new(key, value))
                    .collect(),
            })
            .collect()
    }
}

/// Parsed `Lookup` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupSpec {
    #[serde(flatten)]
    pub target: LookupTarget,
    /// Role to assume to reach the resource in another account.
    #[serde(rename = "RoleArn", default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    /// Secondary resource to resolve along with the main one.
    #[serde(rename = "secret", alias = "Secret", default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<LookupTarget>,
}

impl LookupSpec {
    pub fn from_target(target: LookupTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }
}

/// Parsed `Use` block: either a bare identifier or `{Identifier: ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UseSpec {
    Identifier(String),
    Detailed {
        #[serde(rename = "Identifier", alias = "Arn")]
        identifier: String,
    },
}

impl UseSpec {
    pub fn identifier(&self) -> &str {
        match self {
            UseSpec::Identifier(identifier) => identifier,
            UseSpec::Detailed { identifier } => identifier,
        }
    }
}

/// A resource as written by the user.
///
/// `Lookup` and `Use` are kept raw here; they are only interpreted once the
/// declaration name has been validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeclaration {
    pub name: String,
    /// Family identifier, e.g. `dynamodb`.
    pub module_name: String,
    pub definition: Value,
    pub lookup: Option<Value>,
    pub use_spec: Option<Value>,
}

impl ResourceDeclaration {
    pub fn new(name: impl Into<String>, module_name: impl Into<String>, definition: Value) -> Self {
        let lookup = non_null(definition.get(LOOKUP_KEY));
        let use_spec = non_null(definition.get(USE_KEY));
        Self {
            name: name.into(),
            module_name: module_name.into(),
            definition,
            lookup,
            use_spec,
        }
    }

    pub fn with_lookup(mut self, lookup: Value) -> Self {
        if let Value::Object(map) = &mut self.definition {
            map.insert(LOOKUP_KEY.to_string(), lookup.clone());
        }
        self.lookup = Some(lookup);
        self
    }

    pub fn with_use(mut self, use_spec: Value) -> Self {
        if let Value::Object(map) = &mut self.definition {
            map.insert(USE_KEY.to_string(), use_spec.clone());
        }
        self.use_spec = Some(use_spec);
        self
    }

    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.definition.get(PROPERTIES_KEY).and_then(Value::as_object)
    }
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

/// A compose document with its family sections.
#[derive(Debug, Clone, Default)]
pub struct ComposeDocument {
    content: Map<String, Value>,
}

impl ComposeDocument {
    pub fn from_value(value: Value) -> CoreResult<Self> {
        match value {
            Value::Object(content) => Ok(Self { content }),
            Value::Null => Ok(Self::default()),
            other => Err(CoreError::InvalidDocument(format!(
                "top level must be a mapping, found {}",
                type_name(&other)
            ))),
        }
    }

    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        let value: Value = serde_yaml::from_str(content)?;
        Self::from_value(value)
    }

    /// Load a compose document from a YAML file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        debug!("Reading compose document from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.content.contains_key(section)
    }

    /// Names of every family-style section present in the document.
    pub fn family_sections(&self) -> Vec<&str> {
        self.content
            .keys()
            .filter(|k| k.starts_with(SECTION_PREFIX))
            .map(|k| k.as_str())
            .collect()
    }

    /// Read the declarations of one section. A missing section yields none.
    pub fn declarations(&self, section: &str, module_name: &str) -> CoreResult<Vec<ResourceDeclaration>> {
        let entries = match self.content.get(section) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(entries)) => entries,
            Some(other) => {
                return Err(CoreError::InvalidDocument(format!(
                    "section {} must be a mapping, found {}",
                    section,
                    type_name(other)
                )))
            }
        };

        entries
            .iter()
            .map(|(name, definition)| match definition {
                Value::Object(_) => Ok(ResourceDeclaration::new(name, module_name, definition.clone())),
                Value::Null => Ok(ResourceDeclaration::new(name, module_name, Value::Object(Map::new()))),
                other => Err(CoreError::InvalidDocument(format!(
                    "{}.{} must be a mapping, found {}",
                    section,
                    name,
                    type_name(other)
                ))),
            })
            .collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
