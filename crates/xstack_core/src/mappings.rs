//! Run-wide table of lookup results.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use xstack_cfn::intrinsic::find_in_map;
use xstack_cfn::Template;

use crate::error::{CoreError, CoreResult};
use crate::mapper::LookupMapping;

/// Lookup mappings keyed by family mappings key, then logical name.
///
/// Rendered as the `Mappings` section of templates so that dependent
/// resources read looked-up values with `Fn::FindInMap`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTable {
    families: BTreeMap<String, BTreeMap<String, LookupMapping>>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the mapping of one resource, replacing an earlier one.
    pub fn insert(&mut self, family: impl Into<String>, logical_name: impl Into<String>, mapping: LookupMapping) {
        let family = family.into();
        let logical_name = logical_name.into();
        debug!("Storing lookup mapping {}.{}", family, logical_name);
        self.families
            .entry(family)
            .or_default()
            .insert(logical_name, mapping);
    }

    pub fn get(&self, family: &str, logical_name: &str) -> Option<&LookupMapping> {
        self.families.get(family).and_then(|f| f.get(logical_name))
    }

    pub fn family(&self, family: &str) -> Option<&BTreeMap<String, LookupMapping>> {
        self.families.get(family)
    }

    /// Number of stored resource mappings across all families.
    pub fn len(&self) -> usize {
        self.families.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Fn::FindInMap` expression reading `field` of a looked-up resource.
    pub fn find_in_map(&self, family: &str, logical_name: &str, field: &str) -> CoreResult<Value> {
        let mapping = self.get(family, logical_name).ok_or_else(|| CoreError::MissingMapping {
            family: family.to_string(),
            name: logical_name.to_string(),
        })?;
        if !mapping.contains(field) {
            return Err(CoreError::MissingAttribute {
                field: field.to_string(),
                path: format!("{}::{}", family, logical_name),
            });
        }
        Ok(find_in_map(family, logical_name, field))
    }

    /// Write every family's mappings into the template's `Mappings` section.
    pub fn render_into(&self, template: &mut Template) {
        for (family, resources) in &self.families {
            if resources.is_empty() {
                continue;
            }
            let body: Map<String, Value> = resources
                .iter()
                .map(|(logical_name, mapping)| (logical_name.clone(), mapping.to_cfn()))
                .collect();
            template.set_mapping(family.clone(), Value::Object(body));
        }
    }
}
