//! Parameter files passed to the deployment of the root stack.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::CfnResult;

/// One `ParameterKey`/`ParameterValue` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterEntry {
    #[serde(rename = "ParameterKey")]
    pub key: String,
    #[serde(rename = "ParameterValue")]
    pub value: String,
}

/// Ordered list of stack parameter values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ParameterFile {
    pub entries: Vec<ParameterEntry>,
}

impl ParameterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value. Numbers and booleans are stringified, lists are joined
    /// with commas as `List<...>` parameters expect.
    pub fn push(&mut self, key: impl Into<String>, value: &Value) {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        self.entries.push(ParameterEntry {
            key: key.into(),
            value,
        });
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to(&self, path: &Path) -> CfnResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Wrote {} stack parameters to {:?}", self.entries.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_push_stringifies_values() {
        let mut params = ParameterFile::new();
        params.push("Port", &json!(27017));
        params.push("Subnets", &json!(["subnet-a", "subnet-b"]));
        params.push("UseCfnExports", &json!("True"));

        assert_eq!(params.get("Port"), Some("27017"));
        assert_eq!(params.get("Subnets"), Some("subnet-a,subnet-b"));
        assert_eq!(params.get("UseCfnExports"), Some("True"));
    }

    #[test]
    fn test_write_to_renders_key_value_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("root.params.json");
        let mut params = ParameterFile::new();
        params.push("VpcId", &json!("vpc-123"));

        params.write_to(&path).unwrap();

        let content: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            content,
            json!([{ "ParameterKey": "VpcId", "ParameterValue": "vpc-123" }])
        );
    }
}
