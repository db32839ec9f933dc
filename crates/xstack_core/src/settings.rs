//! Run-wide settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use xstack_cfn::defaults::{USE_CFN_EXPORTS, USE_SSM_EXPORTS};
use xstack_cfn::{bool_flag, ParameterFile};
use xstack_provider::DEFAULT_REGION;

use crate::error::CoreResult;

pub const DEFAULT_ROOT_STACK_NAME: &str = "root";

/// Settings shared by every family during one run.
///
/// Loaded from YAML, every field is optional:
///
/// ```yaml
/// root_stack_name: shop
/// region: eu-west-1
/// use_ssm_exports: true
/// parameters:
///   VpcId: vpc-0123
///   StorageSubnets: [subnet-a, subnet-b]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub root_stack_name: String,
    pub region: String,
    pub account_id: Option<String>,
    pub use_cfn_exports: bool,
    pub use_ssm_exports: bool,
    /// Location the nested templates are uploaded to.
    pub template_url_base: String,
    /// Extra parameter values handed to the root stack.
    pub parameters: BTreeMap<String, Value>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            root_stack_name: DEFAULT_ROOT_STACK_NAME.to_string(),
            region: DEFAULT_REGION.to_string(),
            account_id: None,
            use_cfn_exports: true,
            use_ssm_exports: false,
            template_url_base: ".".to_string(),
            parameters: BTreeMap::new(),
        }
    }
}

impl RunSettings {
    pub fn new(root_stack_name: impl Into<String>) -> Self {
        Self {
            root_stack_name: root_stack_name.into(),
            ..Self::default()
        }
    }

    /// Load settings from a YAML file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        debug!("Loading run settings from {:?}", path);
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_cfn_exports(mut self, enabled: bool) -> Self {
        self.use_cfn_exports = enabled;
        self
    }

    pub fn with_ssm_exports(mut self, enabled: bool) -> Self {
        self.use_ssm_exports = enabled;
        self
    }

    pub fn with_template_url_base(mut self, base: impl Into<String>) -> Self {
        self.template_url_base = base.into();
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// URL of a nested template given its stack title.
    pub fn template_url(&self, title: &str) -> String {
        format!("{}/{}.json", self.template_url_base.trim_end_matches('/'), title)
    }

    /// Parameter values for the deployment of the root stack.
    pub fn root_parameters(&self) -> ParameterFile {
        let mut file = ParameterFile::new();
        file.push(USE_CFN_EXPORTS, &Value::from(bool_flag(self.use_cfn_exports)));
        file.push(USE_SSM_EXPORTS, &Value::from(bool_flag(self.use_ssm_exports)));
        for (key, value) in &self.parameters {
            if key == USE_CFN_EXPORTS || key == USE_SSM_EXPORTS {
                continue;
            }
            file.push(key.clone(), value);
        }
        file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = RunSettings::default();
        assert_eq!(settings.region, "us-east-1");
        assert!(settings.use_cfn_exports);
        assert!(!settings.use_ssm_exports);
        assert_eq!(settings.template_url("dynamodb"), "./dynamodb.json");
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "root_stack_name: shop\nregion: eu-west-1\nparameters:\n  VpcId: vpc-0123\n  StorageSubnets: [subnet-a, subnet-b]"
        )
        .unwrap();

        let settings = RunSettings::from_file(file.path()).unwrap();

        assert_eq!(settings.root_stack_name, "shop");
        assert_eq!(settings.region, "eu-west-1");
        assert!(settings.use_cfn_exports);
        assert_eq!(settings.parameters["VpcId"], json!("vpc-0123"));
    }

    #[test]
    fn test_root_parameters() {
        let settings = RunSettings::new("shop")
            .with_ssm_exports(true)
            .with_parameter("StorageSubnets", json!(["subnet-a", "subnet-b"]))
            .with_parameter("UseSsmExports", json!("False"));

        let file = settings.root_parameters();

        assert_eq!(file.len(), 3);
        assert_eq!(file.get("UseCfnExports"), Some("True"));
        assert_eq!(file.get("UseSsmExports"), Some("True"));
        assert_eq!(file.get("StorageSubnets"), Some("subnet-a,subnet-b"));
    }

    #[test]
    fn test_template_url_trims_trailing_slash() {
        let settings = RunSettings::default().with_template_url_base("https://bucket.s3.amazonaws.com/shop/");
        assert_eq!(
            settings.template_url("docdb"),
            "https://bucket.s3.amazonaws.com/shop/docdb.json"
        );
    }
}
