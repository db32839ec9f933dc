//! Provider fixtures.
//!
//! A fixtures file records the resources a provider account holds, so that
//! lookups can be resolved offline:
//!
//! ```yaml
//! resources:
//!   - arn: arn:aws:dynamodb:us-east-1:123456789012:table/orders
//!     resource_type: dynamodb:table
//!     tags:
//!       env: prod
//!     record:
//!       Table:
//!         TableName: orders
//!         TableArn: arn:aws:dynamodb:us-east-1:123456789012:table/orders
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ProviderResult;
use crate::mock::{MockProvider, MockResource};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderFixtures {
    #[serde(default)]
    pub resources: Vec<MockResource>,
}

impl ProviderFixtures {
    pub fn from_yaml_str(content: &str) -> ProviderResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load fixtures from a YAML file.
    pub fn from_file(path: &Path) -> ProviderResult<Self> {
        let content = fs::read_to_string(path)?;
        let fixtures = Self::from_yaml_str(&content)?;
        info!("Loaded {} provider fixture(s) from {:?}", fixtures.resources.len(), path);
        Ok(fixtures)
    }

    pub fn into_provider(self) -> MockProvider {
        MockProvider::new().with_resources(self.resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ProviderSession, TagFilter};
    use tempfile::tempdir;

    const FIXTURES: &str = r#"
resources:
  - arn: arn:aws:dynamodb:us-east-1:123456789012:table/orders
    resource_type: dynamodb:table
    tags:
      env: prod
    record:
      Table:
        TableName: orders
"#;

    #[tokio::test]
    async fn test_fixtures_load_into_provider() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("provider.yaml");
        fs::write(&path, FIXTURES).unwrap();

        let provider = ProviderFixtures::from_file(&path).unwrap().into_provider();
        let arns = provider
            .search_by_tag("dynamodb:table", &[TagFilter::new("env", "prod")])
            .await
            .unwrap();

        assert_eq!(arns.len(), 1);
        let record = provider.describe("dynamodb:DescribeTable", "orders").await.unwrap();
        assert_eq!(record["Table"]["TableName"], "orders");
    }

    #[test]
    fn test_empty_document_has_no_resources() {
        let fixtures = ProviderFixtures::from_yaml_str("{}").unwrap();
        assert!(fixtures.resources.is_empty());
    }
}
