//! ARN recognition.
//!
//! Each resource family registers an [`ArnPattern`] used to decide whether a
//! user-supplied identifier is already a valid resource identifier, and to
//! keep only the relevant ARNs out of a tag search.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

/// The components of a matched ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArnParts {
    pub arn: String,
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    /// Resource identifier without the resource-type prefix.
    pub resource_id: String,
}

impl ArnParts {
    /// Split an ARN into its generic components.
    ///
    /// The resource id is whatever follows the last `/` or `:` of the
    /// resource section.
    pub fn parse(arn: &str) -> Option<Self> {
        let mut sections = arn.splitn(6, ':');
        if sections.next()? != "arn" {
            return None;
        }
        let partition = sections.next()?;
        let service = sections.next()?;
        let region = sections.next()?;
        let account_id = sections.next()?;
        let resource = sections.next()?;
        if partition.is_empty() || service.is_empty() || resource.is_empty() {
            return None;
        }
        let resource_id = resource
            .rsplit(|c: char| c == '/' || c == ':')
            .next()
            .unwrap_or(resource);

        Some(Self {
            arn: arn.to_string(),
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource_id: resource_id.to_string(),
        })
    }
}

/// Regular expression recognising the ARNs of one resource type.
///
/// Named groups `partition`, `region`, `accountid` and `id` override the
/// generic decomposition when present.
#[derive(Clone)]
pub struct ArnPattern {
    regex: Regex,
}

impl ArnPattern {
    pub fn new(pattern: &str) -> ProviderResult<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, arn: &str) -> bool {
        self.regex.is_match(arn)
    }

    /// Match `arn` and return its components.
    pub fn matches(&self, arn: &str) -> Option<ArnParts> {
        let captures = self.regex.captures(arn)?;
        let mut parts = ArnParts::parse(arn)?;

        if let Some(partition) = captures.name("partition") {
            parts.partition = partition.as_str().to_string();
        }
        if let Some(region) = captures.name("region") {
            parts.region = region.as_str().to_string();
        }
        if let Some(account_id) = captures.name("accountid") {
            parts.account_id = account_id.as_str().to_string();
        }
        if let Some(id) = captures.name("id") {
            parts.resource_id = id.as_str().to_string();
        }
        Some(parts)
    }
}

impl fmt::Debug for ArnPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArnPattern").field(&self.regex.as_str()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_ARN_RE: &str = r"^arn:(?P<partition>aws[\w-]*):dynamodb:(?P<region>[\w-]+):(?P<accountid>\d{12}):table/(?P<id>[\S]+)$";

    #[test]
    fn test_parse_generic_arn() {
        let parts = ArnParts::parse("arn:aws:rds:eu-west-1:123456789012:cluster:docs").unwrap();

        assert_eq!(parts.service, "rds");
        assert_eq!(parts.region, "eu-west-1");
        assert_eq!(parts.account_id, "123456789012");
        assert_eq!(parts.resource_id, "docs");
    }

    #[test]
    fn test_parse_rejects_non_arn() {
        assert!(ArnParts::parse("orders").is_none());
        assert!(ArnParts::parse("arn:aws:dynamodb").is_none());
    }

    #[test]
    fn test_pattern_matches_with_named_groups() {
        let pattern = ArnPattern::new(TABLE_ARN_RE).unwrap();
        let parts = pattern
            .matches("arn:aws:dynamodb:us-east-1:123456789012:table/orders")
            .unwrap();

        assert_eq!(parts.partition, "aws");
        assert_eq!(parts.resource_id, "orders");
        assert!(pattern
            .matches("arn:aws:rds:us-east-1:123456789012:cluster:orders")
            .is_none());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(ArnPattern::new("(unclosed").is_err());
    }
}
