//! # xstack_families
//!
//! Resource families shipped with xstack.
//!
//! - **dynamodb**: DynamoDB tables, declared under `x-dynamodb`
//! - **docdb**: DocumentDB clusters, declared under `x-docdb`, with an
//!   optional secret looked up alongside existing clusters
//!
//! Neither family supports `Use` yet; such declarations are reported and
//! skipped.

pub mod docdb;
pub mod dynamodb;

use xstack_core::{CoreResult, FamilyRegistry};

/// Registry holding every family of this crate.
pub fn standard_registry() -> CoreResult<FamilyRegistry> {
    let mut registry = FamilyRegistry::new();
    registry.register(dynamodb::family()?);
    registry.register(docdb::family()?);
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry() {
        let registry = standard_registry().unwrap();

        assert_eq!(registry.names(), vec!["dynamodb", "docdb"]);
        assert_eq!(registry.by_section("x-docdb").unwrap().key, "docdb");
        assert!(registry.iter().all(|f| !f.supports_use));
        assert!(registry.get("docdb").unwrap().secondary.is_some());
    }
}
