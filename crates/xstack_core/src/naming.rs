//! Resource name rules.

use crate::error::{CoreError, CoreResult};

/// Check that a declared resource name only holds alphanumeric characters.
pub fn validate_resource_title(name: &str, family: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::validation(family, name, "resource name cannot be empty"));
    }
    let offending: Vec<char> = name.chars().filter(|c| !c.is_ascii_alphanumeric()).collect();
    if !offending.is_empty() {
        return Err(CoreError::validation(
            family,
            name,
            format!(
                "resource name contains non alphanumerical characters: {:?}",
                offending
            ),
        ));
    }
    Ok(())
}

/// Template-safe identifier derived from a resource name.
pub fn logical_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphanumeric_names_are_valid() {
        assert!(validate_resource_title("orders", "dynamodb").is_ok());
        assert!(validate_resource_title("Orders2024", "dynamodb").is_ok());
    }

    #[test]
    fn test_separators_are_rejected() {
        for name in ["my-table", "my_table", "my.table", "my table", "tablé", ""] {
            let err = validate_resource_title(name, "dynamodb").unwrap_err();
            assert!(matches!(err, CoreError::Validation { .. }), "{} accepted", name);
        }
    }

    #[test]
    fn test_logical_name_strips_separators() {
        assert_eq!(logical_name("orders"), "orders");
        assert_eq!(logical_name("my-table"), "mytable");
    }
}
