//! Input validation for names and identifiers sent to Resource Manager

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AcctctlError, Result};

static GUID_REGEX: OnceLock<Regex> = OnceLock::new();
static LOCATION_REGEX: OnceLock<Regex> = OnceLock::new();
static RESOURCE_GROUP_REGEX: OnceLock<Regex> = OnceLock::new();

fn guid_regex() -> &'static Regex {
    GUID_REGEX.get_or_init(|| {
        Regex::new(
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        )
        .expect("GUID regex is valid")
    })
}

fn location_regex() -> &'static Regex {
    LOCATION_REGEX.get_or_init(|| Regex::new(r"^[a-z][a-z0-9]*$").expect("location regex is valid"))
}

fn resource_group_regex() -> &'static Regex {
    RESOURCE_GROUP_REGEX.get_or_init(|| {
        Regex::new(r"^[-\w\._\(\)]{1,90}$").expect("resource group regex is valid")
    })
}

/// Validate a storage account name: 3-24 characters, lowercase letters and digits only
pub fn validate_storage_account_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(3..=24).contains(&len) {
        return Err(AcctctlError::invalid_account_name(
            name,
            format!("must be between 3 and 24 characters long (got {len})"),
        ));
    }

    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
    {
        return Err(AcctctlError::invalid_account_name(
            name,
            format!("may contain only lowercase letters and digits (found '{bad}')"),
        ));
    }

    Ok(())
}

pub fn is_valid_storage_account_name(name: &str) -> bool {
    validate_storage_account_name(name).is_ok()
}

/// Azure region short names, e.g. `eastus`, `westeurope`
pub fn is_valid_azure_location(location: &str) -> bool {
    location_regex().is_match(location)
}

pub fn is_guid(value: &str) -> bool {
    guid_regex().is_match(value)
}

pub fn validate_resource_group_name(name: &str) -> Result<()> {
    if name.ends_with('.') || !resource_group_regex().is_match(name) {
        return Err(AcctctlError::invalid_argument(format!(
            "Invalid resource group name '{name}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_account_name_validation() {
        for name in ["abc", "mystorage01", "a23456789012345678901234"] {
            assert!(
                is_valid_storage_account_name(name),
                "Name '{}' should be valid",
                name
            );
        }

        for name in [
            "",
            "ab",
            "a234567890123456789012345",
            "MyStorage",
            "my-storage",
            "my_storage",
            "my storage",
        ] {
            assert!(
                !is_valid_storage_account_name(name),
                "Name '{}' should be invalid",
                name
            );
        }
    }

    #[test]
    fn test_invalid_name_reason() {
        let err = validate_storage_account_name("Bad-Name").unwrap_err();
        assert!(err.to_string().contains("found 'B'"));
    }

    #[test]
    fn test_location_validation() {
        assert!(is_valid_azure_location("eastus"));
        assert!(is_valid_azure_location("westus2"));
        assert!(!is_valid_azure_location("East US"));
        assert!(!is_valid_azure_location("east_us"));
        assert!(!is_valid_azure_location(""));
    }

    #[test]
    fn test_guid_validation() {
        assert!(is_guid("12345678-1234-1234-1234-123456789012"));
        assert!(!is_guid("not-a-guid"));
    }

    #[test]
    fn test_resource_group_validation() {
        assert!(validate_resource_group_name("rg-storage_demo(1)").is_ok());
        assert!(validate_resource_group_name("trailing.").is_err());
        assert!(validate_resource_group_name("").is_err());
        assert!(validate_resource_group_name("bad/name").is_err());
    }
}
