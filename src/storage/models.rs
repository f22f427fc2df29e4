//! Storage account data models and types
//!
//! This module defines the data structures used for storage account
//! management: SKUs, kinds, creation parameters, account properties
//! and access keys.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;
use zeroize::Zeroizing;

use crate::arm::resource_id::ResourceId;
use crate::error::{AcctctlError, Result};
use crate::utils::validation::{is_valid_azure_location, validate_storage_account_name};

pub const STORAGE_ACCOUNT_RESOURCE_TYPE: &str = "Microsoft.Storage/storageAccounts";

fn display_option<T: fmt::Display>(opt: &Option<T>) -> String {
    match opt {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

fn display_datetime(opt: &Option<DateTime<Utc>>) -> String {
    match opt {
        Some(value) => value.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Redundancy and performance class of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageSku {
    #[serde(rename = "Standard_LRS")]
    StandardLrs,
    #[serde(rename = "Standard_GRS")]
    StandardGrs,
    #[serde(rename = "Standard_RAGRS")]
    StandardRagrs,
    #[serde(rename = "Standard_ZRS")]
    StandardZrs,
    #[serde(rename = "Premium_LRS")]
    PremiumLrs,
    #[serde(rename = "Premium_ZRS")]
    PremiumZrs,
    #[serde(rename = "Standard_GZRS")]
    StandardGzrs,
    #[serde(rename = "Standard_RAGZRS")]
    StandardRagzrs,
}

impl StorageSku {
    pub const ALL: [StorageSku; 8] = [
        StorageSku::StandardLrs,
        StorageSku::StandardGrs,
        StorageSku::StandardRagrs,
        StorageSku::StandardZrs,
        StorageSku::PremiumLrs,
        StorageSku::PremiumZrs,
        StorageSku::StandardGzrs,
        StorageSku::StandardRagzrs,
    ];

    /// Name used on the wire, e.g. `Standard_LRS`
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageSku::StandardLrs => "Standard_LRS",
            StorageSku::StandardGrs => "Standard_GRS",
            StorageSku::StandardRagrs => "Standard_RAGRS",
            StorageSku::StandardZrs => "Standard_ZRS",
            StorageSku::PremiumLrs => "Premium_LRS",
            StorageSku::PremiumZrs => "Premium_ZRS",
            StorageSku::StandardGzrs => "Standard_GZRS",
            StorageSku::StandardRagzrs => "Standard_RAGZRS",
        }
    }

    /// Whether the SKU replicates to a secondary region
    pub fn is_geo_redundant(&self) -> bool {
        matches!(
            self,
            StorageSku::StandardGrs
                | StorageSku::StandardRagrs
                | StorageSku::StandardGzrs
                | StorageSku::StandardRagzrs
        )
    }
}

impl fmt::Display for StorageSku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageSku {
    type Err = AcctctlError;

    /// Accepts `Standard_LRS`, `standard_lrs` and `standard-lrs`
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        StorageSku::ALL
            .iter()
            .find(|sku| sku.as_str().to_ascii_uppercase() == normalized)
            .copied()
            .ok_or_else(|| {
                AcctctlError::invalid_argument(format!(
                    "Unknown SKU '{}'. Expected one of: {}",
                    s,
                    StorageSku::ALL
                        .iter()
                        .map(|sku| sku.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Kind of storage account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum StorageKind {
    Storage,
    #[value(name = "storagev2")]
    StorageV2,
    #[value(name = "blobstorage")]
    BlobStorage,
    #[value(name = "filestorage")]
    FileStorage,
    #[value(name = "blockblobstorage")]
    BlockBlobStorage,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Storage => "Storage",
            StorageKind::StorageV2 => "StorageV2",
            StorageKind::BlobStorage => "BlobStorage",
            StorageKind::FileStorage => "FileStorage",
            StorageKind::BlockBlobStorage => "BlockBlobStorage",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default access tier for blob data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum AccessTier {
    Hot,
    Cool,
    Cold,
    Premium,
}

impl AccessTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::Hot => "Hot",
            AccessTier::Cool => "Cool",
            AccessTier::Cold => "Cold",
            AccessTier::Premium => "Premium",
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum FailoverType {
    Planned,
    Unplanned,
}

impl fmt::Display for FailoverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailoverType::Planned => f.write_str("Planned"),
            FailoverType::Unplanned => f.write_str("Unplanned"),
        }
    }
}

/// Names of the keys an account exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AccountKeyName {
    Key1,
    Key2,
    Kerb1,
    Kerb2,
}

impl AccountKeyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKeyName::Key1 => "key1",
            AccountKeyName::Key2 => "key2",
            AccountKeyName::Kerb1 => "kerb1",
            AccountKeyName::Kerb2 => "kerb2",
        }
    }
}

impl fmt::Display for AccountKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage account creation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageAccountCreateRequest {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub sku: StorageSku,
    pub kind: StorageKind,
    pub access_tier: Option<AccessTier>,
    pub allow_shared_key_access: Option<bool>,
    pub minimum_tls_version: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl Default for StorageAccountCreateRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            resource_group: String::new(),
            location: "eastus".to_string(),
            sku: StorageSku::StandardLrs,
            kind: StorageKind::StorageV2,
            access_tier: Some(AccessTier::Cool),
            allow_shared_key_access: Some(false),
            minimum_tls_version: Some("TLS1_2".to_string()),
            tags: BTreeMap::new(),
        }
    }
}

impl StorageAccountCreateRequest {
    pub fn new(name: impl Into<String>, resource_group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_group: resource_group.into(),
            ..Self::default()
        }
    }

    /// Check the request locally before anything is sent
    pub fn validate(&self) -> Result<()> {
        validate_storage_account_name(&self.name)?;

        if self.resource_group.trim().is_empty() {
            return Err(AcctctlError::invalid_argument(
                "A resource group is required to create a storage account",
            ));
        }

        if !is_valid_azure_location(&self.location) {
            return Err(AcctctlError::invalid_argument(format!(
                "Invalid location '{}'; use a region short name such as 'eastus'",
                self.location
            )));
        }

        Ok(())
    }

    /// Request body for the create-or-update call
    pub fn to_arm_body(&self) -> Value {
        let mut properties = Map::new();
        if let Some(tier) = self.access_tier {
            properties.insert("accessTier".to_string(), json!(tier.as_str()));
        }
        if let Some(allow) = self.allow_shared_key_access {
            properties.insert("allowSharedKeyAccess".to_string(), json!(allow));
        }
        if let Some(tls) = &self.minimum_tls_version {
            properties.insert("minimumTlsVersion".to_string(), json!(tls));
        }

        json!({
            "sku": { "name": self.sku.as_str() },
            "kind": self.kind.as_str(),
            "location": self.location,
            "properties": properties,
            "tags": self.tags,
        })
    }
}

/// Storage account properties and metadata
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct StorageAccountProperties {
    #[tabled(skip)]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Resource Group")]
    pub resource_group: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "SKU")]
    pub sku: StorageSku,
    #[tabled(rename = "Kind")]
    pub kind: StorageKind,
    #[tabled(rename = "Access Tier", display_with = "display_option")]
    pub access_tier: Option<AccessTier>,
    #[tabled(rename = "State", display_with = "display_option")]
    pub provisioning_state: Option<String>,
    #[tabled(skip)]
    pub primary_location: Option<String>,
    #[tabled(skip)]
    pub secondary_location: Option<String>,
    #[tabled(skip)]
    pub status_of_primary: Option<String>,
    #[tabled(skip)]
    pub allow_shared_key_access: Option<bool>,
    #[tabled(skip)]
    pub primary_endpoints: BTreeMap<String, String>,
    #[tabled(rename = "Created", display_with = "display_datetime")]
    pub creation_time: Option<DateTime<Utc>>,
    #[tabled(skip)]
    pub tags: BTreeMap<String, String>,
}

impl StorageAccountProperties {
    /// Build from a Resource Manager storage account document
    pub fn from_arm(value: &Value) -> Result<Self> {
        let id = value
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AcctctlError::serialization("Storage account is missing 'id'"))?;
        let resource_id = ResourceId::parse(id)?;

        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| resource_id.name())
            .to_string();

        let sku = value
            .pointer("/sku/name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AcctctlError::serialization(format!("Account '{name}' has no SKU")))?
            .parse::<StorageSku>()?;

        let kind: StorageKind = serde_json::from_value(
            value
                .get("kind")
                .cloned()
                .ok_or_else(|| {
                    AcctctlError::serialization(format!("Account '{name}' has no kind"))
                })?,
        )?;

        let props = value.get("properties").cloned().unwrap_or(Value::Null);
        let prop_str = |key: &str| props.get(key).and_then(|v| v.as_str()).map(str::to_string);

        let access_tier = match props.get("accessTier") {
            Some(tier) if !tier.is_null() => Some(serde_json::from_value(tier.clone())?),
            _ => None,
        };

        let creation_time = prop_str("creationTime")
            .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
            .map(|t| t.with_timezone(&Utc));

        let primary_endpoints = props
            .get("primaryEndpoints")
            .and_then(|v| v.as_object())
            .map(|endpoints| {
                endpoints
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let tags = value
            .get("tags")
            .and_then(|v| v.as_object())
            .map(|tags| {
                tags.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id: id.to_string(),
            resource_group: resource_id
                .resource_group_name()
                .unwrap_or_default()
                .to_string(),
            location: value
                .get("location")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            name,
            sku,
            kind,
            access_tier,
            provisioning_state: prop_str("provisioningState"),
            primary_location: prop_str("primaryLocation"),
            secondary_location: prop_str("secondaryLocation"),
            status_of_primary: prop_str("statusOfPrimary"),
            allow_shared_key_access: props.get("allowSharedKeyAccess").and_then(|v| v.as_bool()),
            primary_endpoints,
            creation_time,
            tags,
        })
    }

    pub fn to_summary(&self) -> StorageAccountSummary {
        StorageAccountSummary {
            name: self.name.clone(),
            resource_group: self.resource_group.clone(),
            location: self.location.clone(),
            sku: self.sku,
            kind: self.kind,
            provisioning_state: self.provisioning_state.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Storage account row for list operations
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct StorageAccountSummary {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Resource Group")]
    pub resource_group: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "SKU")]
    pub sku: StorageSku,
    #[tabled(rename = "Kind")]
    pub kind: StorageKind,
    #[tabled(rename = "State")]
    pub provisioning_state: String,
}

/// An account access key; the value is wiped from memory on drop
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageAccountKey {
    pub key_name: String,
    pub value: Zeroizing<String>,
    pub permissions: String,
    pub creation_time: Option<DateTime<Utc>>,
}

impl fmt::Debug for StorageAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccountKey")
            .field("key_name", &self.key_name)
            .field("value", &"<redacted>")
            .field("permissions", &self.permissions)
            .field("creation_time", &self.creation_time)
            .finish()
    }
}

impl StorageAccountKey {
    /// Parse the `keys` array returned by listKeys / regenerateKey
    pub fn list_from_arm(value: &Value) -> Result<Vec<Self>> {
        let keys = value
            .get("keys")
            .and_then(|k| k.as_array())
            .ok_or_else(|| AcctctlError::serialization("Response has no 'keys' array"))?;

        keys.iter()
            .map(|key| {
                let key_name = key
                    .get("keyName")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| AcctctlError::serialization("Key is missing 'keyName'"))?;
                Ok(Self {
                    key_name: key_name.to_string(),
                    value: Zeroizing::new(
                        key.get("value")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    ),
                    permissions: key
                        .get("permissions")
                        .and_then(|v| v.as_str())
                        .unwrap_or("-")
                        .to_string(),
                    creation_time: key
                        .get("creationTime")
                        .and_then(|v| v.as_str())
                        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                        .map(|t| t.with_timezone(&Utc)),
                })
            })
            .collect()
    }

    /// Row for display, with the value masked unless `reveal` is set
    pub fn to_row(&self, reveal: bool) -> AccountKeyRow {
        AccountKeyRow {
            key_name: self.key_name.clone(),
            value: if reveal {
                self.value.to_string()
            } else {
                mask_secret(&self.value)
            },
            permissions: self.permissions.clone(),
            creation_time: self.creation_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct AccountKeyRow {
    #[tabled(rename = "Key Name")]
    pub key_name: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Permissions")]
    pub permissions: String,
    #[tabled(rename = "Created", display_with = "display_datetime")]
    pub creation_time: Option<DateTime<Utc>>,
}

/// Keep the first four characters of a secret and hide the rest
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}{}", visible, "*".repeat(12))
}

/// Result of a name availability check
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct NameAvailability {
    #[tabled(rename = "Available")]
    pub name_available: bool,
    #[tabled(rename = "Reason", display_with = "display_option")]
    #[serde(default)]
    pub reason: Option<String>,
    #[tabled(rename = "Message", display_with = "display_option")]
    #[serde(default)]
    pub message: Option<String>,
}
