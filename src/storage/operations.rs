//! Storage account control-plane operations
//!
//! Every call goes straight to the `Microsoft.Storage` resource provider
//! through [`ArmClient`].

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{
    AccountKeyName, FailoverType, NameAvailability, StorageAccountCreateRequest,
    StorageAccountKey, StorageAccountProperties, StorageSku, STORAGE_ACCOUNT_RESOURCE_TYPE,
};
use crate::arm::client::ArmClient;
use crate::arm::resource_id::ResourceId;
use crate::error::{AcctctlError, Result};
use crate::provider::models::STORAGE_NAMESPACE;

pub const STORAGE_API_VERSION: &str = "2023-01-01";

#[cfg(test)]
use mockall::automock;

/// Trait for storage account operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StorageAccountOperations: Send + Sync {
    /// Check whether an account name is free across Azure
    async fn check_name_availability(&self, name: &str) -> Result<NameAvailability>;

    /// Create an account and wait until it is provisioned
    async fn create_account(
        &self,
        request: &StorageAccountCreateRequest,
    ) -> Result<StorageAccountProperties>;

    async fn get_account(&self, resource_group: &str, name: &str)
        -> Result<StorageAccountProperties>;

    /// List accounts in the subscription, or in one resource group
    async fn list_accounts(
        &self,
        resource_group: Option<String>,
    ) -> Result<Vec<StorageAccountProperties>>;

    async fn update_sku(
        &self,
        resource_group: &str,
        name: &str,
        sku: StorageSku,
    ) -> Result<StorageAccountProperties>;

    async fn list_keys(&self, resource_group: &str, name: &str) -> Result<Vec<StorageAccountKey>>;

    /// Regenerate one key; returns the full key list afterwards
    async fn regenerate_key(
        &self,
        resource_group: &str,
        name: &str,
        key_name: AccountKeyName,
    ) -> Result<Vec<StorageAccountKey>>;

    /// Fail the account over to its secondary region
    async fn failover(
        &self,
        resource_group: &str,
        name: &str,
        failover_type: FailoverType,
    ) -> Result<()>;

    async fn delete_account(&self, resource_group: &str, name: &str) -> Result<()>;
}

/// Resource Manager implementation of storage account operations
pub struct AzureStorageAccountOperations {
    arm: Arc<ArmClient>,
    subscription_id: String,
}

impl AzureStorageAccountOperations {
    pub fn new(arm: Arc<ArmClient>, subscription_id: String) -> Self {
        Self {
            arm,
            subscription_id,
        }
    }

    fn account_path(&self, resource_group: &str, name: &str) -> String {
        ResourceId::resource(
            &self.subscription_id,
            resource_group,
            STORAGE_NAMESPACE,
            "storageAccounts",
            name,
        )
        .to_string()
    }

    fn account_url(&self, resource_group: &str, name: &str, action: Option<&str>) -> String {
        let mut path = self.account_path(resource_group, name);
        if let Some(action) = action {
            path.push('/');
            path.push_str(action);
        }
        self.arm.url(&path, STORAGE_API_VERSION)
    }

    /// Turn a 404 on an account URL into `StorageAccountNotFound`
    fn not_found_as_missing(name: &str, error: AcctctlError) -> AcctctlError {
        match error.status() {
            Some(404) => AcctctlError::account_not_found(name),
            _ => error,
        }
    }
}

#[async_trait]
impl StorageAccountOperations for AzureStorageAccountOperations {
    async fn check_name_availability(&self, name: &str) -> Result<NameAvailability> {
        let path = format!(
            "/subscriptions/{}/providers/{}/checkNameAvailability",
            self.subscription_id, STORAGE_NAMESPACE
        );
        let url = self.arm.url(&path, STORAGE_API_VERSION);
        let body = json!({ "name": name, "type": STORAGE_ACCOUNT_RESOURCE_TYPE });

        let response = self.arm.post_json(&url, Some(&body)).await?;
        let value = response.body.ok_or_else(|| {
            AcctctlError::serialization("Empty response from checkNameAvailability")
        })?;
        let availability: NameAvailability = serde_json::from_value(value)?;
        debug!(name, available = availability.name_available, "Name availability");
        Ok(availability)
    }

    async fn create_account(
        &self,
        request: &StorageAccountCreateRequest,
    ) -> Result<StorageAccountProperties> {
        let url = self.account_url(&request.resource_group, &request.name, None);
        info!(
            name = %request.name,
            resource_group = %request.resource_group,
            location = %request.location,
            sku = %request.sku,
            "Creating storage account"
        );

        let response = self.arm.put_json(&url, &request.to_arm_body()).await?;
        self.arm.wait_for_completion(response).await?;

        self.get_account(&request.resource_group, &request.name).await
    }

    async fn get_account(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<StorageAccountProperties> {
        let url = self.account_url(resource_group, name, None);
        let body = self
            .arm
            .get_json(&url)
            .await
            .map_err(|e| Self::not_found_as_missing(name, e))?;
        StorageAccountProperties::from_arm(&body)
    }

    async fn list_accounts(
        &self,
        resource_group: Option<String>,
    ) -> Result<Vec<StorageAccountProperties>> {
        let scope = match &resource_group {
            Some(rg) => ResourceId::resource_group(&self.subscription_id, rg),
            None => ResourceId::subscription(&self.subscription_id),
        };
        let path = format!("{}/providers/{}/storageAccounts", scope, STORAGE_NAMESPACE);
        let url = self.arm.url(&path, STORAGE_API_VERSION);

        let items = self.arm.list_all(&url).await?;
        let accounts = items
            .iter()
            .filter_map(|item| match StorageAccountProperties::from_arm(item) {
                Ok(account) => Some(account),
                Err(e) => {
                    warn!(error = %e, "Skipping storage account that could not be parsed");
                    None
                }
            })
            .collect();
        Ok(accounts)
    }

    async fn update_sku(
        &self,
        resource_group: &str,
        name: &str,
        sku: StorageSku,
    ) -> Result<StorageAccountProperties> {
        let url = self.account_url(resource_group, name, None);
        let body = json!({ "sku": { "name": sku.as_str() } });

        let response = self
            .arm
            .patch_json(&url, &body)
            .await
            .map_err(|e| Self::not_found_as_missing(name, e))?;

        match self.arm.wait_for_completion(response).await? {
            Some(value) if value.get("sku").is_some() => StorageAccountProperties::from_arm(&value),
            _ => self.get_account(resource_group, name).await,
        }
    }

    async fn list_keys(&self, resource_group: &str, name: &str) -> Result<Vec<StorageAccountKey>> {
        let url = self.account_url(resource_group, name, Some("listKeys"));
        let response = self
            .arm
            .post_json(&url, None)
            .await
            .map_err(|e| Self::not_found_as_missing(name, e))?;
        let body = response
            .body
            .ok_or_else(|| AcctctlError::serialization("Empty response from listKeys"))?;
        StorageAccountKey::list_from_arm(&body)
    }

    async fn regenerate_key(
        &self,
        resource_group: &str,
        name: &str,
        key_name: AccountKeyName,
    ) -> Result<Vec<StorageAccountKey>> {
        let url = self.account_url(resource_group, name, Some("regenerateKey"));
        let body = json!({ "keyName": key_name.as_str() });
        info!(account = name, key = %key_name, "Regenerating account key");

        let response = self
            .arm
            .post_json(&url, Some(&body))
            .await
            .map_err(|e| Self::not_found_as_missing(name, e))?;
        let body = response
            .body
            .ok_or_else(|| AcctctlError::serialization("Empty response from regenerateKey"))?;
        StorageAccountKey::list_from_arm(&body)
    }

    async fn failover(
        &self,
        resource_group: &str,
        name: &str,
        failover_type: FailoverType,
    ) -> Result<()> {
        let action = match failover_type {
            FailoverType::Planned => "failover?failoverType=Planned",
            FailoverType::Unplanned => "failover",
        };
        let url = self.account_url(resource_group, name, Some(action));
        info!(account = name, %failover_type, "Starting account failover");

        let response = self
            .arm
            .post_json(&url, None)
            .await
            .map_err(|e| Self::not_found_as_missing(name, e))?;
        self.arm.wait_for_completion(response).await?;
        Ok(())
    }

    async fn delete_account(&self, resource_group: &str, name: &str) -> Result<()> {
        let url = self.account_url(resource_group, name, None);
        let response = self
            .arm
            .delete(&url)
            .await
            .map_err(|e| Self::not_found_as_missing(name, e))?;

        if response.is_long_running() {
            info!(account = name, "Waiting for storage account deletion");
            self.arm.wait_for_completion(response).await?;
            info!(account = name, "Storage account deleted");
            return Ok(());
        }

        match response.status {
            200 | 204 => {
                info!(account = name, "Storage account deleted");
                Ok(())
            }
            status => Err(AcctctlError::azure_api(
                status,
                None,
                format!("Unexpected status deleting storage account '{}'", name),
            )),
        }
    }
}
