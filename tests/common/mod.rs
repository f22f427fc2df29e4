//! Shared fixtures for tests that run against a fake Resource Manager endpoint

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use acctctl::arm::client::{ArmClient, ArmClientOptions};
use acctctl::auth::provider::StaticTokenProvider;
use acctctl::utils::retry::RetryOptions;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const SUB: &str = "00000000-0000-0000-0000-000000000001";
pub const RG: &str = "rg-demo";
pub const ACCOUNT: &str = "mystorage01";
pub const TOKEN: &str = "test-token";

pub fn account_path(name: &str) -> String {
    format!(
        "/subscriptions/{SUB}/resourceGroups/{RG}/providers/Microsoft.Storage/storageAccounts/{name}"
    )
}

pub fn arm_options(server: &MockServer) -> ArmClientOptions {
    ArmClientOptions {
        endpoint: server.uri(),
        retry: RetryOptions {
            max_retries: 2,
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(20),
            multiplier: 2.0,
        },
        poll_interval: Duration::from_millis(10),
        max_wait: Duration::from_secs(5),
    }
}

pub fn arm_client(server: &MockServer) -> Arc<ArmClient> {
    Arc::new(
        ArmClient::new(Arc::new(StaticTokenProvider::new(TOKEN)), arm_options(server))
            .expect("client builds"),
    )
}

pub fn account_json(name: &str, sku: &str) -> Value {
    json!({
        "id": account_path(name),
        "name": name,
        "type": "Microsoft.Storage/storageAccounts",
        "location": "eastus",
        "kind": "StorageV2",
        "sku": { "name": sku, "tier": "Standard" },
        "tags": {},
        "properties": {
            "provisioningState": "Succeeded",
            "accessTier": "Cool",
            "allowSharedKeyAccess": false,
            "primaryLocation": "eastus",
            "secondaryLocation": "westus",
            "statusOfPrimary": "available",
            "creationTime": "2024-03-01T10:15:30.0000000Z",
            "primaryEndpoints": {
                "blob": format!("https://{name}.blob.core.windows.net/")
            }
        }
    })
}

pub fn keys_json() -> Value {
    json!({
        "keys": [
            { "keyName": "key1", "value": "a2V5MS12YWx1ZQ==", "permissions": "FULL" },
            { "keyName": "key2", "value": "a2V5Mi12YWx1ZQ==", "permissions": "FULL" }
        ]
    })
}

pub fn provider_json(state: &str) -> Value {
    json!({
        "id": format!("/subscriptions/{SUB}/providers/Microsoft.Storage"),
        "namespace": "Microsoft.Storage",
        "registrationState": state
    })
}
