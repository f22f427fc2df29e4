//! End-to-end walkthrough through the manager against a fake endpoint

mod common;

use std::sync::Arc;

use acctctl::auth::provider::StaticTokenProvider;
use acctctl::error::AcctctlError;
use acctctl::storage::manager::{StorageAccountManager, WalkthroughOptions};
use acctctl::storage::models::{StorageAccountCreateRequest, StorageSku};
use acctctl::utils::format::OutputFormat;
use common::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(server: &MockServer) -> StorageAccountManager {
    StorageAccountManager::new(
        Arc::new(StaticTokenProvider::new(TOKEN)),
        SUB.to_string(),
        arm_options(server),
        true,
    )
    .unwrap()
}

async fn mount_name_check(server: &MockServer, available: bool) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/subscriptions/{SUB}/providers/Microsoft.Storage/checkNameAvailability"
        )))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "nameAvailable": available })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_walkthrough_against_fake_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/subscriptions/{SUB}/providers/Microsoft.Storage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_json("Registered")))
        .expect(1)
        .mount(&server)
        .await;
    mount_name_check(&server, true).await;
    Mock::given(method("PUT"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_LRS")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_LRS")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/subscriptions/{SUB}/providers/Microsoft.Storage/storageAccounts"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                account_json(ACCOUNT, "Standard_LRS"),
                account_json("elsewhere01", "Standard_ZRS")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/subscriptions/{SUB}/resourceGroups/{RG}/providers/Microsoft.Storage/storageAccounts"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [account_json(ACCOUNT, "Standard_LRS")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/listKeys", account_path(ACCOUNT))))
        .respond_with(ResponseTemplate::new(200).set_body_json(keys_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/regenerateKey", account_path(ACCOUNT))))
        .and(body_json(json!({ "keyName": "key1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(keys_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(account_path(ACCOUNT)))
        .and(body_json(json!({ "sku": { "name": "Standard_GRS" } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_GRS")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut options = WalkthroughOptions::new(StorageAccountCreateRequest::new(ACCOUNT, RG));
    options.assume_yes = true;
    options.show_progress = false;

    let report = manager(&server).run_walkthrough(options).await.unwrap();
    assert_eq!(report.account, ACCOUNT);
    assert_eq!(report.resource_group, RG);
    assert_eq!(report.subscription_accounts, 2);
    assert_eq!(report.resource_group_accounts, 1);
    assert_eq!(report.previous_sku, StorageSku::StandardLrs);
    assert_eq!(report.current_sku, StorageSku::StandardGrs);
    assert!(report.deleted);
}

#[tokio::test]
async fn test_taken_name_stops_before_create() {
    let server = MockServer::start().await;
    mount_name_check(&server, false).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = StorageAccountCreateRequest::new(ACCOUNT, RG);
    let result = manager(&server)
        .create_account_with_defaults(&request, OutputFormat::Json)
        .await;
    assert!(matches!(result, Err(AcctctlError::NameUnavailable { .. })));
}

#[tokio::test]
async fn test_invalid_name_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = StorageAccountCreateRequest::new("Invalid_Name!", RG);
    let result = manager(&server)
        .create_account_with_defaults(&request, OutputFormat::Json)
        .await;
    assert!(matches!(result, Err(AcctctlError::InvalidAccountName { .. })));
}

#[tokio::test]
async fn test_update_sku_reports_old_and_new() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_LRS")),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_RAGRS")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let change = manager(&server)
        .update_sku(RG, ACCOUNT, StorageSku::StandardRagrs)
        .await
        .unwrap();
    assert_eq!(change, (StorageSku::StandardLrs, StorageSku::StandardRagrs));
}
