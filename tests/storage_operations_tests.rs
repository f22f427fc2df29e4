//! Storage account operations against a fake Resource Manager endpoint
//!
//! Covers request shapes, long-running operation polling, pagination
//! and error mapping.

mod common;

use std::sync::Arc;
use std::time::Duration;

use acctctl::arm::client::{ArmClient, ArmClientOptions};
use acctctl::auth::provider::StaticTokenProvider;
use acctctl::error::AcctctlError;
use acctctl::storage::models::{
    AccountKeyName, FailoverType, StorageAccountCreateRequest, StorageSku,
};
use acctctl::storage::operations::{AzureStorageAccountOperations, StorageAccountOperations};
use common::*;
use serde_json::json;
use wiremock::matchers::{
    body_json, body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ops(server: &MockServer) -> AzureStorageAccountOperations {
    AzureStorageAccountOperations::new(arm_client(server), SUB.to_string())
}

fn ops_with(options: ArmClientOptions) -> AzureStorageAccountOperations {
    let arm = ArmClient::new(Arc::new(StaticTokenProvider::new(TOKEN)), options).unwrap();
    AzureStorageAccountOperations::new(Arc::new(arm), SUB.to_string())
}

#[tokio::test]
async fn test_check_name_availability_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!(
            "/subscriptions/{SUB}/providers/Microsoft.Storage/checkNameAvailability"
        )))
        .and(query_param("api-version", "2023-01-01"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "name": ACCOUNT,
            "type": "Microsoft.Storage/storageAccounts"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nameAvailable": false,
            "reason": "AlreadyExists",
            "message": "The storage account named mystorage01 is already taken."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let availability = ops(&server).check_name_availability(ACCOUNT).await.unwrap();
    assert!(!availability.name_available);
    assert_eq!(availability.reason.as_deref(), Some("AlreadyExists"));
}

#[tokio::test]
async fn test_create_polls_location_until_done() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/create-1", server.uri());

    Mock::given(method("PUT"))
        .and(path(account_path(ACCOUNT)))
        .and(body_partial_json(json!({
            "sku": { "name": "Standard_LRS" },
            "kind": "StorageV2",
            "location": "eastus",
            "properties": { "accessTier": "Cool", "allowSharedKeyAccess": false }
        })))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", operation_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/create-1"))
        .respond_with(ResponseTemplate::new(202).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/create-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_LRS")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = StorageAccountCreateRequest::new(ACCOUNT, RG);
    let account = ops(&server).create_account(&request).await.unwrap();
    assert_eq!(account.name, ACCOUNT);
    assert_eq!(account.resource_group, RG);
    assert_eq!(account.sku, StorageSku::StandardLrs);
}

#[tokio::test]
async fn test_create_reports_failed_async_operation() {
    let server = MockServer::start().await;
    let status_url = format!("{}/asyncoperations/op-9", server.uri());

    Mock::given(method("PUT"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Azure-AsyncOperation", status_url.as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/asyncoperations/op-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Failed" })))
        .mount(&server)
        .await;

    let request = StorageAccountCreateRequest::new(ACCOUNT, RG);
    let result = ops(&server).create_account(&request).await;
    assert!(matches!(result, Err(AcctctlError::OperationFailed { .. })));
}

#[tokio::test]
async fn test_list_follows_next_link_and_skips_bad_items() {
    let server = MockServer::start().await;
    let next = format!("{}/pages/2", server.uri());

    Mock::given(method("GET"))
        .and(path(format!(
            "/subscriptions/{SUB}/providers/Microsoft.Storage/storageAccounts"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [account_json("first01", "Standard_LRS")],
            "nextLink": next
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pages/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                account_json("second02", "Standard_GRS"),
                { "name": "broken" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = ops(&server).list_accounts(None).await.unwrap();
    let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["first01", "second02"]);
}

#[tokio::test]
async fn test_list_scoped_to_resource_group() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/subscriptions/{SUB}/resourceGroups/{RG}/providers/Microsoft.Storage/storageAccounts"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = ops(&server).list_accounts(Some(RG.to_string())).await.unwrap();
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn test_get_missing_account_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(account_path("ghost01")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": "ResourceNotFound",
                "message": "The Resource 'Microsoft.Storage/storageAccounts/ghost01' was not found."
            }
        })))
        .mount(&server)
        .await;

    let result = ops(&server).get_account(RG, "ghost01").await;
    match result {
        Err(AcctctlError::StorageAccountNotFound { name }) => assert_eq!(name, "ghost01"),
        other => panic!("expected StorageAccountNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_update_sku_patches_only_the_sku() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(account_path(ACCOUNT)))
        .and(body_json(json!({ "sku": { "name": "Standard_GRS" } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_GRS")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let account = ops(&server)
        .update_sku(RG, ACCOUNT, StorageSku::StandardGrs)
        .await
        .unwrap();
    assert_eq!(account.sku, StorageSku::StandardGrs);
}

#[tokio::test]
async fn test_list_and_regenerate_keys() {
    let server = MockServer::start().await;
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

    let ops = ops(&server);
    let keys = ops.list_keys(RG, ACCOUNT).await.unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].key_name, "key1");
    assert_eq!(keys[1].value.as_str(), "a2V5Mi12YWx1ZQ==");

    let regenerated = ops
        .regenerate_key(RG, ACCOUNT, AccountKeyName::Key1)
        .await
        .unwrap();
    assert_eq!(regenerated.len(), 2);
}

#[tokio::test]
async fn test_planned_failover_waits_for_completion() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/failover-1", server.uri());

    Mock::given(method("POST"))
        .and(path(format!("{}/failover", account_path(ACCOUNT))))
        .and(query_param("failoverType", "Planned"))
        .and(query_param("api-version", "2023-01-01"))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", operation_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/failover-1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    ops(&server)
        .failover(RG, ACCOUNT, FailoverType::Planned)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_accepts_200_and_204() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(account_path("gone01")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(account_path("gone02")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ops = ops(&server);
    ops.delete_account(RG, "gone01").await.unwrap();
    ops.delete_account(RG, "gone02").await.unwrap();
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_LRS")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let account = ops(&server).get_account(RG, ACCOUNT).await.unwrap();
    assert_eq!(account.name, ACCOUNT);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": "InvalidValuesForRequestParameters",
                "message": "Values for request parameters are invalid: sku.name."
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = ops(&server)
        .update_sku(RG, ACCOUNT, StorageSku::PremiumZrs)
        .await;
    match result {
        Err(AcctctlError::AzureApiError { status, code, .. }) => {
            assert_eq!(status, 400);
            assert_eq!(code.as_deref(), Some("InvalidValuesForRequestParameters"));
        }
        other => panic!("expected AzureApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_async_operation_in_progress_then_succeeded() {
    let server = MockServer::start().await;
    let status_url = format!("{}/asyncoperations/op-1", server.uri());

    Mock::given(method("PUT"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(201).insert_header("Azure-AsyncOperation", status_url.as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/asyncoperations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "InProgress" })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/asyncoperations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Succeeded" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(account_json(ACCOUNT, "Standard_LRS")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = StorageAccountCreateRequest::new(ACCOUNT, RG);
    let account = ops(&server).create_account(&request).await.unwrap();
    assert_eq!(account.name, ACCOUNT);
}

#[tokio::test]
async fn test_canceled_operation_reports_service_error() {
    let server = MockServer::start().await;
    let status_url = format!("{}/asyncoperations/op-2", server.uri());

    Mock::given(method("PUT"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(202).insert_header("Azure-AsyncOperation", status_url.as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/asyncoperations/op-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Canceled",
            "error": {
                "code": "OperationCanceled",
                "message": "The operation was canceled."
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = StorageAccountCreateRequest::new(ACCOUNT, RG);
    match ops(&server).create_account(&request).await {
        Err(AcctctlError::OperationFailed { status, detail }) => {
            assert_eq!(status, "Canceled");
            assert_eq!(
                detail.as_deref(),
                Some("OperationCanceled: The operation was canceled.")
            );
        }
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_operation_exceeding_max_wait_times_out() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/slow-1", server.uri());

    Mock::given(method("POST"))
        .and(path(format!("{}/failover", account_path(ACCOUNT))))
        .respond_with(ResponseTemplate::new(202).insert_header("Location", operation_url.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/slow-1"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let ops = ops_with(ArmClientOptions {
        poll_interval: Duration::from_millis(20),
        max_wait: Duration::from_millis(200),
        ..arm_options(&server)
    });
    let result = ops.failover(RG, ACCOUNT, FailoverType::Unplanned).await;
    assert!(matches!(result, Err(AcctctlError::Timeout(_))));
}

#[tokio::test]
async fn test_retry_after_overrides_poll_interval() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/quick-1", server.uri());

    Mock::given(method("POST"))
        .and(path(format!("{}/failover", account_path(ACCOUNT))))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", operation_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/quick-1"))
        .respond_with(ResponseTemplate::new(202).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/quick-1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let ops = ops_with(ArmClientOptions {
        poll_interval: Duration::from_secs(60),
        max_wait: Duration::from_secs(120),
        ..arm_options(&server)
    });
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        ops.failover(RG, ACCOUNT, FailoverType::Planned),
    )
    .await
    .expect("Retry-After: 0 should not wait for the poll interval");
    result.unwrap();
}

#[tokio::test]
async fn test_unplanned_failover_sends_no_failover_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/failover", account_path(ACCOUNT))))
        .and(query_param("api-version", "2023-01-01"))
        .and(query_param_is_missing("failoverType"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    ops(&server)
        .failover(RG, ACCOUNT, FailoverType::Unplanned)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_accepted_delete_is_polled_to_completion() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/delete-1", server.uri());

    Mock::given(method("DELETE"))
        .and(path(account_path(ACCOUNT)))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", operation_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/delete-1"))
        .respond_with(ResponseTemplate::new(202).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/operations/delete-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    ops(&server).delete_account(RG, ACCOUNT).await.unwrap();
}
