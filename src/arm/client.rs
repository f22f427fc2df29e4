//! Azure Resource Manager HTTP client
//!
//! Handles authorization headers, error-body parsing, retries, long-running
//! operation polling and `nextLink` pagination for control-plane calls.

use reqwest::header::{
    HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, LOCATION, RETRY_AFTER,
};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::provider::AzureAuthProvider;
use crate::error::{AcctctlError, Result};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};
use crate::utils::retry::{retry_with_backoff, RetryOptions};

pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

/// Tunables for the ARM client
#[derive(Debug, Clone)]
pub struct ArmClientOptions {
    pub endpoint: String,
    pub retry: RetryOptions,
    /// Poll interval when the service sends no `Retry-After`
    pub poll_interval: Duration,
    /// Upper bound on waiting for a long-running operation
    pub max_wait: Duration,
}

impl Default for ArmClientOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ARM_ENDPOINT.to_string(),
            retry: RetryOptions::default(),
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(600),
        }
    }
}

/// A completed ARM response with its body already read
#[derive(Debug, Clone)]
pub struct ArmResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl ArmResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Whether the service accepted the request but has not finished it
    pub fn is_long_running(&self) -> bool {
        matches!(self.status, 201 | 202)
            && (self.header(AZURE_ASYNC_OPERATION).is_some()
                || self.headers.get(LOCATION).is_some())
    }
}

/// Client for the Resource Manager control plane
pub struct ArmClient {
    auth_provider: Arc<dyn AzureAuthProvider>,
    http_client: Client,
    options: ArmClientOptions,
}

impl ArmClient {
    pub fn new(
        auth_provider: Arc<dyn AzureAuthProvider>,
        options: ArmClientOptions,
    ) -> Result<Self> {
        let http_client = create_http_client(&NetworkConfig::default())?;

        Ok(Self {
            auth_provider,
            http_client,
            options,
        })
    }

    pub fn options(&self) -> &ArmClientOptions {
        &self.options
    }

    fn endpoint(&self) -> &str {
        self.options.endpoint.trim_end_matches('/')
    }

    /// Build a full URL for an ARM path, appending `api-version`
    pub fn url(&self, path: &str, api_version: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}api-version={}",
            self.endpoint(),
            path,
            separator,
            api_version
        )
    }

    async fn get_management_token(&self) -> Result<String> {
        let scope = format!("{}/.default", self.endpoint());
        let token = self.auth_provider.get_token(&[scope.as_str()]).await?;
        Ok(token.token.secret().to_string())
    }

    async fn create_headers(&self) -> Result<HeaderMap> {
        let token = self.get_management_token().await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                AcctctlError::authentication(format!("Invalid token format: {}", e))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            CLIENT_REQUEST_ID,
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .map_err(|e| AcctctlError::unknown(format!("Invalid request id: {}", e)))?,
        );
        Ok(headers)
    }

    /// Turn an ARM error body into an error
    fn parse_azure_error(status: u16, body: &str) -> AcctctlError {
        if let Ok(error_json) = serde_json::from_str::<Value>(body) {
            if let Some(error) = error_json.get("error") {
                let code = error
                    .get("code")
                    .and_then(|c| c.as_str())
                    .map(|c| c.to_string());
                if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
                    return AcctctlError::azure_api(status, code, message);
                }
            }
        }

        let message = if body.trim().is_empty() {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("no response body")
                .to_string()
        } else {
            body.to_string()
        };
        AcctctlError::azure_api(status, None, message)
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ArmResponse> {
        let headers = self.create_headers().await?;
        debug!(%method, url, "ARM request");

        let mut request = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| classify_network_error(&e, url))?;
        debug!(status, url, "ARM response");

        if !(200..300).contains(&status) {
            return Err(Self::parse_azure_error(status, &text));
        }

        let body = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(&text).map_err(|e| {
                AcctctlError::serialization(format!("Failed to parse response from {}: {}", url, e))
            })?)
        };

        Ok(ArmResponse {
            status,
            headers,
            body,
        })
    }

    /// Send a request, retrying transient failures
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ArmResponse> {
        retry_with_backoff(
            || self.send_once(method.clone(), url, body),
            self.options.retry.clone(),
        )
        .await
    }

    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.request(Method::GET, url, None).await?;
        response
            .body
            .ok_or_else(|| AcctctlError::serialization(format!("Empty response body from {}", url)))
    }

    pub async fn put_json(&self, url: &str, body: &Value) -> Result<ArmResponse> {
        self.request(Method::PUT, url, Some(body)).await
    }

    pub async fn patch_json(&self, url: &str, body: &Value) -> Result<ArmResponse> {
        self.request(Method::PATCH, url, Some(body)).await
    }

    pub async fn post_json(&self, url: &str, body: Option<&Value>) -> Result<ArmResponse> {
        self.request(Method::POST, url, body).await
    }

    pub async fn delete(&self, url: &str) -> Result<ArmResponse> {
        self.request(Method::DELETE, url, None).await
    }

    /// Wait for a long-running operation started by `response` to finish
    ///
    /// Returns the final body when the service provides one. Responses that
    /// are not long-running are returned as they are.
    pub async fn wait_for_completion(&self, response: ArmResponse) -> Result<Option<Value>> {
        if !response.is_long_running() {
            return Ok(response.body);
        }

        let started = Instant::now();
        let mut delay = response.retry_after().unwrap_or(self.options.poll_interval);

        if let Some(async_url) = response.header(AZURE_ASYNC_OPERATION).map(str::to_string) {
            info!(url = %async_url, "Waiting for long-running operation");
            loop {
                self.sleep_within_budget(started, delay).await?;
                let poll = self.request(Method::GET, &async_url, None).await?;
                let status = poll
                    .body
                    .as_ref()
                    .and_then(|b| b.get("status"))
                    .and_then(|s| s.as_str())
                    .unwrap_or("InProgress")
                    .to_string();
                debug!(%status, "Operation status");

                match status.as_str() {
                    "Succeeded" => return Ok(poll.body),
                    "Failed" | "Canceled" | "Cancelled" => {
                        let detail = poll.body.as_ref().and_then(operation_error_detail);
                        return Err(AcctctlError::operation_failed(status.clone(), detail));
                    }
                    _ => delay = poll.retry_after().unwrap_or(self.options.poll_interval),
                }
            }
        }

        let location = response
            .headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AcctctlError::serialization("Location header is not valid UTF-8"))?;
        info!(url = %location, "Waiting for long-running operation");
        loop {
            self.sleep_within_budget(started, delay).await?;
            let poll = self.request(Method::GET, &location, None).await?;
            if poll.status != 202 {
                return Ok(poll.body);
            }
            delay = poll.retry_after().unwrap_or(self.options.poll_interval);
        }
    }

    async fn sleep_within_budget(&self, started: Instant, delay: Duration) -> Result<()> {
        let elapsed = started.elapsed();
        if elapsed >= self.options.max_wait {
            return Err(AcctctlError::timeout(format!(
                "long-running operation did not finish within {}s",
                self.options.max_wait.as_secs()
            )));
        }
        sleep(delay.min(self.options.max_wait - elapsed)).await;
        Ok(())
    }

    /// GET a collection and follow `nextLink` until exhausted
    pub async fn list_all(&self, url: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next.take() {
            let page = self.get_json(&page_url).await?;
            if let Some(values) = page.get("value").and_then(|v| v.as_array()) {
                items.extend(values.iter().cloned());
            }
            next = page
                .get("nextLink")
                .and_then(|n| n.as_str())
                .filter(|n| !n.is_empty())
                .map(str::to_string);
        }

        debug!(count = items.len(), "Collected list results");
        Ok(items)
    }
}

/// `code: message` from the `error` object of a failed async operation
fn operation_error_detail(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    let code = error.get("code").and_then(|c| c.as_str());
    let message = error.get("message").and_then(|m| m.as_str());
    match (code, message) {
        (Some(code), Some(message)) => Some(format!("{code}: {message}")),
        (Some(text), None) | (None, Some(text)) => Some(text.to_string()),
        (None, None) => None,
    }
}
