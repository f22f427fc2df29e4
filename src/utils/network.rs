use crate::error::{AcctctlError, Result};
use reqwest::Client;
use std::time::Duration;

/// Configuration for HTTP client with proper timeouts
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("acctctl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| AcctctlError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a transport-level reqwest error into a user-facing error
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> AcctctlError {
    let host = extract_host(url);

    if error.is_timeout() {
        return AcctctlError::connection_timeout(format!(
            "Request to '{}' timed out. The Resource Manager endpoint may be slow or unreachable.",
            host
        ));
    }

    if error.is_connect() {
        if is_dns_resolution_error(error) {
            return AcctctlError::dns_resolution(
                host.clone(),
                format!(
                    "Unable to resolve '{}'. Check the configured ARM endpoint and your network.",
                    host
                ),
            );
        }

        return AcctctlError::network(format!(
            "Failed to connect to '{}'. Please check your network connection.",
            host
        ));
    }

    let message = error.to_string().to_lowercase();
    if message.contains("certificate") || message.contains("tls") || message.contains("ssl") {
        return AcctctlError::network(format!(
            "TLS error when contacting '{}': {}",
            host, error
        ));
    }

    AcctctlError::network(format!(
        "Network error when contacting '{}': {}",
        host, error
    ))
}

fn is_dns_resolution_error(error: &reqwest::Error) -> bool {
    let error_msg = error.to_string().to_lowercase();
    let dns_indicators = [
        "dns",
        "name resolution",
        "failed to lookup",
        "name or service not known",
        "nodename nor servname provided",
        "no such host",
        "could not resolve host",
    ];

    dns_indicators
        .iter()
        .any(|&indicator| error_msg.contains(indicator))
}

fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "unknown-host".to_string())
}

/// HTTP statuses ARM documents as transient
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Check if an error is worth retrying
pub fn is_retryable_error(error: &AcctctlError) -> bool {
    match error {
        AcctctlError::ConnectionTimeout(_) => true,
        AcctctlError::NetworkError(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timed out")
                || msg_lower.contains("temporar")
                || msg_lower.contains("failed to connect")
        }
        AcctctlError::AzureApiError { status, .. } => is_retryable_status(*status),
        AcctctlError::DnsResolutionError { .. } => false,
        _ => false,
    }
}
