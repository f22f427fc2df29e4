use azure_core::error::ErrorKind;
use thiserror::Error;

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(", {c}"))
        .unwrap_or_default()
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Main error type for acctctl operations
#[derive(Debug, Error)]
pub enum AcctctlError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error (HTTP {status}{suffix}): {message}", suffix = code_suffix(.code))]
    AzureApiError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage account not found: {name}")]
    StorageAccountNotFound { name: String },

    #[error("Invalid storage account name '{name}': {reason}")]
    InvalidAccountName { name: String, reason: String },

    #[error("Storage account name '{name}' is not available: {reason}")]
    NameUnavailable { name: String, reason: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timed out: {0}")]
    ConnectionTimeout(String),

    #[error("DNS resolution failed for '{host}': {details}")]
    DnsResolutionError { host: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error(
        "Long-running operation ended with status '{status}'{suffix}",
        suffix = detail_suffix(.detail)
    )]
    OperationFailed {
        status: String,
        detail: Option<String>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AcctctlError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(status: u16, code: Option<String>, message: S) -> Self {
        Self::AzureApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn account_not_found<S: Into<String>>(name: S) -> Self {
        Self::StorageAccountNotFound { name: name.into() }
    }

    pub fn invalid_account_name<S: Into<String>, R: Into<String>>(name: S, reason: R) -> Self {
        Self::InvalidAccountName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn name_unavailable<S: Into<String>, R: Into<String>>(name: S, reason: R) -> Self {
        Self::NameUnavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn connection_timeout<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionTimeout(msg.into())
    }

    pub fn dns_resolution<S: Into<String>>(host: S, details: S) -> Self {
        Self::DnsResolutionError {
            host: host.into(),
            details: details.into(),
        }
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn operation_failed<S: Into<String>>(status: S, detail: Option<String>) -> Self {
        Self::OperationFailed {
            status: status.into(),
            detail,
        }
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn unknown<S: Into<String>>(msg: S) -> Self {
        Self::Unknown(msg.into())
    }

    /// HTTP status carried by an Azure API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AzureApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for acctctl operations
pub type Result<T> = std::result::Result<T, AcctctlError>;

/// Convert Azure Core errors to AcctctlError
///
/// Only token acquisition goes through azure_core; control-plane calls use
/// reqwest directly. HTTP and credential failures therefore surface as
/// authentication errors.
impl From<azure_core::Error> for AcctctlError {
    fn from(error: azure_core::Error) -> Self {
        match error.kind() {
            ErrorKind::Io => Self::NetworkError(error.to_string()),
            ErrorKind::DataConversion => Self::SerializationError(error.to_string()),
            _ => Self::AuthenticationError(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_api_error_display_includes_code() {
        let err = AcctctlError::azure_api(409, Some("Conflict".to_string()), "already exists");
        assert_eq!(
            err.to_string(),
            "Azure API error (HTTP 409, Conflict): already exists"
        );
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_azure_api_error_display_without_code() {
        let err = AcctctlError::azure_api(500, None, "boom");
        assert_eq!(err.to_string(), "Azure API error (HTTP 500): boom");
    }

    #[test]
    fn test_operation_failed_carries_service_detail() {
        let err = AcctctlError::operation_failed(
            "Failed",
            Some("StorageAccountAlreadyTaken: name is taken".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Long-running operation ended with status 'Failed': StorageAccountAlreadyTaken: name is taken"
        );
        let bare = AcctctlError::operation_failed("Canceled", None);
        assert_eq!(
            bare.to_string(),
            "Long-running operation ended with status 'Canceled'"
        );
    }

    #[test]
    fn test_azure_core_errors_map_by_kind() {
        let io = azure_core::Error::message(ErrorKind::Io, "connection reset");
        assert!(matches!(AcctctlError::from(io), AcctctlError::NetworkError(_)));

        let data = azure_core::Error::message(ErrorKind::DataConversion, "bad token json");
        assert!(matches!(
            AcctctlError::from(data),
            AcctctlError::SerializationError(_)
        ));

        let credential = azure_core::Error::message(ErrorKind::Credential, "no credential");
        assert!(matches!(
            AcctctlError::from(credential),
            AcctctlError::AuthenticationError(_)
        ));
    }

    #[test]
    fn test_non_api_error_has_no_status() {
        assert_eq!(AcctctlError::config("x").status(), None);
    }
}
