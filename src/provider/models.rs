//! Resource provider data models

use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Namespace of the storage resource provider
pub const STORAGE_NAMESPACE: &str = "Microsoft.Storage";

/// Registration state of a resource provider within a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegistrationState {
    Registered,
    NotRegistered,
    Registering,
    Unregistering,
    Unknown(String),
}

impl RegistrationState {
    pub fn as_str(&self) -> &str {
        match self {
            RegistrationState::Registered => "Registered",
            RegistrationState::NotRegistered => "NotRegistered",
            RegistrationState::Registering => "Registering",
            RegistrationState::Unregistering => "Unregistering",
            RegistrationState::Unknown(raw) => raw,
        }
    }
}

impl Default for RegistrationState {
    fn default() -> Self {
        RegistrationState::Unknown("Unknown".to_string())
    }
}

impl From<&str> for RegistrationState {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "registered" => RegistrationState::Registered,
            "notregistered" => RegistrationState::NotRegistered,
            "registering" => RegistrationState::Registering,
            "unregistering" => RegistrationState::Unregistering,
            _ => RegistrationState::Unknown(value.to_string()),
        }
    }
}

impl From<String> for RegistrationState {
    fn from(value: String) -> Self {
        RegistrationState::from(value.as_str())
    }
}

impl From<RegistrationState> for String {
    fn from(state: RegistrationState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource provider as reported by Resource Manager
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct ResourceProvider {
    #[tabled(skip)]
    #[serde(default)]
    pub id: Option<String>,
    #[tabled(rename = "Namespace")]
    pub namespace: String,
    #[tabled(rename = "Registration State")]
    #[serde(default)]
    pub registration_state: RegistrationState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_state_parsing_is_case_insensitive() {
        assert_eq!(
            RegistrationState::from("NotRegistered"),
            RegistrationState::NotRegistered
        );
        assert_eq!(
            RegistrationState::from("registered"),
            RegistrationState::Registered
        );
        assert_eq!(
            RegistrationState::from("Pending"),
            RegistrationState::Unknown("Pending".to_string())
        );
        assert_eq!(RegistrationState::from("Pending").to_string(), "Pending");
    }

    #[test]
    fn test_provider_deserializes_from_arm_json() {
        let json = serde_json::json!({
            "id": "/subscriptions/sub/providers/Microsoft.Storage",
            "namespace": "Microsoft.Storage",
            "registrationState": "Registering",
            "resourceTypes": []
        });
        let provider: ResourceProvider = serde_json::from_value(json).unwrap();
        assert_eq!(provider.namespace, STORAGE_NAMESPACE);
        assert_eq!(provider.registration_state, RegistrationState::Registering);
    }
}
