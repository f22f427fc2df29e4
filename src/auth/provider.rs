//! Authentication provider trait and implementations
//!
//! This module defines the authentication provider trait and provides
//! implementations for the credential sources acctctl understands.

use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_identity::{ClientSecretCredential, DefaultAzureCredential, TokenCredentialOptions};
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{AcctctlError, Result};

const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Trait for Azure authentication providers
#[async_trait]
pub trait AzureAuthProvider: Send + Sync {
    /// Get an access token for the specified scopes
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;

    /// Get the tenant ID
    async fn get_tenant_id(&self) -> Result<String>;
}

/// Default Azure Credential Provider using DefaultAzureCredential
pub struct DefaultAzureCredentialProvider {
    credential: Arc<DefaultAzureCredential>,
    tenant_id: Option<String>,
}

impl DefaultAzureCredentialProvider {
    /// Create a new DefaultAzureCredentialProvider
    pub fn new() -> Result<Self> {
        let credential = Arc::new(
            DefaultAzureCredential::create(TokenCredentialOptions::default()).map_err(|e| {
                AcctctlError::authentication(format!(
                    "Failed to create DefaultAzureCredential: {}",
                    e
                ))
            })?,
        );

        Ok(Self {
            credential,
            tenant_id: None,
        })
    }

    /// Create a new DefaultAzureCredentialProvider bound to a known tenant
    pub fn with_tenant(tenant_id: String) -> Result<Self> {
        let mut provider = Self::new()?;
        provider.tenant_id = Some(tenant_id);
        Ok(provider)
    }
}

#[async_trait]
impl AzureAuthProvider for DefaultAzureCredentialProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        debug!(?scopes, "Requesting token from DefaultAzureCredential");
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| AcctctlError::authentication(format!("Failed to get token: {}", e)))
    }

    async fn get_tenant_id(&self) -> Result<String> {
        self.tenant_id.clone().ok_or_else(|| {
            AcctctlError::authentication(
                "Tenant ID is not known; set AZURE_TENANT_ID or tenant_id in the config file",
            )
        })
    }
}

/// Client Secret Authentication Provider
pub struct ClientSecretProvider {
    credential: Arc<ClientSecretCredential>,
    tenant_id: String,
}

impl ClientSecretProvider {
    /// Create a new ClientSecretProvider
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Result<Self> {
        let authority_url = url::Url::parse(DEFAULT_AUTHORITY_HOST)
            .map_err(|e| AcctctlError::config(format!("Invalid authority URL: {}", e)))?;

        let credential = Arc::new(ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority_url,
            tenant_id.clone(),
            client_id,
            client_secret,
        ));

        Ok(Self {
            credential,
            tenant_id,
        })
    }
}

#[async_trait]
impl AzureAuthProvider for ClientSecretProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        debug!(?scopes, "Requesting token with client secret");
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| AcctctlError::authentication(format!("Failed to get token: {}", e)))
    }

    async fn get_tenant_id(&self) -> Result<String> {
        Ok(self.tenant_id.clone())
    }
}

/// Provider for a pre-issued bearer token (e.g. `az account get-access-token`)
pub struct StaticTokenProvider {
    token: String,
    tenant_id: Option<String>,
    expires_on: OffsetDateTime,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            tenant_id: None,
            expires_on: OffsetDateTime::now_utc() + time::Duration::hours(1),
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

#[async_trait]
impl AzureAuthProvider for StaticTokenProvider {
    async fn get_token(&self, _scopes: &[&str]) -> Result<AccessToken> {
        if self.token.trim().is_empty() {
            return Err(AcctctlError::authentication("Access token is empty"));
        }
        Ok(AccessToken::new(self.token.clone(), self.expires_on))
    }

    async fn get_tenant_id(&self) -> Result<String> {
        self.tenant_id
            .clone()
            .ok_or_else(|| AcctctlError::authentication("Tenant ID is not known for static token"))
    }
}

/// Authentication provider factory
pub struct AuthProviderFactory;

impl AuthProviderFactory {
    /// Create an authentication provider based on configuration
    pub fn create_provider(
        provider_type: &str,
        config: &HashMap<String, String>,
    ) -> Result<Arc<dyn AzureAuthProvider>> {
        match provider_type.to_lowercase().as_str() {
            "default" | "defaultazurecredential" => {
                if let Some(tenant_id) = config.get("tenant_id").filter(|t| !t.is_empty()) {
                    Ok(Arc::new(DefaultAzureCredentialProvider::with_tenant(
                        tenant_id.clone(),
                    )?))
                } else {
                    Ok(Arc::new(DefaultAzureCredentialProvider::new()?))
                }
            }
            "clientsecret" | "client_secret" => {
                let tenant_id = required(config, "tenant_id", "client secret")?;
                let client_id = required(config, "client_id", "client secret")?;
                let client_secret = required(config, "client_secret", "client secret")?;

                Ok(Arc::new(ClientSecretProvider::new(
                    tenant_id,
                    client_id,
                    client_secret,
                )?))
            }
            "token" => {
                let token = required(config, "access_token", "token")?;
                let mut provider = StaticTokenProvider::new(token);
                if let Some(tenant_id) = config.get("tenant_id").filter(|t| !t.is_empty()) {
                    provider = provider.with_tenant(tenant_id.clone());
                }
                Ok(Arc::new(provider))
            }
            _ => Err(AcctctlError::config(format!(
                "Unsupported authentication provider: {}",
                provider_type
            ))),
        }
    }
}

fn required(config: &HashMap<String, String>, key: &str, method: &str) -> Result<String> {
    config
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| {
            AcctctlError::config(format!("{key} is required for {method} authentication"))
        })
}
