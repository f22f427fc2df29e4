//! Resource provider lookup and registration

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::models::{RegistrationState, ResourceProvider};
use crate::arm::client::ArmClient;
use crate::error::{AcctctlError, Result};

pub const PROVIDER_API_VERSION: &str = "2021-04-01";

#[cfg(test)]
use mockall::automock;

/// Trait for resource provider operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderOperations: Send + Sync {
    /// Read a provider's registration in the subscription
    async fn get_provider(&self, namespace: &str) -> Result<ResourceProvider>;

    /// Start registering a provider in the subscription
    async fn register_provider(&self, namespace: &str) -> Result<ResourceProvider>;
}

/// Resource Manager implementation of provider operations
pub struct AzureProviderOperations {
    arm: Arc<ArmClient>,
    subscription_id: String,
}

impl AzureProviderOperations {
    pub fn new(arm: Arc<ArmClient>, subscription_id: String) -> Self {
        Self {
            arm,
            subscription_id,
        }
    }

    fn provider_path(&self, namespace: &str) -> String {
        format!("/subscriptions/{}/providers/{}", self.subscription_id, namespace)
    }
}

#[async_trait]
impl ProviderOperations for AzureProviderOperations {
    async fn get_provider(&self, namespace: &str) -> Result<ResourceProvider> {
        let url = self
            .arm
            .url(&self.provider_path(namespace), PROVIDER_API_VERSION);
        let body = self.arm.get_json(&url).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn register_provider(&self, namespace: &str) -> Result<ResourceProvider> {
        let path = format!("{}/register", self.provider_path(namespace));
        let url = self.arm.url(&path, PROVIDER_API_VERSION);
        let response = self.arm.post_json(&url, None).await?;

        match response.body {
            Some(body) => Ok(serde_json::from_value(body)?),
            None => self.get_provider(namespace).await,
        }
    }
}

/// Registers a provider only when it is not registered yet
pub struct ProviderRegistrar {
    ops: Arc<dyn ProviderOperations>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl ProviderRegistrar {
    pub fn new(
        ops: Arc<dyn ProviderOperations>,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            ops,
            poll_interval,
            max_wait,
        }
    }

    pub async fn get(&self, namespace: &str) -> Result<ResourceProvider> {
        self.ops.get_provider(namespace).await
    }

    /// Register `namespace` if its state is `NotRegistered`
    ///
    /// With `wait`, keeps polling while the provider is `Registering` until it
    /// reports `Registered` or `max_wait` passes.
    pub async fn ensure_registered(&self, namespace: &str, wait: bool) -> Result<ResourceProvider> {
        let mut provider = self.ops.get_provider(namespace).await?;
        debug!(namespace, state = %provider.registration_state, "Provider state");

        if provider.registration_state == RegistrationState::NotRegistered {
            info!(namespace, "Registering resource provider");
            provider = self.ops.register_provider(namespace).await?;
        }

        if !wait {
            return Ok(provider);
        }

        let started = Instant::now();
        while provider.registration_state == RegistrationState::Registering
            || provider.registration_state == RegistrationState::NotRegistered
        {
            if started.elapsed() >= self.max_wait {
                return Err(AcctctlError::timeout(format!(
                    "provider '{}' still {} after {}s",
                    namespace,
                    provider.registration_state,
                    self.max_wait.as_secs()
                )));
            }
            sleep(self.poll_interval).await;
            provider = self.ops.get_provider(namespace).await?;
            debug!(namespace, state = %provider.registration_state, "Polled provider state");
        }

        Ok(provider)
    }
}
