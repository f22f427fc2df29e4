//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::arm::client::{ArmClientOptions, DEFAULT_ARM_ENDPOINT};
use crate::error::{AcctctlError, Result};
use crate::storage::models::{AccessTier, StorageAccountCreateRequest, StorageKind, StorageSku};
use crate::utils::retry::RetryOptions;
use crate::utils::validation::is_guid;

const APP_DIR: &str = "acctctl";
const CONFIG_FILE: &str = "acctctl.toml";

/// Keys accepted by `config set`
pub const CONFIG_KEYS: &[&str] = &[
    "debug",
    "subscription_id",
    "tenant_id",
    "client_id",
    "default_resource_group",
    "default_location",
    "default_sku",
    "default_kind",
    "default_access_tier",
    "auth_method",
    "arm_endpoint",
    "max_retries",
    "poll_interval_secs",
    "max_wait_secs",
    "output_json",
    "no_color",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub default_resource_group: String,
    pub default_location: String,
    pub default_sku: StorageSku,
    pub default_kind: StorageKind,
    pub default_access_tier: AccessTier,
    pub auth_method: String,
    pub arm_endpoint: String,
    pub max_retries: usize,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    pub output_json: bool,
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            subscription_id: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            default_resource_group: String::new(),
            default_location: "eastus".to_string(),
            default_sku: StorageSku::StandardLrs,
            default_kind: StorageKind::StorageV2,
            default_access_tier: AccessTier::Cool,
            auth_method: "default".to_string(),
            arm_endpoint: DEFAULT_ARM_ENDPOINT.to_string(),
            max_retries: 3,
            poll_interval_secs: 5,
            max_wait_secs: 600,
            output_json: false,
            no_color: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.subscription_id.is_empty() {
            return Err(AcctctlError::config(
                "Subscription ID is required. Set AZURE_SUBSCRIPTION_ID, pass --subscription, or run 'acctctl init'",
            ));
        }

        if !is_guid(&self.subscription_id) {
            return Err(AcctctlError::config(format!(
                "Subscription ID '{}' is not a GUID",
                self.subscription_id
            )));
        }

        if !self.tenant_id.is_empty() && !is_guid(&self.tenant_id) {
            return Err(AcctctlError::config(format!(
                "Tenant ID '{}' is not a GUID",
                self.tenant_id
            )));
        }

        if self.poll_interval_secs == 0 {
            return Err(AcctctlError::config("poll_interval_secs must be at least 1"));
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(xdg_config_home) if !xdg_config_home.is_empty() => PathBuf::from(xdg_config_home),
            _ => dirs::config_dir()
                .ok_or_else(|| AcctctlError::config("Unable to determine config directory"))?,
        };
        Ok(config_dir.join(APP_DIR).join(CONFIG_FILE))
    }

    pub async fn load() -> Result<Self> {
        load_config().await
    }

    pub async fn save(&self) -> Result<()> {
        save_config(self).await
    }

    /// Resolve the resource group: CLI argument, then config default
    pub fn resolve_resource_group(&self, rg_arg: Option<String>) -> Result<String> {
        if let Some(rg) = rg_arg.filter(|rg| !rg.is_empty()) {
            return Ok(rg);
        }

        if !self.default_resource_group.is_empty() {
            return Ok(self.default_resource_group.clone());
        }

        Err(AcctctlError::config(
            "No resource group specified. Use --resource-group or set default_resource_group",
        ))
    }

    /// Control-plane client tunables derived from this configuration
    pub fn arm_options(&self) -> ArmClientOptions {
        ArmClientOptions {
            endpoint: self.arm_endpoint.clone(),
            retry: RetryOptions {
                max_retries: self.max_retries,
                ..RetryOptions::default()
            },
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
        }
    }

    /// Settings handed to the auth provider factory
    ///
    /// Secrets come from the environment only and are never persisted.
    pub fn auth_settings(&self) -> HashMap<String, String> {
        let mut settings = HashMap::new();
        settings.insert("tenant_id".to_string(), self.tenant_id.clone());
        settings.insert("client_id".to_string(), self.client_id.clone());
        if let Ok(secret) = std::env::var("AZURE_CLIENT_SECRET") {
            settings.insert("client_secret".to_string(), secret);
        }
        if let Ok(token) = std::env::var("AZURE_ACCESS_TOKEN") {
            settings.insert("access_token".to_string(), token);
        }
        settings
    }

    /// Create request seeded with the configured defaults
    pub fn create_request(&self, name: &str, resource_group: &str) -> StorageAccountCreateRequest {
        StorageAccountCreateRequest {
            location: self.default_location.clone(),
            sku: self.default_sku,
            kind: self.default_kind,
            access_tier: Some(self.default_access_tier),
            ..StorageAccountCreateRequest::new(name, resource_group)
        }
    }

    /// Set a single value by key, as used by `config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "debug" => self.debug = parse_bool(key, value)?,
            "subscription_id" => self.subscription_id = value.to_string(),
            "tenant_id" => self.tenant_id = value.to_string(),
            "client_id" => self.client_id = value.to_string(),
            "default_resource_group" => self.default_resource_group = value.to_string(),
            "default_location" => self.default_location = value.to_string(),
            "default_sku" => self.default_sku = value.parse()?,
            "default_kind" => self.default_kind = parse_enum(key, value)?,
            "default_access_tier" => self.default_access_tier = parse_enum(key, value)?,
            "auth_method" => self.auth_method = value.to_string(),
            "arm_endpoint" => self.arm_endpoint = value.trim_end_matches('/').to_string(),
            "max_retries" => self.max_retries = parse_number(key, value)?,
            "poll_interval_secs" => self.poll_interval_secs = parse_number(key, value)?,
            "max_wait_secs" => self.max_wait_secs = parse_number(key, value)?,
            "output_json" => self.output_json = parse_bool(key, value)?,
            "no_color" => self.no_color = parse_bool(key, value)?,
            _ => {
                return Err(AcctctlError::invalid_argument(format!(
                    "Unknown configuration key '{}'. Valid keys: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AcctctlError::invalid_argument(format!(
            "{key} expects true or false, got '{value}'"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        AcctctlError::invalid_argument(format!("{key} expects a number, got '{value}'"))
    })
}

fn parse_enum<T: clap::ValueEnum>(key: &str, value: &str) -> Result<T> {
    T::from_str(value, true)
        .map_err(|e| AcctctlError::invalid_argument(format!("Invalid value for {key}: {e}")))
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (handled by clap)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
pub async fn load_config() -> Result<Config> {
    let config = load_config_no_validation().await?;
    config.validate()?;
    Ok(config)
}

/// Load configuration without validation (for init and config commands)
pub async fn load_config_no_validation() -> Result<Config> {
    let config_path = Config::get_config_path()?;
    let mut config = load_from_path(&config_path).await?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Read a config file, or defaults when it does not exist
pub async fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }

    let contents = tokio::fs::read_to_string(path).await?;
    let config = toml::from_str::<Config>(&contents)?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Apply environment overrides, looking variables up through `lookup`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    let string_overrides: [(&str, &mut String); 7] = [
        ("AZURE_SUBSCRIPTION_ID", &mut config.subscription_id),
        ("AZURE_TENANT_ID", &mut config.tenant_id),
        ("AZURE_CLIENT_ID", &mut config.client_id),
        ("ACCTCTL_RESOURCE_GROUP", &mut config.default_resource_group),
        ("ACCTCTL_LOCATION", &mut config.default_location),
        ("ACCTCTL_ARM_ENDPOINT", &mut config.arm_endpoint),
        ("ACCTCTL_AUTH_METHOD", &mut config.auth_method),
    ];

    for (var, field) in string_overrides {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            *field = value;
        }
    }
}

/// Change one key in the file at `path` and write it back
///
/// Starts from the file alone, so env and flag overrides never end up persisted.
pub async fn set_persisted_value(path: &Path, key: &str, value: &str) -> Result<Config> {
    let mut config = load_from_path(path).await?;
    config.set_value(key, value)?;
    save_to_path(&config, path).await?;
    Ok(config)
}

pub async fn save_config(config: &Config) -> Result<()> {
    let config_path = Config::get_config_path()?;
    save_to_path(config, &config_path).await
}

pub async fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| AcctctlError::serialization(e.to_string()))?;

    tokio::fs::write(path, contents).await?;
    debug!(path = %path.display(), "Saved config file");

    Ok(())
}
