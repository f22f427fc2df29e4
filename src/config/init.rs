//! Interactive first-run setup
//!
//! Collects the subscription, default resource group, region, SKU and
//! authentication method, then writes the config file.

use crate::config::settings::{save_config, Config};
use crate::error::Result;
use crate::storage::models::StorageSku;
use crate::utils::format::DisplayUtils;
use crate::utils::interactive::{InteractivePrompt, ProgressIndicator};
use crate::utils::validation::{is_guid, validate_resource_group_name};

const COMMON_LOCATIONS: &[&str] = &[
    "eastus",
    "eastus2",
    "westus2",
    "centralus",
    "northeurope",
    "westeurope",
    "uksouth",
    "southeastasia",
];

const AUTH_METHODS: &[&str] = &["default", "client_secret", "token"];

/// Interactive configuration initialization
pub struct ConfigInitializer {
    prompt: InteractivePrompt,
    display: DisplayUtils,
}

impl ConfigInitializer {
    pub fn new(no_color: bool) -> Self {
        Self {
            prompt: InteractivePrompt::new(),
            display: DisplayUtils::new(no_color),
        }
    }

    /// Walk through the settings, starting from `current`, and save the result
    pub async fn run_interactive_setup(&self, current: Config) -> Result<Config> {
        self.display.print_header("acctctl setup");
        let mut config = current;

        config.subscription_id = self.prompt.input_text_validated(
            "Subscription ID",
            non_empty(&config.subscription_id),
            |value| {
                if is_guid(value) {
                    Ok(())
                } else {
                    Err("expected a GUID such as 00000000-0000-0000-0000-000000000000".to_string())
                }
            },
        )?;

        config.tenant_id = self.prompt.input_text_validated(
            "Tenant ID (leave empty to let the credential chain decide)",
            Some(config.tenant_id.as_str()),
            |value| {
                if value.is_empty() || is_guid(value) {
                    Ok(())
                } else {
                    Err("expected a GUID or nothing".to_string())
                }
            },
        )?;

        config.default_resource_group = self.prompt.input_text_validated(
            "Default resource group (must already exist)",
            non_empty(&config.default_resource_group),
            |value| validate_resource_group_name(value).map_err(|e| e.to_string()),
        )?;

        let location_index = self.prompt.select(
            "Default location",
            COMMON_LOCATIONS,
            COMMON_LOCATIONS
                .iter()
                .position(|loc| *loc == config.default_location),
        )?;
        config.default_location = COMMON_LOCATIONS[location_index].to_string();

        let sku_index = self.prompt.select(
            "Default SKU",
            &StorageSku::ALL,
            StorageSku::ALL.iter().position(|sku| *sku == config.default_sku),
        )?;
        config.default_sku = StorageSku::ALL[sku_index];

        let auth_index = self.prompt.select(
            "Authentication method",
            AUTH_METHODS,
            AUTH_METHODS.iter().position(|m| *m == config.auth_method),
        )?;
        config.auth_method = AUTH_METHODS[auth_index].to_string();

        if config.auth_method == "client_secret" {
            config.client_id = self.prompt.input_text("Client ID", non_empty(&config.client_id))?;
            self.display
                .print_info("The client secret is read from AZURE_CLIENT_SECRET and is not saved");
        } else if config.auth_method == "token" {
            self.display
                .print_info("The bearer token is read from AZURE_ACCESS_TOKEN and is not saved");
        }

        let progress = ProgressIndicator::new("Saving configuration...");
        save_config(&config).await?;
        let path = Config::get_config_path()?;
        progress.finish_success(&format!("Configuration saved to {}", path.display()));

        Ok(config)
    }

    pub fn show_setup_summary(&self, config: &Config) {
        let sku = config.default_sku.to_string();
        println!(
            "{}",
            self.display.format_key_value_pairs(&[
                ("Subscription ID", config.subscription_id.as_str()),
                ("Resource Group", config.default_resource_group.as_str()),
                ("Location", config.default_location.as_str()),
                ("SKU", sku.as_str()),
                ("Auth Method", config.auth_method.as_str()),
            ])
        );
        self.display.print_info("Next steps:");
        println!("  acctctl provider register --wait");
        println!("  acctctl account create <name>");
        println!("  acctctl walkthrough <name>");
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
