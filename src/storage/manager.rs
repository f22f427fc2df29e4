//! Storage account management facade
//!
//! Wraps the raw operations with validation, confirmations and console
//! output, and drives the end-to-end walkthrough.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::models::{
    AccountKeyName, AccountKeyRow, FailoverType, NameAvailability, StorageAccountCreateRequest,
    StorageAccountKey, StorageAccountProperties, StorageAccountSummary, StorageSku,
};
use super::operations::{AzureStorageAccountOperations, StorageAccountOperations};
use crate::arm::client::{ArmClient, ArmClientOptions};
use crate::auth::provider::AzureAuthProvider;
use crate::error::{AcctctlError, Result};
use crate::provider::models::{RegistrationState, ResourceProvider, STORAGE_NAMESPACE};
use crate::provider::registration::{
    AzureProviderOperations, ProviderOperations, ProviderRegistrar,
};
use crate::utils::format::{DisplayUtils, OutputFormat, TableFormatter};
use crate::utils::interactive::{InteractivePrompt, ProgressIndicator};

/// Options for [`StorageAccountManager::run_walkthrough`]
#[derive(Debug, Clone)]
pub struct WalkthroughOptions {
    pub request: StorageAccountCreateRequest,
    /// Leave the account in place at the end
    pub keep: bool,
    /// Skip the confirmation before deleting
    pub assume_yes: bool,
    pub target_sku: StorageSku,
    pub regenerate: AccountKeyName,
    pub show_progress: bool,
    /// Format of the final report; step listings go to stderr when it is JSON or YAML
    pub format: OutputFormat,
}

impl WalkthroughOptions {
    pub fn new(request: StorageAccountCreateRequest) -> Self {
        Self {
            request,
            keep: false,
            assume_yes: false,
            target_sku: StorageSku::StandardGrs,
            regenerate: AccountKeyName::Key1,
            show_progress: true,
            format: OutputFormat::Table,
        }
    }
}

/// Where listings are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Stdout,
    Stderr,
}

impl Listing {
    /// Step listings must not mix with a machine-readable report on stdout
    fn for_report(format: OutputFormat) -> Self {
        if format.is_machine_readable() {
            Listing::Stderr
        } else {
            Listing::Stdout
        }
    }
}

/// What the walkthrough did
#[derive(Debug, Clone, Serialize)]
pub struct WalkthroughReport {
    pub account: String,
    pub resource_group: String,
    pub provider_state: String,
    pub subscription_accounts: usize,
    pub resource_group_accounts: usize,
    pub regenerated_key: String,
    pub previous_sku: StorageSku,
    pub current_sku: StorageSku,
    pub deleted: bool,
}

/// High-level storage account manager
pub struct StorageAccountManager {
    storage_ops: Arc<dyn StorageAccountOperations>,
    registrar: ProviderRegistrar,
    display_utils: DisplayUtils,
    no_color: bool,
}

impl StorageAccountManager {
    /// Create a manager that talks to Resource Manager
    pub fn new(
        auth_provider: Arc<dyn AzureAuthProvider>,
        subscription_id: String,
        options: ArmClientOptions,
        no_color: bool,
    ) -> Result<Self> {
        let poll_interval = options.poll_interval;
        let max_wait = options.max_wait;
        let arm = Arc::new(ArmClient::new(auth_provider, options)?);

        let storage_ops = Arc::new(AzureStorageAccountOperations::new(
            Arc::clone(&arm),
            subscription_id.clone(),
        ));
        let provider_ops = Arc::new(AzureProviderOperations::new(arm, subscription_id));

        Ok(Self::with_operations(
            storage_ops,
            provider_ops,
            poll_interval,
            max_wait,
            no_color,
        ))
    }

    /// Create a manager over caller-supplied operations
    pub fn with_operations(
        storage_ops: Arc<dyn StorageAccountOperations>,
        provider_ops: Arc<dyn ProviderOperations>,
        poll_interval: Duration,
        max_wait: Duration,
        no_color: bool,
    ) -> Self {
        Self {
            storage_ops,
            registrar: ProviderRegistrar::new(provider_ops, poll_interval, max_wait),
            display_utils: DisplayUtils::new(no_color),
            no_color,
        }
    }

    fn formatter(&self, format: OutputFormat) -> TableFormatter {
        TableFormatter::new(format, self.no_color)
    }

    /// Show the storage provider's registration state
    pub async fn show_provider(&self, format: OutputFormat) -> Result<ResourceProvider> {
        let provider = self.registrar.get(STORAGE_NAMESPACE).await?;
        println!("{}", self.formatter(format).format_item(&provider)?);
        Ok(provider)
    }

    /// Register `Microsoft.Storage` unless it is already registered
    pub async fn register_storage_provider(&self, wait: bool) -> Result<ResourceProvider> {
        let provider = self.registrar.ensure_registered(STORAGE_NAMESPACE, wait).await?;

        match provider.registration_state {
            RegistrationState::Registered => self
                .display_utils
                .print_success(&format!("Provider {} is registered", provider.namespace)),
            RegistrationState::Registering => self.display_utils.print_info(&format!(
                "Provider {} is registering; this can take a few minutes",
                provider.namespace
            )),
            ref state => self.display_utils.print_warning(&format!(
                "Provider {} is {}",
                provider.namespace, state
            )),
        }

        Ok(provider)
    }

    /// Check whether an account name can be used
    pub async fn check_name(&self, name: &str, format: OutputFormat) -> Result<NameAvailability> {
        crate::utils::validation::validate_storage_account_name(name)?;
        let availability = self.storage_ops.check_name_availability(name).await?;
        println!("{}", self.formatter(format).format_item(&availability)?);
        Ok(availability)
    }

    fn emit(&self, listing: Listing, text: &str) {
        match listing {
            Listing::Stdout => println!("{text}"),
            Listing::Stderr => self.display_utils.print_block(text),
        }
    }

    /// Validate, check availability, then create the account
    pub async fn create_account_with_defaults(
        &self,
        request: &StorageAccountCreateRequest,
        format: OutputFormat,
    ) -> Result<StorageAccountProperties> {
        let account = self.create_checked(request).await?;
        println!("{}", self.formatter(format).format_item(&account)?);
        Ok(account)
    }

    async fn create_checked(
        &self,
        request: &StorageAccountCreateRequest,
    ) -> Result<StorageAccountProperties> {
        request.validate()?;

        let availability = self
            .storage_ops
            .check_name_availability(&request.name)
            .await?;
        if !availability.name_available {
            return Err(AcctctlError::name_unavailable(
                &request.name,
                availability
                    .message
                    .or(availability.reason)
                    .unwrap_or_else(|| "the name is already in use".to_string()),
            ));
        }

        self.display_utils.print_info(&format!(
            "Creating storage account '{}' in {} ({})...",
            request.name, request.location, request.resource_group
        ));

        let account = self.storage_ops.create_account(request).await?;

        self.display_utils.print_success(&format!(
            "Created storage account '{}' with SKU {}",
            account.name, account.sku
        ));

        Ok(account)
    }

    /// List accounts; `Raw` prints one tab-indented name per line
    pub async fn list_accounts_formatted(
        &self,
        resource_group: Option<&str>,
        format: OutputFormat,
    ) -> Result<Vec<StorageAccountSummary>> {
        self.list_accounts_to(resource_group, format, Listing::Stdout).await
    }

    async fn list_accounts_to(
        &self,
        resource_group: Option<&str>,
        format: OutputFormat,
        listing: Listing,
    ) -> Result<Vec<StorageAccountSummary>> {
        let accounts: Vec<StorageAccountSummary> = self
            .storage_ops
            .list_accounts(resource_group.map(str::to_string))
            .await?
            .iter()
            .map(StorageAccountProperties::to_summary)
            .collect();

        if accounts.is_empty() && !format.is_machine_readable() {
            self.display_utils.print_info("No storage accounts found.");
            return Ok(accounts);
        }

        self.emit(listing, &self.render_accounts(&accounts, format)?);
        Ok(accounts)
    }

    fn render_accounts(
        &self,
        accounts: &[StorageAccountSummary],
        format: OutputFormat,
    ) -> Result<String> {
        match format {
            OutputFormat::Raw => Ok(accounts
                .iter()
                .map(|account| format!("\t{}", account.name))
                .collect::<Vec<_>>()
                .join("\n")),
            _ => self.formatter(format).format_table(accounts),
        }
    }

    /// Display one account
    pub async fn show_account(
        &self,
        resource_group: &str,
        name: &str,
        format: OutputFormat,
    ) -> Result<StorageAccountProperties> {
        let account = self.storage_ops.get_account(resource_group, name).await?;

        match format {
            OutputFormat::Table | OutputFormat::Raw => {
                self.display_utils
                    .print_header(&format!("Storage account: {}", account.name));
                println!("{}", self.account_details(&account));
            }
            _ => println!("{}", self.formatter(format).format_item(&account)?),
        }

        Ok(account)
    }

    fn account_details(&self, account: &StorageAccountProperties) -> String {
        let access_tier = account
            .access_tier
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let sku = account.sku.to_string();
        let kind = account.kind.to_string();
        let shared_key = match account.allow_shared_key_access {
            Some(true) => "allowed",
            Some(false) => "disabled",
            None => "-",
        };
        let created = account
            .creation_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let blob_endpoint = account
            .primary_endpoints
            .get("blob")
            .cloned()
            .unwrap_or_else(|| "-".to_string());

        self.display_utils.format_key_value_pairs(&[
            ("Id", account.id.as_str()),
            ("Resource Group", account.resource_group.as_str()),
            ("Location", account.location.as_str()),
            ("SKU", sku.as_str()),
            ("Kind", kind.as_str()),
            ("Access Tier", access_tier.as_str()),
            (
                "Provisioning State",
                account.provisioning_state.as_deref().unwrap_or("-"),
            ),
            (
                "Primary Location",
                account.primary_location.as_deref().unwrap_or("-"),
            ),
            (
                "Secondary Location",
                account.secondary_location.as_deref().unwrap_or("-"),
            ),
            ("Shared Key Access", shared_key),
            ("Blob Endpoint", blob_endpoint.as_str()),
            ("Created", created.as_str()),
        ])
    }

    fn render_keys(
        &self,
        keys: &[StorageAccountKey],
        reveal: bool,
        format: OutputFormat,
    ) -> Result<String> {
        let rows: Vec<AccountKeyRow> = keys.iter().map(|k| k.to_row(reveal)).collect();

        match format {
            OutputFormat::Raw => Ok(rows
                .iter()
                .map(|row| format!("Key name: {}\nKey value: {}", row.key_name, row.value))
                .collect::<Vec<_>>()
                .join("\n")),
            _ => self.formatter(format).format_table(&rows),
        }
    }

    fn print_keys(
        &self,
        keys: &[StorageAccountKey],
        reveal: bool,
        format: OutputFormat,
        listing: Listing,
    ) -> Result<()> {
        self.emit(listing, &self.render_keys(keys, reveal, format)?);

        if !reveal {
            self.display_utils
                .print_info("Key values are masked; pass --reveal to show them");
        }
        Ok(())
    }

    pub async fn list_keys_formatted(
        &self,
        resource_group: &str,
        name: &str,
        reveal: bool,
        format: OutputFormat,
    ) -> Result<Vec<StorageAccountKey>> {
        let keys = self.storage_ops.list_keys(resource_group, name).await?;
        self.print_keys(&keys, reveal, format, Listing::Stdout)?;
        Ok(keys)
    }

    pub async fn regenerate_key_formatted(
        &self,
        resource_group: &str,
        name: &str,
        key_name: AccountKeyName,
        reveal: bool,
        format: OutputFormat,
    ) -> Result<Vec<StorageAccountKey>> {
        let keys = self.regenerate_key_checked(resource_group, name, key_name).await?;
        self.print_keys(&keys, reveal, format, Listing::Stdout)?;
        Ok(keys)
    }

    async fn regenerate_key_checked(
        &self,
        resource_group: &str,
        name: &str,
        key_name: AccountKeyName,
    ) -> Result<Vec<StorageAccountKey>> {
        let keys = self
            .storage_ops
            .regenerate_key(resource_group, name, key_name)
            .await?;

        self.display_utils
            .print_success(&format!("Regenerated {} for '{}'", key_name, name));
        Ok(keys)
    }

    /// Change the SKU and return `(old, new)`
    pub async fn update_sku(
        &self,
        resource_group: &str,
        name: &str,
        sku: StorageSku,
    ) -> Result<(StorageSku, StorageSku)> {
        let current = self.storage_ops.get_account(resource_group, name).await?;
        let old = current.sku;

        if old == sku {
            self.display_utils
                .print_info(&format!("Storage account '{}' already uses SKU {}", name, sku));
            return Ok((old, old));
        }

        let updated = self
            .storage_ops
            .update_sku(resource_group, name, sku)
            .await?;

        self.display_utils.print_success(&format!(
            "SKU on storage account updated from {} to {}",
            old, updated.sku
        ));
        Ok((old, updated.sku))
    }

    /// Fail over to the secondary region after confirmation
    pub async fn failover_account(
        &self,
        resource_group: &str,
        name: &str,
        failover_type: FailoverType,
        force: bool,
    ) -> Result<()> {
        let account = self.storage_ops.get_account(resource_group, name).await?;

        if !account.sku.is_geo_redundant() {
            return Err(AcctctlError::invalid_argument(format!(
                "Storage account '{}' uses {}; failover needs a geo-redundant SKU",
                name, account.sku
            )));
        }

        if !force {
            self.display_utils.print_warning(&format!(
                "{} failover of '{}' makes {} the primary region",
                failover_type,
                name,
                account.secondary_location.as_deref().unwrap_or("the secondary")
            ));
        }
        InteractivePrompt::new()
            .require_confirmation(&format!("Fail over storage account '{name}'?"), force)?;

        let spinner = ProgressIndicator::new(&format!("Failing over '{name}'..."));
        match self
            .storage_ops
            .failover(resource_group, name, failover_type)
            .await
        {
            Ok(()) => {
                spinner.finish_success(&format!("Failover of '{name}' completed"));
                Ok(())
            }
            Err(e) => {
                spinner.finish_error(&format!("Failover of '{name}' failed"));
                Err(e)
            }
        }
    }

    /// Delete an account after checking it exists and confirming
    pub async fn delete_account_safe(
        &self,
        resource_group: &str,
        name: &str,
        force: bool,
    ) -> Result<()> {
        let account = self.storage_ops.get_account(resource_group, name).await?;
        self.confirm_delete(&account, force)?;

        self.storage_ops.delete_account(resource_group, name).await?;
        self.display_utils
            .print_success(&format!("Deleted storage account '{name}'"));
        Ok(())
    }

    fn confirm_delete(&self, account: &StorageAccountProperties, force: bool) -> Result<()> {
        if !force {
            self.display_utils.print_warning(&format!(
                "This permanently deletes storage account '{}' in resource group '{}' and all data in it",
                account.name, account.resource_group
            ));
        }
        InteractivePrompt::new().require_confirmation(
            &format!("Delete storage account '{}'?", account.name),
            force,
        )
    }

    /// Run the end-to-end sample sequence against one account
    pub async fn run_walkthrough(&self, options: WalkthroughOptions) -> Result<WalkthroughReport> {
        options.request.validate()?;

        let spinner = if options.show_progress {
            ProgressIndicator::new("Starting walkthrough...")
        } else {
            ProgressIndicator::hidden()
        };

        let result = self.walkthrough_steps(&options, &spinner).await;
        match &result {
            Ok(report) => spinner.finish_success(&format!(
                "All walkthrough steps completed for '{}'",
                report.account
            )),
            Err(e) => spinner.finish_error(&format!("Walkthrough stopped: {e}")),
        }
        result
    }

    async fn walkthrough_steps(
        &self,
        options: &WalkthroughOptions,
        spinner: &ProgressIndicator,
    ) -> Result<WalkthroughReport> {
        let request = &options.request;
        let rg = request.resource_group.as_str();
        let name = request.name.as_str();
        let listing = Listing::for_report(options.format);

        info!(step = 1, "Ensuring storage provider is registered");
        spinner.set_message("Checking storage provider registration...");
        let provider = self.registrar.ensure_registered(STORAGE_NAMESPACE, true).await?;
        self.display_utils.print_success(&format!(
            "Provider {} is {}",
            provider.namespace, provider.registration_state
        ));

        info!(step = 2, account = name, "Checking name and creating storage account");
        spinner.set_message(&format!("Creating storage account '{name}'..."));
        let account = self.create_checked(request).await?;
        let rendered = self.formatter(OutputFormat::Table).format_item(&account)?;
        spinner.suspend(|| self.emit(listing, &rendered));

        info!(step = 4, "Listing storage accounts in subscription");
        spinner.set_message("Listing storage accounts in subscription...");
        self.display_utils.print_header("Storage accounts in subscription");
        let subscription_accounts = self
            .list_accounts_to(None, OutputFormat::Raw, listing)
            .await?
            .len();

        info!(step = 5, "Listing storage accounts in resource group");
        spinner.set_message(&format!("Listing storage accounts in {rg}..."));
        self.display_utils
            .print_header(&format!("Storage accounts in resource group {rg}"));
        let resource_group_accounts = self
            .list_accounts_to(Some(rg), OutputFormat::Raw, listing)
            .await?
            .len();

        info!(step = 6, "Listing account keys");
        spinner.set_message("Listing account keys...");
        let keys = self.storage_ops.list_keys(rg, name).await?;
        spinner.suspend(|| self.print_keys(&keys, false, OutputFormat::Raw, listing))?;

        info!(step = 7, key = %options.regenerate, "Regenerating account key");
        spinner.set_message(&format!("Regenerating {}...", options.regenerate));
        let keys = self.regenerate_key_checked(rg, name, options.regenerate).await?;
        spinner.suspend(|| self.print_keys(&keys, false, OutputFormat::Raw, listing))?;

        info!(step = 8, sku = %options.target_sku, "Updating account SKU");
        spinner.set_message(&format!("Updating SKU to {}...", options.target_sku));
        let (previous_sku, current_sku) = self.update_sku(rg, name, options.target_sku).await?;

        let deleted = if options.keep {
            self.display_utils
                .print_info(&format!("Keeping storage account '{}'", account.name));
            false
        } else {
            info!(step = 9, "Deleting storage account");
            spinner.set_message(&format!("Deleting storage account '{name}'..."));
            match self.delete_in_walkthrough(rg, name, options.assume_yes, spinner).await {
                Ok(()) => true,
                Err(AcctctlError::Cancelled) => {
                    warn!(account = name, "Deletion cancelled; account left in place");
                    false
                }
                Err(e) => return Err(e),
            }
        };

        Ok(WalkthroughReport {
            account: account.name,
            resource_group: account.resource_group,
            provider_state: provider.registration_state.to_string(),
            subscription_accounts,
            resource_group_accounts,
            regenerated_key: options.regenerate.to_string(),
            previous_sku,
            current_sku,
            deleted,
        })
    }

    async fn delete_in_walkthrough(
        &self,
        resource_group: &str,
        name: &str,
        force: bool,
        spinner: &ProgressIndicator,
    ) -> Result<()> {
        let account = self.storage_ops.get_account(resource_group, name).await?;
        spinner.suspend(|| self.confirm_delete(&account, force))?;

        self.storage_ops.delete_account(resource_group, name).await?;
        self.display_utils
            .print_success(&format!("Deleted storage account '{name}'"));
        Ok(())
    }
}
