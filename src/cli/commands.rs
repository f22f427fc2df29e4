//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, subcommands, and their arguments.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use crate::auth::provider::AuthProviderFactory;
use crate::config::init::ConfigInitializer;
use crate::config::{load_from_path, set_persisted_value, Config};
use crate::error::Result;
use crate::storage::manager::{StorageAccountManager, WalkthroughOptions};
use crate::storage::models::{AccessTier, AccountKeyName, FailoverType, StorageKind, StorageSku};
use crate::utils::format::{DisplayUtils, OutputFormat, TableFormatter};

/// Build-time information generated by `built`
pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[command(name = "acctctl")]
#[command(about = "Manage Azure Storage accounts through Azure Resource Manager")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format [default: table, or json when output_json is set]
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subscription ID (overrides config and AZURE_SUBSCRIPTION_ID)
    #[arg(long, global = true, value_name = "ID")]
    pub subscription: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Storage resource provider registration
    Provider {
        #[command(subcommand)]
        command: ProviderCommands,
    },
    /// Storage account management
    #[command(alias = "acct")]
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
    /// Storage account access keys
    Keys {
        #[command(subcommand)]
        command: KeysCommands,
    },
    /// Run the full sample sequence: register, create, list, rotate a key, change SKU, delete
    Walkthrough {
        /// Storage account name
        name: String,
        /// Resource group (must already exist)
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Location
        #[arg(short, long)]
        location: Option<String>,
        /// SKU to switch to after creation
        #[arg(long, default_value = "Standard_GRS")]
        target_sku: StorageSku,
        /// Keep the account instead of deleting it at the end
        #[arg(long)]
        keep: bool,
        /// Delete without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Initialize configuration interactively
    Init,
    /// Show detailed version and build information
    Version,
    /// Generate shell completion scripts
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProviderCommands {
    /// Show the registration state of Microsoft.Storage
    Show,
    /// Register Microsoft.Storage if it is not registered
    Register {
        /// Wait until registration completes
        #[arg(long)]
        wait: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a storage account
    Create {
        /// Storage account name (3-24 lowercase letters and digits)
        name: String,
        /// Resource group (must already exist)
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Location
        #[arg(short, long)]
        location: Option<String>,
        /// SKU, e.g. Standard_LRS
        #[arg(long)]
        sku: Option<StorageSku>,
        /// Account kind
        #[arg(long, value_enum)]
        kind: Option<StorageKind>,
        /// Default blob access tier
        #[arg(long, value_enum)]
        access_tier: Option<AccessTier>,
        /// Allow shared key authorization
        #[arg(long)]
        allow_shared_key_access: bool,
        /// Tags in key=value format
        #[arg(long, value_parser = parse_key_val::<String, String>)]
        tag: Vec<(String, String)>,
    },
    /// List storage accounts (alias: ls)
    #[command(alias = "ls")]
    List {
        /// Only accounts in this resource group
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
    },
    /// Show storage account details
    Show {
        /// Storage account name
        name: String,
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
    },
    /// Check whether a storage account name is available
    CheckName {
        /// Storage account name
        name: String,
    },
    /// Change the SKU of a storage account
    UpdateSku {
        /// Storage account name
        name: String,
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// New SKU, e.g. Standard_GRS
        #[arg(long)]
        sku: StorageSku,
    },
    /// Fail a geo-redundant account over to its secondary region
    Failover {
        /// Storage account name
        name: String,
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Failover type
        #[arg(long = "type", value_enum, default_value = "planned")]
        failover_type: FailoverType,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Delete a storage account (alias: rm)
    #[command(alias = "rm")]
    Delete {
        /// Storage account name
        name: String,
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Force deletion without confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum KeysCommands {
    /// List access keys
    List {
        /// Storage account name
        account: String,
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Print key values instead of masking them
        #[arg(long)]
        reveal: bool,
    },
    /// Regenerate an access key
    Regenerate {
        /// Storage account name
        account: String,
        /// Resource group
        #[arg(short = 'g', long)]
        resource_group: Option<String>,
        /// Key to regenerate
        #[arg(long, value_enum, default_value = "key1")]
        key: AccountKeyName,
        /// Print key values instead of masking them
        #[arg(long)]
        reveal: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Print the configuration file path
    Path,
}

impl Cli {
    /// Whether the command needs a complete, validated configuration
    pub fn needs_validated_config(&self) -> bool {
        !matches!(
            self.command,
            Commands::Config { .. }
                | Commands::Init
                | Commands::Version
                | Commands::Completion { .. }
        )
    }

    /// Fold global flags into the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(subscription) = &self.subscription {
            config.subscription_id = subscription.clone();
        }
        if self.no_color {
            config.no_color = true;
        }
        if self.debug {
            config.debug = true;
        }
    }

    fn output_format(&self, config: &Config) -> OutputFormat {
        match self.format {
            Some(format) => format,
            None if config.output_json => OutputFormat::Json,
            None => OutputFormat::Table,
        }
    }

    pub async fn execute(self, config: Config) -> Result<()> {
        let format = self.output_format(&config);

        match self.command {
            Commands::Provider { command } => {
                execute_provider_command(command, &config, format).await
            }
            Commands::Account { command } => {
                execute_account_command(command, &config, format).await
            }
            Commands::Keys { command } => execute_keys_command(command, &config, format).await,
            Commands::Walkthrough {
                name,
                resource_group,
                location,
                target_sku,
                keep,
                yes,
            } => {
                execute_walkthrough(
                    &name,
                    resource_group,
                    location,
                    target_sku,
                    keep,
                    yes,
                    &config,
                    format,
                )
                .await
            }
            Commands::Config { command } => execute_config_command(command, config, format).await,
            Commands::Init => execute_init_command(config).await,
            Commands::Version => execute_version_command(),
            Commands::Completion { shell } => {
                clap_complete::generate(
                    shell,
                    &mut Cli::command(),
                    "acctctl",
                    &mut std::io::stdout(),
                );
                Ok(())
            }
        }
    }
}

fn create_manager(config: &Config) -> Result<StorageAccountManager> {
    debug!(auth_method = %config.auth_method, "Creating auth provider");
    let auth_provider =
        AuthProviderFactory::create_provider(&config.auth_method, &config.auth_settings())?;

    StorageAccountManager::new(
        auth_provider,
        config.subscription_id.clone(),
        config.arm_options(),
        config.no_color,
    )
}

async fn execute_provider_command(
    command: ProviderCommands,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let manager = create_manager(config)?;

    match command {
        ProviderCommands::Show => {
            manager.show_provider(format).await?;
        }
        ProviderCommands::Register { wait } => {
            manager.register_storage_provider(wait).await?;
        }
    }
    Ok(())
}

async fn execute_account_command(
    command: AccountCommands,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let manager = create_manager(config)?;

    match command {
        AccountCommands::Create {
            name,
            resource_group,
            location,
            sku,
            kind,
            access_tier,
            allow_shared_key_access,
            tag,
        } => {
            let resource_group = config.resolve_resource_group(resource_group)?;
            let mut request = config.create_request(&name, &resource_group);
            if let Some(location) = location {
                request.location = location;
            }
            if let Some(sku) = sku {
                request.sku = sku;
            }
            if let Some(kind) = kind {
                request.kind = kind;
            }
            if access_tier.is_some() {
                request.access_tier = access_tier;
            }
            if allow_shared_key_access {
                request.allow_shared_key_access = Some(true);
            }
            request.tags.extend(tag);

            manager.create_account_with_defaults(&request, format).await?;
        }
        AccountCommands::List { resource_group } => {
            manager
                .list_accounts_formatted(resource_group.as_deref(), format)
                .await?;
        }
        AccountCommands::Show {
            name,
            resource_group,
        } => {
            let resource_group = config.resolve_resource_group(resource_group)?;
            manager.show_account(&resource_group, &name, format).await?;
        }
        AccountCommands::CheckName { name } => {
            manager.check_name(&name, format).await?;
        }
        AccountCommands::UpdateSku {
            name,
            resource_group,
            sku,
        } => {
            let resource_group = config.resolve_resource_group(resource_group)?;
            manager.update_sku(&resource_group, &name, sku).await?;
        }
        AccountCommands::Failover {
            name,
            resource_group,
            failover_type,
            force,
        } => {
            let resource_group = config.resolve_resource_group(resource_group)?;
            manager
                .failover_account(&resource_group, &name, failover_type, force)
                .await?;
        }
        AccountCommands::Delete {
            name,
            resource_group,
            force,
        } => {
            let resource_group = config.resolve_resource_group(resource_group)?;
            manager
                .delete_account_safe(&resource_group, &name, force)
                .await?;
        }
    }
    Ok(())
}

async fn execute_keys_command(
    command: KeysCommands,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let manager = create_manager(config)?;

    match command {
        KeysCommands::List {
            account,
            resource_group,
            reveal,
        } => {
            let resource_group = config.resolve_resource_group(resource_group)?;
            manager
                .list_keys_formatted(&resource_group, &account, reveal, format)
                .await?;
        }
        KeysCommands::Regenerate {
            account,
            resource_group,
            key,
            reveal,
        } => {
            let resource_group = config.resolve_resource_group(resource_group)?;
            manager
                .regenerate_key_formatted(&resource_group, &account, key, reveal, format)
                .await?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn execute_walkthrough(
    name: &str,
    resource_group: Option<String>,
    location: Option<String>,
    target_sku: StorageSku,
    keep: bool,
    yes: bool,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let manager = create_manager(config)?;
    let resource_group = config.resolve_resource_group(resource_group)?;

    let mut request = config.create_request(name, &resource_group);
    if let Some(location) = location {
        request.location = location;
    }

    let mut options = WalkthroughOptions::new(request);
    options.keep = keep;
    options.assume_yes = yes;
    options.target_sku = target_sku;
    options.format = format;
    options.show_progress = !format.is_machine_readable();

    let report = manager.run_walkthrough(options).await?;

    if format.is_machine_readable() {
        let formatter = TableFormatter::new(format, config.no_color);
        println!("{}", formatter.format_structured(&report)?);
    } else {
        DisplayUtils::new(config.no_color).print_success(&format!(
            "Walkthrough finished for '{}' ({} -> {}{})",
            report.account,
            report.previous_sku,
            report.current_sku,
            if report.deleted { ", deleted" } else { "" }
        ));
    }
    Ok(())
}

async fn execute_config_command(
    command: ConfigCommands,
    config: Config,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => execute_config_show(&config, format),
        ConfigCommands::Set { key, value } => execute_config_set(&key, &value, config).await,
        ConfigCommands::Path => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
    }
}

#[derive(Tabled, Serialize)]
struct ConfigItem {
    #[tabled(rename = "Setting")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn or_not_set(value: &str) -> String {
    if value.is_empty() {
        "<not set>".to_string()
    } else {
        value.to_string()
    }
}

fn execute_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    if format.is_machine_readable() {
        let formatter = TableFormatter::new(format, config.no_color);
        println!("{}", formatter.format_structured(config)?);
        return Ok(());
    }

    let items: Vec<ConfigItem> = [
        ("debug", config.debug.to_string()),
        ("subscription_id", or_not_set(&config.subscription_id)),
        ("tenant_id", or_not_set(&config.tenant_id)),
        ("client_id", or_not_set(&config.client_id)),
        (
            "default_resource_group",
            or_not_set(&config.default_resource_group),
        ),
        ("default_location", config.default_location.clone()),
        ("default_sku", config.default_sku.to_string()),
        ("default_kind", config.default_kind.to_string()),
        ("default_access_tier", config.default_access_tier.to_string()),
        ("auth_method", config.auth_method.clone()),
        ("arm_endpoint", config.arm_endpoint.clone()),
        ("max_retries", config.max_retries.to_string()),
        ("poll_interval_secs", config.poll_interval_secs.to_string()),
        ("max_wait_secs", config.max_wait_secs.to_string()),
        ("output_json", config.output_json.to_string()),
        ("no_color", config.no_color.to_string()),
    ]
    .into_iter()
    .map(|(key, value)| ConfigItem { key, value })
    .collect();

    let formatter = TableFormatter::new(format, config.no_color);
    println!("{}", formatter.format_table(&items)?);
    println!();
    DisplayUtils::new(config.no_color)
        .print_info(&format!("Config file: {}", Config::get_config_path()?.display()));

    Ok(())
}

async fn execute_config_set(key: &str, value: &str, config: Config) -> Result<()> {
    let path = Config::get_config_path()?;
    set_persisted_value(&path, key, value).await?;

    DisplayUtils::new(config.no_color).print_success(&format!("Set {key} = {value}"));
    Ok(())
}

async fn execute_init_command(config: Config) -> Result<()> {
    let initializer = ConfigInitializer::new(config.no_color);
    let stored = load_from_path(&Config::get_config_path()?).await?;
    let new_config = initializer.run_interactive_setup(stored).await?;
    initializer.show_setup_summary(&new_config);
    Ok(())
}

fn execute_version_command() -> Result<()> {
    println!("acctctl {}", build_info::PKG_VERSION);
    println!("==============");
    println!(
        "Git Hash:   {}",
        build_info::GIT_COMMIT_HASH_SHORT.unwrap_or("unknown")
    );
    println!(
        "Git Dirty:  {}",
        build_info::GIT_DIRTY.map_or("unknown".to_string(), |d| d.to_string())
    );
    println!("Built:      {}", build_info::BUILT_TIME_UTC);
    println!("Profile:    {}", build_info::PROFILE);
    println!("Target:     {}", build_info::TARGET);
    println!("Rustc:      {}", build_info::RUSTC_VERSION);
    Ok(())
}

/// Parse a single key-value pair
fn parse_key_val<T, U>(
    s: &str,
) -> std::result::Result<(T, U), Box<dyn std::error::Error + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: std::error::Error + Send + Sync + 'static,
{
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}
