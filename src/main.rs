//! acctctl - Azure Storage account management tool
//!
//! Command-line entry point: sets up logging, loads configuration and
//! dispatches to the selected command.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use acctctl::cli::Cli;
use acctctl::config::load_config_no_validation;
use acctctl::Result;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    init_logging(cli.debug, cli.log_json);

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting acctctl");

    // Config commands must work before the configuration is complete
    let mut config = load_config_no_validation().await?;
    cli.apply_overrides(&mut config);
    if cli.needs_validated_config() {
        config.validate()?;
    }

    cli.execute(config).await
}

fn init_logging(debug: bool, json: bool) {
    let env_debug = std::env::var("DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let default_directive = if debug || env_debug {
        "acctctl=debug"
    } else {
        "acctctl=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
