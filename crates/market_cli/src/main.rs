//! Infra marketplace CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Configuration or coercion error
//! - 4: Upstream service error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod settings;

use commands::{Cli, Commands};
use settings::{Settings, SettingsError};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIG_ERROR: u8 = 3;
    pub const UPSTREAM_ERROR: u8 = 4;
}

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "market=info,warn";
const VERBOSE_LOG_FILTER: &str = "market=debug,info";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    match run(cli).await {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.settings.as_deref())?.with_env_overrides();

    match cli.command {
        Commands::Recommend(args) => commands::recommend::execute(args, &settings).await,
        Commands::Catalog(args) => commands::catalog::execute(args, &settings).await,
        Commands::Estimate(args) => commands::estimate::execute(args, &settings).await,
        Commands::Submit(args) => commands::submit::execute(args, &settings).await,
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    use market_advisor::AdvisorError;
    use market_catalog::CatalogError;
    use market_config::ConfigError;
    use market_ticket::TicketError;

    for cause in e.chain() {
        if cause.is::<ConfigError>() || cause.is::<SettingsError>() {
            return ExitCodes::CONFIG_ERROR;
        }
        if let Some(err) = cause.downcast_ref::<AdvisorError>() {
            return match err {
                AdvisorError::LlmNotConfigured => ExitCodes::CONFIG_ERROR,
                AdvisorError::EmptyInput => ExitCodes::INVALID_ARGS,
                AdvisorError::Config(_) => ExitCodes::CONFIG_ERROR,
                _ => ExitCodes::UPSTREAM_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<TicketError>() {
            return match err {
                TicketError::NotConfigured(_) => ExitCodes::CONFIG_ERROR,
                _ => ExitCodes::UPSTREAM_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<CatalogError>() {
            return match err {
                CatalogError::ScopeNotConfigured | CatalogError::CredentialsMissing => ExitCodes::CONFIG_ERROR,
                CatalogError::Io(_) | CatalogError::Json(_) => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::UPSTREAM_ERROR,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}
