//! Submit command - Send a configuration for approval.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use market_config::{Environment, RequestConfiguration};
use market_ticket::{ApprovalRequest, TicketSink};

use crate::settings::Settings;

#[derive(Args)]
pub struct SubmitArgs {
    /// Configuration JSON file
    #[arg(short, long)]
    config: PathBuf,

    /// Environment (Production opens a change request)
    #[arg(short, long)]
    environment: Environment,

    /// Project name for the ticket title
    #[arg(long)]
    project_name: Option<String>,
}

pub async fn execute(args: SubmitArgs, settings: &Settings) -> Result<()> {
    let raw = super::read_json_object(&args.config)?;
    let config = RequestConfiguration::from_raw(&raw);

    let client = settings.servicenow_client()?;
    let request = ApprovalRequest::new(args.environment, args.project_name, &config);

    println!("📨 Submitting {}: {}", request.kind(), request.short_description());
    let receipt = client
        .submit(&request)
        .await
        .context("Failed to submit to ServiceNow")?;

    println!("✅ {}", receipt);
    Ok(())
}
