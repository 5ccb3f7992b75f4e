//! CLI command definitions.
//!
//! Each subcommand maps to one step of the request workflow: recommend a
//! configuration, price and edit it, then submit it for approval.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

pub mod catalog;
pub mod estimate;
pub mod recommend;
pub mod submit;

/// Infra marketplace - cloud infrastructure requests with cost estimates
#[derive(Parser)]
#[command(name = "market")]
#[command(version, about = "Infra marketplace - cloud infrastructure requests with cost estimates")]
#[command(long_about = r#"
Request cloud infrastructure, get a recommended configuration, price it
against the live billing catalog, and send it for approval.

WORKFLOW:
  recommend → Turn a form or a free-text description into a configuration
  catalog   → Snapshot the billing price catalog for offline estimates
  estimate  → Edit a configuration and estimate its cost
  submit    → Send a configuration to ServiceNow for approval

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Configuration or coercion error
  4 - Upstream service error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to .market/settings.toml)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend a configuration for a request
    Recommend(recommend::RecommendArgs),

    /// Write a snapshot of the billing price catalog
    Catalog(catalog::CatalogArgs),

    /// Edit a configuration and estimate its cost
    Estimate(estimate::EstimateArgs),

    /// Submit a configuration for approval
    Submit(submit::SubmitArgs),
}

/// Read a JSON object from `path`.
pub(crate) fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Expected a JSON object in {}", path.display()),
    }
}

/// Write `value` as pretty JSON to `path`.
pub(crate) fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
