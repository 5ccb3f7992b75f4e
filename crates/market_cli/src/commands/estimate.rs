//! Estimate command - Edit a configuration and price it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use tracing::{info, warn};

use market_catalog::{read_snapshot, CatalogIndex};
use market_config::field::REGION;
use market_config::{ConfigReconciler, CostEstimate, FieldClass};

use crate::settings::Settings;

#[derive(Args)]
pub struct EstimateArgs {
    /// Configuration JSON file
    #[arg(short, long)]
    config: PathBuf,

    /// Price snapshot written by `market catalog`
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Region to price in (defaults to the configuration's region)
    #[arg(long)]
    region: Option<String>,

    /// Stop tracking a quantified field (compute, memory, storage, budget)
    #[arg(long, value_name = "FIELD")]
    remove: Vec<String>,

    /// Restore a removed field to its default
    #[arg(long, value_name = "FIELD")]
    restore: Vec<String>,

    /// Set a field, e.g. `--set compute=8`
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Write the edited configuration back to the file
    #[arg(long)]
    write: bool,
}

/// Parse `KEY=VALUE`.
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// JSON if it parses, the raw text otherwise.
fn raw_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

pub async fn execute(args: EstimateArgs, settings: &Settings) -> Result<()> {
    let raw = super::read_json_object(&args.config)?;
    let mut session = ConfigReconciler::from_raw(&raw);

    apply_edits(&mut session, &args);

    let catalog = load_catalog(&args, settings).await?;
    let region = args
        .region
        .clone()
        .or_else(|| session.configuration().text(REGION).map(str::to_string))
        .unwrap_or_else(|| settings.defaults.region.clone());

    let estimate = session.estimate_cost(&catalog, &region);
    print_estimate(&session, &estimate);

    if args.write {
        super::write_json(&args.config, &session.snapshot())?;
        println!();
        println!("✅ Configuration written to {}", args.config.display());
    }

    Ok(())
}

/// Apply removals, restores and assignments in that order.
///
/// A failed assignment is reported and skipped.
fn apply_edits(session: &mut ConfigReconciler, args: &EstimateArgs) {
    for name in &args.remove {
        if !session.remove_field(name) {
            warn!("'{}' is not a tracked quantified field; nothing removed", name);
        }
    }
    for name in &args.restore {
        if !session.restore_field(name) {
            warn!("'{}' was not removed; nothing restored", name);
        }
    }
    for (name, text) in &args.set {
        if let Err(e) = session.set_value(name, &raw_value(text)) {
            warn!("{}", e);
            println!("⚠️  {}", e);
        }
    }
}

async fn load_catalog(args: &EstimateArgs, settings: &Settings) -> Result<Arc<CatalogIndex>> {
    if let Some(path) = &args.catalog {
        let index = read_snapshot(path)
            .with_context(|| format!("Failed to load catalog snapshot {}", path.display()))?;
        return Ok(Arc::new(index));
    }

    match settings.billing() {
        Some((parent, client)) => {
            info!("Using live catalog for {}", parent);
            Ok(settings.catalog_cache()?.get_or_refresh(&client, parent).await)
        }
        None => {
            warn!("No catalog snapshot or billing scope configured; prices default to 0");
            Ok(Arc::new(CatalogIndex::empty()))
        }
    }
}

fn print_estimate(session: &ConfigReconciler, estimate: &CostEstimate) {
    println!("🧾 Configuration");
    for (name, value) in session.configuration().iter() {
        let marker = match FieldClass::of(name) {
            FieldClass::Quantified(_) => "#",
            FieldClass::Temporal => "@",
            FieldClass::FreeForm => "-",
        };
        println!("   {} {}: {}", marker, name, value);
    }
    let removed: Vec<String> = session.removal_set().iter().map(|f| f.to_string()).collect();
    if !removed.is_empty() {
        println!("   removed: {}", removed.join(", "));
    }

    println!();
    println!("💰 Pricing in {} ({} hours)", estimate.region, estimate.hours);
    for line in &estimate.lines {
        println!(
            "   {:<28} {:>6} × ${:<10.6} = ${:.4}/h",
            line.description, line.quantity, line.unit_price, line.hourly
        );
    }
    println!();
    println!("{}", estimate.format_total());
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_config::QuantifiedField;
    use serde_json::json;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("compute=8").unwrap(), ("compute".into(), "8".into()));
        assert_eq!(parse_assignment("notes=a=b").unwrap(), ("notes".into(), "a=b".into()));
        assert!(parse_assignment("compute").is_err());
        assert!(parse_assignment("=8").is_err());
    }

    #[test]
    fn test_raw_value() {
        assert_eq!(raw_value("8"), json!(8));
        assert_eq!(raw_value("eight"), json!("eight"));
        assert_eq!(raw_value("\"8\""), json!("8"));
    }

    #[test]
    fn test_edits_apply_in_order_and_skip_bad_values() {
        let mut session = ConfigReconciler::from_raw(json!({"compute": 4, "memory": 16}).as_object().unwrap());
        let args = EstimateArgs {
            config: PathBuf::from("config.json"),
            catalog: None,
            region: None,
            remove: vec!["memory".into(), "gpu".into()],
            restore: vec!["memory".into()],
            set: vec![
                ("compute".into(), "lots".into()),
                ("memory".into(), "64".into()),
            ],
            write: false,
        };

        apply_edits(&mut session, &args);

        assert_eq!(session.configuration().quantity(QuantifiedField::Compute), Some(4));
        assert_eq!(session.configuration().quantity(QuantifiedField::Memory), Some(64));
        assert!(session.removal_set().is_empty());
    }

    #[tokio::test]
    async fn test_execute_with_snapshot_writes_edits() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let snapshot_path = dir.path().join("prices.json");
        std::fs::write(&config_path, r#"{"compute": 4, "budget": 1000, "region": "us-central1"}"#).unwrap();
        market_catalog::write_snapshot(
            &CatalogIndex::from_entries([market_catalog::PriceEntry::new(
                "N1 Predefined Instance Core",
                "global",
                "OnDemand",
                0.05,
            )]),
            &snapshot_path,
        )
        .unwrap();

        let args = EstimateArgs {
            config: config_path.clone(),
            catalog: Some(snapshot_path),
            region: None,
            remove: vec!["budget".into()],
            restore: vec![],
            set: vec![("compute".into(), "8".into())],
            write: true,
        };
        execute(args, &Settings::default()).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&config_path).unwrap()).unwrap();
        assert_eq!(written, json!({"compute": 8, "region": "us-central1"}));
    }
}
