//! Catalog command - Snapshot the billing price catalog.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use market_catalog::{write_snapshot, CatalogError};

use crate::settings::Settings;

#[derive(Args)]
pub struct CatalogArgs {
    /// Where to write the price snapshot (JSON)
    #[arg(short, long)]
    out: PathBuf,
}

pub async fn execute(args: CatalogArgs, settings: &Settings) -> Result<()> {
    let (parent, client) = match settings.billing() {
        Some(billing) => billing,
        None if settings.billing.parent.is_none() => return Err(CatalogError::ScopeNotConfigured.into()),
        None => return Err(CatalogError::CredentialsMissing.into()),
    };

    info!("Fetching price catalog for {}", parent);
    println!("📥 Fetching pricing SKUs for {}...", parent);

    let cache = settings.catalog_cache()?;
    let index = cache.get_or_refresh(&client, parent).await;
    if index.is_empty() {
        warn!("Catalog for {} is empty; estimates will be 0.00", parent);
    }

    write_snapshot(&index, &args.out)?;
    println!("✅ Wrote {} prices to {}", index.len(), args.out.display());

    Ok(())
}
