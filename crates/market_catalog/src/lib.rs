//! # market_catalog
//!
//! Cloud price catalog ingestion and lookup for the infra marketplace.
//!
//! SKU listings arrive as token-paginated pages. Records from the compute
//! service family are folded into a [`CatalogIndex`], which answers point
//! price queries by description fragment, region and usage type.
//!
//! ## Features
//!
//! - Best-effort ingestion: a failed page keeps the prices gathered so far
//! - Substring, first-match lookup with a `"global"` region fallback
//! - A shared [`CatalogCache`] with a freshness window, swapped atomically
//! - A Cloud Billing [`BillingClient`] page source
//!
//! ## Example
//!
//! ```rust
//! use market_catalog::{CatalogIndex, PriceEntry};
//!
//! let index = CatalogIndex::from_entries([
//!     PriceEntry::new("N1 Predefined Instance Core", "us-central1", "OnDemand", 0.03),
//!     PriceEntry::new("N1 Predefined Instance Core", "global", "OnDemand", 0.05),
//! ]);
//!
//! assert_eq!(index.lookup("Instance Core", "us-central1", "OnDemand"), Some(0.03));
//! assert_eq!(index.lookup("Instance Core", "asia-east1", "OnDemand"), Some(0.05));
//! ```

pub mod cache;
pub mod error;
pub mod index;
pub mod sku;
pub mod source;

pub use cache::{CatalogCache, DEFAULT_TTL_HOURS};
pub use error::{CatalogError, CatalogResult};
pub use index::{CatalogBuilder, CatalogFilter, CatalogIndex, PriceEntry, COMPUTE_ENGINE, GLOBAL_REGION};
pub use sku::{Money, PricingExpression, PricingInfo, Sku, SkuCategory, SkuPage, TierRate};
pub use source::{fetch_catalog, BillingClient, SkuPageSource, DEFAULT_BILLING_BASE_URL, DEFAULT_PAGE_SIZE};

/// Read a snapshot of price entries written by [`write_snapshot`].
pub fn read_snapshot(path: impl AsRef<std::path::Path>) -> CatalogResult<CatalogIndex> {
    let content = std::fs::read_to_string(path)?;
    let entries: Vec<PriceEntry> = serde_json::from_str(&content)?;
    Ok(CatalogIndex::from_entries(entries))
}

/// Write the entries of `index` as a JSON array, preserving order.
pub fn write_snapshot(index: &CatalogIndex, path: impl AsRef<std::path::Path>) -> CatalogResult<()> {
    let content = serde_json::to_string_pretty(index.entries())?;
    std::fs::write(path, content)?;
    Ok(())
}
