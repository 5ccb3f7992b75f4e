//! In-memory price index built from SKU pages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::sku::{Sku, SkuPage};

/// Region sentinel for prices that apply everywhere.
pub const GLOBAL_REGION: &str = "global";

/// Default service family kept during ingestion.
pub const COMPUTE_ENGINE: &str = "Compute Engine";

/// One catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub description: String,
    pub region: String,
    pub usage_type: String,
    /// Price per unit per hour, never negative.
    pub unit_price: f64,
}

impl PriceEntry {
    pub fn new(
        description: impl Into<String>,
        region: impl Into<String>,
        usage_type: impl Into<String>,
        unit_price: f64,
    ) -> Self {
        Self {
            description: description.into(),
            region: region.into(),
            usage_type: usage_type.into(),
            unit_price,
        }
    }

    /// Whether this entry answers a query.
    ///
    /// The fragment must be a substring of the stored description. An empty
    /// stored region never matches a specific region.
    pub fn matches(&self, fragment: &str, region: &str, usage_type: &str) -> bool {
        self.description.contains(fragment)
            && self.usage_type == usage_type
            && (self.region == GLOBAL_REGION || (!self.region.is_empty() && self.region == region))
    }
}

/// Which SKUs survive ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Substring matched against `category.serviceDisplayName`.
    pub service_family: String,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            service_family: COMPUTE_ENGINE.to_string(),
        }
    }
}

impl CatalogFilter {
    pub fn service_family(family: impl Into<String>) -> Self {
        Self {
            service_family: family.into(),
        }
    }

    pub fn accepts(&self, sku: &Sku) -> bool {
        sku.category.service_display_name.contains(&self.service_family)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PriceKey {
    description: String,
    region: String,
    usage_type: String,
}

impl From<&PriceEntry> for PriceKey {
    fn from(entry: &PriceEntry) -> Self {
        Self {
            description: entry.description.clone(),
            region: entry.region.clone(),
            usage_type: entry.usage_type.clone(),
        }
    }
}

/// Read-only lookup from `(description, region, usage type)` to unit price.
///
/// Entries keep their ingestion order, which decides ties in [`lookup`].
///
/// [`lookup`]: CatalogIndex::lookup
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<PriceEntry>,
}

impl CatalogIndex {
    /// An index with no prices. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fold a sequence of pages into an index with the default filter.
    ///
    /// The first failed page ends ingestion; the pages before it are kept.
    pub fn build<I, E>(pages: I) -> Self
    where
        I: IntoIterator<Item = Result<SkuPage, E>>,
        E: std::fmt::Display,
    {
        Self::build_filtered(pages, &CatalogFilter::default())
    }

    pub fn build_filtered<I, E>(pages: I, filter: &CatalogFilter) -> Self
    where
        I: IntoIterator<Item = Result<SkuPage, E>>,
        E: std::fmt::Display,
    {
        let mut builder = CatalogBuilder::new(filter.clone());
        for page in pages {
            match page {
                Ok(page) => builder.ingest_page(&page),
                Err(e) => {
                    tracing::warn!("Catalog ingestion stopped early: {}", e);
                    break;
                }
            }
        }
        builder.finish()
    }

    /// Rebuild an index from a snapshot of entries, in order.
    pub fn from_entries(entries: impl IntoIterator<Item = PriceEntry>) -> Self {
        let mut builder = CatalogBuilder::new(CatalogFilter::default());
        for entry in entries {
            builder.insert(entry);
        }
        builder.finish()
    }

    /// First entry, in iteration order, whose description contains
    /// `fragment`, whose region is `region` or global, and whose usage type
    /// is `usage_type`.
    pub fn lookup(&self, fragment: &str, region: &str, usage_type: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.matches(fragment, region, usage_type))
            .map(|entry| entry.unit_price)
    }

    /// Like [`lookup`](Self::lookup) but a miss costs nothing.
    pub fn price_or_zero(&self, fragment: &str, region: &str, usage_type: &str) -> f64 {
        self.lookup(fragment, region, usage_type).unwrap_or(0.0)
    }

    pub fn entries(&self) -> &[PriceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Incremental ingestion shared by the synchronous and paginated paths.
#[derive(Debug)]
pub struct CatalogBuilder {
    filter: CatalogFilter,
    entries: Vec<PriceEntry>,
    positions: HashMap<PriceKey, usize>,
    skipped: usize,
}

impl CatalogBuilder {
    pub fn new(filter: CatalogFilter) -> Self {
        Self {
            filter,
            entries: Vec::new(),
            positions: HashMap::new(),
            skipped: 0,
        }
    }

    /// Ingest every record of a page that passes the filter.
    pub fn ingest_page(&mut self, page: &SkuPage) {
        for sku in &page.skus {
            self.ingest_sku(sku);
        }
    }

    pub fn ingest_sku(&mut self, sku: &Sku) {
        if !self.filter.accepts(sku) {
            return;
        }

        let price = match sku.first_tier_price() {
            Some(price) if price >= 0.0 && price.is_finite() => price,
            _ => {
                debug!("Skipping SKU without a usable price: {}", sku.description);
                self.skipped += 1;
                return;
            }
        };

        self.insert(PriceEntry::new(
            sku.description.clone(),
            sku.region(),
            sku.category.usage_type.clone(),
            price,
        ));
    }

    /// Insert an entry; a repeated key overwrites the price in place.
    pub fn insert(&mut self, entry: PriceEntry) {
        let key = PriceKey::from(&entry);
        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos].unit_price = entry.unit_price,
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Number of entries accumulated so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> CatalogIndex {
        info!(
            "Catalog index built: {} prices ({} malformed SKUs skipped)",
            self.entries.len(),
            self.skipped
        );
        CatalogIndex {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sku::{Money, PricingExpression, PricingInfo, SkuCategory, TierRate};

    fn sku(description: &str, service: &str, region: &str, nanos: Option<i32>) -> Sku {
        Sku {
            description: description.to_string(),
            category: SkuCategory {
                service_display_name: service.to_string(),
                usage_type: "OnDemand".to_string(),
            },
            service_regions: vec![region.to_string()],
            pricing_info: nanos
                .map(|nanos| {
                    vec![PricingInfo {
                        pricing_expression: PricingExpression {
                            tiered_rates: vec![TierRate {
                                unit_price: Money { units: 0, nanos },
                            }],
                        },
                    }]
                })
                .unwrap_or_default(),
        }
    }

    #[test]
    fn test_filter_drops_other_services() {
        let page = SkuPage {
            skus: vec![
                sku("N1 Predefined Instance Core", "Compute Engine", "us-central1", Some(30_000_000)),
                sku("Standard Storage", "Cloud Storage", "us-central1", Some(20_000_000)),
            ],
            next_page_token: None,
        };

        let index = CatalogIndex::build([Ok::<_, String>(page)]);
        assert_eq!(index.len(), 1);
        assert!(index.lookup("Standard Storage", "us-central1", "OnDemand").is_none());
    }

    #[test]
    fn test_malformed_sku_is_skipped() {
        let page = SkuPage {
            skus: vec![
                sku("N1 Predefined Instance Ram", "Compute Engine", "us-central1", None),
                sku("N1 Predefined Instance Core", "Compute Engine", "us-central1", Some(30_000_000)),
            ],
            next_page_token: None,
        };

        let index = CatalogIndex::build([Ok::<_, String>(page)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.entries()[0].description, "N1 Predefined Instance Core");
    }

    #[test]
    fn test_negative_price_is_skipped() {
        let mut builder = CatalogBuilder::new(CatalogFilter::default());
        builder.ingest_sku(&sku("Credit", "Compute Engine", "us-central1", Some(-1)));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_error_keeps_earlier_pages() {
        let first = SkuPage {
            skus: vec![sku("N1 Predefined Instance Core", "Compute Engine", "us-central1", Some(30_000_000))],
            next_page_token: Some("next".to_string()),
        };
        let last = SkuPage {
            skus: vec![sku("SSD backed PD Capacity", "Compute Engine", "us-central1", Some(1_000_000))],
            next_page_token: None,
        };

        let index = CatalogIndex::build(vec![Ok(first), Err("permission denied"), Ok(last)]);
        assert_eq!(index.len(), 1);
        assert!(index.lookup("SSD", "us-central1", "OnDemand").is_none());
    }

    #[test]
    fn test_duplicate_key_overwrites_in_place() {
        let index = CatalogIndex::from_entries([
            PriceEntry::new("Core", "us-central1", "OnDemand", 0.03),
            PriceEntry::new("Core", "global", "OnDemand", 0.05),
            PriceEntry::new("Core", "us-central1", "OnDemand", 0.04),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[0].unit_price, 0.04);
        assert_eq!(index.lookup("Core", "us-central1", "OnDemand"), Some(0.04));
    }

    #[test]
    fn test_empty_region_never_matches() {
        let index = CatalogIndex::from_entries([PriceEntry::new("Core", "", "OnDemand", 0.03)]);
        assert!(index.lookup("Core", "us-central1", "OnDemand").is_none());
        assert_eq!(index.price_or_zero("Core", "us-central1", "OnDemand"), 0.0);
    }

    #[test]
    fn test_usage_type_must_match_exactly() {
        let index = CatalogIndex::from_entries([PriceEntry::new("Core", "global", "Commit1Yr", 0.02)]);
        assert!(index.lookup("Core", "us-central1", "OnDemand").is_none());
        assert_eq!(index.lookup("Core", "us-central1", "Commit1Yr"), Some(0.02));
    }
}
