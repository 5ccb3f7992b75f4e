//! Shared, time-boxed catalog cache.
//!
//! At most one index is held, tagged with the billing scope it was built
//! for. A rebuild swaps in a new `Arc` atomically; readers keep whatever
//! index they already hold.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::index::{CatalogFilter, CatalogIndex};
use crate::source::{fetch_catalog, SkuPageSource};

/// Default freshness window: one day.
pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug)]
struct CachedCatalog {
    scope: String,
    built_at: DateTime<Utc>,
    index: Arc<CatalogIndex>,
}

/// Read-mostly holder of the current catalog index.
pub struct CatalogCache {
    ttl: Duration,
    filter: CatalogFilter,
    slot: ArcSwapOption<CachedCatalog>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_TTL_HOURS))
    }
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            filter: CatalogFilter::default(),
            slot: ArcSwapOption::empty(),
        }
    }

    pub fn with_filter(mut self, filter: CatalogFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached index for `scope` if it is still fresh.
    pub fn current(&self, scope: &str) -> Option<Arc<CatalogIndex>> {
        self.current_at(scope, Utc::now())
    }

    pub fn current_at(&self, scope: &str, now: DateTime<Utc>) -> Option<Arc<CatalogIndex>> {
        let cached = self.slot.load_full()?;
        if cached.scope != scope {
            debug!("Cached catalog is for {}, not {}", cached.scope, scope);
            return None;
        }
        if now - cached.built_at >= self.ttl {
            debug!("Cached catalog for {} is stale", scope);
            return None;
        }
        Some(Arc::clone(&cached.index))
    }

    /// Replace the cached index.
    pub fn install(&self, scope: &str, index: CatalogIndex) -> Arc<CatalogIndex> {
        self.install_at(scope, index, Utc::now())
    }

    pub fn install_at(
        &self,
        scope: &str,
        index: CatalogIndex,
        built_at: DateTime<Utc>,
    ) -> Arc<CatalogIndex> {
        let index = Arc::new(index);
        self.slot.store(Some(Arc::new(CachedCatalog {
            scope: scope.to_string(),
            built_at,
            index: Arc::clone(&index),
        })));
        info!("Installed catalog for {} ({} prices)", scope, index.len());
        index
    }

    /// Drop the cached index.
    pub fn invalidate(&self) {
        self.slot.store(None);
    }

    /// Return the fresh cached index for `scope`, fetching a new one from
    /// `source` when there is none.
    pub async fn get_or_refresh(
        &self,
        source: &dyn SkuPageSource,
        scope: &str,
    ) -> Arc<CatalogIndex> {
        if let Some(index) = self.current(scope) {
            return index;
        }
        let index = fetch_catalog(source, scope, &self.filter).await;
        self.install(scope, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PriceEntry;

    fn index() -> CatalogIndex {
        CatalogIndex::from_entries([PriceEntry::new("Core", "global", "OnDemand", 0.05)])
    }

    #[test]
    fn test_fresh_index_is_served() {
        let cache = CatalogCache::default();
        let now = Utc::now();
        cache.install_at("billingAccounts/A", index(), now);

        let hit = cache.current_at("billingAccounts/A", now + Duration::hours(23)).unwrap();
        assert_eq!(hit.len(), 1);
    }

    #[test]
    fn test_stale_index_is_not_served() {
        let cache = CatalogCache::new(Duration::hours(1));
        let now = Utc::now();
        cache.install_at("billingAccounts/A", index(), now);

        assert!(cache.current_at("billingAccounts/A", now + Duration::hours(1)).is_none());
    }

    #[test]
    fn test_scope_change_misses() {
        let cache = CatalogCache::default();
        cache.install("billingAccounts/A", index());
        assert!(cache.current("billingAccounts/B").is_none());
        assert!(cache.current("billingAccounts/A").is_some());
    }

    #[test]
    fn test_readers_keep_old_index_after_swap() {
        let cache = CatalogCache::default();
        let old = cache.install("billingAccounts/A", index());
        cache.install("billingAccounts/A", CatalogIndex::empty());

        assert_eq!(old.len(), 1);
        assert!(cache.current("billingAccounts/A").unwrap().is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cache = CatalogCache::default();
        cache.install("billingAccounts/A", index());
        cache.invalidate();
        assert!(cache.current("billingAccounts/A").is_none());
    }

    #[tokio::test]
    async fn test_get_or_refresh_fetches_once() {
        let mut source = crate::source::MockSkuPageSource::new();
        source.expect_fetch_page().times(1).returning(|_, _| {
            Ok(serde_json::from_str(
                r#"{"skus": [{
                    "description": "N1 Predefined Instance Core",
                    "category": {"serviceDisplayName": "Compute Engine", "usageType": "OnDemand"},
                    "serviceRegions": ["global"],
                    "pricingInfo": [{"pricingExpression": {"tieredRates": [{"unitPrice": {"nanos": 30000000}}]}}]
                }]}"#,
            )?)
        });

        let cache = CatalogCache::default();
        let first = cache.get_or_refresh(&source, "billingAccounts/A").await;
        let second = cache.get_or_refresh(&source, "billingAccounts/A").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.lookup("Core", "asia-east1", "OnDemand"), Some(0.03));
    }
}
