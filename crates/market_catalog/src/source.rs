//! Paginated SKU sources and catalog fetching.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::index::{CatalogBuilder, CatalogFilter, CatalogIndex};
use crate::sku::SkuPage;

/// Default Cloud Billing endpoint. Account-scoped SKU listing lives in v1beta.
pub const DEFAULT_BILLING_BASE_URL: &str = "https://cloudbilling.googleapis.com/v1beta";

/// Largest page the Cloud Billing API hands out.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// A producer of SKU pages addressed by continuation token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkuPageSource: Send + Sync {
    /// Fetch the page following `page_token` (the first page when `None`).
    async fn fetch_page(&self, parent: &str, page_token: Option<String>) -> CatalogResult<SkuPage>;
}

/// Drain `source` page by page into an index.
///
/// Any fetch error ends ingestion and the prices gathered so far are
/// returned. A token seen before is treated as the end of the listing.
pub async fn fetch_catalog(
    source: &dyn SkuPageSource,
    parent: &str,
    filter: &CatalogFilter,
) -> CatalogIndex {
    let mut builder = CatalogBuilder::new(filter.clone());
    let mut page_token: Option<String> = None;
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = match source.fetch_page(parent, page_token.clone()).await {
            Ok(page) => page,
            Err(e) => {
                warn!(
                    "Error fetching pricing SKUs for {} after {} page(s): {}",
                    parent, pages, e
                );
                break;
            }
        };
        pages += 1;
        builder.ingest_page(&page);
        debug!("Ingested page {} ({} prices so far)", pages, builder.len());

        match page.continuation() {
            Some(next) if seen_tokens.insert(next.to_string()) => {
                page_token = Some(next.to_string());
            }
            Some(next) => {
                warn!("Billing API repeated page token {}; stopping", next);
                break;
            }
            None => break,
        }
    }

    info!("Fetched {} page(s) of SKUs for {}", pages, parent);
    builder.finish()
}

/// Cloud Billing `skus.list` client.
pub struct BillingClient {
    base_url: String,
    access_token: String,
    page_size: u32,
    client: reqwest::Client,
}

impl BillingClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BILLING_BASE_URL.to_string(),
            access_token: access_token.into(),
            page_size: DEFAULT_PAGE_SIZE,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from `GOOGLE_OAUTH_ACCESS_TOKEN`.
    pub fn from_env() -> CatalogResult<Self> {
        match std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            Ok(token) if !token.is_empty() => Ok(Self::new(token)),
            _ => Err(CatalogError::CredentialsMissing),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> CatalogResult<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// URL of the listing for `parent`, e.g. `billingAccounts/0123-4567-89AB`.
    pub fn skus_url(&self, parent: &str) -> String {
        format!("{}/{}/skus", self.base_url, parent.trim_matches('/'))
    }
}

#[async_trait]
impl SkuPageSource for BillingClient {
    async fn fetch_page(&self, parent: &str, page_token: Option<String>) -> CatalogResult<SkuPage> {
        if parent.trim().is_empty() {
            return Err(CatalogError::ScopeNotConfigured);
        }

        let mut request = self
            .client
            .get(self.skus_url(parent))
            .bearer_auth(&self.access_token)
            .query(&[("pageSize", self.page_size.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<SkuPage>().await?)
    }
}
