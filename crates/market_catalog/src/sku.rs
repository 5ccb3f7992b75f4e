//! Wire types for Cloud Billing SKU listings.
//!
//! Only the fields the index needs are modelled; everything else in the
//! response is ignored by serde.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// One page of a `skus.list` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuPage {
    /// Records that decode; a malformed record is dropped on its own.
    #[serde(default, deserialize_with = "skip_malformed_skus")]
    pub skus: Vec<Sku>,
    /// Continuation token; absent or empty on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl SkuPage {
    /// The continuation token, treating an empty string as absent.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// A billable SKU record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: SkuCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_regions: Vec<String>,
    #[serde(default)]
    pub pricing_info: Vec<PricingInfo>,
}

impl Sku {
    /// Region scope of the record: the first listed region, or empty.
    pub fn region(&self) -> &str {
        self.service_regions.first().map(String::as_str).unwrap_or("")
    }

    /// Flat hourly unit price taken from the first tier of the first
    /// pricing entry that has any tiers.
    pub fn first_tier_price(&self) -> Option<f64> {
        self.pricing_info
            .iter()
            .find_map(|info| info.pricing_expression.tiered_rates.first())
            .map(|rate| rate.unit_price.as_f64())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuCategory {
    #[serde(default)]
    pub service_display_name: String,
    #[serde(default)]
    pub usage_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInfo {
    #[serde(default)]
    pub pricing_expression: PricingExpression,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingExpression {
    #[serde(default)]
    pub tiered_rates: Vec<TierRate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRate {
    #[serde(default)]
    pub unit_price: Money,
}

/// `google.type.Money` without the currency code.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Money {
    /// Whole units. The API encodes int64 as a JSON string.
    #[serde(default, deserialize_with = "int64_string_or_number")]
    pub units: i64,
    #[serde(default)]
    pub nanos: i32,
}

impl Money {
    pub fn as_f64(&self) -> f64 {
        self.units as f64 + f64::from(self.nanos) / 1e9
    }
}

fn skip_malformed_skus<'de, D>(deserializer: D) -> Result<Vec<Sku>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Sku>(record) {
            Ok(sku) => Some(sku),
            Err(e) => {
                debug!("Skipping malformed SKU record: {}", e);
                None
            }
        })
        .collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn int64_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
