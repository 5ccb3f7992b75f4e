//! Cost estimation against a price catalog.
//!
//! ```text
//! total = (cpu × vCPUs + ram × GB + ssd × GB + gpu) × days × 24
//! ```
//!
//! Prices come from [`CatalogIndex::lookup`] with usage type `OnDemand`.
//! A price that is not in the catalog costs nothing.

use market_catalog::CatalogIndex;
use serde::Serialize;
use tracing::debug;

use crate::configuration::RequestConfiguration;
use crate::field::{GpuModel, QuantifiedField, GPU};

pub const USAGE_ON_DEMAND: &str = "OnDemand";
pub const CPU_DESCRIPTION: &str = "N1 Predefined Instance Core";
pub const MEMORY_DESCRIPTION: &str = "N1 Predefined Instance Ram";
pub const STORAGE_DESCRIPTION: &str = "SSD";

const HOURS_PER_DAY: i64 = 24;

/// A billable dimension of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostDimension {
    Cpu,
    Memory,
    Storage,
    Gpu,
}

/// One itemized line of an estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub dimension: CostDimension,
    /// Catalog description fragment used for the lookup.
    pub description: String,
    pub quantity: i64,
    /// Hourly unit price; 0 when the catalog had no match.
    pub unit_price: f64,
    /// `unit_price × quantity`, per hour.
    pub hourly: f64,
}

/// Result of [`estimate_cost`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    /// Total for the whole period, rounded to cents.
    pub total: f64,
    pub duration_days: i64,
    pub hours: i64,
    pub region: String,
    pub lines: Vec<CostLine>,
}

impl CostEstimate {
    pub fn as_tuple(&self) -> (f64, i64) {
        (self.total, self.duration_days)
    }

    /// Sum of the hourly subtotals.
    pub fn hourly_rate(&self) -> f64 {
        self.lines.iter().map(|line| line.hourly).sum()
    }

    pub fn format_total(&self) -> String {
        format!(
            "Estimated billing cost for {} days: ${:.2}",
            self.duration_days, self.total
        )
    }
}

/// Days between start and end, at least one.
///
/// Missing dates, or an end on or before the start, give a single day.
pub fn duration_days(config: &RequestConfiguration) -> i64 {
    match (config.start_date(), config.end_date()) {
        (Some(start), Some(end)) => (end - start).num_days().max(1),
        _ => 1,
    }
}

/// Estimate the cost of `config` in `region`. Never fails and never mutates.
pub fn estimate_cost(
    config: &RequestConfiguration,
    catalog: &CatalogIndex,
    region: &str,
) -> CostEstimate {
    let days = duration_days(config);
    let hours = days * HOURS_PER_DAY;

    let quantity = |field: QuantifiedField| config.quantity(field).unwrap_or(0);
    let mut lines = vec![
        line(catalog, region, CostDimension::Cpu, CPU_DESCRIPTION, quantity(QuantifiedField::Compute)),
        line(catalog, region, CostDimension::Memory, MEMORY_DESCRIPTION, quantity(QuantifiedField::Memory)),
        line(catalog, region, CostDimension::Storage, STORAGE_DESCRIPTION, quantity(QuantifiedField::Storage)),
    ];

    // One accelerator, priced per unit.
    if let Some(gpu) = config.text(GPU).and_then(GpuModel::from_name) {
        lines.push(line(catalog, region, CostDimension::Gpu, gpu.display_name(), 1));
    }

    let hourly: f64 = lines.iter().map(|line| line.hourly).sum();
    let total = round_cents(hourly * hours as f64);
    debug!(
        "Estimated {:.2} for {} day(s) in {} ({:.4}/h)",
        total, days, region, hourly
    );

    CostEstimate {
        total,
        duration_days: days,
        hours,
        region: region.to_string(),
        lines,
    }
}

fn line(
    catalog: &CatalogIndex,
    region: &str,
    dimension: CostDimension,
    description: &str,
    quantity: i64,
) -> CostLine {
    let unit_price = catalog.price_or_zero(description, region, USAGE_ON_DEMAND);
    CostLine {
        dimension,
        description: description.to_string(),
        quantity,
        unit_price,
        hourly: unit_price * quantity as f64,
    }
}

/// Round half away from zero to two decimals.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
