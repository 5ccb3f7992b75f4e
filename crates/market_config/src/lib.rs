//! # market_config
//!
//! The configuration reconciler for infrastructure requests.
//!
//! A recommendation yields a flat mapping of fields. [`ConfigReconciler`]
//! owns that mapping together with the set of quantified fields the user
//! opted out of, applies edits, and prices the result against a
//! [`market_catalog::CatalogIndex`].
//!
//! ```
//! use market_catalog::{CatalogIndex, PriceEntry};
//! use market_config::ConfigReconciler;
//! use serde_json::json;
//!
//! let raw = json!({"compute": 4, "start_date": "2025-08-01", "end_date": "2025-08-03"});
//! let mut session = ConfigReconciler::from_raw(raw.as_object().unwrap());
//! session.set_value("compute", &json!("8")).unwrap();
//!
//! let catalog = CatalogIndex::from_entries([PriceEntry::new(
//!     "N1 Predefined Instance Core", "global", "OnDemand", 0.05,
//! )]);
//! let (total, days) = session.estimate_cost(&catalog, "us-central1").as_tuple();
//! assert_eq!((total, days), (19.2, 2));
//! ```

pub mod configuration;
pub mod error;
pub mod estimate;
pub mod field;
pub mod reconciler;
pub mod request;
pub mod value;

pub use configuration::{RemovalSet, RequestConfiguration};
pub use error::{ConfigError, ConfigResult};
pub use estimate::{estimate_cost, CostDimension, CostEstimate, CostLine};
pub use field::{FieldClass, FieldSpec, GpuModel, QuantifiedField};
pub use reconciler::ConfigReconciler;
pub use request::{Environment, Purpose, UserRequest, WorkloadType};
pub use value::FieldValue;

/// Region used when a request names none.
pub const DEFAULT_REGION: &str = "us-central1";
