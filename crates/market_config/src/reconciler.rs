//! Editing session over a configuration and its removal set.

use market_catalog::CatalogIndex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::configuration::{RemovalSet, RequestConfiguration};
use crate::error::{ConfigError, ConfigResult};
use crate::estimate::{self, CostEstimate};
use crate::field::{FieldClass, QuantifiedField};
use crate::value::{coerce_integer, flatten_text, parse_date, today, FieldValue};

/// Owns one request's configuration and removal set for the length of an
/// editing session.
///
/// A quantified field is either present with a value or in the removal set,
/// never both.
#[derive(Debug, Clone, Default)]
pub struct ConfigReconciler {
    config: RequestConfiguration,
    removed: RemovalSet,
}

impl ConfigReconciler {
    pub fn new(config: RequestConfiguration) -> Self {
        Self {
            config,
            removed: RemovalSet::new(),
        }
    }

    /// Start a session from a raw recommendation `config` mapping.
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        Self::new(RequestConfiguration::from_raw(raw))
    }

    pub fn configuration(&self) -> &RequestConfiguration {
        &self.config
    }

    pub fn removal_set(&self) -> &RemovalSet {
        &self.removed
    }

    pub fn is_removed(&self, name: &str) -> bool {
        QuantifiedField::from_name(name).is_some_and(|field| self.removed.contains(field))
    }

    /// Quantified fields that have not been removed.
    ///
    /// Being kept does not imply a value: a field the recommendation left
    /// out stays absent and prices at nothing until `set_value` gives it one.
    pub fn kept_fields(&self) -> Vec<QuantifiedField> {
        QuantifiedField::ALL
            .into_iter()
            .filter(|field| !self.removed.contains(*field))
            .collect()
    }

    /// Opt out of a quantified field.
    ///
    /// Returns `false` when `name` is not quantified or is already removed.
    pub fn remove_field(&mut self, name: &str) -> bool {
        let Some(field) = QuantifiedField::from_name(name) else {
            debug!("Ignoring removal of non-quantified field '{}'", name);
            return false;
        };
        if !self.removed.insert(field) {
            return false;
        }
        self.config.remove(name);
        debug!("Removed field '{}'", name);
        true
    }

    /// Bring a removed field back.
    ///
    /// The field's default is inserted only if it has no value. Returns
    /// `false` when the field was not removed.
    pub fn restore_field(&mut self, name: &str) -> bool {
        let Some(field) = QuantifiedField::from_name(name) else {
            return false;
        };
        if !self.removed.remove(field) {
            return false;
        }
        if !self.config.contains(name) {
            self.config
                .insert(name, FieldValue::Number(field.default_value()));
        }
        debug!("Restored field '{}'", name);
        true
    }

    /// Coerce `raw` by the field's class and store it.
    ///
    /// Quantified fields fail with [`ConfigError::Coercion`] on anything
    /// that is not an integer, and with [`ConfigError::FieldRemoved`] while
    /// removed. Either way the stored value is unchanged. Dates that do not
    /// parse become today. Free-form values are stored as text.
    pub fn set_value(&mut self, name: &str, raw: &Value) -> ConfigResult<()> {
        let value = match FieldClass::of(name) {
            FieldClass::Quantified(field) => {
                if self.removed.contains(field) {
                    return Err(ConfigError::FieldRemoved(name.to_string()));
                }
                FieldValue::Number(coerce_integer(name, raw)?)
            }
            FieldClass::Temporal => FieldValue::Date(parse_date(raw).unwrap_or_else(|| {
                let fallback = today();
                warn!(
                    "Invalid date for '{}': {}; using {}",
                    name, raw, fallback
                );
                fallback
            })),
            FieldClass::FreeForm => FieldValue::Text(flatten_text(raw).unwrap_or_default()),
        };
        self.config.insert(name, value);
        Ok(())
    }

    pub fn estimate_cost(&self, catalog: &CatalogIndex, region: &str) -> CostEstimate {
        estimate::estimate_cost(&self.config, catalog, region)
    }

    /// JSON snapshot of the configuration as it stands.
    pub fn snapshot(&self) -> Value {
        self.config.to_json()
    }

    pub fn into_parts(self) -> (RequestConfiguration, RemovalSet) {
        (self.config, self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reconciler(value: Value) -> ConfigReconciler {
        ConfigReconciler::from_raw(value.as_object().unwrap())
    }

    #[test]
    fn test_remove_only_quantified() {
        let mut session = reconciler(json!({"compute": 8, "gpu": "NVIDIA T4"}));

        assert!(!session.remove_field("gpu"));
        assert!(session.configuration().contains("gpu"));

        assert!(session.remove_field("compute"));
        assert!(!session.configuration().contains("compute"));
        assert!(session.is_removed("compute"));
        assert_eq!(
            session.kept_fields(),
            vec![QuantifiedField::Memory, QuantifiedField::Storage, QuantifiedField::Budget]
        );
    }

    #[test]
    fn test_restore_keeps_existing_value() {
        let mut session = reconciler(json!({"memory": 64}));
        assert!(session.remove_field("memory"));

        // Re-inserted behind the reconciler's back.
        session.config.insert("memory", FieldValue::Number(48));
        assert!(session.restore_field("memory"));
        assert_eq!(session.configuration().quantity(QuantifiedField::Memory), Some(48));
    }

    #[test]
    fn test_set_value_on_removed_field() {
        let mut session = reconciler(json!({"storage": 500}));
        session.remove_field("storage");

        let err = session.set_value("storage", &json!(200)).unwrap_err();
        assert!(matches!(err, ConfigError::FieldRemoved(ref f) if f == "storage"));
        assert!(!session.configuration().contains("storage"));
    }

    #[test]
    fn test_set_value_dates_fall_back_to_today() {
        let mut session = ConfigReconciler::default();
        session.set_value("start_date", &json!("soon")).unwrap();
        assert_eq!(session.configuration().start_date(), Some(today()));

        session.set_value("end_date", &json!("2025-12-31")).unwrap();
        assert_eq!(
            session.configuration().end_date(),
            chrono::NaiveDate::from_ymd_opt(2025, 12, 31)
        );
    }

    #[test]
    fn test_set_value_free_form() {
        let mut session = ConfigReconciler::default();
        session.set_value("special_needs", &json!(["GPU quota", "VPN"])).unwrap();
        session.set_value("monitoring", &json!(null)).unwrap();

        assert_eq!(session.configuration().text("special_needs"), Some("GPU quota, VPN"));
        assert_eq!(session.configuration().text("monitoring"), Some(""));
    }

    #[test]
    fn test_kept_field_without_value_until_set() {
        let mut session = reconciler(json!({"compute": 4}));
        let catalog = CatalogIndex::from_entries([market_catalog::PriceEntry::new(
            "N1 Predefined Instance Ram",
            "global",
            "OnDemand",
            0.01,
        )]);

        assert!(session.kept_fields().contains(&QuantifiedField::Memory));
        assert_eq!(session.configuration().quantity(QuantifiedField::Memory), None);
        assert_eq!(session.estimate_cost(&catalog, "us-central1").total, 0.0);

        session.set_value("memory", &json!(16)).unwrap();
        assert_eq!(session.configuration().quantity(QuantifiedField::Memory), Some(16));
        assert_eq!(session.estimate_cost(&catalog, "us-central1").total, 3.84);
    }

    #[test]
    fn test_into_parts() {
        let mut session = reconciler(json!({"compute": 2, "budget": 500}));
        session.remove_field("budget");

        let (config, removed) = session.into_parts();
        assert_eq!(config.len(), 1);
        assert!(removed.contains(QuantifiedField::Budget));
    }
}
