//! The recommendation returned to the presentation layer.

use market_config::{ConfigReconciler, RequestConfiguration};
use serde::Serialize;
use serde_json::{Map, Value};

/// Summary, recommendation points and a raw configuration mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendation {
    pub summary: String,
    pub recommendation: Vec<String>,
    /// Raw `config` mapping; empty when the model gave none.
    pub config: Map<String, Value>,
}

impl Recommendation {
    /// Read a model answer leniently.
    ///
    /// A string `recommendation` becomes a single point and a missing or
    /// non-object `config` becomes an empty mapping.
    pub fn from_value(value: &Value) -> Self {
        let summary = match value.get("summary") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let recommendation = match value.get("recommendation") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other.to_string()],
        };

        let config = value
            .get("config")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Self {
            summary,
            recommendation,
            config,
        }
    }

    pub fn configuration(&self) -> RequestConfiguration {
        RequestConfiguration::from_raw(&self.config)
    }

    /// Open an editing session on the recommended configuration.
    pub fn reconciler(&self) -> ConfigReconciler {
        ConfigReconciler::from_raw(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_answer() {
        let rec = Recommendation::from_value(&json!({
            "summary": "Small GPU box",
            "recommendation": ["Use N1 with a T4", "Enable preemptible"],
            "config": {"compute": 8, "gpu": "NVIDIA T4"}
        }));

        assert_eq!(rec.summary, "Small GPU box");
        assert_eq!(rec.recommendation.len(), 2);
        assert_eq!(rec.configuration().text("gpu"), Some("NVIDIA T4"));
    }

    #[test]
    fn test_string_recommendation_and_missing_config() {
        let rec = Recommendation::from_value(&json!({
            "summary": "Tiny",
            "recommendation": "Use E2"
        }));

        assert_eq!(rec.recommendation, vec!["Use E2".to_string()]);
        assert!(rec.config.is_empty());
        assert!(rec.reconciler().configuration().is_empty());
    }

    #[test]
    fn test_non_object_config_is_empty() {
        let rec = Recommendation::from_value(&json!({"config": "n/a"}));
        assert!(rec.config.is_empty());
        assert!(rec.summary.is_empty());
    }
}
