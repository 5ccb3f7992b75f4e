//! Integration tests for editing and pricing a request configuration.

use market_catalog::{CatalogIndex, PriceEntry};
use market_config::{
    ConfigError, ConfigReconciler, CostDimension, QuantifiedField, RequestConfiguration,
    UserRequest,
};
use serde_json::{json, Value};

fn session(raw: Value) -> ConfigReconciler {
    ConfigReconciler::from_raw(raw.as_object().unwrap())
}

fn n1_catalog() -> CatalogIndex {
    CatalogIndex::from_entries([
        PriceEntry::new("N1 Predefined Instance Core", "us-central1", "OnDemand", 0.03),
        PriceEntry::new("N1 Predefined Instance Ram", "us-central1", "OnDemand", 0.01),
        PriceEntry::new("SSD backed PD Capacity", "us-central1", "OnDemand", 0.001),
        PriceEntry::new("N1 Predefined Instance Core", "us-central1", "Preemptible", 0.007),
    ])
}

#[test]
fn test_two_day_estimate() {
    let session = session(json!({
        "compute": 4,
        "memory": 16,
        "storage": 100,
        "gpu": "None",
        "start_date": "2025-08-01",
        "end_date": "2025-08-03"
    }));

    let estimate = session.estimate_cost(&n1_catalog(), "us-central1");

    assert_eq!(estimate.as_tuple(), (18.24, 2));
    assert_eq!(estimate.hours, 48);
    assert_eq!(estimate.lines.len(), 3);
    assert_eq!(estimate.lines[0].dimension, CostDimension::Cpu);
    assert_eq!(estimate.lines[0].unit_price, 0.03);
}

#[test]
fn test_empty_catalog_costs_nothing() {
    let configs = [
        json!({}),
        json!({"compute": 4, "memory": 16, "storage": 100, "gpu": "NVIDIA A100"}),
        json!({"compute": 96, "start_date": "2025-01-01", "end_date": "2025-03-01"}),
    ];
    let expected_days = [1, 1, 59];

    for (raw, days) in configs.into_iter().zip(expected_days) {
        let estimate = session(raw).estimate_cost(&CatalogIndex::empty(), "us-central1");
        assert_eq!(estimate.as_tuple(), (0.0, days));
    }
}

#[test]
fn test_estimate_does_not_mutate() {
    let session = session(json!({"compute": 2, "start_date": "bad"}));
    let before = session.snapshot();

    session.estimate_cost(&n1_catalog(), "us-central1");

    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_remove_then_restore_yields_default() {
    let mut session = session(json!({"compute": 4, "memory": 16, "storage": 100, "budget": 1000}));

    for field in QuantifiedField::ALL {
        assert!(session.remove_field(field.as_str()));
        assert!(!session.configuration().contains(field.as_str()));
        assert!(session.restore_field(field.as_str()));
        assert_eq!(session.configuration().quantity(field), Some(field.default_value()));
    }
    assert!(session.removal_set().is_empty());
}

#[test]
fn test_restore_after_customizing_yields_default() {
    let mut session = session(json!({"memory": 512}));

    session.remove_field("memory");
    session.restore_field("memory");

    assert_eq!(session.configuration().quantity(QuantifiedField::Memory), Some(16));
}

#[test]
fn test_remove_is_idempotent() {
    let mut once = session(json!({"storage": 300, "compute": 8}));
    let mut twice = once.clone();

    once.remove_field("storage");
    twice.remove_field("storage");
    assert!(!twice.remove_field("storage"));

    assert_eq!(once.snapshot(), twice.snapshot());
    assert_eq!(once.removal_set(), twice.removal_set());
}

#[test]
fn test_restore_without_remove_is_noop() {
    let mut session = session(json!({"compute": 12}));
    session.set_value("compute", &json!(24)).unwrap();

    assert!(!session.restore_field("compute"));
    assert!(!session.restore_field("budget"));

    assert_eq!(session.configuration().quantity(QuantifiedField::Compute), Some(24));
    assert!(!session.configuration().contains("budget"));
}

#[test]
fn test_malformed_dates_give_one_day() {
    let cases = [
        json!({"start_date": "2025/08/01", "end_date": "2025-08-09"}),
        json!({"start_date": "2025-08-01", "end_date": "tomorrow"}),
        json!({"start_date": 20250801, "end_date": null}),
    ];

    for raw in cases {
        let estimate = session(raw).estimate_cost(&n1_catalog(), "us-central1");
        assert_eq!(estimate.duration_days, 1);
    }
}

#[test]
fn test_non_numeric_set_value_keeps_prior_value() {
    let mut session = session(json!({"memory": 32}));

    let err = session.set_value("memory", &json!("thirty-two")).unwrap_err();

    match err {
        ConfigError::Coercion { field, raw } => {
            assert_eq!(field, "memory");
            assert_eq!(raw, "thirty-two");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.configuration().quantity(QuantifiedField::Memory), Some(32));
}

#[test]
fn test_region_falls_through_to_global() {
    let catalog = CatalogIndex::from_entries([
        PriceEntry::new("N1 Predefined Instance Core", "us-central1", "OnDemand", 0.03),
        PriceEntry::new("N1 Predefined Instance Core", "global", "OnDemand", 0.05),
    ]);
    let session = session(json!({"compute": 1}));

    assert_eq!(session.estimate_cost(&catalog, "us-central1").total, 0.72);
    assert_eq!(session.estimate_cost(&catalog, "asia-east1").total, 1.2);
}

#[test]
fn test_user_request_to_configuration() {
    let request: UserRequest = serde_json::from_value(json!({
        "project_name": "Churn model",
        "workload_type": "AI/ML",
        "compute": 8,
        "memory": 32,
        "storage": "100",
        "gpu": "NVIDIA T4",
        "region": "us-central1",
        "start_date": "2025-08-20",
        "end_date": "2025-09-05",
        "budget": 1500,
        "monitoring": "Yes",
        "environment": "Development",
        "purpose": "Hackathon"
    }))
    .unwrap();

    let config = RequestConfiguration::from_raw(&request.to_raw_config());

    assert_eq!(config.quantity(QuantifiedField::Storage), Some(100));
    assert_eq!(config.text("workload_type"), Some("AI/ML"));
    assert_eq!(config.text("environment"), Some("Development"));
    assert_eq!(market_config::estimate::duration_days(&config), 16);
}
