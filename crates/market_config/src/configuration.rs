//! The requested configuration and its removal set.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::field::{FieldClass, QuantifiedField, END_DATE, START_DATE};
use crate::value::{coerce_integer, flatten_text, parse_date, FieldValue};

/// Mapping from field name to value.
///
/// A removed quantified field is absent from the mapping; it is never stored
/// as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RequestConfiguration {
    fields: BTreeMap<String, FieldValue>,
}

impl RequestConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a raw JSON mapping such as a recommendation's `config`.
    ///
    /// Quantified values that are not integers fall back to the field's
    /// minimum. Unparseable dates and `null` values are left out.
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        let mut config = Self::new();
        for (name, value) in raw {
            match FieldClass::of(name) {
                FieldClass::Quantified(field) => {
                    let number = coerce_integer(name, value).unwrap_or_else(|e| {
                        let min = field.spec().min;
                        warn!("{}; resetting to minimum {}", e, min);
                        min
                    });
                    config.insert(name, FieldValue::Number(number));
                }
                FieldClass::Temporal => match parse_date(value) {
                    Some(date) => config.insert(name, FieldValue::Date(date)),
                    None => warn!("Dropping unparseable date for '{}': {}", name, value),
                },
                FieldClass::FreeForm => {
                    if let Some(text) = flatten_text(value) {
                        config.insert(name, FieldValue::Text(text));
                    }
                }
            }
        }
        config
    }

    /// Parse a JSON object and build from it.
    pub fn from_json_str(json: &str) -> crate::ConfigResult<Self> {
        let raw: Map<String, Value> = serde_json::from_str(json)?;
        Ok(Self::from_raw(&raw))
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub(crate) fn insert(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Numeric value of a quantified field, if present.
    pub fn quantity(&self, field: QuantifiedField) -> Option<i64> {
        self.get(field.as_str()).and_then(FieldValue::as_number)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(FieldValue::as_date)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.date(START_DATE)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.date(END_DATE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fields that are neither quantified nor temporal.
    pub fn free_form(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.iter()
            .filter(|(name, _)| FieldClass::of(name) == FieldClass::FreeForm)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON snapshot for downstream sinks.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Quantified fields the user has opted out of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RemovalSet {
    fields: BTreeSet<QuantifiedField>,
}

impl RemovalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, field: QuantifiedField) -> bool {
        self.fields.contains(&field)
    }

    /// Returns `true` if the field was not already removed.
    pub fn insert(&mut self, field: QuantifiedField) -> bool {
        self.fields.insert(field)
    }

    /// Returns `true` if the field was removed.
    pub fn remove(&mut self, field: QuantifiedField) -> bool {
        self.fields.remove(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = QuantifiedField> + '_ {
        self.fields.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
