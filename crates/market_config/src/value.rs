//! Field values and coercion from raw input.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};

/// Date format used for temporal fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keys checked, in order, when a free-form value arrives as an object.
const OBJECT_VALUE_KEYS: [&str; 5] = ["value", "amount", "answer", "option", "selection"];

/// A stored configuration value. The variant always matches the field class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Coerce to an integer the way a numeric widget would.
///
/// Integers pass through, floats truncate toward zero, strings are trimmed
/// and parsed. Anything else is a coercion fault naming `field`.
pub fn coerce_integer(field: &str, raw: &Value) -> ConfigResult<i64> {
    let coerced = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    coerced.ok_or_else(|| ConfigError::coercion(field, raw))
}

/// Parse a `YYYY-MM-DD` date from a raw value.
pub fn parse_date(raw: &Value) -> Option<NaiveDate> {
    raw.as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
}

/// Today's date in local time, the fallback for unparseable dates.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Flatten a raw value into free-form text.
///
/// Strings are kept verbatim. Lists are joined with `", "`. Objects yield
/// their first well-known answer key, or all values joined. `null` has no
/// text.
pub fn flatten_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(join_values(items.iter())),
        Value::Object(map) => {
            let picked = OBJECT_VALUE_KEYS.iter().find_map(|key| map.get(*key));
            match picked {
                Some(value) => flatten_text(value),
                None => Some(join_values(map.values())),
            }
        }
    }
}

fn join_values<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deserialize an optional integer that may arrive as a number, a numeric
/// string, an empty string or null.
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    match &raw {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        _ => coerce_integer("value", &raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
