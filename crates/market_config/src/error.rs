//! Error types for configuration editing.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by configuration edits.
///
/// A failed edit never changes the stored configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A quantified field received something that is not an integer.
    #[error("Invalid value for '{field}': {raw}")]
    Coercion { field: String, raw: String },

    #[error("Field '{0}' has been removed; restore it before setting a value")]
    FieldRemoved(String),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn coercion(field: &str, raw: &serde_json::Value) -> Self {
        let raw = match raw {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self::Coercion {
            field: field.to_string(),
            raw,
        }
    }

    /// The field a coercion fault is about, if this is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Coercion { field, .. } => Some(field),
            Self::FieldRemoved(field) => Some(field),
            _ => None,
        }
    }
}
