//! Error types for ticket submission.

use thiserror::Error;

/// Result type for ticketing operations.
pub type TicketResult<T> = Result<T, TicketError>;

#[derive(Error, Debug)]
pub enum TicketError {
    /// Instance URL or credentials are missing.
    #[error("ServiceNow not configured: {0}")]
    NotConfigured(String),

    #[error("ServiceNow API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Error connecting to ServiceNow API: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
