//! Error types for catalog ingestion.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while fetching or loading a price catalog.
///
/// None of these are fatal to estimation: ingestion stops and keeps
/// whatever was accumulated.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Billing scope not configured")]
    ScopeNotConfigured,

    #[error("Billing credentials not configured (set GOOGLE_OAUTH_ACCESS_TOKEN)")]
    CredentialsMissing,

    #[error("Billing API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Billing API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid catalog data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
