//! Error types for the recommendation advisor.

use market_config::ConfigError;
use thiserror::Error;

/// Result type for advisor operations.
pub type AdvisorResult<T> = Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("LLM not configured. Set GEMINI_API_KEY or OPENAI_API_KEY")]
    LlmNotConfigured,

    /// The provider call failed after retries, or answered with an error.
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("No JSON found in response: {0}")]
    NoJson(String),

    #[error("JSON decode error: {message}")]
    InvalidJson { message: String, raw: String },

    #[error("Describe your infrastructure needs first")]
    EmptyInput,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
