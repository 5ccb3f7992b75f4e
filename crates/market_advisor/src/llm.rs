//! LLM adapter for single-prompt completions.
//!
//! Supports the Gemini and OpenAI APIs, selected explicitly or via
//! environment variables.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AdvisorError, AdvisorResult};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Attempts per completion for transient failures (5xx, 429, network).
const MAX_RETRIES: u32 = 3;

/// Backoff unit; attempt `n` waits `unit * 2^n`.
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Something that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionSource: Send + Sync {
    async fn complete(&self, prompt: &str) -> AdvisorResult<String>;
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    OpenAI,
}

impl LlmProvider {
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL,
            LlmProvider::OpenAI => DEFAULT_OPENAI_MODEL,
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn key_var(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Some(LlmProvider::Gemini),
            "openai" => Some(LlmProvider::OpenAI),
            _ => None,
        }
    }

    fn base_url(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => GEMINI_BASE_URL,
            LlmProvider::OpenAI => OPENAI_BASE_URL,
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// LLM adapter that handles API calls
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    base_url: String,
    retry_backoff: Duration,
    client: reqwest::Client,
}

impl fmt::Debug for LlmAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmAdapter")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        Self {
            provider,
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            base_url: provider.base_url().to_string(),
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            client: reqwest::Client::new(),
        }
    }

    /// Create an LLM adapter from environment variables
    ///
    /// Checks in order:
    /// 1. GEMINI_API_KEY
    /// 2. OPENAI_API_KEY
    ///
    /// `MARKET_LLM_MODEL` overrides the model.
    pub fn from_env() -> AdvisorResult<Self> {
        let custom_model = env_non_empty("MARKET_LLM_MODEL");

        for provider in [LlmProvider::Gemini, LlmProvider::OpenAI] {
            if let Some(api_key) = env_non_empty(provider.key_var()) {
                return Ok(Self::new(provider, api_key, custom_model));
            }
        }

        Err(AdvisorError::LlmNotConfigured)
    }

    /// Create an adapter for a chosen provider, reading its key from the
    /// environment.
    pub fn for_provider(provider: LlmProvider, model: Option<String>) -> AdvisorResult<Self> {
        let api_key = env_non_empty(provider.key_var()).ok_or(AdvisorError::LlmNotConfigured)?;
        Ok(Self::new(provider, api_key, model))
    }

    /// Point the adapter at another endpoint, such as a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_backoff(mut self, unit: Duration) -> Self {
        self.retry_backoff = unit;
        self
    }

    /// Get the current provider
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_gemini(&self, prompt: &str) -> AdvisorResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .send_with_retry(|| {
                self.client
                    .post(&url)
                    .query(&[("key", &self.api_key)])
                    .json(&request)
            })
            .await?;

        let result: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Llm(format!("Failed to parse response: {}", e)))?;

        result
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| AdvisorError::Llm("No response from Gemini".to_string()))
    }

    async fn complete_openai(&self, prompt: &str) -> AdvisorResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .send_with_retry(|| {
                self.client
                    .post(&url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .json(&request)
            })
            .await?;

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Llm(format!("Failed to parse response: {}", e)))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AdvisorError::Llm("No response from OpenAI".to_string()))
    }

    /// Send, retrying server errors, rate limits and network failures with
    /// exponential backoff.
    async fn send_with_retry<F>(&self, build: F) -> AdvisorResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(self.retry_backoff * (1 << attempt)).await;
            }

            let response = match build().send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("{} request failed (attempt {}/{}): {}", self.provider, attempt + 1, MAX_RETRIES, e);
                    last_error = Some(AdvisorError::Llm(format!("Network error: {}", e)));
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() || status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                warn!("{} API returned {} (attempt {}/{})", self.provider, status, attempt + 1, MAX_RETRIES);
                last_error = Some(AdvisorError::Llm(format!(
                    "{} API error {} (attempt {}/{}): {}",
                    self.provider,
                    status,
                    attempt + 1,
                    MAX_RETRIES,
                    body
                )));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AdvisorError::Llm(format!(
                    "{} API error {}: {}",
                    self.provider, status, body
                )));
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or_else(|| AdvisorError::Llm("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl CompletionSource for LlmAdapter {
    async fn complete(&self, prompt: &str) -> AdvisorResult<String> {
        debug!("Sending {}-char prompt to {} ({})", prompt.len(), self.provider, self.model);
        match self.provider {
            LlmProvider::Gemini => self.complete_gemini(prompt).await,
            LlmProvider::OpenAI => self.complete_openai(prompt).await,
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// Gemini API types
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models() {
        let gemini = LlmAdapter::new(LlmProvider::Gemini, "key".to_string(), None);
        assert_eq!(gemini.model(), "gemini-1.5-pro");

        let openai = LlmAdapter::new(LlmProvider::OpenAI, "key".to_string(), None);
        assert_eq!(openai.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_custom_model() {
        let adapter = LlmAdapter::new(
            LlmProvider::Gemini,
            "key".to_string(),
            Some("gemini-1.5-flash".to_string()),
        );
        assert_eq!(adapter.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(LlmProvider::from_name("Gemini"), Some(LlmProvider::Gemini));
        assert_eq!(LlmProvider::from_name(" openai "), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::from_name("anthropic"), None);
    }

    #[test]
    fn test_debug_hides_key() {
        let adapter = LlmAdapter::new(LlmProvider::OpenAI, "sk-secret".to_string(), None)
            .with_base_url("http://localhost:8080/v1/");
        let shown = format!("{:?}", adapter);

        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("http://localhost:8080/v1\""));
    }

    #[test]
    fn test_gemini_response_shape() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"summary\":"},{"text":"\"ok\"}"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, r#"{"summary":"ok"}"#);
    }
}
