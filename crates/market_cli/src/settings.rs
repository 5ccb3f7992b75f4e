//! CLI settings.
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! 1. Environment variables (highest priority)
//! 2. `--settings` file, else `.market/settings.toml`
//! 3. Built-in defaults
//!
//! Credentials are only ever read from the environment.

use std::fmt;
use std::path::{Path, PathBuf};

use market_advisor::{LlmAdapter, LlmProvider};
use market_catalog::{BillingClient, CatalogCache, DEFAULT_BILLING_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_TTL_HOURS};
use market_config::DEFAULT_REGION;
use market_ticket::{ServiceNowClient, TicketError, TicketResult, DEFAULT_APPROVAL_TABLE, DEFAULT_CHANGE_TABLE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = ".market/settings.toml";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),
}

/// A credential. Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"***\"")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub billing: BillingSettings,
    pub llm: LlmSettings,
    pub servicenow: ServiceNowSettings,
    pub defaults: DefaultSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    /// Billing scope, e.g. `services/6F81-5844-456A`.
    pub parent: Option<String>,
    pub base_url: String,
    pub page_size: u32,
    pub cache_ttl_hours: i64,
    #[serde(skip)]
    pub access_token: Option<Secret>,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            parent: None,
            base_url: DEFAULT_BILLING_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl_hours: DEFAULT_TTL_HOURS,
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// `gemini` or `openai`; picked from the available key when unset.
    pub provider: Option<String>,
    pub model: Option<String>,
    #[serde(skip)]
    pub gemini_api_key: Option<Secret>,
    #[serde(skip)]
    pub openai_api_key: Option<Secret>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceNowSettings {
    pub instance_url: Option<String>,
    pub user: Option<String>,
    pub change_table: String,
    pub approval_table: String,
    #[serde(skip)]
    pub password: Option<Secret>,
}

impl Default for ServiceNowSettings {
    fn default() -> Self {
        Self {
            instance_url: None,
            user: None,
            change_table: DEFAULT_CHANGE_TABLE.to_string(),
            approval_table: DEFAULT_APPROVAL_TABLE.to_string(),
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub region: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// An explicit path must exist. Without one, `.market/settings.toml` is
    /// used if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(SettingsError::NotFound(p.to_path_buf()));
                }
                Self::from_file(p)
            }
            None => {
                let default_path = Path::new(DEFAULT_SETTINGS_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides. Empty values are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(parent) = var("MARKET_BILLING_ACCOUNT") {
            self.billing.parent = Some(parent);
        }
        if let Some(token) = var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            self.billing.access_token = Some(Secret::new(token));
        }
        if let Some(key) = var("GEMINI_API_KEY") {
            self.llm.gemini_api_key = Some(Secret::new(key));
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(Secret::new(key));
        }
        if let Some(model) = var("MARKET_LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = var("SERVICENOW_INSTANCE_URL") {
            self.servicenow.instance_url = Some(url);
        }
        if let Some(user) = var("SERVICENOW_USER") {
            self.servicenow.user = Some(user);
        }
        if let Some(password) = var("SERVICENOW_PASSWORD") {
            self.servicenow.password = Some(Secret::new(password));
        }

        self
    }

    /// The configured LLM, if any key is available.
    ///
    /// An explicit provider without its key gives `None`.
    pub fn llm_adapter(&self) -> Option<LlmAdapter> {
        let key_for = |provider: LlmProvider| match provider {
            LlmProvider::Gemini => self.llm.gemini_api_key.as_ref(),
            LlmProvider::OpenAI => self.llm.openai_api_key.as_ref(),
        };

        let provider = match self.llm.provider.as_deref() {
            Some(name) => LlmProvider::from_name(name)?,
            None => [LlmProvider::Gemini, LlmProvider::OpenAI]
                .into_iter()
                .find(|p| key_for(*p).is_some())?,
        };
        let key = key_for(provider)?;
        Some(LlmAdapter::new(provider, key.expose().to_string(), self.llm.model.clone()))
    }

    /// Billing scope and client, when both are configured.
    pub fn billing(&self) -> Option<(&str, BillingClient)> {
        let parent = self.billing.parent.as_deref()?;
        let token = self.billing.access_token.as_ref()?;
        let client = BillingClient::new(token.expose())
            .with_base_url(self.billing.base_url.clone())
            .with_page_size(self.billing.page_size);
        Some((parent, client))
    }

    /// Catalog cache with the configured TTL; a negative or overflowing
    /// TTL is a settings error.
    pub fn catalog_cache(&self) -> Result<CatalogCache, SettingsError> {
        let hours = self.billing.cache_ttl_hours;
        chrono::Duration::try_hours(hours)
            .filter(|ttl| *ttl >= chrono::Duration::zero())
            .map(CatalogCache::new)
            .ok_or_else(|| SettingsError::Parse(format!("billing.cache_ttl_hours out of range: {}", hours)))
    }

    pub fn servicenow_client(&self) -> TicketResult<ServiceNowClient> {
        let sn = &self.servicenow;
        let missing = |what: &str| TicketError::NotConfigured(format!("{} is not set", what));

        let url = sn.instance_url.as_deref().ok_or_else(|| missing("SERVICENOW_INSTANCE_URL"))?;
        let user = sn.user.as_deref().ok_or_else(|| missing("SERVICENOW_USER"))?;
        let password = sn.password.as_ref().ok_or_else(|| missing("SERVICENOW_PASSWORD"))?;

        Ok(ServiceNowClient::new(url, user, password.expose())?
            .with_change_table(sn.change_table.clone())
            .with_approval_table(sn.approval_table.clone()))
    }
}
