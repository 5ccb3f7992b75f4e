//! ServiceNow table API client.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use crate::error::{TicketError, TicketResult};
use crate::request::{ApprovalRequest, TicketKind, TicketReceipt};

pub const DEFAULT_CHANGE_TABLE: &str = "change_request";
pub const DEFAULT_APPROVAL_TABLE: &str = "u_infra_approval_request";

/// Where finished requests go for approval.
#[async_trait]
pub trait TicketSink: Send + Sync {
    async fn submit(&self, request: &ApprovalRequest) -> TicketResult<TicketReceipt>;
}

/// Posts requests to a ServiceNow instance with basic auth.
pub struct ServiceNowClient {
    instance_url: String,
    user: String,
    password: String,
    change_table: String,
    approval_table: String,
    client: reqwest::Client,
}

impl fmt::Debug for ServiceNowClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceNowClient")
            .field("instance_url", &self.instance_url)
            .field("user", &self.user)
            .field("change_table", &self.change_table)
            .field("approval_table", &self.approval_table)
            .finish_non_exhaustive()
    }
}

impl ServiceNowClient {
    pub fn new(
        instance_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> TicketResult<Self> {
        let instance_url = instance_url.into().trim_end_matches('/').to_string();
        if instance_url.is_empty() {
            return Err(TicketError::NotConfigured("instance URL is empty".to_string()));
        }
        let user = user.into();
        if user.is_empty() {
            return Err(TicketError::NotConfigured("user is empty".to_string()));
        }

        Ok(Self {
            instance_url,
            user,
            password: password.into(),
            change_table: DEFAULT_CHANGE_TABLE.to_string(),
            approval_table: DEFAULT_APPROVAL_TABLE.to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Build from `SERVICENOW_INSTANCE_URL`, `SERVICENOW_USER` and
    /// `SERVICENOW_PASSWORD`.
    pub fn from_env() -> TicketResult<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| TicketError::NotConfigured(format!("{} is not set", name)))
        };
        Self::new(
            var("SERVICENOW_INSTANCE_URL")?,
            var("SERVICENOW_USER")?,
            var("SERVICENOW_PASSWORD")?,
        )
    }

    pub fn with_change_table(mut self, table: impl Into<String>) -> Self {
        self.change_table = table.into();
        self
    }

    pub fn with_approval_table(mut self, table: impl Into<String>) -> Self {
        self.approval_table = table.into();
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn table_for(&self, kind: TicketKind) -> &str {
        match kind {
            TicketKind::ChangeRequest => &self.change_table,
            TicketKind::Approval => &self.approval_table,
        }
    }

    /// `{instance}/api/now/table/{table}`
    pub fn table_url(&self, kind: TicketKind) -> String {
        format!("{}/api/now/table/{}", self.instance_url, self.table_for(kind))
    }
}

#[async_trait]
impl TicketSink for ServiceNowClient {
    async fn submit(&self, request: &ApprovalRequest) -> TicketResult<TicketReceipt> {
        let kind = request.kind();
        let url = self.table_url(kind);
        info!("Submitting {} for {} to {}", kind, request.environment, url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json")
            .json(&request.payload())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("ServiceNow API error {}: {}", status, body);
            return Err(TicketError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        let receipt = TicketReceipt::from_response(kind, request.correlation_id, &body);
        info!("{} (correlation {})", receipt, receipt.correlation_id);
        Ok(receipt)
    }
}
