//! Approval requests and what ServiceNow returns for them.

use std::fmt;

use market_config::{Environment, RequestConfiguration};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const NO_NAME: &str = "[No Name]";
const NO_REFERENCE: &str = "N/A";

/// Which ServiceNow record a request becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketKind {
    /// Production changes go through change management.
    ChangeRequest,
    Approval,
}

impl TicketKind {
    pub fn for_environment(environment: Environment) -> Self {
        if environment.is_production() {
            TicketKind::ChangeRequest
        } else {
            TicketKind::Approval
        }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketKind::ChangeRequest => write!(f, "Change Request"),
            TicketKind::Approval => write!(f, "Approval Request"),
        }
    }
}

/// A finished configuration on its way to approval.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalRequest {
    pub correlation_id: Uuid,
    pub environment: Environment,
    pub project_name: Option<String>,
    /// Opaque configuration snapshot.
    pub configuration: Value,
}

impl ApprovalRequest {
    pub fn new(
        environment: Environment,
        project_name: Option<String>,
        configuration: &RequestConfiguration,
    ) -> Self {
        let project_name = project_name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| configuration.text("project_name").map(str::to_string));

        Self {
            correlation_id: Uuid::new_v4(),
            environment,
            project_name,
            configuration: configuration.to_json(),
        }
    }

    pub fn kind(&self) -> TicketKind {
        TicketKind::for_environment(self.environment)
    }

    pub fn short_description(&self) -> String {
        format!(
            "Infra Request - {}",
            self.project_name.as_deref().unwrap_or(NO_NAME)
        )
    }

    /// The configuration as indented JSON.
    pub fn description(&self) -> String {
        serde_json::to_string_pretty(&self.configuration).unwrap_or_else(|_| self.configuration.to_string())
    }

    /// Body for the ServiceNow table API.
    pub fn payload(&self) -> TicketPayload {
        let change = self.kind() == TicketKind::ChangeRequest;
        TicketPayload {
            short_description: self.short_description(),
            description: self.description(),
            correlation_id: self.correlation_id.to_string(),
            category: change.then(|| "Infrastructure".to_string()),
            change_type: change.then(|| "Normal".to_string()),
            state: change.then(|| "New".to_string()),
        }
    }
}

/// JSON body posted to a ServiceNow table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketPayload {
    pub short_description: String,
    pub description: String,
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// What the user is shown after submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketReceipt {
    pub kind: TicketKind,
    /// CR number, or the approval record's `sys_id`; `"N/A"` if neither
    /// came back.
    pub reference: String,
    pub correlation_id: Uuid,
}

impl TicketReceipt {
    /// Read the reference out of a table API response (`{"result": {...}}`).
    pub fn from_response(kind: TicketKind, correlation_id: Uuid, response: &Value) -> Self {
        let result = response.get("result");
        let field = |name: &str| {
            result
                .and_then(|r| r.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };
        let reference = match kind {
            TicketKind::ChangeRequest => field("number").or_else(|| field("sys_id")),
            TicketKind::Approval => field("sys_id").or_else(|| field("number")),
        };

        Self {
            kind,
            reference: reference.unwrap_or(NO_REFERENCE).to_string(),
            correlation_id,
        }
    }
}

impl fmt::Display for TicketReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} created: {}", self.kind, self.reference)
    }
}
