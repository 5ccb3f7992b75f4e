//! Structured infrastructure requests as collected by intake forms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::value::lenient_int;

/// Deployment environment of a request. Decides the ticket type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Development,
    #[serde(rename = "QA")]
    Qa,
    Production,
    Sandbox,
    Other,
}

impl Environment {
    pub const ALL: [Environment; 5] = [
        Environment::Development,
        Environment::Qa,
        Environment::Production,
        Environment::Sandbox,
        Environment::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "Development",
            Environment::Qa => "QA",
            Environment::Production => "Production",
            Environment::Sandbox => "Sandbox",
            Environment::Other => "Other",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Why the resources are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    Lab,
    Hackathon,
    Development,
}

impl Purpose {
    pub const ALL: [Purpose; 3] = [Purpose::Lab, Purpose::Hackathon, Purpose::Development];

    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Lab => "Lab",
            Purpose::Hackathon => "Hackathon",
            Purpose::Development => "Development",
        }
    }
}

/// Main kind of workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadType {
    Batch,
    Service,
    #[serde(rename = "AI/ML")]
    AiMl,
    Storage,
    Other,
}

impl WorkloadType {
    pub const ALL: [WorkloadType; 5] = [
        WorkloadType::Batch,
        WorkloadType::Service,
        WorkloadType::AiMl,
        WorkloadType::Storage,
        WorkloadType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadType::Batch => "Batch",
            WorkloadType::Service => "Service",
            WorkloadType::AiMl => "AI/ML",
            WorkloadType::Storage => "Storage",
            WorkloadType::Other => "Other",
        }
    }
}

fn parse_label<T: Copy>(
    kind: &'static str,
    all: &[T],
    label: impl Fn(&T) -> &'static str,
    s: &str,
) -> ConfigResult<T> {
    let wanted: String = s
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    all.iter()
        .find(|v| {
            let candidate: String = label(*v)
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();
            candidate.eq_ignore_ascii_case(&wanted)
        })
        .copied()
        .ok_or_else(|| ConfigError::UnknownVariant {
            kind,
            value: s.to_string(),
        })
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("environment", &Self::ALL, Self::as_str, s)
    }
}

impl FromStr for Purpose {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("purpose", &Self::ALL, Self::as_str, s)
    }
}

impl FromStr for WorkloadType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label("workload type", &Self::ALL, Self::as_str, s)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for WorkloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request as entered in the web form or extracted from chat text.
///
/// Every field is optional; extraction may leave any of them out. Dates are
/// kept as entered and parsed when the configuration is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        deserialize_with = "lenient_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub workload_type: Option<WorkloadType>,
    #[serde(deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub compute: Option<i64>,
    #[serde(deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub storage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_needs: Option<String>,
    #[serde(
        deserialize_with = "lenient_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub environment: Option<Environment>,
    #[serde(
        deserialize_with = "lenient_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub purpose: Option<Purpose>,
}

impl UserRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_purpose(mut self, purpose: Purpose) -> Self {
        self.purpose = Some(purpose);
        self
    }

    /// Parse from a JSON object, tolerating numbers given as strings.
    pub fn from_json_value(value: Value) -> ConfigResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The request as a raw mapping, absent fields left out.
    pub fn to_raw_config(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Accept a known label in any case, treat anything else as absent.
fn lenient_label<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_labels() {
        assert_eq!("qa".parse::<Environment>().unwrap(), Environment::Qa);
        assert_eq!(" Production ".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("ai-ml".parse::<WorkloadType>().unwrap(), WorkloadType::AiMl);
        assert_eq!("HACKATHON".parse::<Purpose>().unwrap(), Purpose::Hackathon);

        let err = "staging".parse::<Environment>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown environment: staging");
    }

    #[test]
    fn test_extracted_request_is_lenient() {
        let request = UserRequest::from_json_value(json!({
            "project_name": "Vision",
            "workload_type": "AI/ML",
            "compute": "8",
            "memory": "",
            "storage": 100,
            "environment": "prod-ish",
            "purpose": "Hackathon",
            "unexpected": true
        }))
        .unwrap();

        assert_eq!(request.workload_type, Some(WorkloadType::AiMl));
        assert_eq!(request.compute, Some(8));
        assert_eq!(request.memory, None);
        assert_eq!(request.environment, None);
        assert_eq!(request.purpose, Some(Purpose::Hackathon));
    }

    #[test]
    fn test_to_raw_config() {
        let request = UserRequest {
            compute: Some(4),
            gpu: Some("None".into()),
            workload_type: Some(WorkloadType::AiMl),
            ..UserRequest::default()
        }
        .with_environment(Environment::Qa);

        let raw = Value::Object(request.to_raw_config());
        assert_eq!(
            raw,
            json!({"compute": 4, "gpu": "None", "workload_type": "AI/ML", "environment": "QA"})
        );
    }
}
