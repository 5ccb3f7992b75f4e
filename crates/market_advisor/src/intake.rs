//! Intake sources that produce a [`UserRequest`].
//!
//! The web form passes a structured request through; the chatbot asks the
//! model to extract one from free text.

use async_trait::async_trait;
use market_config::{Environment, Purpose, UserRequest};
use tracing::{debug, info};

use crate::error::{AdvisorError, AdvisorResult};
use crate::extract::extract_json;
use crate::llm::CompletionSource;
use crate::prompt::build_extraction_prompt;

/// A way of collecting the initial request.
#[async_trait]
pub trait IntakeSource: Send + Sync {
    /// Short label for logs and prompts.
    fn name(&self) -> &'static str;

    async fn collect(&self) -> AdvisorResult<UserRequest>;
}

/// A request filled in field by field.
#[derive(Debug, Clone)]
pub struct WebFormIntake {
    request: UserRequest,
}

impl WebFormIntake {
    pub fn new(request: UserRequest) -> Self {
        Self { request }
    }

    /// Read the form from its JSON representation.
    pub fn from_json(json: &str) -> AdvisorResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Ok(Self::new(UserRequest::from_json_value(value)?))
    }
}

#[async_trait]
impl IntakeSource for WebFormIntake {
    fn name(&self) -> &'static str {
        "web form"
    }

    async fn collect(&self) -> AdvisorResult<UserRequest> {
        Ok(self.request.clone())
    }
}

/// A free-text description turned into a request by the model.
///
/// Environment and purpose always come from the user's explicit choice, not
/// from the text.
pub struct ChatbotIntake<'a> {
    text: String,
    environment: Environment,
    purpose: Purpose,
    completion: &'a dyn CompletionSource,
}

impl<'a> ChatbotIntake<'a> {
    pub fn new(
        text: impl Into<String>,
        environment: Environment,
        purpose: Purpose,
        completion: &'a dyn CompletionSource,
    ) -> Self {
        Self {
            text: text.into(),
            environment,
            purpose,
            completion,
        }
    }
}

#[async_trait]
impl IntakeSource for ChatbotIntake<'_> {
    fn name(&self) -> &'static str {
        "chatbot"
    }

    async fn collect(&self) -> AdvisorResult<UserRequest> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(AdvisorError::EmptyInput);
        }

        info!("Extracting request fields from {} chars of text", text.len());
        let prompt = build_extraction_prompt(text, self.environment, self.purpose);
        let answer = self.completion.complete(&prompt).await?;
        let fields = extract_json(&answer)?;
        debug!("Extracted fields: {}", fields);

        let mut request = UserRequest::from_json_value(fields)?;
        request.environment = Some(self.environment);
        request.purpose = Some(self.purpose);
        if request.memory.is_none() {
            request.memory = Some(0);
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockCompletionSource;

    #[tokio::test]
    async fn test_web_form_passes_through() {
        let intake = WebFormIntake::from_json(r#"{"project_name": "Demo", "compute": "4"}"#).unwrap();
        let request = intake.collect().await.unwrap();

        assert_eq!(request.project_name.as_deref(), Some("Demo"));
        assert_eq!(request.compute, Some(4));
    }

    #[tokio::test]
    async fn test_chatbot_forces_choices_and_memory() {
        let mut completion = MockCompletionSource::new();
        completion
            .expect_complete()
            .withf(|prompt| prompt.contains("8 vCPUs") && prompt.contains("Purpose: Lab"))
            .times(1)
            .returning(|_| {
                Ok("```json\n{\"compute\": 8, \"environment\": \"Production\", \"purpose\": \"Hackathon\"}\n```".to_string())
            });

        let intake = ChatbotIntake::new("8 vCPUs please", Environment::Sandbox, Purpose::Lab, &completion);
        let request = intake.collect().await.unwrap();

        assert_eq!(request.compute, Some(8));
        assert_eq!(request.environment, Some(Environment::Sandbox));
        assert_eq!(request.purpose, Some(Purpose::Lab));
        assert_eq!(request.memory, Some(0));
    }

    #[tokio::test]
    async fn test_chatbot_rejects_blank_text() {
        let mut completion = MockCompletionSource::new();
        completion.expect_complete().times(0);

        let intake = ChatbotIntake::new("   ", Environment::Development, Purpose::Lab, &completion);
        assert!(matches!(intake.collect().await, Err(AdvisorError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_chatbot_surfaces_unparseable_answer() {
        let mut completion = MockCompletionSource::new();
        completion
            .expect_complete()
            .returning(|_| Ok("Sorry, I can't help with that.".to_string()));

        let intake = ChatbotIntake::new("something", Environment::Development, Purpose::Lab, &completion);
        assert!(matches!(intake.collect().await, Err(AdvisorError::NoJson(_))));
    }
}
