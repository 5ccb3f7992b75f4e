//! Recommendation with or without a model.

use market_config::{UserRequest, DEFAULT_REGION};
use tracing::{info, warn};

use crate::error::AdvisorResult;
use crate::extract::extract_json;
use crate::llm::CompletionSource;
use crate::prompt::build_recommendation_prompt;
use crate::recommendation::Recommendation;

/// Machine family hint for a CPU count and GPU choice.
pub fn suggest_machine_family(compute: i64, gpu: Option<&str>) -> &'static str {
    let has_gpu = gpu.is_some_and(|g| !g.trim().is_empty() && !g.trim().eq_ignore_ascii_case("none"));
    if has_gpu {
        "A2, N1, or N2 machine types with attached GPU recommended for ML/AI workloads."
    } else if compute >= 32 {
        "C2 (High-CPU) or N2 machine types suitable for compute-intensive workloads."
    } else if compute >= 16 {
        "N2 or E2 machine types offer balance for medium workloads."
    } else {
        "E2 (General Purpose) instances recommended for light workloads."
    }
}

/// Produces recommendations, from a model when one is configured.
#[derive(Default)]
pub struct Advisor {
    completion: Option<Box<dyn CompletionSource>>,
}

impl Advisor {
    pub fn new(completion: Box<dyn CompletionSource>) -> Self {
        Self {
            completion: Some(completion),
        }
    }

    /// An advisor that never calls a model.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn is_offline(&self) -> bool {
        self.completion.is_none()
    }

    pub fn completion(&self) -> Option<&dyn CompletionSource> {
        self.completion.as_deref()
    }

    /// Recommend a configuration for `request`.
    ///
    /// Without a model the answer is built from [`suggest_machine_family`]
    /// and the request's own values.
    pub async fn recommend(&self, request: &UserRequest) -> AdvisorResult<Recommendation> {
        let Some(completion) = &self.completion else {
            warn!("No LLM configured, using offline recommendation");
            return Ok(Self::recommend_offline(request));
        };

        let prompt = build_recommendation_prompt(request);
        let answer = completion.complete(&prompt).await?;
        let value = extract_json(&answer)?;
        let recommendation = Recommendation::from_value(&value);
        info!(
            "Received recommendation with {} point(s) and {} config field(s)",
            recommendation.recommendation.len(),
            recommendation.config.len()
        );
        Ok(recommendation)
    }

    pub fn recommend_offline(request: &UserRequest) -> Recommendation {
        let compute = request.compute.unwrap_or(0);
        let suggestion = suggest_machine_family(compute, request.gpu.as_deref());

        let summary = format!(
            "{} vCPUs, {} GB memory and {} GB storage in {}",
            compute,
            request.memory.unwrap_or(0),
            request.storage.unwrap_or(0),
            request.region.as_deref().unwrap_or(DEFAULT_REGION)
        );

        Recommendation {
            summary,
            recommendation: vec![suggestion.to_string()],
            config: request.to_raw_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisorError;
    use crate::llm::MockCompletionSource;

    #[test]
    fn test_suggest_machine_family() {
        assert!(suggest_machine_family(4, Some("NVIDIA T4")).starts_with("A2, N1, or N2"));
        assert!(suggest_machine_family(64, Some("None")).starts_with("C2"));
        assert!(suggest_machine_family(32, None).starts_with("C2"));
        assert!(suggest_machine_family(16, Some("")).starts_with("N2 or E2"));
        assert!(suggest_machine_family(15, None).starts_with("E2"));
    }

    #[tokio::test]
    async fn test_offline_uses_request_values() {
        let request = UserRequest {
            compute: Some(8),
            memory: Some(32),
            gpu: Some("None".to_string()),
            ..UserRequest::default()
        };

        let rec = Advisor::offline().recommend(&request).await.unwrap();

        assert_eq!(rec.summary, "8 vCPUs, 32 GB memory and 0 GB storage in us-central1");
        assert_eq!(rec.recommendation.len(), 1);
        assert_eq!(rec.configuration().text("gpu"), Some("None"));
    }

    #[tokio::test]
    async fn test_model_answer_is_parsed() {
        let mut completion = MockCompletionSource::new();
        completion.expect_complete().times(1).returning(|_| {
            Ok(r#"{"summary": "GPU node", "recommendation": "Use A2", "config": {"compute": 12}}"#.to_string())
        });

        let advisor = Advisor::new(Box::new(completion));
        let rec = advisor.recommend(&UserRequest::default()).await.unwrap();

        assert_eq!(rec.summary, "GPU node");
        assert_eq!(rec.recommendation, vec!["Use A2".to_string()]);
        assert_eq!(rec.config.get("compute"), Some(&serde_json::json!(12)));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let mut completion = MockCompletionSource::new();
        completion
            .expect_complete()
            .returning(|_| Err(AdvisorError::Llm("boom".to_string())));

        let advisor = Advisor::new(Box::new(completion));
        assert!(matches!(
            advisor.recommend(&UserRequest::default()).await,
            Err(AdvisorError::Llm(_))
        ));
    }
}
