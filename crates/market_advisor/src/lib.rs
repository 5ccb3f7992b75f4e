//! # market_advisor
//!
//! Turns an infrastructure request into a recommended configuration.
//!
//! - **Intake**: a web form passes a [`UserRequest`](market_config::UserRequest)
//!   through, a chatbot extracts one from free text
//! - **Recommendation**: a prompt to Gemini or OpenAI, answered with a JSON
//!   object holding `summary`, `recommendation` and `config`
//! - **LLM optional**: without an API key the [`Advisor`] falls back to a
//!   machine family suggestion and the request's own values

pub mod advisor;
pub mod error;
pub mod extract;
pub mod intake;
pub mod llm;
pub mod prompt;
pub mod recommendation;

pub use advisor::{suggest_machine_family, Advisor};
pub use error::{AdvisorError, AdvisorResult};
pub use extract::extract_json;
pub use intake::{ChatbotIntake, IntakeSource, WebFormIntake};
pub use llm::{CompletionSource, LlmAdapter, LlmProvider};
pub use prompt::{build_extraction_prompt, build_recommendation_prompt};
pub use recommendation::Recommendation;
