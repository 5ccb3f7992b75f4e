//! Recommend command - Turn a request into a configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use market_advisor::{suggest_machine_family, Advisor, AdvisorError, ChatbotIntake, IntakeSource, WebFormIntake};
use market_config::{Environment, Purpose, QuantifiedField};

use crate::settings::Settings;

#[derive(Args)]
pub struct RecommendArgs {
    /// JSON file with the request form fields
    #[arg(long, conflicts_with = "chat", required_unless_present = "chat")]
    request: Option<PathBuf>,

    /// Free-text description of the infrastructure needed
    #[arg(long)]
    chat: Option<String>,

    /// Environment (Development, QA, Production, Sandbox, Other)
    #[arg(long)]
    environment: Option<Environment>,

    /// Purpose (Lab, Hackathon, Development)
    #[arg(long)]
    purpose: Option<Purpose>,

    /// Do not call an LLM
    #[arg(long)]
    offline: bool,

    /// Write the recommended configuration here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

pub async fn execute(args: RecommendArgs, settings: &Settings) -> Result<()> {
    let advisor = match settings.llm_adapter() {
        Some(adapter) if !args.offline => {
            info!("Using {} ({})", adapter.provider(), adapter.model());
            Advisor::new(Box::new(adapter))
        }
        _ => Advisor::offline(),
    };

    let mut request = match (&args.request, &args.chat) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Request file not found: {}", path.display()))?;
            WebFormIntake::from_json(&content)?.collect().await?
        }
        (None, Some(text)) => {
            let completion = advisor.completion().ok_or(AdvisorError::LlmNotConfigured)?;
            let intake = ChatbotIntake::new(
                text.as_str(),
                args.environment.unwrap_or(Environment::Development),
                args.purpose.unwrap_or(Purpose::Lab),
                completion,
            );
            println!("💬 Extracting fields from your description...");
            intake.collect().await?
        }
        (None, None) => anyhow::bail!("Either --request or --chat argument is required"),
    };

    if let Some(environment) = args.environment {
        request.environment = Some(environment);
    }
    if let Some(purpose) = args.purpose {
        request.purpose = Some(purpose);
    }

    let recommendation = advisor
        .recommend(&request)
        .await
        .context("Failed to get a recommendation")?;
    let config = recommendation.configuration();

    println!("📋 Summary");
    println!("   {}", recommendation.summary);
    println!();
    println!("💡 Recommendation");
    for point in &recommendation.recommendation {
        println!("   - {}", point);
    }
    let compute = config
        .quantity(QuantifiedField::Compute)
        .or(request.compute)
        .unwrap_or(0);
    let gpu = config.text("gpu").or(request.gpu.as_deref());
    println!();
    println!("🖥️  Compute Engine suggestion: {}", suggest_machine_family(compute, gpu));

    match &args.out {
        Some(path) => {
            super::write_json(path, &config)?;
            println!();
            println!("✅ Configuration written to {}", path.display());
        }
        None => {
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
