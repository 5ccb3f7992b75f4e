//! Prompt construction for recommendation and field extraction.

use std::fmt::Display;

use market_config::{Environment, Purpose, UserRequest};

/// Fields the extraction prompt asks the model for, in prompt order.
pub const EXTRACTION_FIELDS: [&str; 15] = [
    "project_name",
    "description",
    "workload_type",
    "compute",
    "memory",
    "storage",
    "gpu",
    "region",
    "start_date",
    "end_date",
    "budget",
    "special_needs",
    "environment",
    "purpose",
    "monitoring",
];

fn shown<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

/// Prompt asking for a JSON object with `summary`, `recommendation` and
/// `config` keys.
pub fn build_recommendation_prompt(request: &UserRequest) -> String {
    let mut prompt = String::from(
        "You are an expert Google Cloud architect and FinOps advisor.\n\
         Given the following user requirements, provide an optimized GCP infrastructure recommendation.\n\
         Respond ONLY with a valid JSON object containing keys: summary, recommendation, config.\n\
         Do NOT add extra text or formatting.\n\n\
         User Requirements:\n",
    );

    let lines = [
        ("Project Name", shown(&request.project_name)),
        ("Description", shown(&request.description)),
        ("Purpose", shown(&request.purpose)),
        ("Environment", shown(&request.environment)),
        ("Workload Type", shown(&request.workload_type)),
        ("vCPUs", shown(&request.compute)),
        ("Memory (GB)", shown(&request.memory)),
        ("Storage (GB)", shown(&request.storage)),
        ("GPU", shown(&request.gpu)),
        ("Region", shown(&request.region)),
        ("Start Date", shown(&request.start_date)),
        ("End Date", shown(&request.end_date)),
        ("Budget", shown(&request.budget)),
        ("Monitoring", shown(&request.monitoring)),
        ("Special Needs", shown(&request.special_needs)),
    ];
    for (label, value) in lines {
        prompt.push_str(&format!("{}: {}\n", label, value));
    }

    prompt.push_str("Please respond now.");
    prompt
}

/// Prompt asking the model to pull request fields out of free text.
pub fn build_extraction_prompt(text: &str, environment: Environment, purpose: Purpose) -> String {
    format!(
        "Extract the following fields as JSON from the user's text.\n\
         Fields: {}.\n\
         If any field is missing, try to infer or use empty string. Dates as 'YYYY-MM-DD', numbers as integers.\n\
         \nUser text:\n{}\nEnvironment: {}\nPurpose: {}\nRespond ONLY with valid JSON.",
        EXTRACTION_FIELDS.join(", "),
        text,
        environment,
        purpose
    )
}
