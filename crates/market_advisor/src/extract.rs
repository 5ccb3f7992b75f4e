//! Pull a JSON object out of model output.

use serde_json::Value;

use crate::error::{AdvisorError, AdvisorResult};

/// Parse the first `{` to the last `}` of `text` as JSON.
///
/// Surrounding whitespace and a backtick fence are stripped first, so a
/// fenced ```` ```json ```` block parses too.
pub fn extract_json(text: &str) -> AdvisorResult<Value> {
    let mut text = text.trim();
    if text.starts_with("``") {
        text = text.trim_matches('`').trim();
    }

    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(AdvisorError::NoJson(text.to_string()));
    };
    if end < start {
        return Err(AdvisorError::NoJson(text.to_string()));
    }

    let json = &text[start..=end];
    serde_json::from_str(json).map_err(|e| AdvisorError::InvalidJson {
        message: e.to_string(),
        raw: json.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object() {
        let value = extract_json(r#"  {"summary": "ok"}  "#).unwrap();
        assert_eq!(value, json!({"summary": "ok"}));
    }

    #[test]
    fn test_fenced_object() {
        let text = "```json\n{\"config\": {\"compute\": 4}}\n```";
        assert_eq!(extract_json(text).unwrap(), json!({"config": {"compute": 4}}));
    }

    #[test]
    fn test_surrounding_prose() {
        let text = "Here you go: {\"a\": {\"b\": 1}} Hope it helps!";
        assert_eq!(extract_json(text).unwrap(), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_no_json() {
        assert!(matches!(extract_json("no braces here"), Err(AdvisorError::NoJson(_))));
        assert!(matches!(extract_json("} backwards {"), Err(AdvisorError::NoJson(_))));
    }

    #[test]
    fn test_invalid_json() {
        let err = extract_json("{summary: 'single quotes'}").unwrap_err();
        match err {
            AdvisorError::InvalidJson { raw, .. } => assert_eq!(raw, "{summary: 'single quotes'}"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
