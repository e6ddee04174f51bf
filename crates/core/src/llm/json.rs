use crate::domain::company::CompanyProfile;
use crate::domain::contract::LlmCompanyProfile;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::Provider;

/// Locates the JSON object in a model answer: the fenced block if the answer is fenced,
/// otherwise everything from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        let inner = inner.trim();
        if inner.starts_with('{') {
            return Some(inner.to_string());
        }
        return extract_braces(inner);
    }

    extract_braces(trimmed)
}

fn extract_braces(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].trim().to_string())
}

/// Parses a company profile out of free text. Absent or malformed JSON is an error.
pub fn parse_company_profile(
    provider: Provider,
    text: &str,
    query: &str,
) -> anyhow::Result<CompanyProfile> {
    let Some(json_str) = extract_json(text) else {
        return Err(LlmDiagnosticsError {
            provider,
            stage: "extract_json",
            detail: "Could not parse AI response as JSON".to_string(),
            raw_output: Some(text.to_string()),
            raw_response_json: None,
        }
        .into());
    };

    let parsed = match serde_json::from_str::<LlmCompanyProfile>(&json_str) {
        Ok(p) => p,
        Err(err) => {
            return Err(LlmDiagnosticsError {
                provider,
                stage: "parse_json",
                detail: format!("AI response is not a valid company profile: {err}"),
                raw_output: Some(text.to_string()),
                raw_response_json: None,
            }
            .into())
        }
    };

    parsed.validate_and_into_profile(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body.to_string()));
    }

    #[test]
    fn extract_json_falls_back_to_braces() {
        let s = "prefix {\"a\":1} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn extract_json_spans_nested_objects() {
        let s = "Here you go:\n{\"a\": {\"b\": 2}}\nHope this helps.";
        assert_eq!(extract_json(s), Some("{\"a\": {\"b\": 2}}".to_string()));
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn parses_profile_from_chatty_answer() {
        let text = r#"Sure! Here is the information:
{
    "name": "Apple Inc.",
    "symbol": "AAPL",
    "overview": "Designs consumer electronics.",
    "history": "Founded in 1976.",
    "products": "iPhone, Mac, services.",
    "isPublic": true,
    "industry": "Consumer Electronics"
}"#;
        let p = parse_company_profile(Provider::Gemini, text, "apple").unwrap();
        assert_eq!(p.name, "Apple Inc.");
        assert_eq!(p.symbol.as_deref(), Some("AAPL"));
        assert!(p.is_public);
        assert_eq!(p.industry, "Consumer Electronics");
    }

    #[test]
    fn missing_json_is_a_diagnostic_error() {
        let err = parse_company_profile(Provider::Gemini, "I don't know that company.", "x")
            .unwrap_err();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "extract_json");
        assert_eq!(diag.raw_output.as_deref(), Some("I don't know that company."));
    }

    #[test]
    fn malformed_json_is_a_diagnostic_error() {
        let err = parse_company_profile(Provider::Anthropic, "{\"name\": \"Acme\",}", "acme")
            .unwrap_err();
        let diag = err.downcast_ref::<LlmDiagnosticsError>().unwrap();
        assert_eq!(diag.stage, "parse_json");
    }
}
