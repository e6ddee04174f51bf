pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod json;
pub mod prompt;

use crate::config::Settings;
use crate::domain::company::CompanyProfile;
use crate::llm::prompt::DocumentText;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Anthropic,
}

impl Provider {
    pub fn from_name(name: Option<&str>) -> anyhow::Result<Self> {
        match name.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("gemini") => Ok(Provider::Gemini),
            Some("anthropic") | Some("claude") => Ok(Provider::Anthropic),
            Some(other) => anyhow::bail!("unsupported LLM_PROVIDER: {other}"),
        }
    }
}

/// A free-text generation backend.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Builds the client selected by `LLM_PROVIDER`. Fails before any request if its key is missing.
pub fn client_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn LlmClient>> {
    Ok(match Provider::from_name(settings.llm_provider.as_deref())? {
        Provider::Gemini => Arc::new(gemini::GeminiClient::from_settings(settings)?),
        Provider::Anthropic => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
    })
}

/// Asks the model about `query` and parses the JSON object embedded in its answer.
pub async fn lookup_company(llm: &dyn LlmClient, query: &str) -> anyhow::Result<CompanyProfile> {
    let text = llm.generate_text(&prompt::company_info_prompt(query)).await?;
    json::parse_company_profile(llm.provider(), &text, query)
}

/// Summarizes already-extracted document text, optionally in the context of a known company.
pub async fn analyze_documents(
    llm: &dyn LlmClient,
    company: Option<&CompanyProfile>,
    documents: &[DocumentText],
    max_chars: usize,
) -> anyhow::Result<String> {
    anyhow::ensure!(!documents.is_empty(), "at least one document is required");
    let text = llm
        .generate_text(&prompt::document_analysis_prompt(company, documents, max_chars))
        .await?;
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "document analysis returned no text");
    Ok(text.to_string())
}
