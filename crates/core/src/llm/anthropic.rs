use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const RETRY_MIN_MAX_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You are a research analyst supporting private-equity deal sourcing. \
    Answer factually and concisely. When asked for JSON, return ONLY a single JSON object \
    without markdown fences or comments.";

/// Messages API backend, selected with `LLM_PROVIDER=anthropic`.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut client = Self::new(api_key, base_url, Duration::from_secs(timeout_secs))?;
        if let Ok(model) = std::env::var("ANTHROPIC_MODEL") {
            client.model = model;
        }
        if let Some(max_tokens) = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            client.max_tokens = max_tokens;
        }
        Ok(client)
    }

    pub fn new(api_key: String, base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    fn diagnostics(stage: &'static str, detail: String, text: &str) -> LlmDiagnosticsError {
        LlmDiagnosticsError {
            provider: Provider::Anthropic,
            stage,
            detail,
            raw_output: Some(text.to_string()),
            raw_response_json: serde_json::from_str::<Value>(text).ok(),
        }
    }

    async fn send(&self, prompt: &str, max_tokens: u32) -> anyhow::Result<(String, MessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));

        let req = MessageRequest {
            model: &self.model,
            max_tokens,
            temperature: 0.3,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            return Err(Self::diagnostics("http", format!("Anthropic API error: {status}"), &text).into());
        }

        let parsed = serde_json::from_str::<MessageResponse>(&text).map_err(|e| {
            Self::diagnostics("decode", format!("unexpected Anthropic response: {e}"), &text)
        })?;
        Ok((text, parsed))
    }

    fn response_text(res: &MessageResponse) -> String {
        res.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        let (mut raw, mut res) = self.send(prompt, self.max_tokens).await?;

        // A truncated answer usually cuts the JSON object short; one retry with more room.
        if res.stop_reason.as_deref() == Some("max_tokens") {
            let bumped = self.max_tokens.saturating_mul(2).max(RETRY_MIN_MAX_TOKENS);
            tracing::warn!(from = self.max_tokens, to = bumped, "Anthropic hit max_tokens; retrying");
            (raw, res) = self.send(prompt, bumped).await?;
        }

        let text = Self::response_text(&res);
        if text.trim().is_empty() {
            return Err(
                Self::diagnostics("empty_response", "Anthropic returned no text".to_string(), &raw)
                    .into(),
            );
        }
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}
