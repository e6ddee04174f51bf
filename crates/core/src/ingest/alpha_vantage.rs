use crate::config::Settings;
use crate::ingest::provider::{FinancialDataProvider, ProviderError, ProviderErrorKind};
use crate::ingest::types::{RawFinancials, RawOverview, RawQuoteResponse};
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

const PROVIDER_NAME: &str = "alpha_vantage";
const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 2;

#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retries: u32,
}

impl AlphaVantageClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_alpha_vantage_api_key()?.to_string();
        let base_url = std::env::var("ALPHA_VANTAGE_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("ALPHA_VANTAGE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("ALPHA_VANTAGE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        Ok(Self::new(api_key, base_url, Duration::from_secs(timeout_secs))?.with_retries(retries))
    }

    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build Alpha Vantage http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries: DEFAULT_RETRIES,
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    async fn query<T: DeserializeOwned>(
        &self,
        function: &'static str,
        request: &'static str,
        symbol: &str,
    ) -> Result<T> {
        let params = [
            ("function", function),
            ("symbol", symbol),
            ("apikey", self.api_key.as_str()),
        ];

        let mut attempt: u32 = 0;
        let text = loop {
            attempt += 1;

            let res = match self.http.get(&self.base_url).query(&params).send().await {
                Ok(r) => r,
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err)
                            .with_context(|| format!("Alpha Vantage {function} request failed"));
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(
                        attempt,
                        ?backoff,
                        function,
                        %symbol,
                        error = %err,
                        "Alpha Vantage request failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let status = res.status();
            let text = res
                .text()
                .await
                .with_context(|| format!("failed to read Alpha Vantage {function} response"))?;

            if !status.is_success() {
                let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                if retryable && attempt < self.retries {
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(
                        attempt,
                        ?backoff,
                        function,
                        %symbol,
                        http_status = %status,
                        "Alpha Vantage HTTP error; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                return Err(ProviderError {
                    provider: PROVIDER_NAME,
                    request,
                    kind: ProviderErrorKind::Http,
                    detail: format!("status={status}"),
                }
                .into());
            }

            break text;
        };

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("Alpha Vantage {function} response is not valid JSON: {text}"))
    }
}

#[async_trait::async_trait]
impl FinancialDataProvider for AlphaVantageClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch_raw(&self, symbol: &str) -> Result<RawFinancials> {
        let symbol = symbol.trim();
        anyhow::ensure!(!symbol.is_empty(), "symbol must be non-empty");

        let (overview, quote) = tokio::try_join!(
            self.query::<RawOverview>("OVERVIEW", "overview", symbol),
            self.query::<RawQuoteResponse>("GLOBAL_QUOTE", "quote", symbol),
        )?;

        tracing::debug!(%symbol, "fetched Alpha Vantage overview and quote");
        Ok(RawFinancials { overview, quote })
    }
}
