use crate::domain::financial::FinancialRecord;
use crate::ingest::normalize::normalize;
use crate::ingest::types::RawFinancials;
use anyhow::Result;
use std::fmt;

#[async_trait::async_trait]
pub trait FinancialDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Fetches the overview and quote halves for `symbol`. Fails if either request fails.
    async fn fetch_raw(&self, symbol: &str) -> Result<RawFinancials>;

    async fn fetch_financials(&self, symbol: &str) -> Result<FinancialRecord> {
        let raw = self.fetch_raw(symbol).await?;
        normalize(self.provider_name(), &raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Non-success HTTP status.
    Http,
    /// Explicit error message in the payload (e.g. unknown symbol).
    ErrorPayload,
    /// Rate-limit or usage note in place of data.
    RateLimited,
    /// Well-formed response without the expected record (unknown ticker).
    NoData,
}

/// Failure reported by an external financial-data provider.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: &'static str,
    pub request: &'static str,
    pub kind: ProviderErrorKind,
    pub detail: String,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ProviderErrorKind::Http => "HTTP error",
            ProviderErrorKind::ErrorPayload => "invalid request or symbol",
            ProviderErrorKind::RateLimited => "API limit reached",
            ProviderErrorKind::NoData => "no data for symbol",
        };
        write!(
            f,
            "{} {} failed ({what}): {}",
            self.provider, self.request, self.detail
        )
    }
}

impl std::error::Error for ProviderError {}
