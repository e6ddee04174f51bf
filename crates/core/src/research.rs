use crate::analysis::{classify, deal_score, RiskProfile};
use crate::config::Settings;
use crate::domain::company::CompanyProfile;
use crate::domain::financial::FinancialRecord;
use crate::domain::pipeline::PipelineEntry;
use crate::ingest::alpha_vantage::AlphaVantageClient;
use crate::ingest::provider::FinancialDataProvider;
use crate::llm::prompt::DocumentText;
use crate::llm::{self, LlmClient};
use crate::storage::cache::{financial_key, TtlCache};
use crate::storage::pipeline::{entry_for, PipelineStore};
use crate::storage::KvStore;
use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub documents: Vec<DocumentText>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub documents: Vec<String>,
    pub summary: Option<String>,
    pub error: Option<String>,
}

/// Everything produced for one researched company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyReport {
    pub profile: CompanyProfile,
    pub financials: Option<FinancialRecord>,
    /// Why financial data is missing for a listed company, if it is.
    pub financial_error: Option<String>,
    pub deal_score: u8,
    pub risks: RiskProfile,
    pub pipeline_entry: PipelineEntry,
    pub document_analysis: Option<DocumentAnalysis>,
}

pub struct ResearchService {
    llm: Arc<dyn LlmClient>,
    financial: Option<Arc<dyn FinancialDataProvider>>,
    cache: TtlCache,
    cache_ttl: Duration,
    max_document_length: usize,
    max_uploaded_files: usize,
}

impl ResearchService {
    pub fn new(
        settings: &Settings,
        llm: Arc<dyn LlmClient>,
        financial: Option<Arc<dyn FinancialDataProvider>>,
        cache: TtlCache,
    ) -> Self {
        Self {
            llm,
            financial,
            cache,
            cache_ttl: settings.financial_cache_ttl,
            max_document_length: settings.max_document_length,
            max_uploaded_files: settings.max_uploaded_files,
        }
    }

    /// Wires the configured AI client and, when its key is set, the Alpha Vantage client.
    ///
    /// A missing AI key is fatal. A missing financial key only disables financial data.
    pub fn from_settings(settings: &Settings, store: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let llm = llm::client_from_settings(settings)?;
        let financial: Option<Arc<dyn FinancialDataProvider>> =
            match AlphaVantageClient::from_settings(settings) {
                Ok(client) => Some(Arc::new(client)),
                Err(err) => {
                    tracing::warn!(error = %err, "financial data disabled");
                    None
                }
            };
        Ok(Self::new(settings, llm, financial, TtlCache::new(store)))
    }

    pub fn has_financial_provider(&self) -> bool {
        self.financial.is_some()
    }

    /// AI company lookup. Failures yield a degraded profile rather than an error.
    pub async fn company_profile(&self, query: &str) -> CompanyProfile {
        match llm::lookup_company(self.llm.as_ref(), query).await {
            Ok(profile) => {
                tracing::info!(%query, name = %profile.name, "AI company info retrieved");
                profile
            }
            Err(err) => {
                tracing::warn!(%query, error = %err, "AI company lookup failed; using degraded profile");
                CompanyProfile::degraded(query, &format!("{err:#}"))
            }
        }
    }

    /// Financial record for `symbol`, served from the TTL cache when fresh.
    pub async fn financials(&self, symbol: &str) -> anyhow::Result<FinancialRecord> {
        let provider = self
            .financial
            .as_ref()
            .context("financial data provider is not configured")?;

        let key = financial_key(symbol);
        if let Some(cached) = self.cache.get::<FinancialRecord>(&key).await {
            tracing::info!(%symbol, "using cached financial data");
            return Ok(cached);
        }

        let record = provider.fetch_financials(symbol).await?;
        if let Err(err) = self.cache.set(&key, &record, self.cache_ttl).await {
            tracing::warn!(%symbol, error = %err, "failed to cache financial data");
        }
        tracing::info!(%symbol, provider = provider.provider_name(), "fetched financial data");
        Ok(record)
    }

    pub async fn research(
        &self,
        req: &ResearchRequest,
        pipeline: &mut PipelineStore,
    ) -> anyhow::Result<CompanyReport> {
        self.research_on(req, pipeline, chrono::Local::now().date_naive())
            .await
    }

    /// Full search: profile, financials for listed companies, score, risks, pipeline upsert.
    pub async fn research_on(
        &self,
        req: &ResearchRequest,
        pipeline: &mut PipelineStore,
        date: NaiveDate,
    ) -> anyhow::Result<CompanyReport> {
        let query = req.query.trim();
        anyhow::ensure!(!query.is_empty(), "a company name is required");
        self.check_documents(&req.documents)?;

        tracing::info!(%query, documents = req.documents.len(), "researching company");
        let profile = self.company_profile(query).await;

        let (financials, financial_error) = match profile.listed_symbol() {
            Some(symbol) => match self.financials(symbol).await {
                Ok(record) => (Some(record), None),
                Err(err) => {
                    tracing::warn!(%symbol, error = %err, "financial data unavailable");
                    (None, Some(format!("{err:#}")))
                }
            },
            None => (None, None),
        };

        let score = deal_score(&profile, financials.as_ref());
        let risks = classify(&profile, financials.as_ref());

        let document_analysis = if req.documents.is_empty() {
            None
        } else {
            Some(self.document_analysis(Some(&profile), &req.documents).await)
        };

        let entry = entry_for(&profile, score, date);
        pipeline.upsert(entry.clone()).await?;

        Ok(CompanyReport {
            profile,
            financials,
            financial_error,
            deal_score: score,
            risks,
            pipeline_entry: entry,
            document_analysis,
        })
    }

    /// Analysis of uploaded documents without a company search.
    pub async fn analyze_documents_only(
        &self,
        documents: &[DocumentText],
    ) -> anyhow::Result<DocumentAnalysis> {
        anyhow::ensure!(
            !documents.is_empty(),
            "enter a company name or provide documents to analyze"
        );
        self.check_documents(documents)?;

        let summary = llm::analyze_documents(
            self.llm.as_ref(),
            None,
            documents,
            self.max_document_length,
        )
        .await?;
        Ok(DocumentAnalysis {
            documents: documents.iter().map(|d| d.name.clone()).collect(),
            summary: Some(summary),
            error: None,
        })
    }

    async fn document_analysis(
        &self,
        profile: Option<&CompanyProfile>,
        documents: &[DocumentText],
    ) -> DocumentAnalysis {
        let names = documents.iter().map(|d| d.name.clone()).collect();
        match llm::analyze_documents(self.llm.as_ref(), profile, documents, self.max_document_length)
            .await
        {
            Ok(summary) => DocumentAnalysis {
                documents: names,
                summary: Some(summary),
                error: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "document analysis failed");
                DocumentAnalysis {
                    documents: names,
                    summary: None,
                    error: Some(format!("{err:#}")),
                }
            }
        }
    }

    /// Rejects more than `MAX_UPLOADED_FILES` documents. Every entry point runs it before any call.
    pub fn check_documents(&self, documents: &[DocumentText]) -> anyhow::Result<()> {
        anyhow::ensure!(
            documents.len() <= self.max_uploaded_files,
            "maximum {} documents allowed (got {})",
            self.max_uploaded_files,
            documents.len()
        );
        Ok(())
    }
}
