use crate::domain::company::CompanyProfile;
use crate::domain::pipeline::{
    IndustryComparison, IndustrySummary, PipelineEntry, DEFAULT_INDUSTRY, PRIVATE_SYMBOL,
};
use crate::storage::KvStore;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const PIPELINE_KEY: &str = "dealPipeline";

/// Builds the pipeline record for a freshly scored company.
pub fn entry_for(profile: &CompanyProfile, deal_score: u8, date: NaiveDate) -> PipelineEntry {
    let industry = profile.industry.trim();
    PipelineEntry {
        name: profile.name.clone(),
        symbol: profile
            .symbol
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| PRIVATE_SYMBOL.to_string()),
        deal_score,
        date: date.format("%Y-%m-%d").to_string(),
        industry: if industry.is_empty() {
            DEFAULT_INDUSTRY.to_string()
        } else {
            industry.to_string()
        },
    }
}

/// Ordered list of analyzed companies, written through to the store on every change.
pub struct PipelineStore {
    store: Arc<dyn KvStore>,
    entries: Vec<PipelineEntry>,
}

impl PipelineStore {
    /// Loads the persisted pipeline. A corrupt payload starts an empty pipeline instead of failing.
    pub async fn load(store: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let entries = match store.get(PIPELINE_KEY).await? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<PipelineEntry>>(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(error = %err, "stored pipeline is corrupt; starting empty");
                    Vec::new()
                }
            },
        };
        tracing::info!(companies = entries.len(), backend = store.backend_name(), "pipeline loaded");
        Ok(Self { store, entries })
    }

    pub fn list(&self) -> &[PipelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the entry with the same symbol in place, or appends. Persisted before returning.
    pub async fn upsert(&mut self, entry: PipelineEntry) -> anyhow::Result<()> {
        let mut next = self.entries.clone();
        let replaced = match next.iter().position(|e| e.symbol == entry.symbol) {
            Some(idx) => {
                next[idx] = entry.clone();
                true
            }
            None => {
                next.push(entry.clone());
                false
            }
        };

        let raw = serde_json::to_string(&next)?;
        self.store.set(PIPELINE_KEY, &raw).await?;
        self.entries = next;

        tracing::info!(
            symbol = %entry.symbol,
            name = %entry.name,
            deal_score = entry.deal_score,
            replaced,
            "pipeline updated"
        );
        Ok(())
    }

    pub fn group_by_industry(&self) -> BTreeMap<String, IndustrySummary> {
        let mut groups: BTreeMap<String, Vec<PipelineEntry>> = BTreeMap::new();
        for entry in &self.entries {
            groups
                .entry(entry.industry.clone())
                .or_default()
                .push(entry.clone());
        }

        groups
            .into_iter()
            .map(|(industry, companies)| {
                let total: u32 = companies.iter().map(|c| u32::from(c.deal_score)).sum();
                let average = (f64::from(total) / companies.len() as f64).round() as u8;
                let summary = IndustrySummary {
                    industry: industry.clone(),
                    count: companies.len(),
                    average_score: average,
                    companies,
                };
                (industry, summary)
            })
            .collect()
    }

    /// Industry grouping, or insufficient data when fewer than two companies were analyzed.
    pub fn industry_comparison(&self) -> IndustryComparison {
        if self.entries.len() < 2 {
            return IndustryComparison::InsufficientData {
                companies: self.entries.len(),
            };
        }
        IndustryComparison::Ready {
            industries: self.group_by_industry().into_values().collect(),
        }
    }
}
