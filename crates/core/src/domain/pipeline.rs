use serde::{Deserialize, Serialize};

pub const PRIVATE_SYMBOL: &str = "PRIVATE";
pub const DEFAULT_INDUSTRY: &str = "Technology";

/// A previously analyzed company and the score it received. The pipeline holds at most one entry
/// per symbol, so every private company shares the single `PRIVATE` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEntry {
    pub name: String,
    pub symbol: String,
    pub deal_score: u8,
    /// Calendar date of the analysis (`YYYY-MM-DD`).
    pub date: String,
    pub industry: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustrySummary {
    pub industry: String,
    pub count: usize,
    /// Mean deal score, rounded to the nearest integer.
    pub average_score: u8,
    pub companies: Vec<PipelineEntry>,
}

/// Result of comparing pipeline companies across industries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndustryComparison {
    /// Fewer than two companies analyzed; a comparison would be meaningless.
    InsufficientData { companies: usize },
    Ready { industries: Vec<IndustrySummary> },
}
