use serde::{Deserialize, Serialize};

pub const UNKNOWN_INDUSTRY: &str = "Unknown";

/// Qualitative company information produced by the AI provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub name: String,
    pub symbol: Option<String>,
    pub industry: String,
    pub is_public: bool,
    pub overview: String,
    pub history: String,
    pub products: String,

    /// Set when the lookup failed and this profile is a stand-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompanyProfile {
    /// Stand-in profile used when the AI lookup fails, so the search still yields a pipeline entry.
    pub fn degraded(query: &str, error: &str) -> Self {
        Self {
            name: query.to_string(),
            symbol: None,
            industry: UNKNOWN_INDUSTRY.to_string(),
            is_public: false,
            overview: format!(
                "Information for \"{query}\" could not be retrieved via AI. {error}"
            ),
            history: "Historical information not available due to API error.".to_string(),
            products: "Product information not available due to API error.".to_string(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Ticker to query the financial provider with, if the company is listed.
    pub fn listed_symbol(&self) -> Option<&str> {
        if !self.is_public {
            return None;
        }
        self.symbol.as_deref().filter(|s| !s.trim().is_empty())
    }
}
