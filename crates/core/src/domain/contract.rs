use crate::domain::company::CompanyProfile;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// Company profile as emitted by the AI provider. Every key is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmCompanyProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub products: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub industry: Option<String>,
}

impl LlmCompanyProfile {
    pub fn validate_and_into_profile(self, query: &str) -> anyhow::Result<CompanyProfile> {
        let name = non_blank(self.name).unwrap_or_else(|| query.trim().to_string());
        ensure!(!name.is_empty(), "company name must be non-empty");

        // Models sometimes spell out null as a string.
        let symbol = non_blank(self.symbol)
            .filter(|s| !matches!(s.to_ascii_lowercase().as_str(), "null" | "none" | "n/a"))
            .map(|s| s.to_ascii_uppercase());

        Ok(CompanyProfile {
            name,
            symbol,
            industry: non_blank(self.industry).unwrap_or_default(),
            is_public: self.is_public.unwrap_or(false),
            overview: non_blank(self.overview).unwrap_or_default(),
            history: non_blank(self.history).unwrap_or_default(),
            products: non_blank(self.products).unwrap_or_default(),
            error: None,
        })
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_symbol_and_defaults() {
        let raw: LlmCompanyProfile = serde_json::from_value(json!({
            "name": "  Microsoft Corporation ",
            "symbol": "msft",
            "isPublic": true,
            "industry": "Software"
        }))
        .unwrap();
        let p = raw.validate_and_into_profile("microsoft").unwrap();
        assert_eq!(p.name, "Microsoft Corporation");
        assert_eq!(p.symbol.as_deref(), Some("MSFT"));
        assert!(p.is_public);
        assert_eq!(p.overview, "");
        assert!(p.error.is_none());
    }

    #[test]
    fn null_like_symbols_become_none() {
        for sym in [json!(null), json!("null"), json!(" "), json!("None")] {
            let raw: LlmCompanyProfile =
                serde_json::from_value(json!({"name": "Private Co", "symbol": sym})).unwrap();
            let p = raw.validate_and_into_profile("private co").unwrap();
            assert!(p.symbol.is_none());
            assert!(!p.is_public);
        }
    }

    #[test]
    fn missing_name_falls_back_to_query() {
        let p = LlmCompanyProfile::default()
            .validate_and_into_profile("Stripe")
            .unwrap();
        assert_eq!(p.name, "Stripe");
    }

    #[test]
    fn rejects_blank_name_and_query() {
        assert!(LlmCompanyProfile::default()
            .validate_and_into_profile("  ")
            .is_err());
    }
}
