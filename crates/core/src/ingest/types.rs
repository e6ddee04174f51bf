use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Company-overview record (`function=OVERVIEW`). Values arrive as strings, sometimes `"None"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOverview {
    #[serde(rename = "Error Message", default, deserialize_with = "lenient_string")]
    pub error_message: Option<String>,
    #[serde(rename = "Note", default, deserialize_with = "lenient_string")]
    pub note: Option<String>,
    #[serde(rename = "Information", default, deserialize_with = "lenient_string")]
    pub information: Option<String>,

    #[serde(rename = "Symbol", default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
    #[serde(rename = "RevenueTTM", default, deserialize_with = "lenient_string")]
    pub revenue_ttm: Option<String>,
    #[serde(rename = "EBITDA", default, deserialize_with = "lenient_string")]
    pub ebitda: Option<String>,
    #[serde(rename = "ProfitMargin", default, deserialize_with = "lenient_string")]
    pub profit_margin: Option<String>,
    #[serde(rename = "GrossProfitTTM", default, deserialize_with = "lenient_string")]
    pub gross_profit_ttm: Option<String>,
    #[serde(rename = "52WeekHigh", default, deserialize_with = "lenient_string")]
    pub week_52_high: Option<String>,
    #[serde(rename = "52WeekLow", default, deserialize_with = "lenient_string")]
    pub week_52_low: Option<String>,
    #[serde(rename = "SharesOutstanding", default, deserialize_with = "lenient_string")]
    pub shares_outstanding: Option<String>,
    #[serde(rename = "MarketCapitalization", default, deserialize_with = "lenient_string")]
    pub market_capitalization: Option<String>,
    #[serde(rename = "PERatio", default, deserialize_with = "lenient_string")]
    pub pe_ratio: Option<String>,
}

/// Real-time quote envelope (`function=GLOBAL_QUOTE`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuoteResponse {
    #[serde(rename = "Error Message", default, deserialize_with = "lenient_string")]
    pub error_message: Option<String>,
    #[serde(rename = "Note", default, deserialize_with = "lenient_string")]
    pub note: Option<String>,
    #[serde(rename = "Information", default, deserialize_with = "lenient_string")]
    pub information: Option<String>,

    #[serde(rename = "Global Quote", default)]
    pub global_quote: Option<RawQuote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQuote {
    #[serde(rename = "01. symbol", default, deserialize_with = "lenient_string")]
    pub symbol: Option<String>,
    #[serde(rename = "05. price", default, deserialize_with = "lenient_string")]
    pub price: Option<String>,
    #[serde(rename = "09. change", default, deserialize_with = "lenient_string")]
    pub change: Option<String>,
    #[serde(rename = "10. change percent", default, deserialize_with = "lenient_string")]
    pub change_percent: Option<String>,
}

/// Both halves of a financial fetch, joined before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFinancials {
    pub overview: RawOverview,
    pub quote: RawQuoteResponse,
}

// Accepts strings or bare numbers; anything else (objects, arrays, null) reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_provider_field_names() {
        let v = json!({
            "Symbol": "IBM",
            "RevenueTTM": "62753001000",
            "ProfitMargin": 0.094,
            "52WeekHigh": "199.18",
            "PERatio": "None",
            "Unrelated": {"nested": true}
        });
        let o: RawOverview = serde_json::from_value(v).unwrap();
        assert_eq!(o.symbol.as_deref(), Some("IBM"));
        assert_eq!(o.revenue_ttm.as_deref(), Some("62753001000"));
        assert_eq!(o.profit_margin.as_deref(), Some("0.094"));
        assert_eq!(o.week_52_high.as_deref(), Some("199.18"));
        assert_eq!(o.pe_ratio.as_deref(), Some("None"));
        assert!(o.ebitda.is_none());
    }

    #[test]
    fn empty_global_quote_has_no_fields() {
        let q: RawQuoteResponse = serde_json::from_value(json!({"Global Quote": {}})).unwrap();
        let quote = q.global_quote.unwrap();
        assert!(quote.price.is_none());
    }
}
