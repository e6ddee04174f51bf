use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";

/// Canonical financial snapshot. Every figure is display-ready: a formatted number or `"N/A"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub financials: Financials,
    pub stock_info: StockInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    pub revenue: String,
    pub ebitda: String,
    pub ebitda_margin: String,
    pub gross_profit: String,
    pub gross_margin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    #[serde(rename = "high52Week")]
    pub high_52_week: String,
    #[serde(rename = "low52Week")]
    pub low_52_week: String,
    pub avg_volume: String,
    pub market_cap: String,
    pub pe_ratio: String,
}

impl FinancialRecord {
    /// EBITDA margin in percent (`"12.5%"` -> `12.5`).
    pub fn ebitda_margin_pct(&self) -> Option<f64> {
        parse_display_number(&self.financials.ebitda_margin)
    }

    pub fn pe_ratio(&self) -> Option<f64> {
        parse_display_number(&self.stock_info.pe_ratio)
    }

    pub fn daily_change(&self) -> Option<f64> {
        parse_display_number(&self.change)
    }
}

/// Reads back a plain display number: optional trailing `%`, optional thousands separators.
/// Magnitude-suffixed values (`"1.2B"`) and `"N/A"` are not plain numbers.
pub fn parse_display_number(s: &str) -> Option<f64> {
    let t = s.trim();
    let t = t.strip_suffix('%').unwrap_or(t).trim();
    if t.is_empty() || t == NOT_AVAILABLE {
        return None;
    }
    let v = t.replace(',', "").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn record(ebitda_margin: &str, pe_ratio: &str, change: &str) -> FinancialRecord {
        FinancialRecord {
            price: "100.00".to_string(),
            change: change.to_string(),
            change_percent: NOT_AVAILABLE.to_string(),
            financials: Financials {
                revenue: "1.5B".to_string(),
                ebitda: "300.0M".to_string(),
                ebitda_margin: ebitda_margin.to_string(),
                gross_profit: NOT_AVAILABLE.to_string(),
                gross_margin: NOT_AVAILABLE.to_string(),
            },
            stock_info: StockInfo {
                high_52_week: NOT_AVAILABLE.to_string(),
                low_52_week: NOT_AVAILABLE.to_string(),
                avg_volume: NOT_AVAILABLE.to_string(),
                market_cap: NOT_AVAILABLE.to_string(),
                pe_ratio: pe_ratio.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_display_numbers() {
        assert_eq!(parse_display_number("25.0%"), Some(25.0));
        assert_eq!(parse_display_number("-3.10"), Some(-3.1));
        assert_eq!(parse_display_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_display_number("N/A"), None);
        assert_eq!(parse_display_number("1.2B"), None);
        assert_eq!(parse_display_number("NaN"), None);
    }

    #[test]
    fn serializes_with_dashboard_field_names() {
        let rec = fixtures::record("12.0%", "18.2", "1.25");
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["changePercent"], json!("N/A"));
        assert_eq!(v["financials"]["ebitdaMargin"], json!("12.0%"));
        assert_eq!(v["stockInfo"]["high52Week"], json!("N/A"));
        assert_eq!(v["stockInfo"]["peRatio"], json!("18.2"));
        assert_eq!(rec.ebitda_margin_pct(), Some(12.0));
        assert_eq!(rec.daily_change(), Some(1.25));
    }
}
