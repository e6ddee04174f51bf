use crate::domain::financial::{FinancialRecord, Financials, StockInfo, NOT_AVAILABLE};
use crate::ingest::provider::{ProviderError, ProviderErrorKind};
use crate::ingest::types::{RawFinancials, RawOverview, RawQuote, RawQuoteResponse};

/// Converts a raw provider payload into the canonical record.
///
/// Provider error and rate-limit indicators in either half fail the whole conversion, as does an
/// empty overview or quote; no partial record is ever produced.
pub fn normalize(provider: &'static str, raw: &RawFinancials) -> anyhow::Result<FinancialRecord> {
    check_overview(provider, &raw.overview)?;
    check_quote(provider, &raw.quote)?;

    let o = &raw.overview;
    let quote = present_quote(provider, &raw.quote)?;
    if o.symbol.as_deref().map_or(true, |s| s.trim().is_empty()) {
        return Err(no_data(provider, "overview", "overview has no Symbol"));
    }

    let change_percent = quote
        .change_percent
        .as_deref()
        .map(|s| s.trim().trim_end_matches('%'));

    Ok(FinancialRecord {
        price: fixed(quote.price.as_deref(), 2),
        change: fixed(quote.change.as_deref(), 2),
        change_percent: fixed(change_percent, 2),
        financials: Financials {
            revenue: format_magnitude(o.revenue_ttm.as_deref()),
            ebitda: format_magnitude(o.ebitda.as_deref()),
            ebitda_margin: percent(parse_number(o.profit_margin.as_deref()).map(|m| m * 100.0)),
            gross_profit: format_magnitude(o.gross_profit_ttm.as_deref()),
            gross_margin: percent(gross_margin(o)),
        },
        stock_info: StockInfo {
            high_52_week: fixed(o.week_52_high.as_deref(), 2),
            low_52_week: fixed(o.week_52_low.as_deref(), 2),
            avg_volume: format_magnitude(o.shares_outstanding.as_deref()),
            market_cap: format_magnitude(o.market_capitalization.as_deref()),
            pe_ratio: fixed(o.pe_ratio.as_deref(), 1),
        },
    })
}

fn check_overview(provider: &'static str, o: &RawOverview) -> anyhow::Result<()> {
    check_indicators(provider, "overview", &o.error_message, &o.note, &o.information)
}

fn check_quote(provider: &'static str, q: &RawQuoteResponse) -> anyhow::Result<()> {
    check_indicators(provider, "quote", &q.error_message, &q.note, &q.information)
}

fn check_indicators(
    provider: &'static str,
    request: &'static str,
    error_message: &Option<String>,
    note: &Option<String>,
    information: &Option<String>,
) -> anyhow::Result<()> {
    if let Some(msg) = error_message {
        return Err(ProviderError {
            provider,
            request,
            kind: ProviderErrorKind::ErrorPayload,
            detail: msg.clone(),
        }
        .into());
    }
    if let Some(msg) = note.as_ref().or(information.as_ref()) {
        return Err(ProviderError {
            provider,
            request,
            kind: ProviderErrorKind::RateLimited,
            detail: msg.clone(),
        }
        .into());
    }
    Ok(())
}

// Alpha Vantage answers unknown tickers with `{}` / `{"Global Quote": {}}` rather than an error.
fn present_quote<'a>(provider: &'static str, q: &'a RawQuoteResponse) -> anyhow::Result<&'a RawQuote> {
    match &q.global_quote {
        Some(quote) if quote.price.is_some() => Ok(quote),
        Some(_) => Err(no_data(provider, "quote", "quote has no price")),
        None => Err(no_data(provider, "quote", "response has no Global Quote")),
    }
}

fn no_data(provider: &'static str, request: &'static str, detail: &str) -> anyhow::Error {
    ProviderError {
        provider,
        request,
        kind: ProviderErrorKind::NoData,
        detail: detail.to_string(),
    }
    .into()
}

fn gross_margin(o: &RawOverview) -> Option<f64> {
    let gross = parse_number(o.gross_profit_ttm.as_deref())?;
    let revenue = parse_number(o.revenue_ttm.as_deref())?;
    if revenue == 0.0 {
        return None;
    }
    Some(gross / revenue * 100.0)
}

/// Parses a provider value. Blank, `"None"`, `"-"` and anything non-numeric read as absent.
pub fn parse_number(s: Option<&str>) -> Option<f64> {
    let t = s?.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("none") || t == "-" {
        return None;
    }
    let v = t.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// `1.5e9` -> `"1.5B"`, `2.34e6` -> `"2.3M"`, smaller values with thousands separators.
pub fn format_magnitude(s: Option<&str>) -> String {
    let Some(v) = parse_number(s) else {
        return NOT_AVAILABLE.to_string();
    };
    if v >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if v >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else {
        group_thousands(v)
    }
}

fn fixed(s: Option<&str>, decimals: usize) -> String {
    match parse_number(s) {
        Some(v) => format!("{v:.decimals$}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn percent(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.1}%"),
        None => NOT_AVAILABLE.to_string(),
    }
}

// en-US style: comma separators, at most three fraction digits, trailing zeros dropped.
fn group_thousands(v: f64) -> String {
    let rendered = format!("{:.3}", v.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = v < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawFinancials {
        RawFinancials {
            overview: RawOverview {
                symbol: Some("IBM".to_string()),
                revenue_ttm: Some("1500000000".to_string()),
                ebitda: Some("345600000".to_string()),
                profit_margin: Some("0.231".to_string()),
                gross_profit_ttm: Some("600000000".to_string()),
                week_52_high: Some("199.18".to_string()),
                week_52_low: Some("130.5".to_string()),
                shares_outstanding: Some("918000000".to_string()),
                market_capitalization: Some("2.95e12".to_string()),
                pe_ratio: Some("22.43".to_string()),
                ..Default::default()
            },
            quote: RawQuoteResponse {
                global_quote: Some(RawQuote {
                    symbol: Some("IBM".to_string()),
                    price: Some("183.4600".to_string()),
                    change: Some("1.2350".to_string()),
                    change_percent: Some("0.6778%".to_string()),
                }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn normalizes_full_payload() {
        let rec = normalize("test", &raw()).unwrap();
        assert_eq!(rec.price, "183.46");
        assert_eq!(rec.change_percent, "0.68");
        assert_eq!(rec.financials.revenue, "1.5B");
        assert_eq!(rec.financials.ebitda, "345.6M");
        assert_eq!(rec.financials.ebitda_margin, "23.1%");
        assert_eq!(rec.financials.gross_margin, "40.0%");
        assert_eq!(rec.stock_info.high_52_week, "199.18");
        assert_eq!(rec.stock_info.low_52_week, "130.50");
        assert_eq!(rec.stock_info.avg_volume, "918.0M");
        assert_eq!(rec.stock_info.market_cap, "2950.0B");
        assert_eq!(rec.stock_info.pe_ratio, "22.4");
    }

    #[test]
    fn none_placeholders_render_not_available() {
        let mut r = raw();
        r.quote.global_quote.as_mut().unwrap().price = Some("None".to_string());
        r.overview.pe_ratio = Some("None".to_string());
        r.overview.profit_margin = Some("None".to_string());
        r.overview.revenue_ttm = None;

        let rec = normalize("test", &r).unwrap();
        assert_eq!(rec.price, "N/A");
        assert_eq!(rec.stock_info.pe_ratio, "N/A");
        assert_eq!(rec.financials.ebitda_margin, "N/A");
        assert_eq!(rec.financials.revenue, "N/A");
        assert_eq!(rec.financials.gross_margin, "N/A");
    }

    #[test]
    fn empty_payloads_are_errors() {
        let kind = |r: &RawFinancials| {
            let err = normalize("test", r).unwrap_err();
            let pe = err.downcast_ref::<ProviderError>().unwrap();
            (pe.kind, pe.request)
        };

        let mut r = raw();
        r.quote.global_quote = None;
        assert_eq!(kind(&r), (ProviderErrorKind::NoData, "quote"));

        let mut r = raw();
        r.quote.global_quote = Some(RawQuote::default());
        assert_eq!(kind(&r), (ProviderErrorKind::NoData, "quote"));

        let mut r = raw();
        r.overview = RawOverview::default();
        assert_eq!(kind(&r), (ProviderErrorKind::NoData, "overview"));
    }

    #[test]
    fn unknown_ticker_response_is_rejected() {
        let r = RawFinancials {
            overview: serde_json::from_str("{}").unwrap(),
            quote: serde_json::from_str(r#"{"Global Quote": {}}"#).unwrap(),
        };
        assert!(normalize("test", &r).is_err());
    }

    #[test]
    fn error_indicators_short_circuit() {
        let mut r = raw();
        r.overview.error_message = Some("Invalid API call.".to_string());
        let err = normalize("test", &r).unwrap_err();
        let pe = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(pe.kind, ProviderErrorKind::ErrorPayload);
        assert_eq!(pe.request, "overview");

        let mut r = raw();
        r.quote.note = Some("Thank you for using Alpha Vantage! 5 calls per minute.".to_string());
        let err = normalize("test", &r).unwrap_err();
        let pe = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(pe.kind, ProviderErrorKind::RateLimited);
        assert_eq!(pe.request, "quote");

        let mut r = raw();
        r.overview.information = Some("rate limit".to_string());
        assert!(normalize("test", &r).is_err());
    }

    #[test]
    fn formats_magnitudes() {
        assert_eq!(format_magnitude(Some("1.5e9")), "1.5B");
        assert_eq!(format_magnitude(Some("1000000000")), "1.0B");
        assert_eq!(format_magnitude(Some("999999")), "999,999");
        assert_eq!(format_magnitude(Some("1234.5678")), "1,234.568");
        assert_eq!(format_magnitude(Some("12")), "12");
        assert_eq!(format_magnitude(Some("-2500")), "-2,500");
        assert_eq!(format_magnitude(Some("abc")), "N/A");
        assert_eq!(format_magnitude(None), "N/A");
    }

    #[test]
    fn zero_revenue_has_no_gross_margin() {
        let mut r = raw();
        r.overview.revenue_ttm = Some("0".to_string());
        let rec = normalize("test", &r).unwrap();
        assert_eq!(rec.financials.gross_margin, "N/A");
    }
}
