//! Deal score: a fixed-weight additive heuristic over whatever signals are available.
//!
//! This is a screening aid, not a financial model. The thresholds and bonuses are kept stable so
//! scores stay comparable across pipeline entries.

use crate::domain::company::CompanyProfile;
use crate::domain::financial::FinancialRecord;

const BASE_SCORE: i32 = 50;
const OVERVIEW_BONUS_MIN_CHARS: usize = 100;

/// Scores a company on a 0..=100 scale. Never fails; missing inputs contribute nothing.
pub fn deal_score(profile: &CompanyProfile, financial: Option<&FinancialRecord>) -> u8 {
    let mut score = BASE_SCORE;

    if let Some(fin) = financial {
        score += margin_bonus(fin.ebitda_margin_pct());
        score += pe_bonus(fin.pe_ratio());

        if fin.daily_change().is_some_and(|c| c > 0.0) {
            score += 10;
        }
    }

    // Counted in chars (Unicode scalar values), not UTF-16 units; the two differ only for
    // astral-plane text such as emoji.
    if profile.overview.chars().count() > OVERVIEW_BONUS_MIN_CHARS {
        score += 5;
    }

    score.clamp(0, 100) as u8
}

fn margin_bonus(margin: Option<f64>) -> i32 {
    match margin {
        Some(m) if m > 20.0 => 25,
        Some(m) if m > 10.0 => 15,
        Some(m) if m > 0.0 => 8,
        _ => 0,
    }
}

fn pe_bonus(pe: Option<f64>) -> i32 {
    match pe {
        Some(pe) if pe < 25.0 => 10,
        Some(pe) if pe < 35.0 => 5,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::financial::fixtures::record;

    fn profile(overview: &str) -> CompanyProfile {
        CompanyProfile {
            name: "Acme".to_string(),
            symbol: Some("ACME".to_string()),
            industry: "Software".to_string(),
            is_public: true,
            overview: overview.to_string(),
            history: String::new(),
            products: String::new(),
            error: None,
        }
    }

    #[test]
    fn without_financials_only_overview_counts() {
        assert_eq!(deal_score(&profile("short"), None), 50);
        assert_eq!(deal_score(&profile(&"x".repeat(101)), None), 55);
        // Exactly 100 characters does not qualify.
        assert_eq!(deal_score(&profile(&"x".repeat(100)), None), 50);
    }

    #[test]
    fn overview_length_counts_chars_not_bytes() {
        // 60 chars, 120 bytes.
        assert_eq!(deal_score(&profile(&"é".repeat(60)), None), 50);
        assert_eq!(deal_score(&profile(&"é".repeat(101)), None), 55);
        // 100 emoji are 200 UTF-16 units but still 100 chars.
        assert_eq!(deal_score(&profile(&"📈".repeat(100)), None), 50);
    }

    #[test]
    fn margin_brackets_are_exclusive() {
        let p = profile("");
        assert_eq!(deal_score(&p, Some(&record("25.0%", "N/A", "N/A"))), 75);
        assert_eq!(deal_score(&p, Some(&record("12.0%", "N/A", "N/A"))), 65);
        assert_eq!(deal_score(&p, Some(&record("0.5%", "N/A", "N/A"))), 58);
        assert_eq!(deal_score(&p, Some(&record("-4.0%", "N/A", "N/A"))), 50);
        assert_eq!(deal_score(&p, Some(&record("20.0%", "N/A", "N/A"))), 65);
        assert_eq!(deal_score(&p, Some(&record("N/A", "N/A", "N/A"))), 50);
    }

    #[test]
    fn pe_and_change_bonuses() {
        let p = profile("");
        assert_eq!(deal_score(&p, Some(&record("N/A", "18.0", "N/A"))), 60);
        assert_eq!(deal_score(&p, Some(&record("N/A", "30.0", "N/A"))), 55);
        assert_eq!(deal_score(&p, Some(&record("N/A", "35.0", "N/A"))), 50);
        assert_eq!(deal_score(&p, Some(&record("N/A", "N/A", "0.01"))), 60);
        assert_eq!(deal_score(&p, Some(&record("N/A", "N/A", "-2.50"))), 50);
        assert_eq!(deal_score(&p, Some(&record("N/A", "N/A", "0.00"))), 50);
    }

    #[test]
    fn all_bonuses_reach_the_ceiling() {
        let p = profile(&"a detailed overview ".repeat(10));
        assert_eq!(deal_score(&p, Some(&record("31.2%", "12.0", "3.10"))), 100);
    }
}
