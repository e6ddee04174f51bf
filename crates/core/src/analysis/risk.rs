use crate::domain::company::CompanyProfile;
use crate::domain::financial::FinancialRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            RiskLevel::Low => "risk-low",
            RiskLevel::Medium => "risk-medium",
            RiskLevel::High => "risk-high",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RiskLevel::Low => "✅",
            RiskLevel::Medium => "⚠️",
            RiskLevel::High => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub reason: String,
}

impl RiskAssessment {
    fn new(level: RiskLevel, reason: impl Into<String>) -> Self {
        Self {
            level,
            reason: reason.into(),
        }
    }
}

/// The six pre-LOI risk dimensions, each rated independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub cashflow: RiskAssessment,
    pub customer: RiskAssessment,
    pub revenue: RiskAssessment,
    pub consumability: RiskAssessment,
    pub seasonality: RiskAssessment,
    pub recession: RiskAssessment,
}

impl RiskProfile {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &RiskAssessment)> {
        [
            ("cashflow", &self.cashflow),
            ("customer", &self.customer),
            ("revenue", &self.revenue),
            ("consumability", &self.consumability),
            ("seasonality", &self.seasonality),
            ("recession", &self.recession),
        ]
        .into_iter()
    }
}

/// Rates every risk category from whatever data is present. Never fails.
pub fn classify(profile: &CompanyProfile, financial: Option<&FinancialRecord>) -> RiskProfile {
    let industry = profile.industry.to_lowercase();

    RiskProfile {
        cashflow: cashflow(financial),
        customer: RiskAssessment::new(
            RiskLevel::Medium,
            "Customer concentration analysis requires detailed revenue breakdown data",
        ),
        revenue: revenue(profile, financial),
        consumability: consumability(&industry),
        seasonality: seasonality(&industry),
        recession: recession(&industry),
    }
}

fn cashflow(financial: Option<&FinancialRecord>) -> RiskAssessment {
    let Some(fin) = financial else {
        return RiskAssessment::new(
            RiskLevel::Medium,
            "Financial data not available for analysis",
        );
    };
    let shown = &fin.financials.ebitda_margin;
    match fin.ebitda_margin_pct() {
        None => RiskAssessment::new(
            RiskLevel::Medium,
            "EBITDA margin not available for analysis",
        ),
        Some(m) if m > 15.0 => {
            RiskAssessment::new(RiskLevel::Low, format!("Strong EBITDA margin of {shown}"))
        }
        Some(m) if m > 5.0 => {
            RiskAssessment::new(RiskLevel::Medium, format!("Moderate EBITDA margin of {shown}"))
        }
        Some(_) => RiskAssessment::new(RiskLevel::High, format!("Low EBITDA margin of {shown}")),
    }
}

fn revenue(profile: &CompanyProfile, financial: Option<&FinancialRecord>) -> RiskAssessment {
    if profile.is_public && financial.is_some() {
        RiskAssessment::new(
            RiskLevel::Low,
            "Public companies typically have established revenue models",
        )
    } else {
        RiskAssessment::new(
            RiskLevel::Medium,
            "Revenue model assessment requires additional data",
        )
    }
}

fn consumability(industry: &str) -> RiskAssessment {
    if industry.contains("software") || industry.contains("saas") {
        RiskAssessment::new(
            RiskLevel::Low,
            "Software/SaaS models typically have high repeat usage",
        )
    } else {
        RiskAssessment::new(
            RiskLevel::Medium,
            "Consumability varies by industry and business model",
        )
    }
}

fn seasonality(industry: &str) -> RiskAssessment {
    if industry.contains("retail") || industry.contains("consumer") {
        RiskAssessment::new(
            RiskLevel::Medium,
            "Consumer-facing businesses often have seasonal patterns",
        )
    } else {
        RiskAssessment::new(RiskLevel::Low, "Limited seasonal exposure based on industry")
    }
}

// Both branches rate medium; only the explanation differs. Likely meant to separate
// growth-sensitive tech from other sectors, left as-is until there is data to calibrate against.
fn recession(industry: &str) -> RiskAssessment {
    if industry.contains("technology") || industry.contains("software") {
        RiskAssessment::new(
            RiskLevel::Medium,
            "Technology companies can be growth-sensitive but often resilient",
        )
    } else {
        RiskAssessment::new(
            RiskLevel::Medium,
            "Recession resistance depends on specific business model",
        )
    }
}
