pub mod risk;
pub mod score;

pub use risk::{classify, RiskAssessment, RiskLevel, RiskProfile};
pub use score::deal_score;
