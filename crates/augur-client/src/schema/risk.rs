use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskBucket {
    Low,
    Moderate,
    High,
}

impl RiskBucket {
    pub fn description(&self) -> &'static str {
        match self {
            RiskBucket::Low => "Stable market conditions.",
            RiskBucket::Moderate => "Watch for volatility.",
            RiskBucket::High => "High volatility expected, be cautious.",
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskBucket::Low => "Low",
            RiskBucket::Moderate => "Moderate",
            RiskBucket::High => "High",
        };
        f.write_str(name)
    }
}

/// Risk score for one symbol; `bucket` is derived from `score` by
/// [`classify_risk()`](crate::metrics::classify_risk).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub symbol: String,
    pub score: f64,
    pub bucket: RiskBucket,
}
