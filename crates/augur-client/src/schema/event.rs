use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

/// A market event and its estimated price impact, from `/event-impact/latest`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventImpact {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub impact: Option<f64>,
    #[serde(default, deserialize_with = "de_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl EventImpact {
    /// Upward (or flat) impact; unknown impact counts as flat.
    pub fn is_positive(&self) -> bool {
        self.impact.unwrap_or(0.0) >= 0.0
    }
}

// unknown or null severities fall back to `Low`
fn de_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(raw.as_deref().map(Severity::parse_lenient).unwrap_or_default())
}
