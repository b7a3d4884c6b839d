use serde::{Deserialize, Serialize};

/// One prediction-vs-reality comparison.
///
/// `actual` stays `None` until the real price is known. `error_percent`
/// always comes from [`compute_error_percent()`]; it is `None` when either
/// side is missing or `actual` is zero.
///
/// [`compute_error_percent()`]: crate::metrics::compute_error_percent
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerRow {
    pub date: String,
    pub predicted: Option<f64>,
    pub actual: Option<f64>,
    pub error_percent: Option<f64>,

    /// The backend's own `error` column, kept for diagnostics only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_error: Option<f64>,
}

impl TrackerRow {
    /// Still waiting for the real price.
    pub fn is_pending(&self) -> bool {
        self.actual.is_none()
    }
}
