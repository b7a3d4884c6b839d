//! Derived numbers. Pure functions only; every view that shows a percentage
//! error or a risk bucket gets it from here.

use crate::schema::RiskBucket;

pub const LOW_RISK_CEILING: f64 = 30.0;
pub const MODERATE_RISK_CEILING: f64 = 60.0;

/// Signed error of `predicted` relative to `actual`, in percent of `actual`,
/// rounded half away from zero to two decimals: an over-forecast is positive,
/// an under-forecast negative (`(100, 110)` gives `-9.09`).
///
/// `None` when `actual` is zero or either input is not finite.
pub fn compute_error_percent(predicted: f64, actual: f64) -> Option<f64> {
    if actual == 0.0 || !actual.is_finite() || !predicted.is_finite() {
        return None;
    }
    Some(round2((predicted - actual) / actual * 100.0))
}

/// `Low` below 30, `Moderate` from 30 up to (not including) 60, `High` from 60.
pub fn classify_risk(score: f64) -> RiskBucket {
    if score < LOW_RISK_CEILING {
        RiskBucket::Low
    } else if score < MODERATE_RISK_CEILING {
        RiskBucket::Moderate
    } else {
        RiskBucket::High
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
