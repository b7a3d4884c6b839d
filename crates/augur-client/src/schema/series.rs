use serde::{Deserialize, Serialize};

/// One dated observation. `value` is `None` where the backend sent `null`,
/// so a gap stays a gap instead of becoming a zero.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Point {
    pub timestamp: String,
    pub value: Option<f64>,
}

impl Point {
    pub fn new(timestamp: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }
}

/// Canonical chart series exchanged with rendering consumers.
/// ```json
/// "series": {
///     "label": "lstm",
///     "points": [
///         { "timestamp": "2024-01-02", "value": 187.2 },
///         { "timestamp": "2024-01-03", "value": null },
///         // ...
///     ]
/// }
/// ```
/// An empty `points` means "no data yet"; a failed fetch is never represented
/// as a series at all.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    pub label: String,
    pub points: Vec<Point>,
}

impl TimeSeries {
    pub fn new(label: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(label, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keep the first `len` points, preserving order.
    pub fn truncate(&mut self, len: usize) {
        self.points.truncate(len);
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|p| p.timestamp.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Most recent non-null value.
    pub fn last_value(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.value)
    }
}
