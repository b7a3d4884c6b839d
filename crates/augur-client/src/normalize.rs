//! Backend payload shapes → canonical [`TimeSeries`] / [`TrackerRow`].
//!
//! Normalization is synchronous and never touches the network. A payload that
//! does not match its declared shape is an `Err(Malformed)`; a payload that
//! matches but disagrees with itself (label and value arrays of different
//! lengths) is truncated and carries a non-fatal `Malformed` warning.

use crate::error::{ErrorKind, Result};
use crate::metrics::compute_error_percent;
use crate::schema::{Point, TimeSeries, TrackerRow};
use chrono::{DateTime, SecondsFormat};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// The dated-series payload layouts the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesShape {
    /// `{ "dates": [...], "values": [...] }`: forecasts and past trends.
    DatesValues,
    /// `{ "timestamps": [...], "prices": [...] }`: the realtime feed.
    TimestampsPrices,
}

/// A normalized value plus anything suspicious found on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub value: T,
    pub warnings: Vec<ErrorKind>,
}

impl<T> Normalized<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Normalized<U> {
        Normalized {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Emit every warning through `tracing` and keep only the value.
    pub fn into_logged(self, context: &str) -> T {
        for warning in &self.warnings {
            warn!("{context}: {warning}");
        }
        self.value
    }
}

// -------------------------------------------------------------------------------------------------
// raw wire schemas

/// A label entry: either text already, or epoch seconds.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub(crate) enum Stamp {
    Text(String),
    Epoch(i64),
}

impl Stamp {
    pub(crate) fn into_text(self) -> Result<String> {
        match self {
            Stamp::Text(text) => Ok(text),
            Stamp::Epoch(secs) => DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
                .ok_or_else(|| ErrorKind::malformed(format!("timestamp {secs} out of range"))),
        }
    }
}

#[derive(Deserialize, Debug)]
struct DatesValues {
    dates: Vec<Stamp>,
    values: Vec<Option<f64>>,
}

#[derive(Deserialize, Debug)]
struct TimestampsPrices {
    timestamps: Vec<Stamp>,
    prices: Vec<Option<f64>>,
}

// `null` is a pending value, a missing key is still malformed
#[derive(Deserialize, Debug)]
struct RawTrackerRow {
    date: Stamp,
    #[serde(deserialize_with = "Option::deserialize")]
    predicted: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    actual: Option<f64>,
    #[serde(default)]
    error: Option<f64>,
}

// -------------------------------------------------------------------------------------------------

/// Normalize a single `shape` payload into a series called `label`.
pub fn normalize_series(label: &str, raw: &Value, shape: SeriesShape) -> Result<Normalized<TimeSeries>> {
    decode_series(label, raw, shape).map(|(series, _)| series)
}

/// [`normalize_series()`], also telling whether points were cut.
pub(crate) fn decode_series(
    label: &str,
    raw: &Value,
    shape: SeriesShape,
) -> Result<(Normalized<TimeSeries>, bool)> {
    let (stamps, values) = match shape {
        SeriesShape::DatesValues => {
            let de = DatesValues::deserialize(raw)
                .map_err(|e| ErrorKind::malformed(format!("`{label}`: {e}")))?;
            (de.dates, de.values)
        }
        SeriesShape::TimestampsPrices => {
            let de = TimestampsPrices::deserialize(raw)
                .map_err(|e| ErrorKind::malformed(format!("`{label}`: {e}")))?;
            (de.timestamps, de.prices)
        }
    };
    zip_points(label, stamps, values)
}

/// Normalize a `{ label: shape, ... }` object into one series per key, in key order.
pub fn normalize_series_map(raw: &Value, shape: SeriesShape) -> Result<Normalized<Vec<TimeSeries>>> {
    let map = raw
        .as_object()
        .ok_or_else(|| ErrorKind::malformed(format!("expected an object of series, got {}", kind_of(raw))))?;

    let mut labels: Vec<&String> = map.keys().collect();
    labels.sort();

    let mut out = Normalized::clean(Vec::with_capacity(labels.len()));
    for label in labels {
        let series = normalize_series(label, &map[label.as_str()], shape)?;
        out.warnings.extend(series.warnings);
        out.value.push(series.value);
    }
    debug!("normalized {} series", out.value.len());
    Ok(out)
}

/// Pair labels with values, truncating to the shorter of the two. The flag is
/// set when anything was dropped.
pub(crate) fn zip_points(
    label: &str,
    stamps: Vec<Stamp>,
    values: Vec<Option<f64>>,
) -> Result<(Normalized<TimeSeries>, bool)> {
    let mut warnings = Vec::new();
    let truncated = stamps.len() != values.len();
    if truncated {
        let kept = stamps.len().min(values.len());
        warnings.push(ErrorKind::malformed(format!(
            "`{label}` has {} labels but {} values; truncated to {kept}",
            stamps.len(),
            values.len()
        )));
    }

    let points = stamps
        .into_iter()
        .zip(values)
        .map(|(stamp, value)| Ok(Point::new(stamp.into_text()?, value)))
        .collect::<Result<Vec<_>>>()?;

    let series = Normalized {
        value: TimeSeries::new(label, points),
        warnings,
    };
    Ok((series, truncated))
}

/// Normalize `/tracker/get` rows, deriving each `error_percent` locally.
pub fn normalize_tracker(raw: &Value) -> Result<Normalized<Vec<TrackerRow>>> {
    let rows = raw
        .as_array()
        .ok_or_else(|| ErrorKind::malformed(format!("expected an array of tracker rows, got {}", kind_of(raw))))?;

    let mut out = Normalized::clean(Vec::with_capacity(rows.len()));
    for (idx, row) in rows.iter().enumerate() {
        let de = RawTrackerRow::deserialize(row)
            .map_err(|e| ErrorKind::malformed(format!("tracker row {idx}: {e}")))?;
        let error_percent = match (de.predicted, de.actual) {
            (Some(predicted), Some(actual)) => compute_error_percent(predicted, actual),
            _ => None,
        };

        if let (Some(reported), Some(derived)) = (de.error, error_percent) {
            if (reported.abs() - derived.abs()).abs() > 0.01 {
                out.warnings.push(ErrorKind::malformed(format!(
                    "tracker row {idx} reports {reported}% error, derived {derived}%"
                )));
            }
        }

        out.value.push(TrackerRow {
            date: de.date.into_text()?,
            predicted: de.predicted,
            actual: de.actual,
            error_percent,
            reported_error: de.error,
        });
    }
    Ok(out)
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn equal_lengths_keep_every_point_in_order() {
        let raw = json!({
            "dates": ["2024-01-01", "2024-01-02", "2024-01-03"],
            "values": [1.5, 2.5, 3.5],
        });
        let out = normalize_series("lstm", &raw, SeriesShape::DatesValues).unwrap();

        assert!(out.is_clean());
        assert_eq!(out.value.label, "lstm");
        assert_eq!(
            out.value.timestamps().collect::<Vec<_>>(),
            vec!["2024-01-01", "2024-01-02", "2024-01-03"]
        );
        assert_eq!(
            out.value.values().collect::<Vec<_>>(),
            vec![Some(1.5), Some(2.5), Some(3.5)]
        );
    }

    #[test]
    fn mismatched_lengths_truncate_with_warning() {
        let raw = json!({ "dates": ["a", "b", "c", "d"], "values": [1.0, 2.0] });
        let out = normalize_series("arima", &raw, SeriesShape::DatesValues).unwrap();
        assert_eq!(out.value.len(), 2);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind(), ErrorClass::Malformed);

        let raw = json!({ "dates": ["a"], "values": [1.0, 2.0, 3.0] });
        let out = normalize_series("arima", &raw, SeriesShape::DatesValues).unwrap();
        assert_eq!(out.value.len(), 1);
        assert!(!out.is_clean());
    }

    #[test]
    fn nulls_are_kept_as_gaps() {
        let raw = json!({ "timestamps": ["t1", "t2", "t3"], "prices": [10.0, null, 12.0] });
        let out = normalize_series("AAPL", &raw, SeriesShape::TimestampsPrices).unwrap();
        assert_eq!(
            out.value.values().collect::<Vec<_>>(),
            vec![Some(10.0), None, Some(12.0)]
        );
    }

    #[test]
    fn epoch_timestamps_become_rfc3339() {
        let raw = json!({ "timestamps": [1_700_000_000], "prices": [1.0] });
        let out = normalize_series("AAPL", &raw, SeriesShape::TimestampsPrices).unwrap();
        assert_eq!(out.value.points[0].timestamp, "2023-11-14T22:13:20Z");
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let missing = json!({ "dates": ["a"] });
        let typed = json!({ "dates": ["a"], "values": ["1.0"] });
        let other = json!({ "dates": ["a"], "values": [1.0] });

        for raw in [&missing, &typed] {
            let err = normalize_series("x", raw, SeriesShape::DatesValues).unwrap_err();
            assert_eq!(err.kind(), ErrorClass::Malformed);
        }
        assert!(normalize_series("x", &other, SeriesShape::TimestampsPrices).is_err());
    }

    #[test]
    fn empty_arrays_are_an_empty_series_not_an_error() {
        let raw = json!({ "dates": [], "values": [] });
        let out = normalize_series("x", &raw, SeriesShape::DatesValues).unwrap();
        assert!(out.value.is_empty());
        assert!(out.is_clean());
    }

    #[test]
    fn series_map_is_sorted_by_label() {
        let raw = json!({
            "TSLA": { "timestamps": ["t1"], "prices": [200.0] },
            "AAPL": { "timestamps": ["t1", "t2"], "prices": [190.0] },
        });
        let out = normalize_series_map(&raw, SeriesShape::TimestampsPrices).unwrap();
        let labels: Vec<_> = out.value.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["AAPL", "TSLA"]);
        assert_eq!(out.warnings.len(), 1);

        assert!(normalize_series_map(&json!([]), SeriesShape::TimestampsPrices).is_err());
    }

    #[test]
    fn tracker_rows_derive_error_percent() {
        let raw = json!([
            { "date": "2024-01-01", "predicted": 100.0, "actual": 110.0, "error": -9.09 },
            { "date": "2024-01-02", "predicted": 100.0, "actual": 0.0, "error": 0.0 },
        ]);
        let out = normalize_tracker(&raw).unwrap();
        assert!(out.is_clean());
        assert_eq!(out.value[0].error_percent, Some(-9.09));
        assert_eq!(out.value[0].reported_error, Some(-9.09));
        assert_eq!(out.value[1].error_percent, None);
    }

    #[test]
    fn tracker_flags_disagreeing_backend_error() {
        let raw = json!([{ "date": "d", "predicted": 50.0, "actual": 100.0, "error": 12.0 }]);
        let out = normalize_tracker(&raw).unwrap();
        assert_eq!(out.value[0].error_percent, Some(-50.0));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn pending_tracker_rows_are_kept() {
        let raw = json!([
            { "date": "2024-01-01", "predicted": 100.0, "actual": 110.0, "error": -9.09 },
            { "date": "2024-01-02", "predicted": 104.2, "actual": null, "error": null },
        ]);
        let out = normalize_tracker(&raw).unwrap();

        assert!(out.is_clean());
        assert_eq!(out.value.len(), 2);
        assert_eq!(out.value[0].error_percent, Some(-9.09));
        assert!(out.value[1].is_pending());
        assert_eq!(out.value[1].predicted, Some(104.2));
        assert_eq!(out.value[1].error_percent, None);
    }

    #[test]
    fn tracker_rejects_bad_rows() {
        assert!(normalize_tracker(&json!({ "rows": [] })).is_err());
        assert!(normalize_tracker(&json!([{ "date": "d", "predicted": 1.0 }])).is_err());
        assert!(normalize_tracker(&json!([{ "date": "d", "predicted": "1", "actual": 1.0 }])).is_err());
        assert!(normalize_tracker(&json!([])).unwrap().value.is_empty());
    }
}
