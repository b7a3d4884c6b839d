//! Merge per-model forecasts into one [`ModelComparison`].
//!
//! Series of different lengths are cut to the shortest non-empty one and the
//! comparison is marked `partial`. Keys that are not a known [`ModelName`] are
//! skipped so a backend that grows a new model does not break older clients.

use crate::error::{ErrorKind, Result};
use crate::normalize::{decode_series, kind_of, zip_points, Normalized, SeriesShape, Stamp};
use crate::schema::{ModelComparison, ModelName, TimeSeries};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

const DATES_KEY: &str = "dates";

/// `/predict/compare`: `{ "dates": [...], "lstm": [...], "arima": [...], ... }`.
pub fn aggregate_parallel(symbol: &str, raw: &Value) -> Result<Normalized<ModelComparison>> {
    let object = raw.as_object().ok_or_else(|| {
        ErrorKind::malformed(format!("expected a comparison object, got {}", kind_of(raw)))
    })?;

    let dates = object
        .get(DATES_KEY)
        .ok_or_else(|| ErrorKind::malformed("comparison is missing `dates`"))?;
    let dates = Vec::<Stamp>::deserialize(dates)
        .map_err(|e| ErrorKind::malformed(format!("`dates`: {e}")))?;

    let mut warnings = Vec::new();
    let mut series = BTreeMap::new();
    let mut truncated = false;
    for (key, values) in object.iter().filter(|(key, _)| key.as_str() != DATES_KEY) {
        let Some(model) = known_model(key) else {
            continue;
        };
        let values = Vec::<Option<f64>>::deserialize(values)
            .map_err(|e| ErrorKind::malformed(format!("`{key}`: {e}")))?;
        let (normalized, cut) = zip_points(model.as_str(), dates.clone(), values)?;
        truncated |= cut;
        warnings.extend(normalized.warnings);
        insert_model(&mut series, model, normalized.value, &mut warnings);
    }

    Ok(align(symbol, series, warnings, truncated))
}

/// `/predict`: `{ "LSTM": { "dates": [...], "values": [...] }, ... }`.
pub fn aggregate_map(symbol: &str, raw: &Value) -> Result<Normalized<ModelComparison>> {
    let object = raw.as_object().ok_or_else(|| {
        ErrorKind::malformed(format!("expected an object of model forecasts, got {}", kind_of(raw)))
    })?;

    let mut warnings = Vec::new();
    let mut series = BTreeMap::new();
    let mut truncated = false;
    for (key, payload) in object {
        let Some(model) = known_model(key) else {
            continue;
        };
        let (normalized, cut) = decode_series(model.as_str(), payload, SeriesShape::DatesValues)?;
        truncated |= cut;
        warnings.extend(normalized.warnings);
        insert_model(&mut series, model, normalized.value, &mut warnings);
    }

    Ok(align(symbol, series, warnings, truncated))
}

fn known_model(key: &str) -> Option<ModelName> {
    match key.parse::<ModelName>() {
        Ok(model) => Some(model),
        Err(e) => {
            debug!("ignoring {e}");
            None
        }
    }
}

fn insert_model(
    series: &mut BTreeMap<ModelName, TimeSeries>,
    model: ModelName,
    value: TimeSeries,
    warnings: &mut Vec<ErrorKind>,
) {
    if series.insert(model, value).is_some() {
        warnings.push(ErrorKind::malformed(format!(
            "model `{model}` appears more than once; keeping the last"
        )));
    }
}

/// Cut every non-empty series to the shortest non-empty length. `partial`
/// starts from `truncated`: a label/value mismatch inside one model already
/// cut that series.
fn align(
    symbol: &str,
    mut series: BTreeMap<ModelName, TimeSeries>,
    mut warnings: Vec<ErrorKind>,
    truncated: bool,
) -> Normalized<ModelComparison> {
    let mut partial = truncated;

    let shortest = series
        .values()
        .filter(|s| !s.is_empty())
        .map(TimeSeries::len)
        .min();

    if let Some(shortest) = shortest {
        for (model, s) in series.iter_mut() {
            if s.len() > shortest {
                warnings.push(ErrorKind::malformed(format!(
                    "`{model}` has {} points, others {shortest}; truncated",
                    s.len()
                )));
                s.truncate(shortest);
                partial = true;
            }
        }
    }

    debug!(
        "[{symbol}] aggregated {} models{}",
        series.len(),
        if partial { " (partial)" } else { "" }
    );

    Normalized {
        value: ModelComparison {
            symbol: symbol.to_string(),
            series,
            partial,
        },
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dates(n: usize) -> Vec<String> {
        (1..=n).map(|d| format!("2024-01-{d:02}")).collect()
    }

    fn values(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn uneven_models_are_truncated_and_partial() {
        let raw = json!({
            "dates": dates(10),
            "lstm": values(10),
            "arima": values(8),
            "sarima": values(10),
            "lightgbm": values(10),
        });
        let out = aggregate_parallel("AAPL", &raw).unwrap();

        assert!(out.value.partial);
        assert_eq!(out.value.series.len(), 4);
        for series in out.value.series.values() {
            assert_eq!(series.len(), 8);
        }
        let lstm = out.value.get(ModelName::Lstm).unwrap();
        assert_eq!(lstm.points[7].timestamp, "2024-01-08");
    }

    #[test]
    fn even_models_are_complete() {
        let raw = json!({
            "dates": dates(3),
            "lstm": values(3),
            "arima": values(3),
        });
        let out = aggregate_parallel("TSLA", &raw).unwrap();
        assert!(!out.value.partial);
        assert!(out.is_clean());
        assert_eq!(out.value.symbol, "TSLA");
        assert_eq!(
            out.value.models().collect::<Vec<_>>(),
            vec![ModelName::Lstm, ModelName::Arima]
        );
    }

    #[test]
    fn unknown_models_are_ignored() {
        let raw = json!({
            "dates": dates(2),
            "lstm": values(2),
            "prophet": values(5),
            "meta": { "version": 3 },
        });
        let out = aggregate_parallel("AAPL", &raw).unwrap();
        assert_eq!(out.value.series.len(), 1);
        assert!(!out.value.partial);
    }

    #[test]
    fn empty_models_do_not_drag_the_others_down() {
        let raw = json!({ "dates": dates(4), "lstm": values(4), "arima": [] });
        let out = aggregate_parallel("AAPL", &raw).unwrap();
        assert_eq!(out.value.get(ModelName::Lstm).unwrap().len(), 4);
        assert!(out.value.get(ModelName::Arima).unwrap().is_empty());
    }

    #[test]
    fn missing_dates_is_malformed() {
        let err = aggregate_parallel("AAPL", &json!({ "lstm": [1.0] })).unwrap_err();
        assert_eq!(err.kind(), ErrorClass::Malformed);

        let err = aggregate_parallel("AAPL", &json!({ "dates": [], "lstm": "n/a" })).unwrap_err();
        assert_eq!(err.kind(), ErrorClass::Malformed);
    }

    #[test]
    fn duplicate_model_keys_warn_without_partial() {
        let raw = json!({
            "LSTM": { "dates": dates(2), "values": values(2) },
            "lstm": { "dates": dates(2), "values": values(2) },
        });
        let out = aggregate_map("AAPL", &raw).unwrap();

        assert!(!out.value.partial);
        assert_eq!(out.value.series.len(), 1);
        assert_eq!(out.value.get(ModelName::Lstm).unwrap().len(), 2);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn mismatch_inside_one_model_is_partial() {
        let raw = json!({ "dates": dates(3), "lstm": values(2) });
        let out = aggregate_parallel("AAPL", &raw).unwrap();
        assert!(out.value.partial);
        assert_eq!(out.value.get(ModelName::Lstm).unwrap().len(), 2);
    }

    #[test]
    fn map_shape_accepts_backend_spelling() {
        let raw = json!({
            "LSTM": { "dates": dates(5), "values": values(5) },
            "LightGBM": { "dates": dates(3), "values": values(3) },
            "Ensemble": { "dates": dates(9), "values": values(9) },
        });
        let out = aggregate_map("NVDA", &raw).unwrap();
        assert!(out.value.partial);
        assert_eq!(out.value.series.len(), 2);
        assert_eq!(out.value.get(ModelName::Lstm).unwrap().len(), 3);
        assert_eq!(out.value.get(ModelName::Lightgbm).unwrap().label, "lightgbm");
    }
}
