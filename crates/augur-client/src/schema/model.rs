use super::series::TimeSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The forecasting models the backend is known to serve.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    Lstm,
    Arima,
    Sarima,
    Lightgbm,
}

impl ModelName {
    pub const ALL: [ModelName; 4] = [
        ModelName::Lstm,
        ModelName::Arima,
        ModelName::Sarima,
        ModelName::Lightgbm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Lstm => "lstm",
            ModelName::Arima => "arima",
            ModelName::Sarima => "sarima",
            ModelName::Lightgbm => "lightgbm",
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModel(pub String);

impl fmt::Display for UnknownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model `{}`", self.0)
    }
}

impl std::error::Error for UnknownModel {}

/// Case-insensitive: the backend answers with `LSTM`, `LightGBM`, ... on some routes.
impl FromStr for ModelName {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelName::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}

/// Several model forecasts for one symbol on one date axis.
///
/// Every non-empty member shares the same length; `partial` is set when the
/// backend's series disagreed and were cut down to the shortest one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ModelComparison {
    pub symbol: String,
    pub series: BTreeMap<ModelName, TimeSeries>,
    pub partial: bool,
}

impl ModelComparison {
    pub fn get(&self, model: ModelName) -> Option<&TimeSeries> {
        self.series.get(&model)
    }

    pub fn models(&self) -> impl Iterator<Item = ModelName> + '_ {
        self.series.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(TimeSeries::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_spellings() {
        assert_eq!("LSTM".parse::<ModelName>(), Ok(ModelName::Lstm));
        assert_eq!("LightGBM".parse::<ModelName>(), Ok(ModelName::Lightgbm));
        assert_eq!(" sarima ".parse::<ModelName>(), Ok(ModelName::Sarima));
        assert!("prophet".parse::<ModelName>().is_err());
    }

    #[test]
    fn serializes_lowercase_keys() {
        let mut comparison = ModelComparison {
            symbol: "AAPL".into(),
            ..Default::default()
        };
        comparison
            .series
            .insert(ModelName::Lightgbm, TimeSeries::empty("lightgbm"));
        let json = serde_json::to_value(&comparison).unwrap();
        assert!(json["series"].get("lightgbm").is_some());
        assert!(comparison.is_empty());
    }
}
