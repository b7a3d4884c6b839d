use crate::aggregate::{aggregate_map, aggregate_parallel};
use crate::config::TransportConfig;
use crate::error::{ConfigError, ErrorKind, Result};
use crate::metrics::classify_risk;
use crate::normalize::{normalize_series_map, normalize_tracker, SeriesShape};
use crate::poller::PollSession;
use crate::schema::{EventImpact, ModelComparison, RiskAssessment, TimeSeries, TrackerRow};
use crate::settings::Settings;
use crate::transport::{HttpTransport, Transport};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Backend routes, relative to the transport's base url.
pub mod endpoints {
    pub const PREDICT: &str = "/predict";
    pub const COMPARE: &str = "/predict/compare";
    pub const PAST_TRENDS: &str = "/predict/past-trends";
    pub const REALTIME: &str = "/realtime/get";
    pub const RISK: &str = "/risk/predict";
    pub const EVENTS: &str = "/event-impact/latest";
    pub const NARRATIVE: &str = "/narrative/predict";
    pub const TRACKER: &str = "/tracker/get";
}

/// The one entry point views use to reach the analytics backend.
///
/// Every operation returns `Result<_, ErrorKind>`: an empty `Ok` value means
/// the backend genuinely had nothing, an `Err` means the request or its
/// payload failed. The facade keeps no state beyond the shared transport and a
/// copy of the user's settings.
#[derive(Clone)]
pub struct Dashboard {
    transport: Arc<dyn Transport>,
    settings: Settings,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            settings: Settings::default(),
        }
    }

    /// A dashboard over HTTP, configured by `config`.
    pub fn connect(config: &TransportConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings.sanitized();
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// `POST /predict`: every model's forecast for `symbol`.
    pub async fn get_prediction(&self, symbol: &str) -> Result<ModelComparison> {
        let symbol = clean_symbol(symbol)?;
        let raw = self
            .transport
            .post(endpoints::PREDICT, json!({ "symbol": symbol }))
            .await?;
        Ok(aggregate_map(&symbol, &raw)?.into_logged(endpoints::PREDICT))
    }

    /// `POST /predict/compare`: the four models side by side on one date axis.
    pub async fn compare_models(&self, symbol: &str) -> Result<ModelComparison> {
        let symbol = clean_symbol(symbol)?;
        let raw = self
            .transport
            .post(endpoints::COMPARE, json!({ "symbol": symbol }))
            .await?;
        Ok(aggregate_parallel(&symbol, &raw)?.into_logged(endpoints::COMPARE))
    }

    /// `GET /predict/past-trends`: one series per model, sorted by name.
    pub async fn get_past_trends(&self) -> Result<Vec<TimeSeries>> {
        let raw = self.transport.get(endpoints::PAST_TRENDS).await?;
        Ok(normalize_series_map(&raw, SeriesShape::DatesValues)?.into_logged(endpoints::PAST_TRENDS))
    }

    /// `GET /realtime/get`: one series per symbol, sorted by symbol.
    pub async fn get_realtime(&self) -> Result<Vec<TimeSeries>> {
        fetch_realtime(self.transport.as_ref()).await
    }

    /// An idle poll session over the realtime feed, at the settings' refresh interval.
    pub fn poll_realtime(&self) -> PollSession<Vec<TimeSeries>> {
        self.poll_realtime_every(self.settings.refresh_interval())
    }

    pub fn poll_realtime_every(&self, interval: Duration) -> PollSession<Vec<TimeSeries>> {
        let transport = self.transport.clone();
        PollSession::from_fn(
            move || {
                let transport = transport.clone();
                async move { fetch_realtime(transport.as_ref()).await }
            },
            interval,
        )
    }

    /// `POST /risk/predict`: score and bucket for `symbol`.
    pub async fn get_risk_score(&self, symbol: &str) -> Result<RiskAssessment> {
        #[derive(Deserialize)]
        struct RiskResponse {
            score: f64,
        }

        let symbol = clean_symbol(symbol)?;
        let raw = self
            .transport
            .post(endpoints::RISK, json!({ "symbol": symbol }))
            .await?;
        let RiskResponse { score } = decode(endpoints::RISK, raw)?;

        if !(0.0..=100.0).contains(&score) {
            return Err(ErrorKind::malformed(format!(
                "risk score {score} is outside 0..=100"
            )));
        }

        let bucket = classify_risk(score);
        debug!("[{symbol}] risk {score} => {bucket}");
        Ok(RiskAssessment {
            symbol,
            score,
            bucket,
        })
    }

    /// `GET /event-impact/latest`.
    pub async fn get_event_impacts(&self) -> Result<Vec<EventImpact>> {
        #[derive(Deserialize)]
        struct EventsResponse {
            events: Vec<EventImpact>,
        }

        let raw = self.transport.get(endpoints::EVENTS).await?;
        let EventsResponse { events } = decode(endpoints::EVENTS, raw)?;
        Ok(events)
    }

    /// `POST /narrative/predict`: a prose explanation for `symbol`.
    pub async fn get_narrative(&self, symbol: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct NarrativeResponse {
            narrative: String,
        }

        let symbol = clean_symbol(symbol)?;
        let raw = self
            .transport
            .post(endpoints::NARRATIVE, json!({ "symbol": symbol }))
            .await?;
        let NarrativeResponse { narrative } = decode(endpoints::NARRATIVE, raw)?;
        Ok(narrative)
    }

    /// `GET /tracker/get`: prediction vs reality, with locally derived error.
    pub async fn get_tracker(&self) -> Result<Vec<TrackerRow>> {
        let raw = self.transport.get(endpoints::TRACKER).await?;
        Ok(normalize_tracker(&raw)?.into_logged(endpoints::TRACKER))
    }
}

async fn fetch_realtime(transport: &dyn Transport) -> Result<Vec<TimeSeries>> {
    let raw = transport.get(endpoints::REALTIME).await?;
    let series = normalize_series_map(&raw, SeriesShape::TimestampsPrices)?;
    trace!("realtime returned {} symbols", series.value.len());
    Ok(series.into_logged(endpoints::REALTIME))
}

fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, raw: Value) -> Result<T> {
    serde_json::from_value(raw).map_err(|e| ErrorKind::malformed(format!("{endpoint}: {e}")))
}

// tickers are sent upper-case; a blank one is never sent at all
fn clean_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ErrorKind::malformed("symbol must not be empty"));
    }
    Ok(symbol.to_uppercase())
}
