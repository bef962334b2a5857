//! Air-pollution provider access.
//!
//! [`PollutionProvider`] is the seam to the upstream HTTP service and returns
//! the raw provider JSON; [`OpenWeatherProvider`] implements it against the
//! OpenWeather air pollution API. [`PollutionClient`] layers the current and
//! history operations on top, normalizing each payload.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::normalize::{normalize, result_list};
use crate::{AqiError, Coordinate, HistoryPoint, PollutantReading};

// ---

/// Seconds in the window requested for each history day.
pub const HISTORY_WINDOW_SECS: i64 = 3600;

/// A `[start, end)` range of UNIX timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    /// The first hour of `date` in UTC.
    pub fn first_hour_of(date: NaiveDate) -> Self {
        // ---
        let start = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        Self {
            start,
            end: start + HISTORY_WINDOW_SECS,
        }
    }
}

/// Upstream source of raw air-pollution payloads.
#[async_trait]
pub trait PollutionProvider: Send + Sync {
    /// Current conditions when `window` is `None`, historical otherwise.
    async fn pollution(&self, coord: Coordinate, window: Option<TimeWindow>)
        -> Result<Value, AqiError>;
}

/// OpenWeather air pollution API.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherProvider {
    // ---
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl PollutionProvider for OpenWeatherProvider {
    async fn pollution(
        &self,
        coord: Coordinate,
        window: Option<TimeWindow>,
    ) -> Result<Value, AqiError> {
        // ---
        let lat = coord.latitude().to_string();
        let lon = coord.longitude().to_string();
        let mut query = vec![
            ("lat", lat),
            ("lon", lon),
            ("appid", self.api_key.clone()),
        ];

        let url = match window {
            Some(w) => {
                query.push(("start", w.start.to_string()));
                query.push(("end", w.end.to_string()));
                format!("{}/air_pollution/history", self.base_url)
            }
            None => format!("{}/air_pollution", self.base_url),
        };

        debug!("Fetching air pollution from {} window={:?}", url, window);

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AqiError::upstream(format!("Failed to fetch AQI data: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| AqiError::upstream(format!("Failed to read AQI response body: {e}")))?;

        if !status.is_success() {
            return Err(AqiError::upstream(format!(
                "AQI provider returned status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| AqiError::malformed(format!("AQI provider returned invalid JSON: {e}")))
    }
}

/// Current and historical readings for a coordinate.
#[derive(Clone)]
pub struct PollutionClient {
    provider: Arc<dyn PollutionProvider>,
}

impl PollutionClient {
    // ---
    pub fn new(provider: Arc<dyn PollutionProvider>) -> Self {
        Self { provider }
    }

    /// Latest reading. Any failure fails the whole call.
    pub async fn current(&self, coord: Coordinate) -> Result<PollutantReading, AqiError> {
        // ---
        let raw = self.provider.pollution(coord, None).await?;
        if result_list(&raw).is_none() {
            return Err(AqiError::NoData);
        }
        normalize(&raw)
    }

    /// Up to `days` daily samples ending yesterday (UTC), oldest first.
    pub async fn history(&self, coord: Coordinate, days: u32) -> Vec<HistoryPoint> {
        self.history_at(coord, days, Utc::now().date_naive()).await
    }

    /// [`history`](Self::history) relative to an explicit `today`.
    ///
    /// Each day is a single sample from the first UTC hour of that day, not
    /// a daily average. Days whose fetch fails or carries no AQI are logged
    /// and left out.
    pub async fn history_at(
        &self,
        coord: Coordinate,
        days: u32,
        today: NaiveDate,
    ) -> Vec<HistoryPoint> {
        // ---
        let mut points = Vec::with_capacity(days as usize);

        for offset in 1..=i64::from(days) {
            let date = today - Duration::days(offset);
            let window = TimeWindow::first_hour_of(date);

            let reading = self
                .provider
                .pollution(coord, Some(window))
                .await
                .and_then(|raw| normalize(&raw));

            match reading {
                Ok(PollutantReading { aqi: Some(aqi), .. }) => {
                    points.push(HistoryPoint { date, aqi });
                }
                Ok(_) => {
                    warn!("History entry for {} has no AQI value, skipping", date);
                }
                Err(e) => {
                    warn!("History fetch failed for {}: {}", date, e);
                }
            }
        }

        points.sort_by_key(|p| p.date);
        info!(
            "Collected {} of {} history points for ({}, {})",
            points.len(),
            days,
            coord.latitude(),
            coord.longitude()
        );
        points
    }
}

fn truncate_body(body: &str) -> String {
    // ---
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned provider keyed by window start; `None` key is the current call.
    struct FakeProvider {
        responses: HashMap<Option<i64>, Result<Value, AqiError>>,
        calls: Mutex<Vec<Option<TimeWindow>>>,
    }

    impl FakeProvider {
        fn new(responses: HashMap<Option<i64>, Result<Value, AqiError>>) -> Self {
            Self {
                responses,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PollutionProvider for FakeProvider {
        async fn pollution(
            &self,
            _coord: Coordinate,
            window: Option<TimeWindow>,
        ) -> Result<Value, AqiError> {
            self.calls.lock().unwrap().push(window);
            self.responses
                .get(&window.map(|w| w.start))
                .cloned()
                .unwrap_or_else(|| Err(AqiError::upstream("connection refused")))
        }
    }

    fn delhi() -> Coordinate {
        Coordinate::new(28.6139, 77.2090).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn reading(aqi: i64) -> Value {
        json!({"list": [{"main": {"aqi": aqi}, "components": {"pm2_5": 10.0}}]})
    }

    #[test]
    fn test_first_hour_window() {
        // ---
        let w = TimeWindow::first_hour_of(day(26));
        assert_eq!(w.start, 1_742_947_200);
        assert_eq!(w.end - w.start, 3600);
    }

    #[test]
    fn test_current_ok() {
        // ---
        let provider = FakeProvider::new(HashMap::from([(None, Ok(reading(3)))]));
        let client = PollutionClient::new(Arc::new(provider));

        let r = tokio_test::block_on(client.current(delhi())).unwrap();
        assert_eq!(r.aqi.map(|a| a.index()), Some(3));
        assert_eq!(r.components["pm2_5"], 10.0);
    }

    #[test]
    fn test_current_empty_list_is_no_data() {
        // ---
        let provider = FakeProvider::new(HashMap::from([(None, Ok(json!({"list": []})))]));
        let client = PollutionClient::new(Arc::new(provider));

        let err = tokio_test::block_on(client.current(delhi())).unwrap_err();
        assert_eq!(err, AqiError::NoData);
    }

    #[test]
    fn test_current_upstream_failure_propagates() {
        // ---
        let provider = FakeProvider::new(HashMap::new());
        let client = PollutionClient::new(Arc::new(provider));

        let err = tokio_test::block_on(client.current(delhi())).unwrap_err();
        assert!(matches!(err, AqiError::Upstream(_)));
    }

    #[test]
    fn test_history_all_failing_is_empty() {
        // ---
        let provider = Arc::new(FakeProvider::new(HashMap::new()));
        let client = PollutionClient::new(provider.clone());

        let points = tokio_test::block_on(client.history_at(delhi(), 7, day(27)));
        assert!(points.is_empty());
        assert_eq!(provider.calls.lock().unwrap().len(), 7);
    }

    #[test]
    fn test_history_sorted_and_skips_failures() {
        // ---
        let start = |d| TimeWindow::first_hour_of(day(d)).start;
        let responses = HashMap::from([
            (Some(start(26)), Ok(reading(2))),
            (Some(start(25)), Err(AqiError::upstream("timeout"))),
            (Some(start(24)), Ok(json!({"list": []}))),
            (Some(start(23)), Ok(reading(4))),
            (Some(start(22)), Ok(json!({"list": [{"components": {}}]}))),
            (Some(start(21)), Ok(reading(1))),
            (Some(start(20)), Ok(reading(5))),
        ]);
        let client = PollutionClient::new(Arc::new(FakeProvider::new(responses)));

        let points = tokio_test::block_on(client.history_at(delhi(), 7, day(27)));
        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        let aqis: Vec<_> = points.iter().map(|p| p.aqi.index()).collect();

        assert_eq!(dates, vec![day(20), day(21), day(23), day(26)]);
        assert_eq!(aqis, vec![5, 1, 4, 2]);
    }

    #[test]
    fn test_history_requests_one_hour_per_day() {
        // ---
        let provider = Arc::new(FakeProvider::new(HashMap::new()));
        let client = PollutionClient::new(provider.clone());
        tokio_test::block_on(client.history_at(delhi(), 3, day(27)));

        let calls = provider.calls.lock().unwrap();
        let expected: Vec<_> = [26, 25, 24]
            .into_iter()
            .map(|d| Some(TimeWindow::first_hour_of(day(d))))
            .collect();
        assert_eq!(*calls, expected);
    }

    #[test]
    fn test_truncate_body() {
        // ---
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(250);
        assert_eq!(truncate_body(&long).len(), 203);
    }
}
