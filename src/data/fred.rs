//! FRED API integration for monthly macro series (e.g. `UNRATE`).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{Frequency, Record, TimeSeries};
use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 100_000;

/// Civilian unemployment rate, monthly, first-of-month dates.
pub const SERIES_UNRATE: &str = "UNRATE";

/// Column name the unemployment series carries in merged tables.
pub const FIELD_UNEMPLOYMENT: &str = "unemployment_rate";

pub struct FredClient {
    client: Client,
    api_key: String,
}

impl FredClient {
    /// Build a client with an explicit API key.
    ///
    /// Loading the key (env, `.env`, flags) is the caller's job; see
    /// `config::Credentials`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Fetch `series_id` over `[start, end]` as a one-field monthly series.
    ///
    /// FRED's "." placeholder values are left out (missing), not errors.
    pub fn fetch_series(
        &self,
        series_id: &str,
        field: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries<NaiveDateTime>, AppError> {
        info!(series_id, %start, %end, "fetching FRED series");

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("series_id", series_id),
                ("api_key", &self.api_key),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("limit", &OBS_LIMIT.to_string()),
                ("observation_start", &start.to_string()),
                ("observation_end", &end.to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("FRED request failed: {}", e.without_url())))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("FRED request for {series_id} failed with status {}.", resp.status()),
            ));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse FRED response: {e}")))?;

        let series = observations_to_series(series_id, field, body.observations)?;
        debug!(series_id, rows = series.len(), "FRED series parsed");
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

fn observations_to_series(
    series_id: &str,
    field: &str,
    observations: Vec<Observation>,
) -> Result<TimeSeries<NaiveDateTime>, AppError> {
    let mut series = TimeSeries::new(series_id, Frequency::Monthly, [field]);
    for obs in observations {
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| AppError::new(4, format!("Invalid FRED date '{}': {e}", obs.date)))?;
        let mut record = Record::new();
        if let Some(v) = parse_value(&obs.value) {
            record.insert(field.to_string(), v);
        }
        series
            .insert(date.and_time(NaiveTime::MIN), record)
            .map_err(|e| AppError::new(4, e.to_string()))?;
    }
    Ok(series)
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<TimeSeries<NaiveDateTime>, AppError> {
        let body: ObservationsResponse = serde_json::from_str(json).unwrap();
        observations_to_series(SERIES_UNRATE, FIELD_UNEMPLOYMENT, body.observations)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn observations_become_first_of_month_rows() {
        let series = parse(
            r#"{"observations":[
                {"realtime_start":"2024-07-01","date":"2024-04-01","value":"3.9"},
                {"realtime_start":"2024-07-01","date":"2024-05-01","value":"4.0"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(series.name(), "UNRATE");
        assert_eq!(series.frequency(), Frequency::Monthly);
        assert_eq!(series.len(), 2);
        assert_eq!(series.value(&day(2024, 5, 1), "unemployment_rate"), Some(4.0));
    }

    #[test]
    fn dot_placeholder_is_a_missing_value() {
        let series = parse(r#"{"observations":[{"date":"2020-10-01","value":"."}]}"#).unwrap();
        assert_eq!(series.len(), 1);
        assert!(series.get(&day(2020, 10, 1)).unwrap().is_empty());
    }

    #[test]
    fn bad_date_is_an_upstream_error() {
        let err = parse(r#"{"observations":[{"date":"2020/10/01","value":"7.8"}]}"#).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn parse_value_rejects_non_finite() {
        assert_eq!(parse_value(" 3.5 "), Some(3.5));
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value(""), None);
    }
}
