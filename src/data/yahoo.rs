//! Yahoo Finance chart API integration for daily stock bars.
//!
//! Bars come back as UTC epoch seconds. Each one is converted with the
//! exchange's IANA zone (`exchangeTimezoneName`), so a bar carries the offset
//! in force on its own date (e.g. `2020-09-28 00:00:00-04:00` but
//! `2024-01-03 00:00:00-05:00` for a US listing). The flat `gmtoffset` from the
//! response meta is only used when the zone name is missing or unknown.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{Frequency, Record, TimeSeries};
use crate::error::AppError;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

pub const FIELD_OPEN: &str = "open";
pub const FIELD_HIGH: &str = "high";
pub const FIELD_LOW: &str = "low";
pub const FIELD_CLOSE: &str = "close";
pub const FIELD_VOLUME: &str = "volume";
pub const FIELD_DIVIDENDS: &str = "dividends";
pub const FIELD_SPLITS: &str = "stock_splits";
pub const FIELD_CAPITAL_GAINS: &str = "capital_gains";

/// Fields of a daily stock series, in output order.
pub const STOCK_FIELDS: [&str; 8] = [
    FIELD_OPEN,
    FIELD_HIGH,
    FIELD_LOW,
    FIELD_CLOSE,
    FIELD_VOLUME,
    FIELD_DIVIDENDS,
    FIELD_SPLITS,
    FIELD_CAPITAL_GAINS,
];

pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Fetch daily bars for `ticker` over `[start, end]` (both inclusive).
    pub fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries<DateTime<FixedOffset>>, AppError> {
        if end < start {
            return Err(AppError::new(2, format!("End date {end} is before start date {start}.")));
        }
        info!(ticker, %start, %end, "fetching Yahoo daily bars");

        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive upstream; extend by one day to include `end`.
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_400;

        let url = format!("{BASE_URL}/{ticker}");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits,capitalGains".to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("Yahoo request for {ticker} failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| AppError::new(4, format!("Failed to read Yahoo response: {e}")))?;
        if !status.is_success() {
            // Yahoo reports unknown tickers as 404 with a JSON error body.
            return Err(match parse_chart(ticker, &text) {
                Err(err) => err,
                Ok(_) => AppError::new(
                    4,
                    format!("Yahoo request for {ticker} failed with status {status}."),
                ),
            });
        }

        let series = parse_chart(ticker, &text)?;
        debug!(ticker, rows = series.len(), "Yahoo bars parsed");
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
    #[serde(default)]
    events: Option<Events>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i32,
    #[serde(default)]
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Events {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
    #[serde(default)]
    capital_gains: HashMap<String, DividendEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

/// Converts bar timestamps to exchange-local time.
#[derive(Debug, Clone, Copy)]
enum ExchangeClock {
    /// IANA zone: the offset follows the zone's DST history.
    Zone(Tz),
    /// Flat offset from `gmtoffset`, used when no usable zone name is present.
    Fixed(FixedOffset),
}

impl ExchangeClock {
    fn from_meta(meta: &ChartMeta) -> Result<Self, AppError> {
        if let Some(zone) = meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
        {
            return Ok(Self::Zone(zone));
        }
        if let Some(name) = &meta.exchange_timezone_name {
            warn!(timezone = %name, gmtoffset = meta.gmtoffset, "unknown exchange timezone; using flat offset");
        }
        FixedOffset::east_opt(meta.gmtoffset)
            .map(Self::Fixed)
            .ok_or_else(|| AppError::new(4, format!("Invalid exchange offset {}s.", meta.gmtoffset)))
    }

    fn local_day(&self, ts: i64) -> Option<NaiveDate> {
        match self {
            Self::Zone(tz) => tz.timestamp_opt(ts, 0).single().map(|d| d.date_naive()),
            Self::Fixed(off) => off.timestamp_opt(ts, 0).single().map(|d| d.date_naive()),
        }
    }

    /// Local midnight of `day`, carrying the zone's offset at that time.
    ///
    /// An ambiguous midnight takes the earlier offset.
    fn midnight(&self, day: NaiveDate) -> Option<DateTime<FixedOffset>> {
        let naive = day.and_time(NaiveTime::MIN);
        match self {
            Self::Zone(tz) => {
                let offset = match tz.from_local_datetime(&naive) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.offset().fix(),
                    // Midnight skipped: take the offset in force later that day.
                    LocalResult::None => tz
                        .from_local_datetime(&day.and_time(NaiveTime::from_hms_opt(12, 0, 0)?))
                        .earliest()?
                        .offset()
                        .fix(),
                };
                offset.from_local_datetime(&naive).single()
            }
            Self::Fixed(off) => off.from_local_datetime(&naive).single(),
        }
    }
}

/// Parse a chart API payload into a timezone-aware daily series.
///
/// - null OHLCV entries stay missing
/// - days without a dividend / split / capital gain report `0.0` for that field
fn parse_chart(ticker: &str, json: &str) -> Result<TimeSeries<DateTime<FixedOffset>>, AppError> {
    let response: ChartResponse = serde_json::from_str(json)
        .map_err(|e| AppError::new(4, format!("Failed to parse Yahoo response: {e}")))?;

    if let Some(err) = response.chart.error {
        return Err(AppError::new(
            4,
            format!("Yahoo error for {ticker} [{}]: {}", err.code, err.description),
        ));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AppError::new(3, format!("No Yahoo data returned for {ticker}.")))?;

    let clock = ExchangeClock::from_meta(&data.meta)?;
    debug!(ticker, clock = ?clock, "exchange clock");

    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let events = data.events.unwrap_or_default();

    // Events are keyed by their own timestamp; index them by local calendar day.
    let local_day = |ts: i64| clock.local_day(ts);
    let mut dividends: HashMap<NaiveDate, f64> = HashMap::new();
    for ev in events.dividends.values() {
        if let Some(d) = local_day(ev.date) {
            *dividends.entry(d).or_default() += ev.amount;
        }
    }
    let mut gains: HashMap<NaiveDate, f64> = HashMap::new();
    for ev in events.capital_gains.values() {
        if let Some(d) = local_day(ev.date) {
            *gains.entry(d).or_default() += ev.amount;
        }
    }
    let mut splits: HashMap<NaiveDate, f64> = HashMap::new();
    for ev in events.splits.values() {
        if ev.denominator != 0.0 {
            if let Some(d) = local_day(ev.date) {
                splits.insert(d, ev.numerator / ev.denominator);
            }
        }
    }

    let mut series = TimeSeries::new(ticker, Frequency::Daily, STOCK_FIELDS);
    for (i, &ts) in data.timestamp.iter().enumerate() {
        // Daily bars are labelled by session date at local midnight.
        let day = clock
            .local_day(ts)
            .ok_or_else(|| AppError::new(4, format!("Invalid Yahoo timestamp {ts}.")))?;
        let key = clock
            .midnight(day)
            .ok_or_else(|| AppError::new(4, format!("No local midnight on {day} for {ticker}.")))?;

        let mut record = Record::new();
        let columns = [
            (FIELD_OPEN, &quote.open),
            (FIELD_HIGH, &quote.high),
            (FIELD_LOW, &quote.low),
            (FIELD_CLOSE, &quote.close),
            (FIELD_VOLUME, &quote.volume),
        ];
        for (field, column) in columns {
            if let Some(v) = column.get(i).copied().flatten().filter(|v| v.is_finite()) {
                record.insert(field.to_string(), v);
            }
        }
        record.insert(FIELD_DIVIDENDS.to_string(), dividends.get(&day).copied().unwrap_or(0.0));
        record.insert(FIELD_SPLITS.to_string(), splits.get(&day).copied().unwrap_or(0.0));
        record.insert(FIELD_CAPITAL_GAINS.to_string(), gains.get(&day).copied().unwrap_or(0.0));

        series
            .insert(key, record)
            .map_err(|e| AppError::new(4, e.to_string()))?;
    }

    Ok(series)
}
