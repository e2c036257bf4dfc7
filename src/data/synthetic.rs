//! Synthetic monthly macro panel.
//!
//! Placeholder for a real interest-rate / inflation source. Values follow a
//! fixed periodic pattern so runs are reproducible:
//!
//! ```text
//! interest_rate[i] = 2.0 + 0.1 * (i % 10)
//! inflation[i]     = 1.5 + 0.2 * (i % 5)
//! ```
//!
//! where `i` is the 0-based index of the month end inside `[start, end]`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

use crate::align::month_end;
use crate::domain::{Frequency, TimeSeries, record};
use crate::error::AppError;

pub const SERIES_MACRO: &str = "macro";
pub const FIELD_INTEREST_RATE: &str = "interest_rate";
pub const FIELD_INFLATION: &str = "inflation";

const INTEREST_RATE_PERIOD: usize = 10;
const INFLATION_PERIOD: usize = 5;

/// Month ends falling inside `[start, end]`, ascending.
pub fn month_ends(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, AppError> {
    let mut out = Vec::new();
    if end < start {
        return Ok(out);
    }
    let (mut year, mut month) = (start.year(), start.month());
    loop {
        let me = month_end(year, month)?;
        if me > end {
            break;
        }
        if me >= start {
            out.push(me);
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    Ok(out)
}

/// Generate the synthetic macro panel over `[start, end]`.
pub fn macro_indicators(start: NaiveDate, end: NaiveDate) -> Result<TimeSeries<NaiveDateTime>, AppError> {
    if end < start {
        return Err(AppError::new(2, format!("End date {end} is before start date {start}.")));
    }

    let dates = month_ends(start, end)?;
    info!(%start, %end, months = dates.len(), "generating synthetic macro panel");

    let rows = dates.into_iter().enumerate().map(|(i, d)| {
        let interest_rate = 2.0 + 0.1 * (i % INTEREST_RATE_PERIOD) as f64;
        let inflation = 1.5 + 0.2 * (i % INFLATION_PERIOD) as f64;
        (
            d.and_time(NaiveTime::MIN),
            record([(FIELD_INTEREST_RATE, interest_rate), (FIELD_INFLATION, inflation)]),
        )
    });

    let series = TimeSeries::from_rows(
        SERIES_MACRO,
        Frequency::Monthly,
        [FIELD_INTEREST_RATE, FIELD_INFLATION],
        rows,
    )?;
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_ends_are_inclusive_of_range_bounds() {
        let ends = month_ends(date(2020, 1, 31), date(2020, 4, 30)).unwrap();
        assert_eq!(
            ends,
            vec![date(2020, 1, 31), date(2020, 2, 29), date(2020, 3, 31), date(2020, 4, 30)]
        );

        let ends = month_ends(date(2020, 1, 15), date(2020, 3, 30)).unwrap();
        assert_eq!(ends, vec![date(2020, 1, 31), date(2020, 2, 29)]);
    }

    #[test]
    fn month_ends_cross_year_boundary() {
        let ends = month_ends(date(2019, 11, 1), date(2020, 1, 31)).unwrap();
        assert_eq!(ends, vec![date(2019, 11, 30), date(2019, 12, 31), date(2020, 1, 31)]);
    }

    #[test]
    fn values_cycle_with_fixed_periods() {
        let series = macro_indicators(date(2020, 1, 1), date(2021, 12, 31)).unwrap();
        assert_eq!(series.len(), 24);

        let rates: Vec<f64> = series.column(FIELD_INTEREST_RATE).into_iter().map(|(_, v)| v).collect();
        let infl: Vec<f64> = series.column(FIELD_INFLATION).into_iter().map(|(_, v)| v).collect();

        assert_relative_eq!(rates[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(rates[9], 2.9, epsilon = 1e-12);
        assert_relative_eq!(rates[10], 2.0, epsilon = 1e-12);
        assert_relative_eq!(infl[0], 1.5, epsilon = 1e-12);
        assert_relative_eq!(infl[4], 2.3, epsilon = 1e-12);
        assert_relative_eq!(infl[5], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn rows_are_anchored_at_month_end() {
        let series = macro_indicators(date(2024, 5, 1), date(2024, 6, 30)).unwrap();
        let dates: Vec<_> = series.dates().map(|d| d.date()).collect();
        assert_eq!(dates, vec![date(2024, 5, 31), date(2024, 6, 30)]);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(macro_indicators(date(2024, 6, 1), date(2024, 5, 1)).is_err());
    }
}
