//! Daily -> monthly resampling.
//!
//! Each calendar month with at least one source row becomes one output row
//! keyed at midnight of the month's last day. Field values are arithmetic
//! means over the observations present for that field in the month.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::domain::{Frequency, Record, TimeSeries};
use crate::error::AlignError;

/// Last calendar day of the month `(year, month)`.
pub fn month_end(year: i32, month: u32) -> Result<NaiveDate, AlignError> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or(AlignError::MonthEnd { year, month })
}

/// Month-end key (midnight) for the month containing `date`.
pub fn month_end_key(date: NaiveDateTime) -> Result<NaiveDateTime, AlignError> {
    let end = month_end(date.year(), date.month())?;
    Ok(end.and_time(chrono::NaiveTime::MIN))
}

/// Resample a series to one row per calendar month (mean of each field).
pub fn resample_monthly(
    series: &TimeSeries<NaiveDateTime>,
) -> Result<TimeSeries<NaiveDateTime>, AlignError> {
    // (year, month) -> field -> (sum, count)
    let mut buckets: BTreeMap<(i32, u32), BTreeMap<&str, (f64, usize)>> = BTreeMap::new();

    for (date, record) in series.iter() {
        let bucket = buckets.entry((date.year(), date.month())).or_default();
        for (field, value) in record {
            let acc = bucket.entry(field.as_str()).or_insert((0.0, 0));
            acc.0 += value;
            acc.1 += 1;
        }
    }

    let mut rows = BTreeMap::new();
    for ((year, month), sums) in buckets {
        let key = month_end(year, month)?.and_time(chrono::NaiveTime::MIN);
        let record: Record = sums
            .into_iter()
            .map(|(field, (sum, n))| (field.to_string(), sum / n as f64))
            .collect();
        rows.insert(key, record);
    }

    Ok(TimeSeries::from_parts(
        series.name().to_string(),
        Frequency::Monthly,
        series.fields().to_vec(),
        rows,
    ))
}
