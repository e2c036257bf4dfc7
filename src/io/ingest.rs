//! CSV ingest for source series.
//!
//! Lets a run use local files instead of the network (offline runs, fixtures,
//! re-using a previous `--export`). Expected layout:
//!
//! - one date column (`date`, `datetime`, `observation_date`, or the first column)
//! - any number of numeric columns, one per field
//!
//! Header names are normalized (`Stock Splits` -> `stock_splits`). Dates may
//! carry a UTC offset (`2020-09-28 00:00:00-04:00`) or not, but a file must not
//! mix both. Empty cells, `.` and `NaN` are missing values. Rows that fail to
//! parse are skipped and reported, like the bond ingest in earlier versions.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use tracing::{info, warn};

use crate::align::SourceSeries;
use crate::domain::{Frequency, Record, TimeSeries};
use crate::error::AppError;

const DATE_COLUMNS: [&str; 4] = ["date", "datetime", "observation_date", "timestamp"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the parsed series plus what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: SourceSeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

enum ParsedDate {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

/// Load a series from a CSV file.
pub fn load_series_csv(path: &Path, name: &str, frequency: Frequency) -> Result<IngestedSeries, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read_series_csv(file, name, frequency)?;

    info!(
        path = %path.display(),
        rows = ingested.series.len(),
        skipped = ingested.row_errors.len(),
        "loaded series from CSV"
    );
    for err in &ingested.row_errors {
        warn!(path = %path.display(), line = err.line, "{}", err.message);
    }
    Ok(ingested)
}

/// Parse a series from any CSV reader.
pub fn read_series_csv<R: std::io::Read>(
    reader: R,
    name: &str,
    frequency: Frequency,
) -> Result<IngestedSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    if names.is_empty() {
        return Err(AppError::new(2, "CSV has no columns."));
    }

    let date_idx = names
        .iter()
        .position(|n| DATE_COLUMNS.contains(&n.as_str()))
        .unwrap_or(0);
    let fields: Vec<(usize, String)> = names
        .iter()
        .enumerate()
        .filter(|(i, n)| *i != date_idx && !n.is_empty())
        .map(|(i, n)| (i, n.clone()))
        .collect();
    let field_names: Vec<String> = fields.iter().map(|(_, n)| n.clone()).collect();

    let mut aware: Option<TimeSeries<DateTime<FixedOffset>>> = None;
    let mut naive: Option<TimeSeries<NaiveDateTime>> = None;
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, header on line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = parse_row(&record, date_idx, &fields).and_then(|(date, values)| {
            match date {
                ParsedDate::Aware(d) => {
                    if naive.is_some() {
                        return Err("mixes offset and naive dates".to_string());
                    }
                    aware
                        .get_or_insert_with(|| TimeSeries::new(name, frequency, field_names.clone()))
                        .insert(d, values)
                }
                ParsedDate::Naive(d) => {
                    if aware.is_some() {
                        return Err("mixes offset and naive dates".to_string());
                    }
                    naive
                        .get_or_insert_with(|| TimeSeries::new(name, frequency, field_names.clone()))
                        .insert(d, values)
                }
            }
            .map_err(|e| e.to_string())
        });

        if let Err(message) = parsed {
            row_errors.push(RowError { line, message });
        }
    }

    let series = match (aware, naive) {
        (Some(s), _) => SourceSeries::Aware(s),
        (None, Some(s)) => SourceSeries::Naive(s),
        (None, None) => {
            return Err(AppError::new(
                3,
                format!("No valid rows in CSV for series '{name}'."),
            ));
        }
    };

    Ok(IngestedSeries {
        series,
        row_errors,
        rows_read,
    })
}

fn parse_row(
    record: &StringRecord,
    date_idx: usize,
    fields: &[(usize, String)],
) -> Result<(ParsedDate, Record), String> {
    let raw_date = record
        .get(date_idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing date value".to_string())?;
    let date = parse_date(raw_date)?;

    let mut values = Record::new();
    for (idx, field) in fields {
        let Some(raw) = record.get(*idx) else {
            continue;
        };
        if let Some(v) = parse_cell(raw).map_err(|_| format!("Invalid number '{raw}' in column `{field}`"))? {
            values.insert(field.clone(), v);
        }
    }
    Ok((date, values))
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase().replace([' ', '-'], "_")
}

fn parse_date(s: &str) -> Result<ParsedDate, String> {
    const AWARE_FMTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S %:z", "%Y-%m-%dT%H:%M:%S%:z"];
    const NAIVE_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    const DATE_FMTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    for fmt in AWARE_FMTS {
        if let Ok(d) = DateTime::parse_from_str(s, fmt) {
            return Ok(ParsedDate::Aware(d));
        }
    }
    for fmt in NAIVE_FMTS {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ParsedDate::Naive(d));
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(ParsedDate::Naive(d.and_time(NaiveTime::MIN)));
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, or either with a UTC offset."
    ))
}

/// `Ok(None)` for a missing value, `Err` for text that is not a number.
fn parse_cell(raw: &str) -> Result<Option<f64>, ()> {
    let s = raw.trim();
    if s.is_empty() || s == "." || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let v = s.parse::<f64>().map_err(|_| ())?;
    Ok(v.is_finite().then_some(v))
}
