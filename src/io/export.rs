//! Export series and merged tables to CSV or JSON.
//!
//! CSV is meant for spreadsheets and for feeding back into `--*-csv` inputs.
//! JSON additionally carries the alignment report and any forecast.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::align::AlignmentReport;
use crate::domain::{MergedTable, TimeKey, TimeSeries};
use crate::error::AppError;
use crate::forecast::ForecastOutput;

/// Write a series as CSV: a `date` column, then one column per field.
///
/// Missing values are written as empty cells.
pub fn write_series_csv<K: TimeKey>(path: &Path, series: &TimeSeries<K>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_series(file, series)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))
}

fn write_series<K: TimeKey, W: std::io::Write>(writer: W, series: &TimeSeries<K>) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(series.fields().iter().cloned());
    out.write_record(&header)?;

    for (date, record) in series.iter() {
        let mut row = Vec::with_capacity(header.len());
        row.push(date.to_string());
        for field in series.fields() {
            row.push(record.get(field).map(|v| v.to_string()).unwrap_or_default());
        }
        out.write_record(&row)?;
    }

    out.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct TableFile<'a> {
    tool: &'static str,
    name: &'a str,
    frequency: &'static str,
    fields: &'a [String],
    rows: Vec<TableRow<'a>>,
    alignment: &'a AlignmentReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    forecast: Option<&'a ForecastOutput>,
}

#[derive(Debug, Serialize)]
struct TableRow<'a> {
    date: String,
    /// `null` for a missing value.
    values: Vec<(&'a str, Option<f64>)>,
}

/// Write the merged table, alignment report, and forecast as pretty JSON.
pub fn write_table_json(
    path: &Path,
    table: &MergedTable,
    report: &AlignmentReport,
    forecast: Option<&ForecastOutput>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;

    let rows = table
        .iter()
        .map(|(date, record)| TableRow {
            date: date.to_string(),
            values: table
                .fields()
                .iter()
                .map(|f| (f.as_str(), record.get(f).copied()))
                .collect(),
        })
        .collect();

    let doc = TableFile {
        tool: "malign",
        name: table.name(),
        frequency: table.frequency().label(),
        fields: table.fields(),
        rows,
        alignment: report,
        forecast,
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;

    Ok(())
}
