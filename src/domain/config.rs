//! Run configuration shared by the CLI and the pipeline.

use std::path::PathBuf;

use chrono::NaiveDate;

/// Where a source series comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Fetch from the upstream API (or generate, for the synthetic panel).
    Remote,
    /// Load from a local CSV file.
    Csv(PathBuf),
}

/// ARIMA(p, d, 0) settings for the optional forecast step.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub field: String,
    pub ar_order: usize,
    pub diff_order: usize,
    pub horizon: usize,
}

/// Everything a merge run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    pub ticker: String,
    pub unemployment_series: String,
    pub start: NaiveDate,
    pub end: NaiveDate,

    pub stock_source: SourceSpec,
    pub unemployment_source: SourceSpec,
    pub macro_source: SourceSpec,

    /// Skip the completeness filter and keep rows with gaps.
    pub keep_partial: bool,
    /// Number of rows printed in the terminal table (0 = all).
    pub show_rows: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,

    pub forecast: Option<ForecastConfig>,
}

impl MergeConfig {
    /// True when any source needs the FRED API (and therefore an API key).
    pub fn needs_fred(&self) -> bool {
        self.unemployment_source == SourceSpec::Remote
    }
}
