//! Shared merge pipeline used by the CLI subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch/load -> normalize -> resample -> merge -> completeness filter -> diagnostics
//!
//! Front-ends then only deal with presentation and exports.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::align::{
    AlignmentReport, SourceSeries, diagnose, drop_incomplete, merge_all, resample_monthly,
};
use crate::config::Credentials;
use crate::data::synthetic::SERIES_MACRO;
use crate::data::{FIELD_UNEMPLOYMENT, FredClient, YahooClient, macro_indicators};
use crate::domain::{Frequency, MergeConfig, MergedTable, SourceSpec, TimeSeries};
use crate::error::AppError;
use crate::forecast::{ForecastOutput, forecast_field};
use crate::io::ingest::load_series_csv;

/// Source series exactly as delivered, before any alignment step.
#[derive(Debug, Clone)]
pub struct RawSources {
    pub stock: SourceSeries,
    pub unemployment: SourceSeries,
    pub macro_panel: SourceSeries,
}

/// All computed outputs of a single `malign merge` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stock_monthly: TimeSeries<NaiveDateTime>,
    pub unemployment: TimeSeries<NaiveDateTime>,
    pub macro_monthly: TimeSeries<NaiveDateTime>,
    /// Outer join of the three sources, gaps included.
    pub merged: MergedTable,
    /// The table handed to consumers: complete rows only, unless `keep_partial`.
    pub table: MergedTable,
    pub report: AlignmentReport,
    pub forecast: Option<ForecastOutput>,
    /// Why a requested forecast was not produced (too little data).
    pub forecast_skipped: Option<String>,
}

/// Load every source and run the pipeline.
pub fn run_merge(config: &MergeConfig, credentials: Option<&Credentials>) -> Result<RunOutput, AppError> {
    let sources = load_sources(config, credentials)?;
    run_merge_with_sources(config, sources)
}

/// Fetch, generate, or read from CSV each source, per `config`.
///
/// Any failure is fatal; there are no retries.
pub fn load_sources(config: &MergeConfig, credentials: Option<&Credentials>) -> Result<RawSources, AppError> {
    if config.end < config.start {
        return Err(AppError::new(
            2,
            format!("End date {} is before start date {}.", config.end, config.start),
        ));
    }

    let stock = match &config.stock_source {
        SourceSpec::Remote => YahooClient::new()?
            .fetch_daily(&config.ticker, config.start, config.end)?
            .into(),
        SourceSpec::Csv(path) => load_series_csv(path, &config.ticker, Frequency::Daily)?.series,
    };

    let unemployment = match &config.unemployment_source {
        SourceSpec::Remote => {
            let creds = credentials.ok_or_else(|| {
                AppError::new(2, "Missing FRED_API_KEY in environment (.env).")
            })?;
            FredClient::new(creds.fred_api_key.clone())
                .fetch_series(&config.unemployment_series, FIELD_UNEMPLOYMENT, config.start, config.end)?
                .into()
        }
        SourceSpec::Csv(path) => {
            let loaded = load_series_csv(path, &config.unemployment_series, Frequency::Monthly)?;
            unemployment_column(loaded.series.normalize())?.into()
        }
    };

    let macro_panel = match &config.macro_source {
        SourceSpec::Remote => macro_indicators(config.start, config.end)?.into(),
        SourceSpec::Csv(path) => load_series_csv(path, SERIES_MACRO, Frequency::Monthly)?.series,
    };

    Ok(RawSources {
        stock,
        unemployment,
        macro_panel,
    })
}

/// Give a CSV unemployment series the same column name the FRED adapter uses.
///
/// A FRED download has one value column named after the series id
/// (`observation_date,UNRATE`); that column becomes `unemployment_rate`.
pub fn unemployment_column(series: TimeSeries<NaiveDateTime>) -> Result<TimeSeries<NaiveDateTime>, AppError> {
    if series.fields().iter().any(|f| f == FIELD_UNEMPLOYMENT) {
        return Ok(series);
    }
    let fields = series.fields().to_vec();
    if let [only] = fields.as_slice() {
        info!(series = %series.name(), from = %only, to = FIELD_UNEMPLOYMENT, "renaming unemployment column");
        return Ok(series.rename_field(only, FIELD_UNEMPLOYMENT));
    }
    Err(AppError::new(
        2,
        format!(
            "Unemployment CSV '{}' needs one value column or a '{FIELD_UNEMPLOYMENT}' column, found: {}.",
            series.name(),
            fields.join(", ")
        ),
    ))
}

/// Run the alignment pipeline on already-loaded sources.
pub fn run_merge_with_sources(config: &MergeConfig, sources: RawSources) -> Result<RunOutput, AppError> {
    for (role, s) in [
        ("stock", &sources.stock),
        ("unemployment", &sources.unemployment),
        ("macro", &sources.macro_panel),
    ] {
        if s.is_empty() {
            return Err(AppError::new(3, format!("No {role} observations for '{}'.", s.name())));
        }
    }

    // 1) Strip offsets so every key compares as a naive calendar date.
    let stock = sources.stock.normalize();
    let unemployment = sources.unemployment.normalize();
    let macro_panel = sources.macro_panel.normalize();

    // 2) Daily -> monthly. The unemployment series is already monthly and keeps
    //    its own (first-of-month) anchors.
    let stock_monthly = resample_monthly(&stock)?;
    let macro_monthly = resample_monthly(&macro_panel)?;
    info!(
        stock_days = stock.len(),
        stock_months = stock_monthly.len(),
        unemployment_months = unemployment.len(),
        macro_months = macro_monthly.len(),
        "sources aligned to monthly"
    );

    // 3) Outer join on exact dates.
    let inputs = [&stock_monthly, &unemployment, &macro_monthly];
    let merged = merge_all(inputs);

    // 4) Completeness filter.
    let complete = drop_incomplete(&merged);
    let report = diagnose(&inputs, &merged, complete.len());

    for m in &report.mismatches {
        warn!(
            left = %m.left,
            right = %m.right,
            left_day = m.left_day,
            right_day = m.right_day,
            months = m.months,
            "monthly sources use different anchor days; their rows never merge"
        );
    }
    if report.all_rows_dropped() {
        warn!(
            merged = report.merged_rows,
            "completeness filter dropped every row; use --keep-partial to inspect the gaps"
        );
    } else {
        info!(
            merged = report.merged_rows,
            complete = report.complete_rows,
            "completeness filter applied"
        );
    }

    let table = if config.keep_partial { merged.clone() } else { complete };

    // 5) Optional forecast on the final table. Too little data skips it
    //    instead of discarding the report and exports.
    let mut forecast = None;
    let mut forecast_skipped = None;
    if let Some(fc) = &config.forecast {
        match forecast_field(&table, fc) {
            Ok(out) => forecast = Some(out),
            Err(err) if err.exit_code() == 3 => {
                let reason = if !config.keep_partial && report.all_rows_dropped() {
                    format!("{err} The completeness filter dropped every row; rerun with --keep-partial.")
                } else {
                    err.to_string()
                };
                warn!(field = %fc.field, %reason, "forecast skipped");
                forecast_skipped = Some(reason);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(RunOutput {
        stock_monthly,
        unemployment,
        macro_monthly,
        merged,
        table,
        report,
        forecast,
        forecast_skipped,
    })
}
