//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads credentials only when a FRED fetch is needed
//! - runs the merge pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, FetchOutput, FetchSource, MergeArgs};
use crate::config::{Credentials, init_logging};
use crate::data::{FredClient, YahooClient, macro_indicators};
use crate::domain::{ForecastConfig, MergeConfig, SourceSpec, TimeKey, TimeSeries};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `malign` binary.
pub fn run() -> Result<(), AppError> {
    init_logging();

    // `malign` and `malign --ticker MSFT` behave like `malign merge ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Merge(args) => handle_merge(&args),
        Command::Fetch(args) => handle_fetch(args.source),
    }
}

fn handle_merge(args: &MergeArgs) -> Result<(), AppError> {
    let config = merge_config_from_args(args);
    let credentials = if config.needs_fred() {
        Some(Credentials::from_env()?)
    } else {
        None
    };

    let run = pipeline::run_merge(&config, credentials.as_ref())?;

    println!("{}", crate::report::format_run_summary(&config, &run.report));
    println!("{}", crate::report::format_alignment(&run.report));
    print!("{}", crate::report::format_table(&run.table, config.show_rows));
    if let Some(forecast) = &run.forecast {
        println!();
        print!("{}", crate::report::format_forecast(forecast));
    }
    if let Some(reason) = &run.forecast_skipped {
        println!();
        println!("Forecast skipped: {reason}");
    }

    if let Some(path) = &config.export_csv {
        crate::io::export::write_series_csv(path, &run.table)?;
        info!(path = %path.display(), rows = run.table.len(), "exported CSV");
    }
    if let Some(path) = &config.export_json {
        crate::io::export::write_table_json(path, &run.table, &run.report, run.forecast.as_ref())?;
        info!(path = %path.display(), "exported JSON");
    }

    Ok(())
}

fn handle_fetch(source: FetchSource) -> Result<(), AppError> {
    match source {
        FetchSource::Stock { ticker, output } => {
            let series = YahooClient::new()?.fetch_daily(&ticker, output.range.start, output.range.end)?;
            show_series(&series, &output)
        }
        FetchSource::Fred {
            series,
            field,
            output,
        } => {
            let creds = Credentials::from_env()?;
            let series = FredClient::new(creds.fred_api_key).fetch_series(
                &series,
                &field,
                output.range.start,
                output.range.end,
            )?;
            show_series(&series, &output)
        }
        FetchSource::Macro { output } => {
            let series = macro_indicators(output.range.start, output.range.end)?;
            show_series(&series, &output)
        }
    }
}

fn show_series<K: TimeKey>(series: &TimeSeries<K>, output: &FetchOutput) -> Result<(), AppError> {
    if series.is_empty() {
        return Err(AppError::new(3, format!("No observations for '{}'.", series.name())));
    }

    println!(
        "{} ({}, {} rows)",
        series.name(),
        series.frequency().label(),
        series.len()
    );
    print!("{}", crate::report::format_table(series, output.rows));

    if let Some(path) = &output.export {
        crate::io::export::write_series_csv(path, series)?;
        info!(path = %path.display(), rows = series.len(), "exported CSV");
    }
    Ok(())
}

pub fn merge_config_from_args(args: &MergeArgs) -> MergeConfig {
    let source = |path: &Option<std::path::PathBuf>| match path {
        Some(p) => SourceSpec::Csv(p.clone()),
        None => SourceSpec::Remote,
    };

    MergeConfig {
        ticker: args.ticker.clone(),
        unemployment_series: args.series.clone(),
        start: args.range.start,
        end: args.range.end,
        stock_source: source(&args.stock_csv),
        unemployment_source: source(&args.unemployment_csv),
        macro_source: source(&args.macro_csv),
        keep_partial: args.keep_partial,
        show_rows: args.rows,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
        forecast: args.forecast.map(|horizon| ForecastConfig {
            field: args.forecast_field.clone(),
            ar_order: args.ar_order,
            diff_order: args.diff_order,
            horizon,
        }),
    }
}

/// Rewrite argv so `malign` defaults to `malign merge`.
///
/// Rules:
/// - `malign`                          -> `malign merge`
/// - `malign --ticker MSFT ...`        -> `malign merge --ticker MSFT ...`
/// - `malign --help/--version/-h`      -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("merge".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help") {
        return argv;
    }

    if matches!(arg1.as_str(), "merge" | "fetch") {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "merge".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_merge() {
        assert_eq!(rewrite_args(args(&["malign"])), args(&["malign", "merge"]));
        assert_eq!(
            rewrite_args(args(&["malign", "--ticker", "MSFT"])),
            args(&["malign", "merge", "--ticker", "MSFT"])
        );
        assert_eq!(rewrite_args(args(&["malign", "--help"])), args(&["malign", "--help"]));
        assert_eq!(
            rewrite_args(args(&["malign", "fetch", "macro"])),
            args(&["malign", "fetch", "macro"])
        );
    }

    #[test]
    fn csv_flags_select_local_sources() {
        let cli = Cli::try_parse_from([
            "malign",
            "merge",
            "--unemployment-csv",
            "unrate.csv",
            "--forecast",
            "6",
            "--ar-order",
            "2",
        ])
        .unwrap();
        let Command::Merge(merge) = cli.command else {
            panic!("expected merge");
        };

        let config = merge_config_from_args(&merge);

        assert_eq!(config.stock_source, SourceSpec::Remote);
        assert_eq!(config.unemployment_source, SourceSpec::Csv("unrate.csv".into()));
        assert!(!config.needs_fred());
        let fc = config.forecast.unwrap();
        assert_eq!((fc.horizon, fc.ar_order, fc.diff_order), (6, 2, 1));
        assert_eq!(fc.field, "close");
    }
}
