//! Command-line parsing for the monthly macro panel builder.
//!
//! Argument parsing and command dispatch live apart from the alignment code;
//! `app` turns these structs into a `MergeConfig`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::data::{FIELD_UNEMPLOYMENT, SERIES_UNRATE};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "malign",
    version,
    about = "Align daily stock prices, FRED unemployment and macro indicators into one monthly table"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every source, align to monthly, merge, and drop incomplete rows.
    Merge(MergeArgs),
    /// Fetch and print a single source series.
    Fetch(FetchArgs),
}

/// Date range shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RangeArgs {
    /// First date to request (YYYY-MM-DD).
    #[arg(long, default_value = "2020-01-01")]
    pub start: NaiveDate,

    /// Last date to request, inclusive (YYYY-MM-DD).
    #[arg(long, default_value = "2024-12-31")]
    pub end: NaiveDate,
}

#[derive(Debug, Args, Clone)]
pub struct MergeArgs {
    /// Stock ticker for daily prices.
    #[arg(short = 't', long, default_value = "AAPL")]
    pub ticker: String,

    /// FRED series id for the unemployment rate.
    #[arg(short = 's', long, default_value = SERIES_UNRATE)]
    pub series: String,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Read daily stock prices from CSV instead of Yahoo.
    #[arg(long, value_name = "CSV")]
    pub stock_csv: Option<PathBuf>,

    /// Read the unemployment series from CSV instead of FRED (no API key needed).
    #[arg(long, value_name = "CSV")]
    pub unemployment_csv: Option<PathBuf>,

    /// Read macro indicators from CSV instead of the synthetic panel.
    #[arg(long, value_name = "CSV")]
    pub macro_csv: Option<PathBuf>,

    /// Keep rows with missing fields instead of dropping them.
    #[arg(long)]
    pub keep_partial: bool,

    /// Rows of the merged table to print (last N; 0 = all).
    #[arg(long, default_value_t = 24)]
    pub rows: usize,

    /// Export the final table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the final table, alignment report and forecast to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Forecast this many months ahead with ARIMA(p, d, 0).
    #[arg(long, value_name = "MONTHS")]
    pub forecast: Option<usize>,

    /// Field of the final table to forecast.
    #[arg(long, default_value = "close")]
    pub forecast_field: String,

    /// AR order p.
    #[arg(long, default_value_t = 1)]
    pub ar_order: usize,

    /// Differencing order d.
    #[arg(long = "diff", default_value_t = 1)]
    pub diff_order: usize,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(subcommand)]
    pub source: FetchSource,
}

#[derive(Debug, Subcommand)]
pub enum FetchSource {
    /// Daily prices from Yahoo Finance (exchange-local dates).
    Stock {
        #[arg(short = 't', long, default_value = "AAPL")]
        ticker: String,
        #[command(flatten)]
        output: FetchOutput,
    },
    /// A FRED series (needs FRED_API_KEY).
    Fred {
        #[arg(short = 's', long, default_value = SERIES_UNRATE)]
        series: String,
        /// Column name for the values.
        #[arg(long, default_value = FIELD_UNEMPLOYMENT)]
        field: String,
        #[command(flatten)]
        output: FetchOutput,
    },
    /// The synthetic monthly interest rate / inflation panel.
    Macro {
        #[command(flatten)]
        output: FetchOutput,
    },
}

/// Range and output options for `fetch`.
#[derive(Debug, Args, Clone)]
pub struct FetchOutput {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Rows to print (last N; 0 = all).
    #[arg(long, default_value_t = 24)]
    pub rows: usize,

    /// Export the series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_defaults() {
        let cli = Cli::try_parse_from(["malign", "merge"]).unwrap();
        let Command::Merge(args) = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(args.ticker, "AAPL");
        assert_eq!(args.series, "UNRATE");
        assert_eq!(args.range.start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert!(!args.keep_partial);
        assert!(args.forecast.is_none());
        assert_eq!(args.diff_order, 1);
    }

    #[test]
    fn fetch_fred_with_range() {
        let cli = Cli::try_parse_from([
            "malign", "fetch", "fred", "--series", "CPIAUCSL", "--start", "2021-01-01", "--end", "2021-06-30",
        ])
        .unwrap();
        let Command::Fetch(FetchArgs {
            source: FetchSource::Fred { series, output, .. },
        }) = cli.command
        else {
            panic!("expected fetch fred");
        };
        assert_eq!(series, "CPIAUCSL");
        assert_eq!(output.range.end, NaiveDate::from_ymd_opt(2021, 6, 30).unwrap());
    }

    #[test]
    fn fetch_fred_defaults_to_the_merged_column_name() {
        let cli = Cli::try_parse_from(["malign", "fetch", "fred"]).unwrap();
        let Command::Fetch(FetchArgs {
            source: FetchSource::Fred { series, field, .. },
        }) = cli.command
        else {
            panic!("expected fetch fred");
        };
        assert_eq!(series, SERIES_UNRATE);
        assert_eq!(field, "unemployment_rate");
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["malign", "merge", "--start", "2020-13-01"]).is_err());
    }
}
