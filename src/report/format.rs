//! Formatted terminal output.
//!
//! We keep formatting code in one place so the alignment code stays free of
//! presentation concerns and output changes are localized.

use crate::align::AlignmentReport;
use crate::domain::{MergeConfig, TimeKey, TimeSeries};
use crate::forecast::ForecastOutput;

const DATE_WIDTH: usize = 26;
const VALUE_WIDTH: usize = 14;

/// Header block for a merge run.
pub fn format_run_summary(config: &MergeConfig, report: &AlignmentReport) -> String {
    let mut out = String::new();

    out.push_str("=== malign - monthly macro panel ===\n");
    out.push_str(&format!("Ticker: {}\n", config.ticker));
    out.push_str(&format!("Unemployment series: {}\n", config.unemployment_series));
    out.push_str(&format!("Range: {} .. {}\n", config.start, config.end));
    out.push_str(&format!(
        "Rows: merged={} complete={} dropped={}{}\n",
        report.merged_rows,
        report.complete_rows,
        report.dropped_rows(),
        if config.keep_partial { " (partial rows kept)" } else { "" },
    ));

    out
}

/// Per-source coverage and anchor-date mismatches.
pub fn format_alignment(report: &AlignmentReport) -> String {
    let mut out = String::new();

    out.push_str("Sources:\n");
    out.push_str(&format!("{:<24} {:>8} {:>10}\n", "source", "rows", "matched"));
    out.push_str(&format!("{:-<24} {:-<8} {:-<10}\n", "", "", ""));
    for s in &report.sources {
        out.push_str(&format!(
            "{:<24} {:>8} {:>10}\n",
            truncate(&s.name, 24),
            s.rows,
            s.matched_rows
        ));
    }

    if !report.mismatches.is_empty() {
        out.push_str("\nAnchor-date mismatches (exact-date merge cannot align these):\n");
        for m in &report.mismatches {
            out.push_str(&format!(
                "- {} (day {}) vs {} (day {}): {} month(s) never share a date\n",
                m.left, m.left_day, m.right, m.right_day, m.months
            ));
        }
    }

    out
}

/// Render a series as a fixed-width table.
///
/// `max_rows = 0` prints every row; otherwise only the last `max_rows`.
pub fn format_table<K: TimeKey>(series: &TimeSeries<K>, max_rows: usize) -> String {
    let mut out = String::new();

    if series.is_empty() {
        out.push_str(&format!("(no rows in {})\n", series.name()));
        return out;
    }

    let mut header = format!("{:<DATE_WIDTH$}", "date");
    let mut rule = format!("{:-<DATE_WIDTH$}", "");
    for f in series.fields() {
        header.push_str(&format!(" {:>VALUE_WIDTH$}", truncate(f, VALUE_WIDTH)));
        rule.push_str(&format!(" {:-<VALUE_WIDTH$}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    let skip = if max_rows == 0 {
        0
    } else {
        series.len().saturating_sub(max_rows)
    };
    if skip > 0 {
        out.push_str(&format!("... {skip} earlier row(s) not shown\n"));
    }

    for (date, record) in series.iter().skip(skip) {
        let mut line = format!("{:<DATE_WIDTH$}", date.to_string());
        for f in series.fields() {
            let cell = record.get(f).map(|v| fmt_value(*v)).unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {cell:>VALUE_WIDTH$}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Fitted model and forecast points.
pub fn format_forecast(forecast: &ForecastOutput) -> String {
    let mut out = String::new();
    let fit = &forecast.fit;

    out.push_str(&format!(
        "Forecast: {} ARIMA({},{},0) n_obs={} sigma2={:.6}\n",
        forecast.field, fit.p, fit.d, fit.n_obs, fit.sigma2
    ));
    out.push_str(&format!("- intercept: {:.6}\n", fit.intercept));
    out.push_str(&format!("- ar       : {}\n", fmt_vec(&fit.ar)));
    for p in &forecast.points {
        out.push_str(&format!("  {}  {}\n", p.date.date(), fmt_value(p.value)));
    }

    out
}

fn fmt_value(v: f64) -> String {
    if v.abs() >= 1e6 {
        format!("{v:.0}")
    } else {
        format!("{v:.4}")
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
