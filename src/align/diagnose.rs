//! Alignment diagnostics.
//!
//! The merge joins on exact dates, so two monthly sources that observe the
//! same month on different days (e.g. FRED's first-of-month `UNRATE` against a
//! month-end resample) never line up. This module counts that loss and names
//! the source pairs responsible. It only reports; it never re-anchors dates.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::domain::{Frequency, MergedTable, TimeSeries};

/// Per-source row counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCoverage {
    pub name: String,
    pub rows: usize,
    /// Rows whose date appears in every other source.
    pub matched_rows: usize,
}

/// Two monthly sources observing the same months on different days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorMismatch {
    pub left: String,
    pub right: String,
    /// Day of month used by `left` in the first mismatched month.
    pub left_day: u32,
    /// Day of month used by `right` in the first mismatched month.
    pub right_day: u32,
    /// Number of months both observe without sharing a date.
    pub months: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentReport {
    pub sources: Vec<SourceCoverage>,
    pub merged_rows: usize,
    pub complete_rows: usize,
    pub mismatches: Vec<AnchorMismatch>,
}

impl AlignmentReport {
    pub fn dropped_rows(&self) -> usize {
        self.merged_rows.saturating_sub(self.complete_rows)
    }

    /// True when the merge produced rows but none had every field.
    pub fn all_rows_dropped(&self) -> bool {
        self.merged_rows > 0 && self.complete_rows == 0
    }
}

/// Build the report for one merge run.
pub fn diagnose(
    inputs: &[&TimeSeries<NaiveDateTime>],
    merged: &MergedTable,
    complete_rows: usize,
) -> AlignmentReport {
    let date_sets: Vec<BTreeSet<NaiveDateTime>> = inputs
        .iter()
        .map(|s| s.dates().copied().collect())
        .collect();

    let sources = inputs
        .iter()
        .enumerate()
        .map(|(i, series)| {
            let matched_rows = date_sets[i]
                .iter()
                .filter(|d| {
                    date_sets
                        .iter()
                        .enumerate()
                        .all(|(j, other)| j == i || other.contains(*d))
                })
                .count();
            SourceCoverage {
                name: series.name().to_string(),
                rows: series.len(),
                matched_rows,
            }
        })
        .collect();

    let monthly: Vec<&TimeSeries<NaiveDateTime>> = inputs
        .iter()
        .copied()
        .filter(|s| s.frequency() == Frequency::Monthly)
        .collect();

    let mut mismatches = Vec::new();
    for (i, left) in monthly.iter().enumerate() {
        for right in &monthly[i + 1..] {
            if let Some(m) = anchor_mismatch(left, right) {
                mismatches.push(m);
            }
        }
    }

    AlignmentReport {
        sources,
        merged_rows: merged.len(),
        complete_rows,
        mismatches,
    }
}

fn anchor_mismatch(
    left: &TimeSeries<NaiveDateTime>,
    right: &TimeSeries<NaiveDateTime>,
) -> Option<AnchorMismatch> {
    let left_months = by_month(left);
    let right_months = by_month(right);

    let mut first: Option<(u32, u32)> = None;
    let mut months = 0usize;
    for (month, left_dates) in &left_months {
        let Some(right_dates) = right_months.get(month) else {
            continue;
        };
        if left_dates.is_disjoint(right_dates) {
            months += 1;
            if first.is_none() {
                let l = left_dates.iter().next().map(|d| d.day())?;
                let r = right_dates.iter().next().map(|d| d.day())?;
                first = Some((l, r));
            }
        }
    }

    let (left_day, right_day) = first?;
    Some(AnchorMismatch {
        left: left.name().to_string(),
        right: right.name().to_string(),
        left_day,
        right_day,
        months,
    })
}

fn by_month(series: &TimeSeries<NaiveDateTime>) -> BTreeMap<(i32, u32), BTreeSet<NaiveDateTime>> {
    let mut out: BTreeMap<(i32, u32), BTreeSet<NaiveDateTime>> = BTreeMap::new();
    for date in series.dates() {
        out.entry((date.year(), date.month())).or_default().insert(*date);
    }
    out
}
