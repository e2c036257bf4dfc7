//! Shared domain types.
//!
//! A `TimeSeries` is an ordered map from a date key to a value record. Keys are
//! unique and ascending by construction (`BTreeMap`). A missing observation is
//! the *absence* of a field in the record, never a sentinel like `NaN`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::AlignError;

/// One row of observations: field name -> value.
pub type Record = BTreeMap<String, f64>;

/// Conventional sampling frequency of a series.
///
/// This is a tag set by the producing source. Nothing checks it against the
/// actual spacing of the dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Monthly,
    /// Result of merging series with different frequencies.
    Mixed,
}

impl Frequency {
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Monthly => "monthly",
            Frequency::Mixed => "mixed",
        }
    }
}

/// A date key usable in a `TimeSeries`.
///
/// `naive_local` returns the wall-clock value of the key with any UTC offset
/// discarded (not converted).
pub trait TimeKey: Ord + Copy + fmt::Display {
    fn naive_local(&self) -> NaiveDateTime;
}

impl TimeKey for NaiveDateTime {
    fn naive_local(&self) -> NaiveDateTime {
        *self
    }
}

impl TimeKey for DateTime<FixedOffset> {
    fn naive_local(&self) -> NaiveDateTime {
        DateTime::naive_local(self)
    }
}

/// Date-keyed sequence of numeric observations.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<K: Ord> {
    name: String,
    frequency: Frequency,
    fields: Vec<String>,
    rows: BTreeMap<K, Record>,
}

/// The output of a merge: a naive-keyed series whose schema is the union of
/// its inputs' schemas.
pub type MergedTable = TimeSeries<NaiveDateTime>;

impl<K: TimeKey> TimeSeries<K> {
    /// Create an empty series with a declared field list.
    ///
    /// Duplicate field names are collapsed, keeping the first occurrence.
    pub fn new<I, S>(name: impl Into<String>, frequency: Frequency, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut declared: Vec<String> = Vec::new();
        for f in fields {
            let f = f.into();
            if !declared.contains(&f) {
                declared.push(f);
            }
        }
        Self {
            name: name.into(),
            frequency,
            fields: declared,
            rows: BTreeMap::new(),
        }
    }

    /// Build a series from rows, rejecting duplicated dates and undeclared fields.
    pub fn from_rows<I, S, R>(
        name: impl Into<String>,
        frequency: Frequency,
        fields: I,
        rows: R,
    ) -> Result<Self, AlignError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator<Item = (K, Record)>,
    {
        let mut series = Self::new(name, frequency, fields);
        for (date, record) in rows {
            series.insert(date, record)?;
        }
        Ok(series)
    }

    /// Add one row.
    pub fn insert(&mut self, date: K, record: Record) -> Result<(), AlignError> {
        if let Some(field) = record.keys().find(|f| !self.fields.contains(f)) {
            return Err(AlignError::UnknownField {
                series: self.name.clone(),
                field: field.clone(),
            });
        }
        if self.rows.contains_key(&date) {
            return Err(AlignError::DuplicateDate {
                series: self.name.clone(),
                date: date.to_string(),
            });
        }
        self.rows.insert(date, record);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, date: &K) -> Option<&Record> {
        self.rows.get(date)
    }

    /// Value of `field` at `date`, if observed.
    pub fn value(&self, date: &K, field: &str) -> Option<f64> {
        self.rows.get(date).and_then(|r| r.get(field)).copied()
    }

    pub fn contains_date(&self, date: &K) -> bool {
        self.rows.contains_key(date)
    }

    /// Rows in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Record)> {
        self.rows.iter()
    }

    /// Dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }

    pub fn first_date(&self) -> Option<K> {
        self.rows.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<K> {
        self.rows.keys().next_back().copied()
    }

    /// True when `record` holds a value for every declared field.
    pub fn is_complete(&self, record: &Record) -> bool {
        self.fields.iter().all(|f| record.contains_key(f))
    }

    /// Observed values of one field, in date order, skipping gaps.
    pub fn column(&self, field: &str) -> Vec<(K, f64)> {
        self.rows
            .iter()
            .filter_map(|(d, r)| r.get(field).map(|v| (*d, *v)))
            .collect()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Rename a declared field in the schema and in every row.
    ///
    /// No-op when `from` is not declared or `to` already is.
    pub fn rename_field(mut self, from: &str, to: &str) -> Self {
        let Some(slot) = self.fields.iter().position(|f| f == from) else {
            return self;
        };
        if self.fields.iter().any(|f| f == to) {
            return self;
        }
        self.fields[slot] = to.to_string();
        for record in self.rows.values_mut() {
            if let Some(v) = record.remove(from) {
                record.insert(to.to_string(), v);
            }
        }
        self
    }

    pub fn into_rows(self) -> BTreeMap<K, Record> {
        self.rows
    }

    /// Assemble a series from parts already known to be consistent.
    pub(crate) fn from_parts(
        name: String,
        frequency: Frequency,
        fields: Vec<String>,
        rows: BTreeMap<K, Record>,
    ) -> Self {
        Self {
            name,
            frequency,
            fields,
            rows,
        }
    }
}

/// Convenience constructor for a record from `(field, value)` pairs.
pub fn record<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn rows_iterate_in_ascending_date_order() {
        let series = TimeSeries::from_rows(
            "s",
            Frequency::Daily,
            ["x"],
            vec![
                (day(2024, 1, 3), record([("x", 3.0)])),
                (day(2024, 1, 1), record([("x", 1.0)])),
                (day(2024, 1, 2), record([("x", 2.0)])),
            ],
        )
        .unwrap();

        let dates: Vec<_> = series.dates().copied().collect();
        assert_eq!(dates, vec![day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)]);
        assert_eq!(series.first_date(), Some(day(2024, 1, 1)));
        assert_eq!(series.last_date(), Some(day(2024, 1, 3)));
    }

    #[test]
    fn duplicate_date_is_rejected() {
        let err = TimeSeries::from_rows(
            "UNRATE",
            Frequency::Monthly,
            ["unemployment_rate"],
            vec![
                (day(2024, 5, 1), record([("unemployment_rate", 4.0)])),
                (day(2024, 5, 1), record([("unemployment_rate", 4.1)])),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, AlignError::DuplicateDate { .. }));
    }

    #[test]
    fn undeclared_field_is_rejected() {
        let mut series = TimeSeries::new("s", Frequency::Daily, ["x"]);
        let err = series.insert(day(2024, 1, 1), record([("y", 1.0)])).unwrap_err();
        assert_eq!(
            err,
            AlignError::UnknownField {
                series: "s".to_string(),
                field: "y".to_string()
            }
        );
    }

    #[test]
    fn declared_fields_are_deduplicated_in_order() {
        let series: TimeSeries<NaiveDateTime> =
            TimeSeries::new("s", Frequency::Daily, ["b", "a", "b"]);
        assert_eq!(series.fields(), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn aware_key_exposes_wall_clock_time() {
        let offset = FixedOffset::west_opt(4 * 3600).unwrap();
        let aware = day(2020, 9, 28).and_local_timezone(offset).single().unwrap();
        assert_eq!(aware.naive_local(), day(2020, 9, 28));
    }

    #[test]
    fn rename_field_moves_schema_and_values() {
        let s = TimeSeries::from_rows(
            "UNRATE",
            Frequency::Monthly,
            ["unrate"],
            vec![(day(2024, 1, 1), record([("unrate", 3.7)]))],
        )
        .unwrap()
        .rename_field("unrate", "unemployment_rate");

        assert_eq!(s.fields(), ["unemployment_rate".to_string()]);
        assert_eq!(s.value(&day(2024, 1, 1), "unemployment_rate"), Some(3.7));
        assert_eq!(s.value(&day(2024, 1, 1), "unrate"), None);
    }

    #[test]
    fn completeness_checks_every_declared_field() {
        let series: TimeSeries<NaiveDateTime> =
            TimeSeries::new("s", Frequency::Monthly, ["a", "b"]);
        assert!(series.is_complete(&record([("a", 1.0), ("b", 2.0)])));
        assert!(!series.is_complete(&record([("a", 1.0)])));
    }
}
