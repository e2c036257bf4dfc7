//! Completeness filter.
//!
//! Rows missing any declared field are dropped; nothing is imputed or
//! forward-filled. When monthly sources anchor on different days of the month
//! (first vs last), no date carries every field and the result is empty.
//! See `diagnose` for how that case is reported.

use crate::domain::{TimeKey, TimeSeries};

/// Keep only rows that hold a value for every field of `table`.
pub fn drop_incomplete<K: TimeKey>(table: &TimeSeries<K>) -> TimeSeries<K> {
    let rows = table
        .iter()
        .filter(|(_, record)| table.is_complete(record))
        .map(|(date, record)| (*date, record.clone()))
        .collect();

    TimeSeries::from_parts(
        table.name().to_string(),
        table.frequency(),
        table.fields().to_vec(),
        rows,
    )
}
