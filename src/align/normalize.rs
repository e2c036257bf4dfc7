//! Timezone normalization.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use tracing::warn;

use crate::domain::{TimeKey, TimeSeries};

/// A series as delivered by a source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSeries {
    Aware(TimeSeries<DateTime<FixedOffset>>),
    Naive(TimeSeries<NaiveDateTime>),
}

impl SourceSeries {
    pub fn name(&self) -> &str {
        match self {
            SourceSeries::Aware(s) => s.name(),
            SourceSeries::Naive(s) => s.name(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceSeries::Aware(s) => s.len(),
            SourceSeries::Naive(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn normalize(self) -> TimeSeries<NaiveDateTime> {
        match self {
            SourceSeries::Aware(s) => normalize(s),
            SourceSeries::Naive(s) => normalize(s),
        }
    }
}

impl From<TimeSeries<DateTime<FixedOffset>>> for SourceSeries {
    fn from(series: TimeSeries<DateTime<FixedOffset>>) -> Self {
        SourceSeries::Aware(series)
    }
}

impl From<TimeSeries<NaiveDateTime>> for SourceSeries {
    fn from(series: TimeSeries<NaiveDateTime>) -> Self {
        SourceSeries::Naive(series)
    }
}

/// Strip the UTC offset from every key, keeping the wall-clock value.
///
/// Naive input comes back unchanged, so applying this twice is the same as
/// applying it once. If two aware keys collapse onto the same wall-clock time
/// (only possible when a source mixes offsets), the later key wins.
pub fn normalize<K: TimeKey>(series: TimeSeries<K>) -> TimeSeries<NaiveDateTime> {
    let name = series.name().to_string();
    let frequency = series.frequency();
    let fields = series.fields().to_vec();

    let mut rows = BTreeMap::new();
    for (date, record) in series.into_rows() {
        let naive = date.naive_local();
        if rows.insert(naive, record).is_some() {
            warn!(series = %name, date = %naive, "offsets collapse two rows onto one wall-clock time");
        }
    }

    TimeSeries::from_parts(name, frequency, fields, rows)
}
