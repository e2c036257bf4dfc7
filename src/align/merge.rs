//! Outer join of date-keyed series.

use chrono::NaiveDateTime;

use crate::domain::{Frequency, MergedTable, TimeSeries};

/// Outer-join two series on exact date equality.
///
/// - dates: union of both inputs, ascending
/// - fields: `a`'s fields, then `b`'s fields not already in `a`
/// - values: on a date `a` has, `a` owns its own fields (a gap there stays a
///   gap); every other cell takes `b`'s observation, else missing
///
/// Dates that differ by any amount never merge.
pub fn merge(a: &TimeSeries<NaiveDateTime>, b: &TimeSeries<NaiveDateTime>) -> MergedTable {
    let mut fields = a.fields().to_vec();
    for f in b.fields() {
        if !fields.contains(f) {
            fields.push(f.clone());
        }
    }

    let mut rows = a.clone().into_rows();
    for (date, record) in b.iter() {
        let a_has_date = a.contains_date(date);
        let row = rows.entry(*date).or_default();
        for (field, value) in record {
            if a_has_date && a.fields().contains(field) {
                continue;
            }
            row.insert(field.clone(), *value);
        }
    }

    let frequency = if a.frequency() == b.frequency() {
        a.frequency()
    } else {
        Frequency::Mixed
    };

    TimeSeries::from_parts(
        format!("{}+{}", a.name(), b.name()),
        frequency,
        fields,
        rows,
    )
}

/// Fold any number of series into one table, left to right.
///
/// No input gives an empty table with no fields.
pub fn merge_all<'a, I>(series: I) -> MergedTable
where
    I: IntoIterator<Item = &'a TimeSeries<NaiveDateTime>>,
{
    let mut iter = series.into_iter();
    let Some(first) = iter.next() else {
        return TimeSeries::new("merged", Frequency::Mixed, Vec::<String>::new());
    };
    iter.fold(first.clone(), |acc, next| merge(&acc, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn single(name: &str, field: &str, date: NaiveDateTime, v: f64) -> TimeSeries<NaiveDateTime> {
        TimeSeries::from_rows(name, Frequency::Monthly, [field], vec![(date, record([(field, v)]))])
            .unwrap()
    }

    #[test]
    fn shared_date_with_disjoint_fields_gives_one_full_row() {
        let a = single("stock", "close", day(2020, 9, 30), 116.0);
        let b = single("macro", "inflation", day(2020, 9, 30), 1.7);

        let merged = merge(&a, &b);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged.fields(), ["close".to_string(), "inflation".to_string()]);
        let row = merged.get(&day(2020, 9, 30)).unwrap();
        assert_eq!(row.get("close"), Some(&116.0));
        assert_eq!(row.get("inflation"), Some(&1.7));
    }

    #[test]
    fn dates_one_day_apart_never_merge() {
        let a = single("a", "x", day(2024, 5, 31), 1.0);
        let b = single("b", "y", day(2024, 6, 1), 2.0);

        let merged = merge(&a, &b);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.value(&day(2024, 5, 31), "y"), None);
        assert_eq!(merged.value(&day(2024, 6, 1), "x"), None);
    }

    #[test]
    fn left_observation_wins_on_overlapping_field() {
        let a = single("a", "x", day(2024, 1, 31), 1.0);
        let b = single("b", "x", day(2024, 1, 31), 9.0);

        assert_eq!(merge(&a, &b).value(&day(2024, 1, 31), "x"), Some(1.0));
        assert_eq!(merge(&b, &a).value(&day(2024, 1, 31), "x"), Some(9.0));
    }

    #[test]
    fn left_gap_on_its_own_field_is_not_filled_from_right() {
        let mut a = TimeSeries::new("a", Frequency::Monthly, ["x", "y"]);
        a.insert(day(2024, 1, 31), record([("y", 5.0)])).unwrap();
        let b = single("b", "x", day(2024, 1, 31), 9.0);

        let merged = merge(&a, &b);
        assert_eq!(merged.value(&day(2024, 1, 31), "x"), None);
        assert_eq!(merged.value(&day(2024, 1, 31), "y"), Some(5.0));
    }

    #[test]
    fn right_supplies_shared_field_on_dates_left_lacks() {
        let a = single("a", "x", day(2024, 1, 31), 1.0);
        let b = single("b", "x", day(2024, 2, 29), 9.0);

        let merged = merge(&a, &b);
        assert_eq!(merged.value(&day(2024, 1, 31), "x"), Some(1.0));
        assert_eq!(merged.value(&day(2024, 2, 29), "x"), Some(9.0));
    }

    #[test]
    fn frequency_becomes_mixed_when_inputs_differ() {
        let a = single("a", "x", day(2024, 1, 31), 1.0);
        let daily = TimeSeries::from_rows(
            "d",
            Frequency::Daily,
            ["y"],
            vec![(day(2024, 1, 2), record([("y", 1.0)]))],
        )
        .unwrap();

        assert_eq!(merge(&a, &a).frequency(), Frequency::Monthly);
        assert_eq!(merge(&a, &daily).frequency(), Frequency::Mixed);
    }

    #[test]
    fn merge_all_folds_three_sources() {
        let stock = single("stock", "close", day(2024, 5, 31), 190.0);
        let unemployment = single("UNRATE", "unemployment_rate", day(2024, 5, 1), 4.0);
        let macro_panel = single("macro", "inflation", day(2024, 5, 31), 1.5);

        let merged = merge_all([&stock, &unemployment, &macro_panel]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.fields().len(), 3);
        assert_eq!(merged.name(), "stock+UNRATE+macro");
        let may_end = merged.get(&day(2024, 5, 31)).unwrap();
        assert_eq!(may_end.len(), 2);
        assert!(!may_end.contains_key("unemployment_rate"));
    }

    #[test]
    fn merge_all_of_nothing_is_empty() {
        let merged = merge_all(std::iter::empty::<&MergedTable>());
        assert!(merged.is_empty());
        assert!(merged.fields().is_empty());
    }
}
