use std::collections::BTreeSet;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use macro_align::align::{drop_incomplete, merge, normalize, resample_monthly};
use macro_align::domain::{Frequency, Record, TimeSeries, record};
use proptest::prelude::*;

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap().and_time(NaiveTime::MIN)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(NaiveTime::MIN)
}

/// Series over `fields` with unique dates and some missing values.
fn arb_series(name: &'static str, fields: &'static [&'static str]) -> impl Strategy<Value = TimeSeries<NaiveDateTime>> {
    let cell = prop::option::of(-1_000.0f64..1_000.0);
    let row = prop::collection::vec(cell, fields.len());
    prop::collection::btree_map(0i64..2_000, row, 0..60).prop_map(move |rows| {
        let rows = rows.into_iter().map(|(offset, cells)| {
            let rec: Record = fields
                .iter()
                .zip(cells)
                .filter_map(|(f, v)| v.map(|v| (f.to_string(), v)))
                .collect();
            (base() + Duration::days(offset), rec)
        });
        TimeSeries::from_rows(name, Frequency::Daily, fields.iter().copied(), rows).unwrap()
    })
}

proptest! {
    #[test]
    fn merge_order_does_not_change_values_for_disjoint_fields(
        a in arb_series("stock", &["close", "volume"]),
        b in arb_series("macro", &["inflation"]),
    ) {
        let ab = merge(&a, &b);
        let ba = merge(&b, &a);

        let ab_dates: Vec<_> = ab.dates().copied().collect();
        let ba_dates: Vec<_> = ba.dates().copied().collect();
        prop_assert_eq!(&ab_dates, &ba_dates);
        for (date, row) in ab.iter() {
            prop_assert_eq!(Some(row), ba.get(date));
        }
    }

    #[test]
    fn resampling_never_invents_months(s in arb_series("stock", &["close"])) {
        let monthly = resample_monthly(&s).unwrap();

        let source_months: BTreeSet<(i32, u32)> = s.dates().map(|d| (d.year(), d.month())).collect();
        let out_months: BTreeSet<(i32, u32)> = monthly.dates().map(|d| (d.year(), d.month())).collect();
        prop_assert_eq!(source_months, out_months);
        prop_assert!(monthly.len() <= s.len());
    }

    #[test]
    fn filter_keeps_a_gap_free_subset(
        a in arb_series("stock", &["close"]),
        b in arb_series("macro", &["inflation", "interest_rate"]),
    ) {
        let merged = merge(&a, &b);
        let complete = drop_incomplete(&merged);

        prop_assert!(complete.len() <= merged.len());
        for (date, row) in complete.iter() {
            prop_assert_eq!(merged.get(date), Some(row));
            prop_assert!(complete.is_complete(row));
            prop_assert_eq!(row.len(), complete.fields().len());
        }
    }

    #[test]
    fn normalizing_naive_series_is_identity(s in arb_series("stock", &["close", "volume"])) {
        let once = normalize(s.clone());
        prop_assert_eq!(&once, &s);
        prop_assert_eq!(normalize(once.clone()), once);
    }

    #[test]
    fn normalizing_aware_series_keeps_local_dates(
        offset_hours in -12i32..=14,
        days in prop::collection::btree_set(0i64..2_000, 1..40),
    ) {
        let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let rows: Vec<_> = days
            .iter()
            .map(|d| {
                let local = base() + Duration::days(*d);
                (local.and_local_timezone(tz).single().unwrap(), record([("close", 1.0)]))
            })
            .collect();
        let aware = TimeSeries::from_rows("stock", Frequency::Daily, ["close"], rows).unwrap();

        let naive = normalize(aware);

        let expected: Vec<NaiveDateTime> = days.iter().map(|d| base() + Duration::days(*d)).collect();
        let got: Vec<NaiveDateTime> = naive.dates().copied().collect();
        prop_assert_eq!(got, expected);
    }
}

#[test]
fn late_september_days_collapse_to_one_month_end_mean() {
    let daily = TimeSeries::from_rows(
        "stock",
        Frequency::Daily,
        ["close"],
        vec![
            (day(2020, 9, 28), record([("close", 10.0)])),
            (day(2020, 9, 29), record([("close", 20.0)])),
            (day(2020, 9, 30), record([("close", 30.0)])),
        ],
    )
    .unwrap();

    let monthly = resample_monthly(&daily).unwrap();

    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly.value(&day(2020, 9, 30), "close"), Some(20.0));
}

#[test]
fn first_and_last_of_month_never_meet() {
    let a = TimeSeries::from_rows("a", Frequency::Monthly, ["x"], vec![(day(2024, 5, 1), record([("x", 1.0)]))])
        .unwrap();
    let b = TimeSeries::from_rows("b", Frequency::Monthly, ["y"], vec![(day(2024, 5, 31), record([("y", 2.0)]))])
        .unwrap();

    let merged = merge(&a, &b);
    assert_eq!(merged.len(), 2);
    assert!(drop_incomplete(&merged).is_empty());
}

#[test]
fn shared_date_with_disjoint_fields_gives_one_row() {
    let a = TimeSeries::from_rows("a", Frequency::Monthly, ["close"], vec![(day(2020, 9, 30), record([("close", 116.0)]))])
        .unwrap();
    let b = TimeSeries::from_rows(
        "b",
        Frequency::Monthly,
        ["inflation"],
        vec![(day(2020, 9, 30), record([("inflation", 1.7)]))],
    )
    .unwrap();

    let complete = drop_incomplete(&merge(&a, &b));

    assert_eq!(complete.len(), 1);
    assert_eq!(complete.get(&day(2020, 9, 30)), Some(&record([("close", 116.0), ("inflation", 1.7)])));
}
