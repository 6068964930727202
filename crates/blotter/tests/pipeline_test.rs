//! End-to-end tests for the six-stage blotter pipeline.

use blotter::stages::blotter_stages;
use blotter::{
    Dataset, ExecutionContext, ExecutionMode, Pipeline, PipelineConfig, PipelineError, Position,
    Precision, Return, run,
};
use chrono::NaiveDate;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, BTreeSet, HashSet};

fn raw(date: &str, lkid: &str, ticker: Option<&str>, pal: &str, exposure: &str) -> Position {
    Position::raw(
        date,
        lkid,
        ticker.map(str::to_string),
        "analyst",
        "Technology",
        pal,
        exposure,
    )
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A blotter with several books, tickers, same-day duplicates and date gaps.
fn sample_blotter() -> Vec<Position> {
    let days = [1, 2, 3, 5, 8, 9];
    let mut rows = Vec::new();
    for (b, book) in ["B2", "A1", "C3"].iter().enumerate() {
        for (t, ticker) in ["AAPL", "MSFT", "XOM"].iter().enumerate() {
            for (i, day) in days.iter().enumerate() {
                if (b + t + i) % 4 == 3 {
                    continue;
                }
                let pal = (i as i64 + 1) * if t % 2 == 0 { 3 } else { -2 } + b as i64;
                let exposure = 1_000 + 100 * t as i64 + 37 * i as i64 + 11 * b as i64;
                rows.push(raw(
                    &format!("2024-03-{day:02}"),
                    book,
                    Some(ticker),
                    &format!("{pal}.25"),
                    &format!("{exposure}.5"),
                ));
            }
        }
    }
    // Same (lkid, ticker, date) twice
    rows.push(raw("2024-03-02", "A1", Some("AAPL"), "4.75", "250"));
    rows.push(raw("2024-03-05", "B2", Some("XOM"), "-1", "125.125"));
    rows
}

fn first_stages(n: usize) -> Pipeline {
    let mut stages = blotter_stages(Precision::default());
    stages.truncate(n);
    Pipeline::new(stages)
}

fn run_stages(n: usize, rows: Vec<Position>) -> Dataset {
    let mut ctx = ExecutionContext::new(Dataset::new(rows), ExecutionMode::InPlace);
    first_stages(n).run(&mut ctx).unwrap();
    ctx.into_dataset()
}

#[test]
fn test_worked_example() {
    let rows = vec![
        raw("2024-01-01", "A", Some("X"), "10", "100"),
        raw("2024-01-02", "A", Some("X"), "-5", "80"),
    ];

    let after_liq = run_stages(4, rows.clone());
    assert_eq!(after_liq.rows()[0].open_liq, Some(dec!(80)));
    assert_eq!(after_liq.rows()[1].open_liq, Some(dec!(85)));

    let (out, report) = run(Dataset::new(rows), &PipelineConfig::default()).unwrap();
    assert_eq!(report.rows_in(), 2);
    assert_eq!(report.rows_out(), 2);

    let day1 = &out.rows()[0];
    assert_eq!(day1.date().unwrap(), ymd(2024, 1, 1));
    assert_eq!(day1.pal().unwrap(), dec!(10));
    assert_eq!(day1.exposure().unwrap(), dec!(100));
    assert_eq!(day1.sector, "Information Technology");
    assert_eq!(day1.ret, Some(Return::Value(dec!(0.125))));

    let day2 = &out.rows()[1];
    assert_eq!(day2.date().unwrap(), ymd(2024, 1, 2));
    let ret = day2.ret.and_then(|r| r.value()).unwrap();
    assert_eq!(ret.round_dp(6), dec!(-0.058824));
}

#[test]
fn test_row_index_unique_and_stable_through_stage_five() {
    let rows = sample_blotter();
    let n = rows.len();

    for stages in 1..=5 {
        let out = run_stages(stages, rows.clone());
        assert_eq!(out.len(), n, "row count changed after {stages} stages");
        let idx: Vec<_> = out.iter().map(|r| r.row_index.unwrap()).collect();
        assert_eq!(idx, (0..n as u64).collect::<Vec<_>>());
    }
}

#[test]
fn test_open_liquidity_follows_next_calendar_day() {
    let out = run_stages(4, sample_blotter());

    let mut sequences: BTreeMap<(String, String), BTreeMap<NaiveDate, (Decimal, Decimal, Decimal)>> =
        BTreeMap::new();
    for row in out.iter().filter(|r| !r.is_folded()) {
        let key = (row.lkid.clone(), row.ticker.clone().unwrap());
        let prev = sequences.entry(key).or_default().insert(
            row.date().unwrap(),
            (row.pal().unwrap(), row.exposure().unwrap(), row.open_liq.unwrap()),
        );
        assert!(prev.is_none(), "one representative per sequence day");
    }

    for days in sequences.values() {
        for (date, (pal, exposure, open_liq)) in days {
            let next = date.succ_opt().unwrap();
            match days.get(&next) {
                Some((_, next_exposure, _)) => assert_eq!(open_liq, next_exposure),
                None => assert_eq!(*open_liq, exposure - pal),
            }
        }
    }
}

#[test]
fn test_returns_reconstruct_daily_pal() {
    let out = run_stages(5, sample_blotter());

    let mut totals: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for row in out.iter().filter(|r| !r.is_folded()) {
        let entry = totals.entry(row.date().unwrap()).or_default();
        entry.0 += row.open_liq.unwrap();
        entry.1 += row.pal().unwrap();
    }

    for (date, (total, pal)) in totals {
        assert!(!total.is_zero());
        let rebuilt: Decimal = out
            .iter()
            .filter(|r| !r.is_folded() && r.date().unwrap() == date)
            .map(|r| r.ret.and_then(|ret| ret.value()).unwrap() * total)
            .sum();
        assert!(
            (rebuilt - pal).abs() < dec!(0.000000000001),
            "{date}: {rebuilt} != {pal}"
        );
    }
}

#[test]
fn test_one_output_row_per_date_and_book() {
    let rows = sample_blotter();
    let before = run_stages(5, rows.clone());
    let pairs: HashSet<_> = before
        .iter()
        .map(|r| (r.date().unwrap(), r.lkid.clone()))
        .collect();

    let (out, _) = run(Dataset::new(rows), &PipelineConfig::default()).unwrap();
    assert_eq!(out.len(), pairs.len());

    let keys: Vec<_> = out
        .iter()
        .map(|r| (r.lkid.clone(), r.date().unwrap()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(keys, sorted, "output must be sorted by (lkid, date) without duplicates");
}

#[test]
fn test_aggregate_preserves_book_totals() {
    let rows = sample_blotter();
    let before = run_stages(5, rows.clone());
    let mut expected: BTreeMap<(String, NaiveDate), (Decimal, Decimal)> = BTreeMap::new();
    for row in before.iter().filter(|r| !r.is_folded()) {
        let entry = expected
            .entry((row.lkid.clone(), row.date().unwrap()))
            .or_default();
        entry.0 += row.pal().unwrap();
        entry.1 += row.exposure().unwrap();
    }

    let (out, _) = run(Dataset::new(rows), &PipelineConfig::default()).unwrap();
    for row in out.iter() {
        let key = (row.lkid.clone(), row.date().unwrap());
        assert_eq!(
            (row.pal().unwrap(), row.exposure().unwrap()),
            expected[&key]
        );
    }
}

#[test]
fn test_same_day_duplicates_are_counted_once() {
    let rows = vec![
        raw("2024-01-01", "A", Some("X"), "10", "100"),
        raw("2024-01-01", "A", Some("X"), "5", "50"),
    ];

    let (out, _) = run(Dataset::new(rows), &PipelineConfig::default()).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out.rows()[0].pal().unwrap(), dec!(15));
    assert_eq!(out.rows()[0].exposure().unwrap(), dec!(150));
    // open_liq = 150 - 15
    assert_eq!(out.rows()[0].ret, Some(Return::Value(dec!(15) / dec!(135))));
}

#[test]
fn test_zero_fund_value_day_yields_nan() {
    let rows = vec![
        raw("2024-01-01", "A", Some("X"), "5", "5"),
        raw("2024-01-01", "B", Some("Y"), "-2", "-2"),
        raw("2024-01-02", "A", Some("Z"), "1", "11"),
    ];

    let (out, _) = run(Dataset::new(rows), &PipelineConfig::default()).unwrap();
    assert_eq!(out.len(), 3);
    let by_key: BTreeMap<_, _> = out
        .iter()
        .map(|r| ((r.lkid.clone(), r.date().unwrap()), r.ret))
        .collect();
    assert_eq!(
        by_key[&("A".to_string(), ymd(2024, 1, 1))],
        Some(Return::NaN)
    );
    assert_eq!(
        by_key[&("B".to_string(), ymd(2024, 1, 1))],
        Some(Return::NaN)
    );
    assert_eq!(
        by_key[&("A".to_string(), ymd(2024, 1, 2))],
        Some(Return::Value(dec!(0.1)))
    );
}

#[test]
fn test_missing_tickers_form_single_row_sequences() {
    let rows = vec![
        raw("2024-01-01", "A", None, "10", "100"),
        raw("2024-01-02", "A", None, "-5", "80"),
    ];

    let out = run_stages(4, rows);
    assert_eq!(out.rows()[0].ticker.as_deref(), Some("ticker_0"));
    // No shared sequence, so both days fall back to exposure - pal.
    assert_eq!(out.rows()[0].open_liq, Some(dec!(90)));
    assert_eq!(out.rows()[1].open_liq, Some(dec!(85)));
}

#[rstest]
#[case(ExecutionMode::InPlace, false)]
#[case(ExecutionMode::InPlace, true)]
#[case(ExecutionMode::Copy, false)]
#[case(ExecutionMode::Copy, true)]
fn test_modes_produce_identical_output(#[case] mode: ExecutionMode, #[case] parallel: bool) {
    let baseline = run(Dataset::new(sample_blotter()), &PipelineConfig::default())
        .unwrap()
        .0;

    let config = PipelineConfig {
        mode,
        parallel,
        ..Default::default()
    };
    let (out, report) = run(Dataset::new(sample_blotter()), &config).unwrap();
    assert_eq!(report.mode, mode);
    assert_eq!(out.rows(), baseline.rows());
}

#[test]
fn test_parse_failure_aborts_run() {
    let rows = vec![
        raw("2024-01-01", "A", Some("X"), "10", "100"),
        raw("not a date", "A", Some("X"), "10", "100"),
    ];

    let err = run(Dataset::new(rows), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Parse {
            row: 1,
            column: "date",
            ..
        }
    ));
}

#[rstest]
#[case(vec![raw("2024-01-01", "A", Some("X"), "-1", "79228162514264337593543950335")])]
#[case(vec![
    raw("2024-01-01", "A", Some("X"), "1", "5e28"),
    raw("2024-01-01", "A", Some("X"), "1", "5e28"),
])]
fn test_decimal_overflow_is_an_error(#[case] rows: Vec<Position>) {
    let err = run(Dataset::new(rows), &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Arithmetic(_)));
}

#[test]
fn test_invalid_precision_rejected_before_running() {
    let config = PipelineConfig {
        precision: 0,
        ..Default::default()
    };
    let err = run(Dataset::new(sample_blotter()), &config).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

#[test]
fn test_books_and_dates_in_output() {
    let (out, _) = run(Dataset::new(sample_blotter()), &PipelineConfig::default()).unwrap();
    let books: BTreeSet<_> = out.iter().map(|r| r.lkid.as_str()).collect();
    assert_eq!(books.into_iter().collect::<Vec<_>>(), vec!["A1", "B2", "C3"]);
    assert!(out.iter().all(|r| r.sector == "Information Technology"));
}
