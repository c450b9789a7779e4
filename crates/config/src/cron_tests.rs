// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron expression parsing and iteration tests.

use super::*;
use chrono::NaiveDate;

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

#[test]
fn parses_wildcards_and_values() {
    let expr = CronExpr::parse("30 17 * * 5").unwrap();
    assert!(expr.matches(at(2026, 1, 2, 17, 30))); // a Friday
    assert!(!expr.matches(at(2026, 1, 2, 17, 31)));
    assert!(!expr.matches(at(2026, 1, 3, 17, 30))); // Saturday
}

#[test]
fn parses_step_fields() {
    let expr = CronExpr::parse("*/15 * * * *").unwrap();
    assert!(expr.matches(at(2026, 1, 1, 3, 0)));
    assert!(expr.matches(at(2026, 1, 1, 3, 45)));
    assert!(!expr.matches(at(2026, 1, 1, 3, 20)));
}

#[test]
fn parses_range_with_step() {
    let expr = CronExpr::parse("0 9-17/4 * * *").unwrap();
    assert!(expr.matches(at(2026, 1, 1, 9, 0)));
    assert!(expr.matches(at(2026, 1, 1, 13, 0)));
    assert!(expr.matches(at(2026, 1, 1, 17, 0)));
    assert!(!expr.matches(at(2026, 1, 1, 11, 0)));
}

#[test]
fn parses_lists_and_ranges() {
    let expr = CronExpr::parse("0 9 * * 1,3,5").unwrap();
    assert!(expr.matches(at(2026, 1, 5, 9, 0))); // Monday
    assert!(expr.matches(at(2026, 1, 7, 9, 0))); // Wednesday
    assert!(!expr.matches(at(2026, 1, 6, 9, 0))); // Tuesday

    let range = CronExpr::parse("0 9 * * 1-5").unwrap();
    assert!(range.matches(at(2026, 1, 6, 9, 0)));
    assert!(!range.matches(at(2026, 1, 4, 9, 0))); // Sunday
}

#[test]
fn day_of_week_seven_means_sunday() {
    let expr = CronExpr::parse("0 0 * * 7").unwrap();
    assert!(expr.matches(at(2026, 1, 4, 0, 0))); // Sunday
    assert!(!expr.matches(at(2026, 1, 5, 0, 0)));
}

#[test]
fn vixie_dom_dow_or_rule() {
    // Both restricted: match when either the 15th OR a Monday.
    let expr = CronExpr::parse("0 0 15 * 1").unwrap();
    assert!(expr.matches(at(2026, 1, 15, 0, 0))); // Thursday the 15th
    assert!(expr.matches(at(2026, 1, 5, 0, 0))); // Monday the 5th
    assert!(!expr.matches(at(2026, 1, 6, 0, 0))); // Tuesday the 6th
}

#[test]
fn next_after_is_strictly_greater() {
    let expr = CronExpr::parse("30 6 * * *").unwrap();
    let next = expr.next_after(at(2026, 2, 23, 6, 30)).unwrap();
    assert_eq!(next, at(2026, 2, 24, 6, 30));
}

#[test]
fn next_after_same_day_later_slot() {
    let expr = CronExpr::parse("0 */6 * * *").unwrap();
    let next = expr.next_after(at(2026, 2, 23, 7, 15)).unwrap();
    assert_eq!(next, at(2026, 2, 23, 12, 0));
}

#[test]
fn next_after_crosses_month_for_sparse_dates() {
    let expr = CronExpr::parse("0 8 31 * *").unwrap();
    let next = expr.next_after(at(2026, 4, 30, 12, 0)).unwrap();
    assert_eq!(next, at(2026, 5, 31, 8, 0)); // April has no 31st
}

#[test]
fn next_after_yearly() {
    let expr = CronExpr::parse("0 0 1 1 *").unwrap();
    let next = expr.next_after(at(2026, 1, 1, 0, 0)).unwrap();
    assert_eq!(next, at(2027, 1, 1, 0, 0));
}

#[test]
fn next_after_leap_day() {
    let expr = CronExpr::parse("0 12 29 2 *").unwrap();
    let next = expr.next_after(at(2026, 3, 1, 0, 0)).unwrap();
    assert_eq!(next, at(2028, 2, 29, 12, 0));
}

#[test]
fn unsatisfiable_expression_returns_none() {
    let expr = CronExpr::parse("0 0 30 2 *").unwrap();
    assert_eq!(expr.next_after(at(2026, 1, 1, 0, 0)), None);
}

#[test]
fn rejects_malformed_expressions() {
    assert!(CronExpr::parse("* * * *").is_err());
    assert!(CronExpr::parse("61 * * * *").is_err());
    assert!(CronExpr::parse("* 24 * * *").is_err());
    assert!(CronExpr::parse("* * 0 * *").is_err());
    assert!(CronExpr::parse("* * * 13 *").is_err());
    assert!(CronExpr::parse("* * * * 8").is_err());
    assert!(CronExpr::parse("5-2 * * * *").is_err());
    assert!(CronExpr::parse("*/0 * * * *").is_err());
    assert!(CronExpr::parse("a * * * *").is_err());
}

#[test]
fn step_larger_than_range_rejected() {
    assert!(CronExpr::parse("*/61 * * * *").is_err());
}

#[test]
fn field_rendering_round_trips() {
    let expr = CronExpr::parse("30 17 * * 5").unwrap();
    assert_eq!(expr.as_str(), "30 17 * * 5");
    assert_eq!(expr.to_string(), "30 17 * * 5");
}
