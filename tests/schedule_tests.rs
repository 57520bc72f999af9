// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ledgerclip::models::Frequency;
use ledgerclip::schedule::{next_due, Cadence};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn future_start_is_returned_unchanged() {
    let start = d("2030-01-15");
    let today = d("2024-06-12");
    assert_eq!(
        next_due(start, &Cadence::Monthly { day: 31 }, today),
        start
    );
    assert_eq!(
        next_due(start, &Cadence::Weekly { weekday: 0 }, today),
        start
    );
    assert_eq!(next_due(start, &Cadence::Yearly, today), start);
}

#[test]
fn monthly_later_in_current_month() {
    // Anchor day not yet reached this month.
    let due = next_due(d("2024-01-05"), &Cadence::Monthly { day: 20 }, d("2024-06-12"));
    assert_eq!(due, d("2024-06-20"));
}

#[test]
fn monthly_due_today_rolls_to_next_month() {
    let due = next_due(d("2024-01-10"), &Cadence::Monthly { day: 10 }, d("2024-06-10"));
    assert_eq!(due, d("2024-07-10"));
}

#[test]
fn monthly_day_31_clamps_to_short_month() {
    let due = next_due(d("2024-01-31"), &Cadence::Monthly { day: 31 }, d("2024-02-15"));
    assert_eq!(due, d("2024-02-29"));
}

#[test]
fn monthly_wraps_december_into_next_year() {
    let due = next_due(d("2024-01-05"), &Cadence::Monthly { day: 5 }, d("2024-12-20"));
    assert_eq!(due, d("2025-01-05"));
}

#[test]
fn weekly_matching_weekday_rolls_a_full_week() {
    // 2024-06-12 is a Wednesday; weekday 3 = Wednesday.
    let due = next_due(d("2024-01-03"), &Cadence::Weekly { weekday: 3 }, d("2024-06-12"));
    assert_eq!(due, d("2024-06-19"));
}

#[test]
fn weekly_upcoming_weekday_stays_in_week() {
    let due = next_due(d("2024-01-05"), &Cadence::Weekly { weekday: 5 }, d("2024-06-12"));
    assert_eq!(due, d("2024-06-14"));
}

#[test]
fn weekly_past_weekday_moves_to_next_week() {
    let due = next_due(d("2024-01-07"), &Cadence::Weekly { weekday: 0 }, d("2024-06-12"));
    assert_eq!(due, d("2024-06-16"));
}

#[test]
fn yearly_anniversary_today_answers_next_year() {
    let due = next_due(d("2023-03-01"), &Cadence::Yearly, d("2024-03-01"));
    assert_eq!(due, d("2025-03-01"));
}

#[test]
fn yearly_upcoming_anniversary_stays_in_year() {
    let due = next_due(d("2020-09-15"), &Cadence::Yearly, d("2024-03-01"));
    assert_eq!(due, d("2024-09-15"));
}

#[test]
fn yearly_leap_day_clamps_in_common_years() {
    let due = next_due(d("2024-02-29"), &Cadence::Yearly, d("2024-03-01"));
    assert_eq!(due, d("2025-02-28"));
}

#[test]
fn cadence_requires_the_matching_day_field() {
    let err = Cadence::new(Frequency::Monthly, None, Some(3)).unwrap_err();
    assert_eq!(err.to_string(), "Monthly obligations require a day of month");

    let err = Cadence::new(Frequency::Weekly, Some(15), None).unwrap_err();
    assert_eq!(err.to_string(), "Weekly obligations require a day of week");
}

#[test]
fn cadence_rejects_out_of_range_days() {
    let err = Cadence::new(Frequency::Monthly, Some(32), None).unwrap_err();
    assert_eq!(err.to_string(), "Day of month 32 out of range 1..=31");

    let err = Cadence::new(Frequency::Weekly, None, Some(7)).unwrap_err();
    assert_eq!(err.to_string(), "Day of week 7 out of range 0..=6 (0 = Sunday)");
}

#[test]
fn cadence_drops_day_fields_it_does_not_use() {
    let c = Cadence::new(Frequency::Yearly, Some(10), Some(2)).unwrap();
    assert_eq!(c.day_of_month(), None);
    assert_eq!(c.day_of_week(), None);

    let c = Cadence::new(Frequency::Monthly, Some(10), Some(2)).unwrap();
    assert_eq!(c.day_of_month(), Some(10));
    assert_eq!(c.day_of_week(), None);
}
