// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use ledgerclip::ledger::{self, EntryDraft};
use ledgerclip::models::EntryKind;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE categories(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            icon TEXT NOT NULL DEFAULT '',
            type TEXT NOT NULL
        );
        CREATE TABLE entries(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            type TEXT NOT NULL,
            amount TEXT NOT NULL,
            category TEXT NOT NULL,
            category_icon TEXT NOT NULL DEFAULT '',
            description TEXT
        );
        CREATE TABLE month_history(
            user_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            day INTEGER NOT NULL,
            income TEXT NOT NULL DEFAULT '0',
            expense TEXT NOT NULL DEFAULT '0',
            PRIMARY KEY(user_id, year, month, day)
        );
        CREATE TABLE year_history(
            user_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            income TEXT NOT NULL DEFAULT '0',
            expense TEXT NOT NULL DEFAULT '0',
            PRIMARY KEY(user_id, year, month)
        );
        "#,
    )
    .unwrap();
    conn.execute(
        "INSERT INTO categories(user_id, name, icon, type) VALUES
         (1, 'Salary', '💰', 'income'),
         (1, 'Groceries', '🛒', 'expense')",
        [],
    )
    .unwrap();
    conn
}

fn draft(date: &str, kind: EntryKind, amount: &str, category: &str) -> EntryDraft {
    EntryDraft {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        kind,
        amount: Decimal::from_str_exact(amount).unwrap(),
        category: category.into(),
        description: None,
    }
}

fn day_bucket(conn: &Connection, y: i32, m: u32, d: u32) -> Option<(Decimal, Decimal)> {
    conn.query_row(
        "SELECT income, expense FROM month_history WHERE user_id=1 AND year=?1 AND month=?2 AND day=?3",
        params![y, m, d],
        |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
    )
    .optional()
    .unwrap()
    .map(|(i, e)| {
        (
            Decimal::from_str_exact(&i).unwrap(),
            Decimal::from_str_exact(&e).unwrap(),
        )
    })
}

fn month_bucket(conn: &Connection, y: i32, m: u32) -> Option<(Decimal, Decimal)> {
    conn.query_row(
        "SELECT income, expense FROM year_history WHERE user_id=1 AND year=?1 AND month=?2",
        params![y, m],
        |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
    )
    .optional()
    .unwrap()
    .map(|(i, e)| {
        (
            Decimal::from_str_exact(&i).unwrap(),
            Decimal::from_str_exact(&e).unwrap(),
        )
    })
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

#[test]
fn recording_entries_updates_both_rollups() {
    let mut conn = setup();
    ledger::record_entry(&mut conn, 1, &draft("2024-06-05", EntryKind::Income, "2500.00", "Salary"))
        .unwrap();
    ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-06-05", EntryKind::Expense, "499.99", "Groceries"),
    )
    .unwrap();
    ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-06-20", EntryKind::Expense, "0.01", "Groceries"),
    )
    .unwrap();

    assert_eq!(day_bucket(&conn, 2024, 6, 5), Some((dec("2500.00"), dec("499.99"))));
    assert_eq!(day_bucket(&conn, 2024, 6, 20), Some((Decimal::ZERO, dec("0.01"))));
    assert_eq!(month_bucket(&conn, 2024, 6), Some((dec("2500.00"), dec("500.00"))));
}

#[test]
fn entry_rows_carry_the_category_icon() {
    let mut conn = setup();
    let id = ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-06-05", EntryKind::Expense, "12.50", "Groceries"),
    )
    .unwrap();
    let (amount, icon): (String, String) = conn
        .query_row(
            "SELECT amount, category_icon FROM entries WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(amount, "12.50");
    assert_eq!(icon, "🛒");
}

#[test]
fn decimal_amounts_accumulate_exactly() {
    let mut conn = setup();
    for amount in ["0.1", "0.2"] {
        ledger::record_entry(
            &mut conn,
            1,
            &draft("2024-03-01", EntryKind::Expense, amount, "Groceries"),
        )
        .unwrap();
    }
    let (_, expense) = month_bucket(&conn, 2024, 3).unwrap();
    assert_eq!(expense, dec("0.3"));
}

#[test]
fn removing_an_entry_reverses_the_rollups() {
    let mut conn = setup();
    ledger::record_entry(&mut conn, 1, &draft("2024-06-05", EntryKind::Income, "2500.00", "Salary"))
        .unwrap();
    let id = ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-06-05", EntryKind::Expense, "80.00", "Groceries"),
    )
    .unwrap();

    ledger::remove_entry(&mut conn, 1, id).unwrap();

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(day_bucket(&conn, 2024, 6, 5), Some((dec("2500.00"), Decimal::ZERO)));
    assert_eq!(month_bucket(&conn, 2024, 6), Some((dec("2500.00"), Decimal::ZERO)));
}

#[test]
fn removing_a_missing_or_foreign_entry_is_rejected() {
    let mut conn = setup();
    let id = ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-06-05", EntryKind::Expense, "80.00", "Groceries"),
    )
    .unwrap();

    let err = ledger::remove_entry(&mut conn, 1, 999).unwrap_err();
    assert_eq!(err.to_string(), "Entry 999 not found or not yours");

    // Another user's id reads the same as a missing one.
    let err = ledger::remove_entry(&mut conn, 2, id).unwrap_err();
    assert_eq!(err.to_string(), format!("Entry {} not found or not yours", id));

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
    assert_eq!(day_bucket(&conn, 2024, 6, 5), Some((Decimal::ZERO, dec("80.00"))));
}

#[test]
fn non_positive_amounts_are_rejected_before_any_write() {
    let mut conn = setup();
    let err = ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-06-05", EntryKind::Expense, "0", "Groceries"),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Amount must be positive, got 0");

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
    assert_eq!(day_bucket(&conn, 2024, 6, 5), None);
}

#[test]
fn unknown_category_is_rejected_before_any_write() {
    let mut conn = setup();
    let err = ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-06-05", EntryKind::Expense, "10.00", "Rent"),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Category 'Rent' not found for the active user");

    // The category exists, but only for the other kind.
    let err = ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-06-05", EntryKind::Income, "10.00", "Groceries"),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Category 'Groceries' not found for the active user");

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM month_history", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn entries_across_months_land_in_separate_buckets() {
    let mut conn = setup();
    ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-01-31", EntryKind::Expense, "40.00", "Groceries"),
    )
    .unwrap();
    ledger::record_entry(
        &mut conn,
        1,
        &draft("2024-02-01", EntryKind::Expense, "60.00", "Groceries"),
    )
    .unwrap();

    assert_eq!(month_bucket(&conn, 2024, 1), Some((Decimal::ZERO, dec("40.00"))));
    assert_eq!(month_bucket(&conn, 2024, 2), Some((Decimal::ZERO, dec("60.00"))));
    assert_eq!(day_bucket(&conn, 2024, 1, 31), Some((Decimal::ZERO, dec("40.00"))));
    assert_eq!(day_bucket(&conn, 2024, 2, 1), Some((Decimal::ZERO, dec("60.00"))));
}
