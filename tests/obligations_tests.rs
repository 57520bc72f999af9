// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, Utc};
use ledgerclip::errors::CoreError;
use ledgerclip::schedule::{next_due, Cadence};
use ledgerclip::{cli, commands::obligations};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE settings(key TEXT PRIMARY KEY, value TEXT NOT NULL);
        CREATE TABLE users(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, currency TEXT NOT NULL);
        CREATE TABLE categories(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            icon TEXT NOT NULL DEFAULT '',
            type TEXT NOT NULL
        );
        CREATE TABLE obligations(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            amount TEXT NOT NULL,
            type TEXT NOT NULL,
            category TEXT NOT NULL,
            category_icon TEXT NOT NULL DEFAULT '',
            frequency TEXT NOT NULL,
            day_of_month INTEGER,
            day_of_week INTEGER,
            start_date TEXT NOT NULL,
            end_date TEXT,
            next_due TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            description TEXT
        );
        "#,
    )
    .unwrap();
    conn.execute("INSERT INTO users(name, currency) VALUES ('sam', 'USD')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO settings(key, value) VALUES ('active_user', '1')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO categories(user_id, name, icon, type) VALUES
         (1, 'Rent', '🏠', 'expense'),
         (1, 'Salary', '💰', 'income')",
        [],
    )
    .unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args);
    match matches.subcommand() {
        Some(("recurring", sub)) => obligations::handle(conn, sub),
        _ => panic!("no recurring subcommand"),
    }
}

#[test]
fn add_computes_next_due_and_normalizes_day_fields() {
    let conn = setup();
    run(
        &conn,
        &[
            "ledgerclip", "recurring", "add", "--title", "Rent", "--amount", "1200.00",
            "--type", "expense", "--category", "Rent", "--frequency", "monthly",
            "--day-of-month", "15", "--day-of-week", "3", "--start", "2024-01-15",
        ],
    )
    .unwrap();

    let today = Utc::now().date_naive();
    let expected = next_due(
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        &Cadence::Monthly { day: 15 },
        today,
    );
    let (due, dom, dow, icon, active): (String, Option<u32>, Option<u32>, String, bool) = conn
        .query_row(
            "SELECT next_due, day_of_month, day_of_week, category_icon, active FROM obligations WHERE id=1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(due, expected.to_string());
    assert_eq!(dom, Some(15));
    // The weekday flag is meaningless for a monthly cadence and is not kept.
    assert_eq!(dow, None);
    assert_eq!(icon, "🏠");
    assert!(active);
}

#[test]
fn a_future_start_is_the_first_due_date() {
    let conn = setup();
    run(
        &conn,
        &[
            "ledgerclip", "recurring", "add", "--title", "Rent", "--amount", "1200.00",
            "--type", "expense", "--category", "Rent", "--frequency", "monthly",
            "--day-of-month", "1", "--start", "2999-02-15",
        ],
    )
    .unwrap();
    let due: String = conn
        .query_row("SELECT next_due FROM obligations WHERE id=1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(due, "2999-02-15");
}

#[test]
fn update_recomputes_the_due_date_and_drops_the_stale_day_field() {
    let conn = setup();
    run(
        &conn,
        &[
            "ledgerclip", "recurring", "add", "--title", "Gym", "--amount", "30.00",
            "--type", "expense", "--category", "Rent", "--frequency", "monthly",
            "--day-of-month", "15", "--start", "2999-02-15",
        ],
    )
    .unwrap();
    run(
        &conn,
        &[
            "ledgerclip", "recurring", "update", "--id", "1", "--frequency", "weekly",
            "--day-of-week", "2",
        ],
    )
    .unwrap();

    let (freq, dom, dow, due): (String, Option<u32>, Option<u32>, String) = conn
        .query_row(
            "SELECT frequency, day_of_month, day_of_week, next_due FROM obligations WHERE id=1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(freq, "weekly");
    assert_eq!(dom, None);
    assert_eq!(dow, Some(2));
    assert_eq!(due, "2999-02-15");
}

#[test]
fn switching_frequency_without_its_day_field_changes_nothing() {
    let conn = setup();
    run(
        &conn,
        &[
            "ledgerclip", "recurring", "add", "--title", "Gym", "--amount", "30.00",
            "--type", "expense", "--category", "Rent", "--frequency", "monthly",
            "--day-of-month", "15", "--start", "2999-02-15",
        ],
    )
    .unwrap();
    let err = run(
        &conn,
        &["ledgerclip", "recurring", "update", "--id", "1", "--frequency", "weekly"],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Weekly obligations require a day of week");

    let (freq, dom): (String, Option<u32>) = conn
        .query_row(
            "SELECT frequency, day_of_month FROM obligations WHERE id=1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(freq, "monthly");
    assert_eq!(dom, Some(15));
}

#[test]
fn missing_ids_are_rejected() {
    let conn = setup();
    let err = run(
        &conn,
        &["ledgerclip", "recurring", "update", "--id", "7", "--title", "X"],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Recurring obligation 7 not found or not yours");

    let err = run(&conn, &["ledgerclip", "recurring", "rm", "--id", "42"]).unwrap_err();
    assert_eq!(err.to_string(), "Recurring obligation 42 not found or not yours");
}

#[test]
fn rm_deletes_the_obligation() {
    let conn = setup();
    run(
        &conn,
        &[
            "ledgerclip", "recurring", "add", "--title", "Rent", "--amount", "1200.00",
            "--type", "expense", "--category", "Rent", "--frequency", "yearly",
            "--start", "2999-02-15",
        ],
    )
    .unwrap();
    run(&conn, &["ledgerclip", "recurring", "rm", "--id", "1"]).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM obligations", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn add_validates_category_and_amount() {
    let conn = setup();
    let err = run(
        &conn,
        &[
            "ledgerclip", "recurring", "add", "--title", "X", "--amount", "10.00",
            "--type", "expense", "--category", "Nope", "--frequency", "yearly",
        ],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Category 'Nope' not found for the active user");
    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::CategoryNotFound(name)) if name == "Nope"
    ));

    let err = run(
        &conn,
        &[
            "ledgerclip", "recurring", "add", "--title", "X", "--amount", "0",
            "--type", "expense", "--category", "Rent", "--frequency", "yearly",
        ],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Amount must be positive, got 0");

    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM obligations", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn query_all_orders_by_due_date_and_hides_paused_rows() {
    let conn = setup();
    conn.execute_batch(
        r#"
        INSERT INTO obligations(user_id, title, amount, type, category, frequency, day_of_month, start_date, next_due, active)
        VALUES (1, 'Rent', '1200.00', 'expense', 'Rent', 'monthly', 1, '2024-01-01', '2024-05-01', 1);
        INSERT INTO obligations(user_id, title, amount, type, category, frequency, day_of_month, start_date, next_due, active)
        VALUES (1, 'Old gym', '30.00', 'expense', 'Rent', 'monthly', 1, '2023-01-01', '2024-01-01', 0);
        INSERT INTO obligations(user_id, title, amount, type, category, frequency, day_of_month, start_date, next_due, active)
        VALUES (1, 'Insurance', '80.00', 'expense', 'Rent', 'monthly', 1, '2024-01-01', '2024-02-01', 1);
        "#,
    )
    .unwrap();

    let active_only = obligations::query_all(&conn, 1, false).unwrap();
    assert_eq!(
        active_only.iter().map(|o| o.id).collect::<Vec<_>>(),
        vec![3, 1]
    );
    assert!(active_only.iter().all(|o| o.active));
    assert_eq!(active_only[0].amount, Decimal::from_str_exact("80.00").unwrap());

    let all = obligations::query_all(&conn, 1, true).unwrap();
    assert_eq!(all.iter().map(|o| o.id).collect::<Vec<_>>(), vec![2, 3, 1]);

    // Another user sees nothing.
    assert!(obligations::query_all(&conn, 2, true).unwrap().is_empty());
}
