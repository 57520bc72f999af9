// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use ledgerclip::{cli, commands::exporter};
use rusqlite::Connection;
use serde_json::json;
use tempfile::tempdir;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE settings(key TEXT PRIMARY KEY, value TEXT NOT NULL);
        CREATE TABLE users(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, currency TEXT NOT NULL);
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
    conn.execute_batch(
        r#"
        INSERT INTO entries(user_id, date, type, amount, category, description) VALUES
        (1, '2025-01-05', 'expense', '12.34', 'Groceries', 'Corner shop'),
        (1, '2025-01-02', 'income', '3000.00', 'Salary', NULL),
        (2, '2025-01-03', 'expense', '99.00', 'Groceries', 'not yours');
        "#,
    )
    .unwrap();
    conn
}

fn run_export(conn: &Connection, fmt: &str, out: &str) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "ledgerclip", "export", "entries", "--format", fmt, "--out", out,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_entries_writes_csv_in_date_order() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    run_export(&conn, "csv", out_path.to_str().unwrap()).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "date,type,amount,category,description",
            "2025-01-02,income,3000.00,Salary,",
            "2025-01-05,expense,12.34,Groceries,Corner shop",
        ]
    );
}

#[test]
fn export_entries_writes_pretty_json_for_the_active_user_only() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    // Format matching is case-insensitive.
    run_export(&conn, "JSON", out_path.to_str().unwrap()).unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "date": "2025-01-02",
                "type": "income",
                "amount": "3000.00",
                "category": "Salary",
                "description": null
            },
            {
                "date": "2025-01-05",
                "type": "expense",
                "amount": "12.34",
                "category": "Groceries",
                "description": "Corner shop"
            }
        ])
    );
}

#[test]
fn export_entries_skips_unknown_formats() {
    let conn = setup();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    // The handler reports the unsupported format on stderr and exits cleanly
    // without creating the file.
    run_export(&conn, "xml", out_path.to_str().unwrap()).unwrap();
    assert!(!out_path.exists());
}
