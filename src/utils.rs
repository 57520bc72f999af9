// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::{EntryKind, User};

const UA: &str = concat!(
    "ledgerclip/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/ledgerclip)"
);

pub const SUPPORTED_CURRENCIES: [&str; 6] = ["USD", "EUR", "JPY", "GBP", "INR", "TRY"];

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    chrono::NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_currency(s: &str) -> Result<String> {
    let ccy = s.trim().to_uppercase();
    if !SUPPORTED_CURRENCIES.contains(&ccy.as_str()) {
        anyhow::bail!(
            "Unsupported currency '{}', expected one of {}",
            s,
            SUPPORTED_CURRENCIES.join(", ")
        );
    }
    Ok(ccy)
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {}", ccy, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 => {
            if chrono::NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

/// Build a date, pulling `day` back to the month's last day when it overshoots
/// (31 in a 30-day month, 29+ in February). Never overflows into the next month.
pub fn clamp_to_month(year: i32, month: u32, day: u32) -> NaiveDate {
    let last = days_in_month(year, month);
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
        .expect("month is 1..=12 and day is clamped to its length")
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Resolve the active user profile. Every data command calls this before
/// touching user-scoped tables; without one the command fails up front.
pub fn active_user(conn: &Connection) -> Result<User> {
    let Some(id_s) = get_setting(conn, "active_user")? else {
        return Err(CoreError::Unauthenticated.into());
    };
    let id: i64 = id_s
        .parse()
        .map_err(|_| CoreError::Corrupt(format!("active_user setting '{}' is not an id", id_s)))?;
    let user = conn
        .query_row(
            "SELECT id, name, currency FROM users WHERE id=?1",
            params![id],
            |r| {
                Ok(User {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    currency: r.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user.ok_or(CoreError::Unauthenticated)?)
}

pub fn icon_for_category(
    conn: &Connection,
    user_id: i64,
    name: &str,
    kind: EntryKind,
) -> Result<String> {
    let mut stmt =
        conn.prepare("SELECT icon FROM categories WHERE user_id=?1 AND name=?2 AND type=?3")?;
    let icon: Option<String> = stmt
        .query_row(params![user_id, name, kind.as_str()], |r| r.get(0))
        .optional()?;
    Ok(icon.ok_or_else(|| CoreError::CategoryNotFound(name.to_string()))?)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
