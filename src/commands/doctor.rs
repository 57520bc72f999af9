// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{EntryKind, Frequency};
use crate::schedule::Cadence;
use crate::utils::pretty_table;
use anyhow::Result;
use chrono::Datelike;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;

type Bucket = (Decimal, Decimal);

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = audit(conn)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn audit(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Recompute per-day and per-month sums from the entries and diff them
    //    against both rollup tables.
    let mut day_expected: HashMap<(i64, i32, u32, u32), Bucket> = HashMap::new();
    let mut month_expected: HashMap<(i64, i32, u32), Bucket> = HashMap::new();
    let mut stmt = conn.prepare("SELECT user_id, date, type, amount FROM entries")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let user_id: i64 = r.get(0)?;
        let date_s: String = r.get(1)?;
        let type_s: String = r.get(2)?;
        let amount_s: String = r.get(3)?;
        let date = chrono::NaiveDate::parse_from_str(&date_s, "%Y-%m-%d")?;
        let amount = Decimal::from_str_exact(&amount_s)?;
        let kind = type_s.parse::<EntryKind>()?;
        let day = day_expected
            .entry((user_id, date.year(), date.month(), date.day()))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        let month = month_expected
            .entry((user_id, date.year(), date.month()))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match kind {
            EntryKind::Income => {
                day.0 += amount;
                month.0 += amount;
            }
            EntryKind::Expense => {
                day.1 += amount;
                month.1 += amount;
            }
        }
    }

    let mut day_stored: HashMap<(i64, i32, u32, u32), Bucket> = HashMap::new();
    let mut stmt2 =
        conn.prepare("SELECT user_id, year, month, day, income, expense FROM month_history")?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let key = (
            r.get::<_, i64>(0)?,
            r.get::<_, i32>(1)?,
            r.get::<_, u32>(2)?,
            r.get::<_, u32>(3)?,
        );
        let income = Decimal::from_str_exact(&r.get::<_, String>(4)?)?;
        let expense = Decimal::from_str_exact(&r.get::<_, String>(5)?)?;
        if income < Decimal::ZERO || expense < Decimal::ZERO {
            rows.push(vec![
                "negative_day_bucket".into(),
                format!(
                    "user {} {}-{:02}-{:02}: {}/{}",
                    key.0, key.1, key.2, key.3, income, expense
                ),
            ]);
        }
        day_stored.insert(key, (income, expense));
    }
    for (key, expected) in &day_expected {
        let stored = day_stored
            .get(key)
            .copied()
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        if stored != *expected {
            rows.push(vec![
                "day_bucket_drift".into(),
                format!(
                    "user {} {}-{:02}-{:02}: stored {}/{}, entries say {}/{}",
                    key.0, key.1, key.2, key.3, stored.0, stored.1, expected.0, expected.1
                ),
            ]);
        }
    }
    for (key, stored) in &day_stored {
        if !day_expected.contains_key(key)
            && (stored.0 != Decimal::ZERO || stored.1 != Decimal::ZERO)
        {
            rows.push(vec![
                "orphan_day_bucket".into(),
                format!(
                    "user {} {}-{:02}-{:02}: {}/{}",
                    key.0, key.1, key.2, key.3, stored.0, stored.1
                ),
            ]);
        }
    }

    let mut month_stored: HashMap<(i64, i32, u32), Bucket> = HashMap::new();
    let mut stmt3 =
        conn.prepare("SELECT user_id, year, month, income, expense FROM year_history")?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let key = (
            r.get::<_, i64>(0)?,
            r.get::<_, i32>(1)?,
            r.get::<_, u32>(2)?,
        );
        let income = Decimal::from_str_exact(&r.get::<_, String>(3)?)?;
        let expense = Decimal::from_str_exact(&r.get::<_, String>(4)?)?;
        if income < Decimal::ZERO || expense < Decimal::ZERO {
            rows.push(vec![
                "negative_month_bucket".into(),
                format!("user {} {}-{:02}: {}/{}", key.0, key.1, key.2, income, expense),
            ]);
        }
        month_stored.insert(key, (income, expense));
    }
    for (key, expected) in &month_expected {
        let stored = month_stored
            .get(key)
            .copied()
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        if stored != *expected {
            rows.push(vec![
                "month_bucket_drift".into(),
                format!(
                    "user {} {}-{:02}: stored {}/{}, entries say {}/{}",
                    key.0, key.1, key.2, stored.0, stored.1, expected.0, expected.1
                ),
            ]);
        }
    }
    for (key, stored) in &month_stored {
        if !month_expected.contains_key(key)
            && (stored.0 != Decimal::ZERO || stored.1 != Decimal::ZERO)
        {
            rows.push(vec![
                "orphan_month_bucket".into(),
                format!("user {} {}-{:02}: {}/{}", key.0, key.1, key.2, stored.0, stored.1),
            ]);
        }
    }

    // 2) Obligations whose cadence fields no longer validate
    let mut stmt4 = conn
        .prepare("SELECT id, frequency, day_of_month, day_of_week FROM obligations ORDER BY id")?;
    let mut cur4 = stmt4.query([])?;
    while let Some(r) = cur4.next()? {
        let id: i64 = r.get(0)?;
        let freq_s: String = r.get(1)?;
        let dom: Option<u32> = r.get(2)?;
        let dow: Option<u32> = r.get(3)?;
        match freq_s.parse::<Frequency>() {
            Ok(f) => {
                if let Err(e) = Cadence::new(f, dom, dow) {
                    rows.push(vec!["bad_cadence".into(), format!("obligation {}: {}", id, e)]);
                } else {
                    let stray = match f {
                        Frequency::Monthly => dow.is_some(),
                        Frequency::Weekly => dom.is_some(),
                        Frequency::Yearly => dom.is_some() || dow.is_some(),
                    };
                    if stray {
                        rows.push(vec![
                            "stray_cadence_field".into(),
                            format!("obligation {}: day field not used by {}", id, f),
                        ]);
                    }
                }
            }
            Err(e) => rows.push(vec!["bad_cadence".into(), format!("obligation {}: {}", id, e)]),
        }
    }

    Ok(rows)
}
