// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::advisor::{self, ReportData, SummaryRow};
use crate::errors::CoreError;
use crate::models::{Entry, EntryKind, ReportKind};
use crate::utils::{active_user, clamp_to_month, days_in_month, parse_date};
use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let report = ReportKind::from_str(m.get_one::<String>("report").unwrap())?;
    let today = Utc::now().date_naive();

    let (period, from, to) = match report {
        ReportKind::Daily => {
            let day = match m.get_one::<String>("date") {
                Some(s) => parse_date(s)?,
                None => today,
            };
            (day.to_string(), day, day)
        }
        ReportKind::Monthly => {
            let year = m.get_one::<i32>("year").copied().unwrap_or(today.year());
            let month = m.get_one::<u32>("month").copied().unwrap_or(today.month());
            if !(1..=12).contains(&month) {
                return Err(
                    CoreError::Validation(format!("Month must be 1..=12, got {}", month)).into(),
                );
            }
            let from = clamp_to_month(year, month, 1);
            let to = clamp_to_month(year, month, days_in_month(year, month));
            (format!("{:04}-{:02}", year, month), from, to)
        }
    };

    // The gate is checked and charged before any report data is assembled;
    // an empty ledger still consumes a call.
    let now = Utc::now();
    let calls = advisor::recent_calls(conn, user.id, report)?;
    if let Err(denial) = advisor::evaluate(now, &calls) {
        println!("{}", denial);
        return Ok(());
    }
    advisor::charge(conn, user.id, report, now)?;

    let data = ReportData {
        report,
        currency: user.currency.clone(),
        period,
        summary: summary_rows(conn, user.id, report, from)?,
        entries: entries_between(conn, user.id, from, to)?,
    };
    let text = advisor::generate(conn, &data)?;
    println!("{}", text);
    Ok(())
}

fn summary_rows(
    conn: &Connection,
    user_id: i64,
    report: ReportKind,
    from: NaiveDate,
) -> Result<Vec<SummaryRow>> {
    let mut out = Vec::new();
    match report {
        ReportKind::Monthly => {
            let mut stmt = conn.prepare(
                "SELECT day, income, expense FROM month_history
                 WHERE user_id=?1 AND year=?2 AND month=?3 ORDER BY day",
            )?;
            let rows = stmt.query_map(params![user_id, from.year(), from.month()], |r| {
                Ok((
                    r.get::<_, u32>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (day, income, expense) = row?;
                out.push(SummaryRow {
                    label: clamp_to_month(from.year(), from.month(), day).to_string(),
                    income: Decimal::from_str_exact(&income)?,
                    expense: Decimal::from_str_exact(&expense)?,
                });
            }
        }
        ReportKind::Daily => {
            let mut stmt = conn.prepare(
                "SELECT income, expense FROM month_history
                 WHERE user_id=?1 AND year=?2 AND month=?3 AND day=?4",
            )?;
            let mut rows = stmt.query(params![user_id, from.year(), from.month(), from.day()])?;
            if let Some(r) = rows.next()? {
                let income: String = r.get(0)?;
                let expense: String = r.get(1)?;
                out.push(SummaryRow {
                    label: from.to_string(),
                    income: Decimal::from_str_exact(&income)?,
                    expense: Decimal::from_str_exact(&expense)?,
                });
            }
        }
    }
    Ok(out)
}

fn entries_between(
    conn: &Connection,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Entry>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, type, amount, category, category_icon, description
         FROM entries WHERE user_id=?1 AND date>=?2 AND date<=?3 ORDER BY date, id",
    )?;
    let mut rows = stmt.query(params![user_id, from.to_string(), to.to_string()])?;
    let mut entries = Vec::new();
    while let Some(r) = rows.next()? {
        let date: String = r.get(1)?;
        let kind: String = r.get(2)?;
        let amount: String = r.get(3)?;
        entries.push(Entry {
            id: r.get(0)?,
            date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")?,
            kind: kind.parse::<EntryKind>()?,
            amount: Decimal::from_str_exact(&amount)?,
            category: r.get(4)?,
            category_icon: r.get(5)?,
            description: r.get(6)?,
        });
    }
    Ok(entries)
}
