// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::CoreError;
use crate::utils::{active_user, clamp_to_month, days_in_month, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{Datelike, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("periods", sub)) => periods(conn, sub)?,
        Some(("view", sub)) => view(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn periods(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut years = years(conn, user.id)?;
    if years.is_empty() {
        years.push(Utc::now().date_naive().year());
    }
    if !maybe_print_json(json_flag, jsonl_flag, &years)? {
        let data = years.iter().map(|y| vec![y.to_string()]).collect();
        println!("{}", pretty_table(&["Year"], data));
    }
    Ok(())
}

pub fn years(conn: &Connection, user_id: i64) -> Result<Vec<i32>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT year FROM month_history WHERE user_id=?1 ORDER BY year DESC")?;
    let rows = stmt.query_map(params![user_id], |r| r.get::<_, i32>(0))?;
    let mut years = Vec::new();
    for row in rows {
        years.push(row?);
    }
    Ok(years)
}

#[derive(Serialize)]
pub struct PeriodRow {
    pub period: String,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// One row per calendar day of the month, or per month of the year, with
/// days/months absent from the rollups zero-filled.
fn view(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let year = *sub.get_one::<i32>("year").unwrap();

    let data = match sub.get_one::<u32>("month") {
        Some(&month) => {
            if !(1..=12).contains(&month) {
                return Err(
                    CoreError::Validation(format!("Month must be 1..=12, got {}", month)).into(),
                );
            }
            month_series(conn, user.id, year, month)?
        }
        None => year_series(conn, user.id, year)?,
    };

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|p| {
                vec![
                    p.period.clone(),
                    p.income.to_string(),
                    p.expense.to_string(),
                    p.net.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Period", "Income", "Expense", "Net"], rows)
        );
    }
    Ok(())
}

pub fn month_series(
    conn: &Connection,
    user_id: i64,
    year: i32,
    month: u32,
) -> Result<Vec<PeriodRow>> {
    let mut buckets: HashMap<u32, (Decimal, Decimal)> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT day, income, expense FROM month_history
         WHERE user_id=?1 AND year=?2 AND month=?3",
    )?;
    let rows = stmt.query_map(params![user_id, year, month], |r| {
        Ok((
            r.get::<_, u32>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (day, income, expense) = row?;
        buckets.insert(
            day,
            (
                Decimal::from_str_exact(&income)?,
                Decimal::from_str_exact(&expense)?,
            ),
        );
    }
    let mut data = Vec::new();
    for day in 1..=days_in_month(year, month) {
        let (income, expense) = buckets
            .get(&day)
            .copied()
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        data.push(PeriodRow {
            period: clamp_to_month(year, month, day).to_string(),
            income,
            expense,
            net: income - expense,
        });
    }
    Ok(data)
}

pub fn year_series(conn: &Connection, user_id: i64, year: i32) -> Result<Vec<PeriodRow>> {
    let mut buckets: HashMap<u32, (Decimal, Decimal)> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT month, income, expense FROM year_history
         WHERE user_id=?1 AND year=?2",
    )?;
    let rows = stmt.query_map(params![user_id, year], |r| {
        Ok((
            r.get::<_, u32>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (month, income, expense) = row?;
        buckets.insert(
            month,
            (
                Decimal::from_str_exact(&income)?,
                Decimal::from_str_exact(&expense)?,
            ),
        );
    }
    let mut data = Vec::new();
    for month in 1..=12u32 {
        let (income, expense) = buckets
            .get(&month)
            .copied()
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        data.push(PeriodRow {
            period: format!("{:04}-{:02}", year, month),
            income,
            expense,
            net: income - expense,
        });
    }
    Ok(data)
}
