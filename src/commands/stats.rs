// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::CoreError;
use crate::models::EntryKind;
use crate::utils::{active_user, fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("balance", sub)) => balance(conn, sub)?,
        Some(("categories", sub)) => categories(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct Balance {
    from: String,
    to: String,
    currency: String,
    income: Decimal,
    expense: Decimal,
    net: Decimal,
}

fn balance(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = parse_date(sub.get_one::<String>("to").unwrap())?;
    if from > to {
        return Err(
            CoreError::Validation(format!("Invalid range: {} is after {}", from, to)).into(),
        );
    }

    let (income, expense) = balance_totals(conn, user.id, from, to)?;
    let b = Balance {
        from: from.to_string(),
        to: to.to_string(),
        currency: user.currency.clone(),
        income,
        expense,
        net: income - expense,
    };
    if !maybe_print_json(json_flag, jsonl_flag, &b)? {
        println!(
            "{}",
            pretty_table(
                &["Income", "Expense", "Net"],
                vec![vec![
                    fmt_money(&b.income, &user.currency),
                    fmt_money(&b.expense, &user.currency),
                    fmt_money(&b.net, &user.currency),
                ]],
            )
        );
    }
    Ok(())
}

pub fn balance_totals(
    conn: &Connection,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(Decimal, Decimal)> {
    let mut stmt =
        conn.prepare("SELECT type, amount FROM entries WHERE user_id=?1 AND date>=?2 AND date<=?3")?;
    let rows = stmt.query_map(
        params![user_id, from.to_string(), to.to_string()],
        |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
    )?;
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for row in rows {
        let (t, a) = row?;
        let amount = Decimal::from_str_exact(&a)?;
        match t.parse::<EntryKind>()? {
            EntryKind::Income => income += amount,
            EntryKind::Expense => expense += amount,
        }
    }
    Ok((income, expense))
}

#[derive(Serialize)]
pub struct CategoryStat {
    pub kind: EntryKind,
    pub category: String,
    pub icon: String,
    pub amount: Decimal,
    pub percent: Decimal,
}

fn categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = parse_date(sub.get_one::<String>("to").unwrap())?;
    if from > to {
        return Err(
            CoreError::Validation(format!("Invalid range: {} is after {}", from, to)).into(),
        );
    }
    let filter = sub
        .get_one::<String>("type")
        .map(|s| EntryKind::from_str(s))
        .transpose()?;

    let stats = category_stats(conn, user.id, from, to, filter)?;
    if !maybe_print_json(json_flag, jsonl_flag, &stats)? {
        let data = stats
            .iter()
            .map(|s| {
                let category = if s.icon.is_empty() {
                    s.category.clone()
                } else {
                    format!("{} {}", s.icon, s.category)
                };
                vec![
                    s.kind.to_string(),
                    category,
                    fmt_money(&s.amount, &user.currency),
                    format!("{}%", s.percent),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Type", "Category", "Amount", "Share"], data)
        );
    }
    Ok(())
}

/// Per-category sums with each category's share of its kind's total,
/// largest amounts first within a kind.
pub fn category_stats(
    conn: &Connection,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
    filter: Option<EntryKind>,
) -> Result<Vec<CategoryStat>> {
    let mut stmt = conn.prepare(
        "SELECT type, category, category_icon, amount
         FROM entries WHERE user_id=?1 AND date>=?2 AND date<=?3",
    )?;
    let rows = stmt.query_map(
        params![user_id, from.to_string(), to.to_string()],
        |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
            ))
        },
    )?;

    let mut agg: HashMap<(EntryKind, String, String), Decimal> = HashMap::new();
    let mut totals: HashMap<EntryKind, Decimal> = HashMap::new();
    for row in rows {
        let (t, category, icon, a) = row?;
        let kind = t.parse::<EntryKind>()?;
        if let Some(f) = filter {
            if kind != f {
                continue;
            }
        }
        let amount = Decimal::from_str_exact(&a)?;
        *agg.entry((kind, category, icon)).or_insert(Decimal::ZERO) += amount;
        *totals.entry(kind).or_insert(Decimal::ZERO) += amount;
    }

    let mut stats: Vec<CategoryStat> = agg
        .into_iter()
        .map(|((kind, category, icon), amount)| {
            let total = totals.get(&kind).copied().unwrap_or(Decimal::ZERO);
            let percent = if total > Decimal::ZERO {
                (amount / total * Decimal::from(100)).round_dp(1)
            } else {
                Decimal::ZERO
            };
            CategoryStat {
                kind,
                category,
                icon,
                amount,
                percent,
            }
        })
        .collect();
    stats.sort_by(|a, b| {
        a.kind
            .as_str()
            .cmp(b.kind.as_str())
            .then(b.amount.cmp(&a.amount))
            .then_with(|| a.category.cmp(&b.category))
    });
    Ok(stats)
}
