// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::CoreError;
use crate::models::Goal;
use crate::utils::{
    active_user, fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("progress", sub)) => progress(conn, sub)?,
        Some(("rm", sub)) => {
            let user = active_user(conn)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM goals WHERE user_id=?1 AND id=?2",
                params![user.id, id],
            )?;
            if n == 0 {
                return Err(CoreError::GoalNotFound(id).into());
            }
            println!("Removed goal {}", id);
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let name = sub.get_one::<String>("name").unwrap();
    let target = parse_decimal(sub.get_one::<String>("target").unwrap())?;
    if target <= Decimal::ZERO {
        return Err(
            CoreError::Validation(format!("Target amount must be positive, got {}", target))
                .into(),
        );
    }
    let current = match sub.get_one::<String>("current") {
        Some(s) => {
            let c = parse_decimal(s)?;
            if c < Decimal::ZERO {
                return Err(CoreError::Validation(format!(
                    "Current amount cannot be negative, got {}",
                    c
                ))
                .into());
            }
            c
        }
        None => Decimal::ZERO,
    };
    let kind = sub.get_one::<String>("kind").unwrap();
    let date = sub
        .get_one::<String>("date")
        .map(|s| parse_date(s))
        .transpose()?;
    conn.execute(
        "INSERT INTO goals(user_id, name, description, target_amount, current_amount, kind, target_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            name,
            sub.get_one::<String>("description"),
            target.to_string(),
            current.to_string(),
            kind,
            date.map(|d| d.to_string()),
        ],
    )?;
    println!(
        "Added goal '{}' targeting {}",
        name,
        fmt_money(&target, &user.currency)
    );
    Ok(())
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut goal = load(conn, user.id, id)?;

    if let Some(n) = sub.get_one::<String>("name") {
        goal.name = n.clone();
    }
    if let Some(t) = sub.get_one::<String>("target") {
        let target = parse_decimal(t)?;
        if target <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "Target amount must be positive, got {}",
                target
            ))
            .into());
        }
        goal.target_amount = target;
    }
    if let Some(k) = sub.get_one::<String>("kind") {
        goal.kind = k.clone();
    }
    if let Some(d) = sub.get_one::<String>("date") {
        goal.target_date = Some(parse_date(d)?);
    }
    if let Some(d) = sub.get_one::<String>("description") {
        goal.description = Some(d.clone());
    }

    conn.execute(
        "UPDATE goals SET name=?1, description=?2, target_amount=?3, kind=?4, target_date=?5
         WHERE user_id=?6 AND id=?7",
        params![
            goal.name,
            goal.description,
            goal.target_amount.to_string(),
            goal.kind,
            goal.target_date.map(|d| d.to_string()),
            user.id,
            id,
        ],
    )?;
    println!("Updated goal {}", id);
    Ok(())
}

fn progress(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = parse_decimal(sub.get_one::<String>("current").unwrap())?;
    if current < Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "Current amount cannot be negative, got {}",
            current
        ))
        .into());
    }
    let goal = load(conn, user.id, id)?;
    conn.execute(
        "UPDATE goals SET current_amount=?1 WHERE user_id=?2 AND id=?3",
        params![current.to_string(), user.id, id],
    )?;
    println!(
        "Goal '{}' now at {} of {} ({}%)",
        goal.name,
        fmt_money(&current, &user.currency),
        fmt_money(&goal.target_amount, &user.currency),
        percent(&current, &goal.target_amount)
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut stmt = conn.prepare(
        "SELECT id, name, description, target_amount, current_amount, kind, target_date
         FROM goals WHERE user_id=?1 ORDER BY id",
    )?;
    let mut rows = stmt.query(params![user.id])?;
    let mut goals: Vec<Goal> = Vec::new();
    while let Some(r) = rows.next()? {
        goals.push(read_row(r)?);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &goals)? {
        let data = goals
            .iter()
            .map(|g| {
                vec![
                    g.id.to_string(),
                    g.name.clone(),
                    g.kind.clone(),
                    fmt_money(&g.target_amount, &user.currency),
                    fmt_money(&g.current_amount, &user.currency),
                    format!("{}%", percent(&g.current_amount, &g.target_amount)),
                    g.target_date.map(|d| d.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Name", "Kind", "Target", "Saved", "Progress", "Target date"],
                data,
            )
        );
    }
    Ok(())
}

fn percent(current: &Decimal, target: &Decimal) -> Decimal {
    if *target > Decimal::ZERO {
        (current / target * Decimal::from(100)).round_dp(1)
    } else {
        Decimal::ZERO
    }
}

fn load(conn: &Connection, user_id: i64, id: i64) -> Result<Goal> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, target_amount, current_amount, kind, target_date
         FROM goals WHERE user_id=?1 AND id=?2",
    )?;
    let mut rows = stmt.query(params![user_id, id])?;
    match rows.next()? {
        Some(r) => read_row(r),
        None => Err(CoreError::GoalNotFound(id).into()),
    }
}

fn read_row(r: &rusqlite::Row<'_>) -> Result<Goal> {
    let target: String = r.get(3)?;
    let current: String = r.get(4)?;
    let date: Option<String> = r.get(6)?;
    Ok(Goal {
        id: r.get(0)?,
        name: r.get(1)?,
        description: r.get(2)?,
        target_amount: Decimal::from_str_exact(&target)?,
        current_amount: Decimal::from_str_exact(&current)?,
        kind: r.get(5)?,
        target_date: date
            .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()?,
    })
}
