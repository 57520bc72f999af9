// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::CoreError;
use crate::models::{EntryKind, Frequency, Obligation};
use crate::schedule::{self, Cadence};
use crate::utils::{
    active_user, fmt_money, icon_for_category, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("update", sub)) => update(conn, sub)?,
        Some(("rm", sub)) => {
            let user = active_user(conn)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            let n = conn.execute(
                "DELETE FROM obligations WHERE user_id=?1 AND id=?2",
                params![user.id, id],
            )?;
            if n == 0 {
                return Err(CoreError::ObligationNotFound(id).into());
            }
            println!("Removed obligation {}", id);
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let title = sub.get_one::<String>("title").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    if amount <= Decimal::ZERO {
        return Err(
            CoreError::Validation(format!("Amount must be positive, got {}", amount)).into(),
        );
    }
    let kind = EntryKind::from_str(sub.get_one::<String>("type").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap();
    let icon = icon_for_category(conn, user.id, category, kind)?;
    let frequency = Frequency::from_str(sub.get_one::<String>("frequency").unwrap())?;
    let cadence = Cadence::new(
        frequency,
        sub.get_one::<u32>("day-of-month").copied(),
        sub.get_one::<u32>("day-of-week").copied(),
    )?;
    let today = Utc::now().date_naive();
    let start = match sub.get_one::<String>("start") {
        Some(s) => parse_date(s)?,
        None => today,
    };
    let end = sub
        .get_one::<String>("end")
        .map(|s| parse_date(s))
        .transpose()?;
    let next_due = schedule::next_due(start, &cadence, today);

    conn.execute(
        "INSERT INTO obligations(user_id, title, amount, type, category, category_icon,
                                 frequency, day_of_month, day_of_week, start_date, end_date,
                                 next_due, active, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, ?13)",
        params![
            user.id,
            title,
            amount.to_string(),
            kind.as_str(),
            category,
            icon,
            cadence.frequency().as_str(),
            cadence.day_of_month(),
            cadence.day_of_week(),
            start.to_string(),
            end.map(|d| d.to_string()),
            next_due.to_string(),
            sub.get_one::<String>("description"),
        ],
    )?;
    println!(
        "Added obligation '{}' ({}), next due {}",
        title, frequency, next_due
    );
    Ok(())
}

fn update(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut ob = load(conn, user.id, id)?;

    if let Some(t) = sub.get_one::<String>("title") {
        ob.title = t.clone();
    }
    if let Some(a) = sub.get_one::<String>("amount") {
        let amount = parse_decimal(a)?;
        if amount <= Decimal::ZERO {
            return Err(
                CoreError::Validation(format!("Amount must be positive, got {}", amount)).into(),
            );
        }
        ob.amount = amount;
    }
    if let Some(c) = sub.get_one::<String>("category") {
        ob.category_icon = icon_for_category(conn, user.id, c, ob.kind)?;
        ob.category = c.clone();
    }
    if let Some(f) = sub.get_one::<String>("frequency") {
        ob.frequency = Frequency::from_str(f)?;
    }
    if let Some(d) = sub.get_one::<u32>("day-of-month") {
        ob.day_of_month = Some(*d);
    }
    if let Some(d) = sub.get_one::<u32>("day-of-week") {
        ob.day_of_week = Some(*d);
    }
    if let Some(s) = sub.get_one::<String>("start") {
        ob.start_date = parse_date(s)?;
    }
    if let Some(e) = sub.get_one::<String>("end") {
        ob.end_date = Some(parse_date(e)?);
    }
    if let Some(d) = sub.get_one::<String>("description") {
        ob.description = Some(d.clone());
    }
    if let Some(a) = sub.get_one::<String>("active") {
        ob.active = a == "true";
    }

    // Cadence fields are re-validated and normalized as a whole, so switching
    // frequency drops the day field the new cadence does not use.
    let cadence = Cadence::new(ob.frequency, ob.day_of_month, ob.day_of_week)?;
    let today = Utc::now().date_naive();
    ob.next_due = schedule::next_due(ob.start_date, &cadence, today);

    conn.execute(
        "UPDATE obligations
         SET title=?1, amount=?2, category=?3, category_icon=?4, frequency=?5,
             day_of_month=?6, day_of_week=?7, start_date=?8, end_date=?9,
             next_due=?10, active=?11, description=?12
         WHERE user_id=?13 AND id=?14",
        params![
            ob.title,
            ob.amount.to_string(),
            ob.category,
            ob.category_icon,
            cadence.frequency().as_str(),
            cadence.day_of_month(),
            cadence.day_of_week(),
            ob.start_date.to_string(),
            ob.end_date.map(|d| d.to_string()),
            ob.next_due.to_string(),
            ob.active,
            ob.description,
            user.id,
            id,
        ],
    )?;
    println!("Updated obligation {}, next due {}", id, ob.next_due);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let obs = query_all(conn, user.id, sub.get_flag("all"))?;
    if maybe_print_json(json_flag, jsonl_flag, &obs)? {
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let mut overdue_total = Decimal::ZERO;
    let data = obs
        .iter()
        .map(|o| {
            let overdue = o.active && o.next_due < today;
            if overdue && o.kind == EntryKind::Expense {
                overdue_total += o.amount;
            }
            let due = if overdue {
                format!("{} (overdue)", o.next_due)
            } else {
                o.next_due.to_string()
            };
            vec![
                o.id.to_string(),
                o.title.clone(),
                o.kind.to_string(),
                o.category.clone(),
                o.amount.to_string(),
                o.frequency.to_string(),
                due,
                if o.active { "yes" } else { "paused" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Title", "Type", "Category", "Amount", "Frequency", "Next due", "Active"],
            data,
        )
    );
    if overdue_total > Decimal::ZERO {
        println!("Overdue expenses: {}", fmt_money(&overdue_total, &user.currency));
    }
    Ok(())
}

pub fn query_all(conn: &Connection, user_id: i64, include_paused: bool) -> Result<Vec<Obligation>> {
    let mut sql = String::from(
        "SELECT id, title, amount, type, category, category_icon, frequency,
                day_of_month, day_of_week, start_date, end_date, next_due, active, description
         FROM obligations WHERE user_id=?1",
    );
    if !include_paused {
        sql.push_str(" AND active=1");
    }
    sql.push_str(" ORDER BY next_due, id");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![user_id])?;
    let mut obs = Vec::new();
    while let Some(r) = rows.next()? {
        obs.push(read_row(r)?);
    }
    Ok(obs)
}

fn load(conn: &Connection, user_id: i64, id: i64) -> Result<Obligation> {
    let mut stmt = conn.prepare(
        "SELECT id, title, amount, type, category, category_icon, frequency,
                day_of_month, day_of_week, start_date, end_date, next_due, active, description
         FROM obligations WHERE user_id=?1 AND id=?2",
    )?;
    let mut rows = stmt.query(params![user_id, id])?;
    match rows.next()? {
        Some(r) => read_row(r),
        None => Err(CoreError::ObligationNotFound(id).into()),
    }
}

fn read_row(r: &rusqlite::Row<'_>) -> Result<Obligation> {
    let amount: String = r.get(2)?;
    let kind: String = r.get(3)?;
    let frequency: String = r.get(6)?;
    let start: String = r.get(9)?;
    let end: Option<String> = r.get(10)?;
    let next: String = r.get(11)?;
    Ok(Obligation {
        id: r.get(0)?,
        title: r.get(1)?,
        amount: Decimal::from_str_exact(&amount)?,
        kind: kind.parse()?,
        category: r.get(4)?,
        category_icon: r.get(5)?,
        frequency: frequency.parse()?,
        day_of_month: r.get(7)?,
        day_of_week: r.get(8)?,
        start_date: NaiveDate::parse_from_str(&start, "%Y-%m-%d")?,
        end_date: end
            .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()?,
        next_due: NaiveDate::parse_from_str(&next, "%Y-%m-%d")?,
        active: r.get(12)?,
        description: r.get(13)?,
    })
}
