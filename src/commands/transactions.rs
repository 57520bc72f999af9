// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, EntryDraft};
use crate::models::{Entry, EntryKind};
use crate::utils::{active_user, maybe_print_json, parse_date, parse_decimal, parse_month, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use std::str::FromStr;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("rm", sub)) => {
            let user = active_user(conn)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            ledger::remove_entry(conn, user.id, id)?;
            println!("Removed entry {}", id);
        }
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let draft = EntryDraft {
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        kind: EntryKind::from_str(sub.get_one::<String>("type").unwrap())?,
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        category: sub.get_one::<String>("category").unwrap().clone(),
        description: sub.get_one::<String>("description").map(|s| s.to_string()),
    };
    let id = ledger::record_entry(conn, user.id, &draft)?;
    println!(
        "Recorded {} {} on {} in '{}' (id {})",
        draft.kind, draft.amount, draft.date, draft.category, id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, user.id, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                let category = if e.category_icon.is_empty() {
                    e.category.clone()
                } else {
                    format!("{} {}", e.category_icon, e.category)
                };
                vec![
                    e.id.to_string(),
                    e.date.to_string(),
                    e.kind.to_string(),
                    category,
                    e.amount.to_string(),
                    e.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Type", "Category", "Amount", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, user_id: i64, sub: &clap::ArgMatches) -> Result<Vec<Entry>> {
    let mut sql = String::from(
        "SELECT id, date, type, amount, category, category_icon, description
         FROM entries WHERE user_id=?",
    );
    let mut params_vec: Vec<String> = vec![user_id.to_string()];

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(date,1,7)=?");
        params_vec.push(parse_month(month)?);
    }
    if let Some(from) = sub.get_one::<String>("from") {
        sql.push_str(" AND date>=?");
        params_vec.push(parse_date(from)?.to_string());
    }
    if let Some(to) = sub.get_one::<String>("to") {
        sql.push_str(" AND date<=?");
        params_vec.push(parse_date(to)?.to_string());
    }
    if let Some(t) = sub.get_one::<String>("type") {
        EntryKind::from_str(t)?;
        sql.push_str(" AND type=?");
        params_vec.push(t.clone());
    }
    sql.push_str(" ORDER BY date DESC, id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let date: String = r.get(1)?;
        let kind: String = r.get(2)?;
        let amount: String = r.get(3)?;
        data.push(Entry {
            id: r.get(0)?,
            date: chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")?,
            kind: kind.parse()?,
            amount: rust_decimal::Decimal::from_str_exact(&amount)?,
            category: r.get(4)?,
            category_icon: r.get(5)?,
            description: r.get(6)?,
        });
    }
    Ok(data)
}
