// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use crate::utils::{
    active_user, get_setting, maybe_print_json, parse_currency, pretty_table, set_setting,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let ccy = parse_currency(sub.get_one::<String>("currency").unwrap())?;
            conn.execute(
                "INSERT INTO users(name, currency) VALUES (?1, ?2)",
                params![name, ccy],
            )?;
            let id = conn.last_insert_rowid();
            if get_setting(conn, "active_user")?.is_none() {
                set_setting(conn, "active_user", &id.to_string())?;
                println!("Added user '{}' ({}) and made it active", name, ccy);
            } else {
                println!("Added user '{}' ({})", name, ccy);
            }
        }
        Some(("switch", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id: i64 = conn
                .query_row("SELECT id FROM users WHERE name=?1", params![name], |r| {
                    r.get(0)
                })
                .optional()?
                .with_context(|| format!("No user named '{}'", name))?;
            set_setting(conn, "active_user", &id.to_string())?;
            println!("Switched to user '{}'", name);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let active_id = get_setting(conn, "active_user")?
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(-1);
            let mut stmt = conn.prepare("SELECT id, name, currency FROM users ORDER BY name")?;
            let rows = stmt.query_map([], |r| {
                Ok(User {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    currency: r.get(2)?,
                })
            })?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            if !maybe_print_json(json_flag, jsonl_flag, &users)? {
                let data = users
                    .iter()
                    .map(|u| {
                        vec![
                            if u.id == active_id { "*" } else { "" }.to_string(),
                            u.name.clone(),
                            u.currency.clone(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Active", "Name", "Currency"], data));
            }
        }
        Some(("set-currency", sub)) => {
            let user = active_user(conn)?;
            let ccy = parse_currency(sub.get_one::<String>("currency").unwrap())?;
            conn.execute(
                "UPDATE users SET currency=?1 WHERE id=?2",
                params![ccy, user.id],
            )?;
            println!("Set currency to {} for '{}'", ccy, user.name);
        }
        _ => {}
    }
    Ok(())
}
