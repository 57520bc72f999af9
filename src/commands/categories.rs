// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::CoreError;
use crate::models::{Category, EntryKind};
use crate::utils::{active_user, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};
use std::str::FromStr;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = active_user(conn)?;
            let name = sub.get_one::<String>("name").unwrap();
            let kind = EntryKind::from_str(sub.get_one::<String>("type").unwrap())?;
            let icon = sub.get_one::<String>("icon").map(|s| s.as_str()).unwrap_or("");
            conn.execute(
                "INSERT INTO categories(user_id, name, icon, type) VALUES (?1, ?2, ?3, ?4)",
                params![user.id, name, icon, kind.as_str()],
            )?;
            println!("Added {} category '{}'", kind, name);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let user = active_user(conn)?;
            let name = sub.get_one::<String>("name").unwrap();
            let kind = EntryKind::from_str(sub.get_one::<String>("type").unwrap())?;
            let n = conn.execute(
                "DELETE FROM categories WHERE user_id=?1 AND name=?2 AND type=?3",
                params![user.id, name, kind.as_str()],
            )?;
            if n == 0 {
                return Err(CoreError::CategoryNotFound(name.clone()).into());
            }
            // Entries keep the denormalized name/icon they were created with.
            println!("Removed {} category '{}'", kind, name);
        }
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");

    let mut sql =
        String::from("SELECT id, name, icon, type FROM categories WHERE user_id=?1");
    let mut params_vec: Vec<String> = vec![user.id.to_string()];
    if let Some(t) = sub.get_one::<String>("type") {
        EntryKind::from_str(t)?;
        sql.push_str(" AND type=?2");
        params_vec.push(t.clone());
    }
    sql.push_str(" ORDER BY type, name");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> =
        params_vec.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut cats: Vec<Category> = Vec::new();
    while let Some(r) = rows.next()? {
        let kind: String = r.get(3)?;
        cats.push(Category {
            id: r.get(0)?,
            name: r.get(1)?,
            icon: r.get(2)?,
            kind: kind.parse()?,
        });
    }
    if !maybe_print_json(json_flag, jsonl_flag, &cats)? {
        let data = cats
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.icon.clone(),
                    c.name.clone(),
                    c.kind.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Id", "Icon", "Name", "Type"], data));
    }
    Ok(())
}
