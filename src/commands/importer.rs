// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, EntryDraft};
use crate::models::EntryKind;
use crate::utils::{active_user, parse_date, parse_decimal};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::{Connection, TransactionBehavior};
use std::str::FromStr;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("entries", sub)) => import_entries(conn, sub),
        _ => Ok(()),
    }
}

fn import_entries(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = active_user(conn)?;
    let path = sub.get_one::<String>("path").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    // One transaction per file: a malformed row aborts the whole import and
    // leaves the rollups untouched.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut imported = 0usize;
    for result in rdr.records() {
        let rec = result?;
        let date_raw = rec.get(0).context("date missing")?.trim().to_string();
        let type_raw = rec.get(1).context("type missing")?.trim().to_string();
        let amount_raw = rec.get(2).context("amount missing")?.trim().to_string();
        let category = rec.get(3).context("category missing")?.trim().to_string();
        let description = rec
            .get(4)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let draft = EntryDraft {
            date: parse_date(&date_raw)
                .with_context(|| format!("Invalid entry date '{}'", date_raw))?,
            kind: EntryKind::from_str(&type_raw)?,
            amount: parse_decimal(&amount_raw)
                .with_context(|| format!("Invalid amount '{}' for {}", amount_raw, category))?,
            category,
            description,
        };
        ledger::record_entry_tx(&tx, user.id, &draft)?;
        imported += 1;
    }
    tx.commit()?;
    println!("Imported {} entries from {}", imported, path);
    Ok(())
}
