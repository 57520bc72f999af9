// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::EntryKind;

pub struct EntryDraft {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
}

/// Insert one entry and bump the matching day and month rollup buckets, all
/// inside a single immediate transaction. The immediate behavior takes the
/// write lock at BEGIN, so concurrent operations against the same bucket
/// serialize their read-modify-write instead of clobbering each other.
pub fn record_entry(
    conn: &mut Connection,
    user_id: i64,
    draft: &EntryDraft,
) -> Result<i64, CoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let id = record_entry_tx(&tx, user_id, draft)?;
    tx.commit()?;
    Ok(id)
}

/// Same as [`record_entry`] but runs inside a transaction the caller owns.
/// The CSV importer uses this to make a whole file one atomic unit.
pub fn record_entry_tx(
    tx: &Connection,
    user_id: i64,
    draft: &EntryDraft,
) -> Result<i64, CoreError> {
    if draft.amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "Amount must be positive, got {}",
            draft.amount
        )));
    }
    let icon: Option<String> = tx
        .query_row(
            "SELECT icon FROM categories WHERE user_id=?1 AND name=?2 AND type=?3",
            params![user_id, draft.category, draft.kind.as_str()],
            |r| r.get(0),
        )
        .optional()?;
    let Some(icon) = icon else {
        return Err(CoreError::CategoryNotFound(draft.category.clone()));
    };

    tx.execute(
        "INSERT INTO entries(user_id, date, type, amount, category, category_icon, description)
         VALUES (?1,?2,?3,?4,?5,?6,?7)",
        params![
            user_id,
            draft.date.to_string(),
            draft.kind.as_str(),
            draft.amount.to_string(),
            draft.category,
            icon,
            draft.description
        ],
    )?;
    let id = tx.last_insert_rowid();
    bump_buckets(tx, user_id, draft.date, draft.kind, draft.amount)?;
    Ok(id)
}

/// Delete one entry and decrement both buckets symmetrically, as one
/// transaction. A missing or foreign-owned id is rejected before any write;
/// the two cases are indistinguishable to the caller.
pub fn remove_entry(conn: &mut Connection, user_id: i64, entry_id: i64) -> Result<(), CoreError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let row: Option<(String, String, String)> = tx
        .query_row(
            "SELECT date, type, amount FROM entries WHERE id=?1 AND user_id=?2",
            params![entry_id, user_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let Some((date_s, kind_s, amount_s)) = row else {
        return Err(CoreError::EntryNotFound(entry_id));
    };
    let date = parse_stored_date(&date_s)?;
    let kind: EntryKind = kind_s
        .parse()
        .map_err(|_| CoreError::Corrupt(format!("Entry {} has type '{}'", entry_id, kind_s)))?;
    let amount = parse_stored_decimal(&amount_s)?;

    tx.execute(
        "DELETE FROM entries WHERE id=?1 AND user_id=?2",
        params![entry_id, user_id],
    )?;
    bump_buckets(&tx, user_id, date, kind, -amount)?;
    tx.commit()?;
    Ok(())
}

fn bump_buckets(
    conn: &Connection,
    user_id: i64,
    date: NaiveDate,
    kind: EntryKind,
    delta: Decimal,
) -> Result<(), CoreError> {
    bump_month_history(conn, user_id, date, kind, delta)?;
    bump_year_history(conn, user_id, date, kind, delta)?;
    Ok(())
}

fn bump_month_history(
    conn: &Connection,
    user_id: i64,
    date: NaiveDate,
    kind: EntryKind,
    delta: Decimal,
) -> Result<(), CoreError> {
    let existing: Option<(String, String)> = conn
        .query_row(
            "SELECT income, expense FROM month_history
             WHERE user_id=?1 AND year=?2 AND month=?3 AND day=?4",
            params![user_id, date.year(), date.month(), date.day()],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let (mut income, mut expense) = split_bucket(existing)?;
    match kind {
        EntryKind::Income => income += delta,
        EntryKind::Expense => expense += delta,
    }
    conn.execute(
        "INSERT INTO month_history(user_id, year, month, day, income, expense)
         VALUES (?1,?2,?3,?4,?5,?6)
         ON CONFLICT(user_id, year, month, day)
         DO UPDATE SET income=excluded.income, expense=excluded.expense",
        params![
            user_id,
            date.year(),
            date.month(),
            date.day(),
            income.to_string(),
            expense.to_string()
        ],
    )?;
    Ok(())
}

fn bump_year_history(
    conn: &Connection,
    user_id: i64,
    date: NaiveDate,
    kind: EntryKind,
    delta: Decimal,
) -> Result<(), CoreError> {
    let existing: Option<(String, String)> = conn
        .query_row(
            "SELECT income, expense FROM year_history
             WHERE user_id=?1 AND year=?2 AND month=?3",
            params![user_id, date.year(), date.month()],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let (mut income, mut expense) = split_bucket(existing)?;
    match kind {
        EntryKind::Income => income += delta,
        EntryKind::Expense => expense += delta,
    }
    conn.execute(
        "INSERT INTO year_history(user_id, year, month, income, expense)
         VALUES (?1,?2,?3,?4,?5)
         ON CONFLICT(user_id, year, month)
         DO UPDATE SET income=excluded.income, expense=excluded.expense",
        params![
            user_id,
            date.year(),
            date.month(),
            income.to_string(),
            expense.to_string()
        ],
    )?;
    Ok(())
}

fn split_bucket(row: Option<(String, String)>) -> Result<(Decimal, Decimal), CoreError> {
    match row {
        Some((i, e)) => Ok((parse_stored_decimal(&i)?, parse_stored_decimal(&e)?)),
        None => Ok((Decimal::ZERO, Decimal::ZERO)),
    }
}

fn parse_stored_decimal(s: &str) -> Result<Decimal, CoreError> {
    s.parse::<Decimal>()
        .map_err(|_| CoreError::Corrupt(format!("Stored amount '{}' is not a decimal", s)))
}

fn parse_stored_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CoreError::Corrupt(format!("Stored date '{}' is not YYYY-MM-DD", s)))
}
