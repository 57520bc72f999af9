// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CoreError;
use crate::models::{Entry, EntryKind, ReportKind};

pub const MAX_PER_DAY: usize = 3;
pub const COOLDOWN_HOURS: i64 = 6;
pub const MAX_PER_WINDOW: usize = 4;
pub const RETAINED_CALLS: usize = 10;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const GEN_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Why an advisory call was refused. Not an error: handlers print it and exit
/// cleanly, and nothing is recorded against the caller's budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    DailyLimit,
    Cooldown { wait_minutes: i64 },
    RollingLimit { wait_minutes: i64 },
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::DailyLimit => write!(
                f,
                "Daily advisory limit reached ({}/{}); try again tomorrow",
                MAX_PER_DAY, MAX_PER_DAY
            ),
            Denial::Cooldown { wait_minutes } => write!(
                f,
                "Advisories are limited to one per {} hours; next call possible in about {}",
                COOLDOWN_HOURS,
                fmt_wait(*wait_minutes)
            ),
            Denial::RollingLimit { wait_minutes } => write!(
                f,
                "24-hour advisory limit reached ({}/{}); next call possible in about {}",
                MAX_PER_WINDOW,
                MAX_PER_WINDOW,
                fmt_wait(*wait_minutes)
            ),
        }
    }
}

fn fmt_wait(minutes: i64) -> String {
    if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes.max(1))
    }
}

/// Apply the three gate rules to a call history. Checks run in a fixed order:
/// the calendar-day cap, then the cooldown since the most recent call, then
/// the rolling 24-hour cap. Calls older than 24 hours are ignored entirely.
pub fn evaluate(now: DateTime<Utc>, calls: &[DateTime<Utc>]) -> Result<(), Denial> {
    let window: Vec<DateTime<Utc>> = calls
        .iter()
        .copied()
        .filter(|t| now.signed_duration_since(*t) < Duration::hours(24))
        .collect();

    let today = now.date_naive();
    let today_count = window.iter().filter(|t| t.date_naive() == today).count();
    if today_count >= MAX_PER_DAY {
        return Err(Denial::DailyLimit);
    }

    if let Some(last) = window.iter().max() {
        let since_last = now.signed_duration_since(*last);
        if since_last < Duration::hours(COOLDOWN_HOURS) {
            let wait = Duration::hours(COOLDOWN_HOURS) - since_last;
            return Err(Denial::Cooldown {
                wait_minutes: wait.num_minutes(),
            });
        }
    }

    if window.len() >= MAX_PER_WINDOW {
        // the oldest call ageing out of the window is what frees a slot
        let oldest = window.iter().min().copied().unwrap_or(now);
        let wait = Duration::hours(24) - now.signed_duration_since(oldest);
        return Err(Denial::RollingLimit {
            wait_minutes: wait.num_minutes(),
        });
    }
    Ok(())
}

pub fn recent_calls(
    conn: &Connection,
    user_id: i64,
    report: ReportKind,
) -> Result<Vec<DateTime<Utc>>, CoreError> {
    let mut stmt = conn.prepare(
        "SELECT called_at FROM advisor_calls WHERE user_id=?1 AND report=?2 ORDER BY called_at",
    )?;
    let rows = stmt.query_map(params![user_id, report.as_str()], |r| r.get::<_, i64>(0))?;
    let mut out = Vec::new();
    for row in rows {
        let ms = row?;
        let Some(ts) = Utc.timestamp_millis_opt(ms).single() else {
            return Err(CoreError::Corrupt(format!(
                "Stored call timestamp {} is out of range",
                ms
            )));
        };
        out.push(ts);
    }
    Ok(out)
}

/// Record an allowed call, then trim the history to the trailing 24-hour
/// window and the retained-row bound.
pub fn charge(
    conn: &Connection,
    user_id: i64,
    report: ReportKind,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    conn.execute(
        "INSERT INTO advisor_calls(user_id, report, called_at) VALUES (?1,?2,?3)",
        params![user_id, report.as_str(), now.timestamp_millis()],
    )?;
    conn.execute(
        "DELETE FROM advisor_calls WHERE user_id=?1 AND report=?2 AND called_at <= ?3",
        params![
            user_id,
            report.as_str(),
            (now - Duration::hours(24)).timestamp_millis()
        ],
    )?;
    conn.execute(
        "DELETE FROM advisor_calls WHERE user_id=?1 AND report=?2 AND called_at NOT IN (
            SELECT called_at FROM advisor_calls WHERE user_id=?1 AND report=?2
            ORDER BY called_at DESC LIMIT ?3
        )",
        params![user_id, report.as_str(), RETAINED_CALLS as i64],
    )?;
    Ok(())
}

/// One aggregate row feeding a report: a single day's totals.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Everything the generator sees: the report window's aggregate rows plus the
/// raw entries, with the report type and display currency.
#[derive(Debug, Serialize)]
pub struct ReportData {
    pub report: ReportKind,
    pub currency: String,
    pub period: String,
    pub summary: Vec<SummaryRow>,
    pub entries: Vec<Entry>,
}

/// Produce the advisory text. With an `advisor_api_key` setting present the
/// external generator is tried first; any failure there, or no key at all,
/// downgrades to the local composer, which cannot fail on well-formed rows.
pub fn generate(conn: &Connection, data: &ReportData) -> Result<String, CoreError> {
    let key: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='advisor_api_key'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    let model: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='advisor_model'",
            [],
            |r| r.get(0),
        )
        .optional()?;

    let text = match key {
        Some(key) if !key.is_empty() => {
            match call_generator(&key, model.as_deref().unwrap_or(DEFAULT_MODEL), data) {
                Ok(text) => text,
                Err(_) => compose_fallback(data),
            }
        }
        _ => compose_fallback(data),
    };
    Ok(text)
}

#[derive(Debug, Deserialize)]
struct GenResponse {
    candidates: Vec<GenCandidate>,
}
#[derive(Debug, Deserialize)]
struct GenCandidate {
    content: GenContent,
}
#[derive(Debug, Deserialize)]
struct GenContent {
    parts: Vec<GenPart>,
}
#[derive(Debug, Deserialize)]
struct GenPart {
    text: String,
}

fn call_generator(key: &str, model: &str, data: &ReportData) -> anyhow::Result<String> {
    let prompt = build_prompt(data)?;
    let url = format!("{}/{}:generateContent?key={}", GEN_ENDPOINT, model, key);
    let client = crate::utils::http_client()?;
    let resp = client
        .post(url)
        .json(&serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        }))
        .send()?
        .error_for_status()?;
    let body: GenResponse = resp.json()?;
    let text = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| anyhow::anyhow!("Generator returned no candidates"))?;
    Ok(text)
}

fn build_prompt(data: &ReportData) -> anyhow::Result<String> {
    let payload = serde_json::to_string_pretty(data)?;
    let focus = match data.report {
        ReportKind::Monthly => {
            "income and spending trends, the highest spending categories, and saving opportunities"
        }
        ReportKind::Daily => {
            "today's spending, the income/spending balance, and daily budgeting habits"
        }
    };
    Ok(format!(
        "You are a personal finance advisor. Analyze the following {} report data and give the \
         user specific, actionable advice about {}.\n\nReport data:\n{}\n\nAnswer in markdown \
         using ## and ### headers, with one '-' bullet per point.",
        data.report, focus, payload
    ))
}

/// Deterministic local composer: same structure every time for the same rows,
/// no randomness, no external calls.
pub fn compose_fallback(data: &ReportData) -> String {
    match data.report {
        ReportKind::Monthly => monthly_fallback(data),
        ReportKind::Daily => daily_fallback(data),
    }
}

fn monthly_fallback(d: &ReportData) -> String {
    let ccy = &d.currency;
    let total_income: Decimal = d.summary.iter().map(|r| r.income).sum();
    let total_expense: Decimal = d.summary.iter().map(|r| r.expense).sum();
    let net = total_income - total_expense;
    let saving_rate = if total_income > Decimal::ZERO {
        (net / total_income * Decimal::from(100)).round_dp(1)
    } else {
        Decimal::ZERO
    };
    let by_category = top_expense_categories(&d.entries, 3);

    let mut out = String::new();
    out.push_str(&format!("## Monthly review for {}\n\n", d.period));
    out.push_str("### Income and spending\n");
    out.push_str(&format!(
        "- Total income: {} {}\n",
        total_income.round_dp(2),
        ccy
    ));
    out.push_str(&format!(
        "- Total spending: {} {}\n",
        total_expense.round_dp(2),
        ccy
    ));
    out.push_str(&format!("- Net balance: {} {}\n", net.round_dp(2), ccy));
    out.push_str(&format!("- Saving rate: {}%\n\n", saving_rate));

    out.push_str("### Top spending categories\n");
    if by_category.is_empty() {
        out.push_str("- Not enough category data for this period yet.\n");
    } else {
        for (name, amount) in &by_category {
            let share = if total_expense > Decimal::ZERO {
                (*amount / total_expense * Decimal::from(100)).round_dp(0)
            } else {
                Decimal::ZERO
            };
            out.push_str(&format!(
                "- {}: {} {} ({}%)\n",
                name,
                amount.round_dp(2),
                ccy,
                share
            ));
        }
    }
    out.push('\n');

    out.push_str("### Recommendations\n");
    if net >= Decimal::ZERO {
        out.push_str("- Move this month's surplus into an emergency fund before it gets spent.\n");
        out.push_str(
            "- Set up a recurring transfer so saving happens without a decision each month.\n",
        );
        out.push_str("- Aim for roughly 50% needs, 30% wants, 20% savings when splitting income.\n");
    } else {
        match by_category.first() {
            Some((top, _)) => out.push_str(&format!(
                "- Spending exceeded income; '{}' is the first category worth a budget cap.\n",
                top
            )),
            None => out.push_str(
                "- Spending exceeded income; set a budget cap for your biggest category.\n",
            ),
        }
        out.push_str("- Review subscriptions and cancel the ones you no longer use.\n");
        out.push_str("- Set a daily spending limit for next month to close the gap.\n");
    }
    out.push('\n');

    out.push_str("### Action plan for next month\n");
    out.push_str("- Track each category against a limit you set now.\n");
    let cushion = (total_income * Decimal::new(1, 1)).round_dp(0);
    out.push_str(&format!(
        "- Put aside an emergency cushion of about {} {}.\n",
        cushion, ccy
    ));
    out.push_str("- Make your savings target concrete and measurable.\n");
    out
}

fn daily_fallback(d: &ReportData) -> String {
    let ccy = &d.currency;
    let total_income: Decimal = d
        .entries
        .iter()
        .filter(|e| e.kind == EntryKind::Income)
        .map(|e| e.amount)
        .sum();
    let total_expense: Decimal = d
        .entries
        .iter()
        .filter(|e| e.kind == EntryKind::Expense)
        .map(|e| e.amount)
        .sum();
    let net = total_income - total_expense;
    let top = top_expense_categories(&d.entries, 2);

    let mut out = String::new();
    out.push_str(&format!("## Daily review for {}\n\n", d.period));
    out.push_str("### Today at a glance\n");
    out.push_str(&format!(
        "- Total income: {} {}\n",
        total_income.round_dp(2),
        ccy
    ));
    out.push_str(&format!(
        "- Total spending: {} {}\n",
        total_expense.round_dp(2),
        ccy
    ));
    out.push_str(&format!("- Net balance: {} {}\n\n", net.round_dp(2), ccy));

    out.push_str("### Spending breakdown\n");
    if total_expense > Decimal::ZERO {
        for (name, amount) in &top {
            let share = (*amount / total_expense * Decimal::from(100)).round_dp(0);
            out.push_str(&format!(
                "- {}: {} {} ({}%)\n",
                name,
                amount.round_dp(2),
                ccy,
                share
            ));
        }
    } else {
        out.push_str("- No spending recorded today.\n");
    }
    out.push('\n');

    out.push_str("### Advice\n");
    if d.entries.is_empty() {
        out.push_str(
            "- No entries recorded today; log income and spending as it happens to keep \
             these reports useful.\n",
        );
    } else if total_expense == Decimal::ZERO {
        out.push_str("- No spending today; a good sign for your budget discipline.\n");
    } else if net >= Decimal::ZERO {
        out.push_str("- Positive cash flow today, well done.\n");
        out.push_str("- Add today's surplus to your monthly savings target.\n");
        if let Some((name, _)) = top.first() {
            out.push_str(&format!(
                "- Your biggest spending item today was '{}'.\n",
                name
            ));
        }
    } else {
        out.push_str("- Spending exceeded income today.\n");
        out.push_str("- Plan tomorrow's spending more tightly to recover the gap.\n");
        out.push_str("- Postpone purchases that are not urgent.\n");
    }
    out.push('\n');

    out.push_str("### Habit tips\n");
    out.push_str("- Before buying, ask whether it is a need or a momentary want.\n");
    out.push_str("- Track the small daily purchases; they add up over time.\n");
    out.push_str("- Card payments are easier to trace back than cash.\n");
    out
}

fn top_expense_categories(entries: &[Entry], n: usize) -> Vec<(String, Decimal)> {
    use std::collections::HashMap;
    let mut agg: HashMap<String, Decimal> = HashMap::new();
    for e in entries {
        if e.kind == EntryKind::Expense {
            *agg.entry(e.category.clone()).or_insert(Decimal::ZERO) += e.amount;
        }
    }
    let mut items: Vec<_> = agg.into_iter().collect();
    // name tiebreak keeps the ordering stable for equal amounts
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items.truncate(n);
    items
}
