// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("ledgerclip")
        .version(clap::crate_version!())
        .about("Personal finance ledger with recurring obligations and advisory reports")
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(user_cmd())
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(recurring_cmd())
        .subcommand(stats_cmd())
        .subcommand(history_cmd())
        .subcommand(goal_cmd())
        .subcommand(advise_cmd())
        .subcommand(import_cmd())
        .subcommand(export_cmd())
        .subcommand(Command::new("doctor").about("Audit stored data for inconsistencies"))
}

fn user_cmd() -> Command {
    Command::new("user")
        .about("Manage user profiles")
        .subcommand(
            Command::new("add")
                .about("Create a profile")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("currency")
                        .long("currency")
                        .required(true)
                        .help("One of USD, EUR, JPY, GBP, INR, TRY"),
                ),
        )
        .subcommand(
            Command::new("switch")
                .about("Make a profile the active one")
                .arg(Arg::new("name").long("name").required(true)),
        )
        .subcommand(json_flags(Command::new("list").about("List profiles")))
        .subcommand(
            Command::new("set-currency")
                .about("Change the active profile's display currency")
                .arg(Arg::new("currency").long("currency").required(true)),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage income/expense categories")
        .subcommand(
            Command::new("add")
                .about("Add a category for the active user")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .required(true)
                        .value_parser(["income", "expense"]),
                )
                .arg(Arg::new("icon").long("icon").help("Emoji or short marker")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List categories")
                .arg(Arg::new("type").long("type").help("income or expense")),
        ))
        .subcommand(
            Command::new("rm")
                .about("Remove a category (existing entries keep its name)")
                .arg(Arg::new("name").long("name").required(true))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .required(true)
                        .value_parser(["income", "expense"]),
                ),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and list ledger entries")
        .subcommand(
            Command::new("add")
                .about("Record an entry and update the history rollups")
                .arg(
                    Arg::new("date")
                        .long("date")
                        .required(true)
                        .help("YYYY-MM-DD"),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .required(true)
                        .value_parser(["income", "expense"]),
                )
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(Arg::new("category").long("category").required(true))
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an entry and update the history rollups")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List entries, newest first")
                .arg(Arg::new("month").long("month").help("YYYY-MM"))
                .arg(Arg::new("from").long("from").help("YYYY-MM-DD"))
                .arg(Arg::new("to").long("to").help("YYYY-MM-DD"))
                .arg(Arg::new("type").long("type").help("income or expense"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(clap::value_parser!(usize)),
                ),
        ))
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Manage recurring obligations")
        .subcommand(
            Command::new("add")
                .about("Create an obligation; its next due date is computed, never supplied")
                .arg(Arg::new("title").long("title").required(true))
                .arg(Arg::new("amount").long("amount").required(true))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .required(true)
                        .value_parser(["income", "expense"]),
                )
                .arg(Arg::new("category").long("category").required(true))
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .required(true)
                        .value_parser(["weekly", "monthly", "yearly"]),
                )
                .arg(
                    Arg::new("day-of-month")
                        .long("day-of-month")
                        .value_parser(clap::value_parser!(u32))
                        .help("1-31, required for monthly"),
                )
                .arg(
                    Arg::new("day-of-week")
                        .long("day-of-week")
                        .value_parser(clap::value_parser!(u32))
                        .help("0-6 with 0 = Sunday, required for weekly"),
                )
                .arg(Arg::new("start").long("start").help("YYYY-MM-DD, default today"))
                .arg(Arg::new("end").long("end").help("YYYY-MM-DD"))
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(
            Command::new("update")
                .about("Edit an obligation; the next due date is recomputed")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(Arg::new("title").long("title"))
                .arg(Arg::new("amount").long("amount"))
                .arg(Arg::new("category").long("category"))
                .arg(
                    Arg::new("frequency")
                        .long("frequency")
                        .value_parser(["weekly", "monthly", "yearly"]),
                )
                .arg(
                    Arg::new("day-of-month")
                        .long("day-of-month")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("day-of-week")
                        .long("day-of-week")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(Arg::new("start").long("start"))
                .arg(Arg::new("end").long("end"))
                .arg(Arg::new("description").long("description"))
                .arg(
                    Arg::new("active")
                        .long("active")
                        .value_parser(["true", "false"])
                        .help("Pause or resume without editing anything else"),
                ),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an obligation")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List obligations by due date; overdue ones are flagged")
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Include paused obligations"),
                ),
        ))
}

fn stats_cmd() -> Command {
    Command::new("stats")
        .about("Totals over a date range, from the raw entries")
        .subcommand(json_flags(
            Command::new("balance")
                .about("Income, spending, and net for a range")
                .arg(Arg::new("from").long("from").required(true).help("YYYY-MM-DD"))
                .arg(Arg::new("to").long("to").required(true).help("YYYY-MM-DD")),
        ))
        .subcommand(json_flags(
            Command::new("categories")
                .about("Per-category totals with share of the type's total")
                .arg(Arg::new("from").long("from").required(true).help("YYYY-MM-DD"))
                .arg(Arg::new("to").long("to").required(true).help("YYYY-MM-DD"))
                .arg(Arg::new("type").long("type").help("income or expense")),
        ))
}

fn history_cmd() -> Command {
    Command::new("history")
        .about("Rollup history maintained alongside the entries")
        .subcommand(json_flags(
            Command::new("periods").about("Years that have recorded history"),
        ))
        .subcommand(json_flags(
            Command::new("view")
                .about("Per-day rows for a month, or per-month rows for a year")
                .arg(
                    Arg::new("year")
                        .long("year")
                        .required(true)
                        .value_parser(clap::value_parser!(i32)),
                )
                .arg(
                    Arg::new("month")
                        .long("month")
                        .value_parser(clap::value_parser!(u32))
                        .help("1-12; omit for the whole-year view"),
                ),
        ))
}

fn goal_cmd() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .about("Create a goal")
                .arg(Arg::new("name").long("name").required(true))
                .arg(Arg::new("target").long("target").required(true))
                .arg(Arg::new("current").long("current").help("Starting amount, default 0"))
                .arg(Arg::new("kind").long("kind").default_value("savings"))
                .arg(Arg::new("date").long("date").help("Target date YYYY-MM-DD"))
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(
            Command::new("update")
                .about("Edit a goal")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(Arg::new("name").long("name"))
                .arg(Arg::new("target").long("target"))
                .arg(Arg::new("kind").long("kind"))
                .arg(Arg::new("date").long("date"))
                .arg(Arg::new("description").long("description")),
        )
        .subcommand(
            Command::new("progress")
                .about("Set the saved-so-far amount")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(Arg::new("current").long("current").required(true)),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a goal")
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
        .subcommand(json_flags(Command::new("list").about("List goals with progress")))
}

fn advise_cmd() -> Command {
    Command::new("advise")
        .about("Generate a rate-limited advisory report")
        .arg(
            Arg::new("report")
                .long("report")
                .required(true)
                .value_parser(["daily", "monthly"]),
        )
        .arg(
            Arg::new("date")
                .long("date")
                .help("Day for the daily report, YYYY-MM-DD (default today)"),
        )
        .arg(
            Arg::new("year")
                .long("year")
                .value_parser(clap::value_parser!(i32))
                .help("Year for the monthly report (default current)"),
        )
        .arg(
            Arg::new("month")
                .long("month")
                .value_parser(clap::value_parser!(u32))
                .help("Month 1-12 for the monthly report (default current)"),
        )
}

fn import_cmd() -> Command {
    Command::new("import").about("Import data").subcommand(
        Command::new("entries")
            .about("Import entries from CSV (date,type,amount,category,description)")
            .arg(Arg::new("path").long("path").required(true)),
    )
}

fn export_cmd() -> Command {
    Command::new("export").about("Export data").subcommand(
        Command::new("entries")
            .about("Export the active user's entries")
            .arg(
                Arg::new("format")
                    .long("format")
                    .required(true)
                    .help("csv or json"),
            )
            .arg(Arg::new("out").long("out").required(true)),
    )
}
