use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use liftlog_core::{parse_set_count, PlanEntry, PlanFilter, PlanSource};

use crate::AppContext;

#[derive(Subcommand, Debug)]
pub enum PlanAction {
    /// Import plan rows from a JSON array file
    Import {
        /// Path to the JSON file
        file: PathBuf,

        /// Remove existing plan rows first
        #[arg(long)]
        replace: bool,
    },

    /// Show plan sessions, or the rows of one week
    Show {
        #[arg(long)]
        year: Option<i32>,

        /// Month number (1-12)
        #[arg(long)]
        month: Option<u32>,

        #[arg(long)]
        week: Option<u32>,

        /// Session codes to include (all when omitted)
        #[arg(long = "session")]
        sessions: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_plan_command(ctx: &AppContext, action: PlanAction) -> Result<()> {
    match action {
        PlanAction::Import { file, replace } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let plans = ctx.db.plans();
            if replace {
                let removed = plans.clear()?;
                println!("{} {} existing rows", "Removed".dimmed(), removed);
            }
            let count = plans
                .import_json(&json)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            println!("{} {} plan rows", "Imported".bright_green().bold(), count);
        }
        PlanAction::Show {
            year,
            month,
            week,
            sessions,
            json,
        } => match (year, month, week) {
            (None, None, None) => print_sessions(ctx, json)?,
            (Some(year), Some(month_num), Some(week)) => {
                let filter = PlanFilter {
                    year,
                    month_num,
                    week,
                    session_codes: sessions,
                };
                let entries = ctx.db.load_plan_entries(&filter).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else if entries.is_empty() {
                    println!("{}", "No plan rows for that week.".dimmed());
                } else {
                    print_entries(&entries);
                }
            }
            _ => anyhow::bail!("--year, --month and --week must be given together"),
        },
    }

    Ok(())
}

fn print_sessions(ctx: &AppContext, json: bool) -> Result<()> {
    let keys = ctx.db.plans().sessions()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
    } else if keys.is_empty() {
        println!("{}", "No plan imported yet.".dimmed());
    } else {
        println!(
            "{:<6} {:<6} {:<6} {}",
            "YEAR".dimmed(),
            "MONTH".dimmed(),
            "WEEK".dimmed(),
            "SESSION".dimmed(),
        );
        for key in keys {
            println!(
                "{:<6} {:<6} {:<6} {}",
                key.year, key.month_num, key.week, key.session_code
            );
        }
    }

    Ok(())
}

fn print_entries(entries: &[PlanEntry]) {
    println!(
        "{:<4} {:<24} {:<8} {:<8} {:<6} {}",
        "SESS".dimmed(),
        "EXERCISE".dimmed(),
        "SETS".dimmed(),
        "REPS".dimmed(),
        "REST".dimmed(),
        "TEMPO".dimmed(),
    );

    for e in entries {
        let sets = format!("{} ({})", e.target_sets, parse_set_count(&e.target_sets));
        let rest = e
            .rest_seconds
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<24} {:<8} {:<8} {:<6} {}",
            e.session_code.bright_cyan(),
            e.exercise,
            sets,
            e.target_reps,
            rest,
            e.tempo
        );
        if !e.notes.is_empty() {
            println!("     {}", e.notes.dimmed());
        }
    }
}
