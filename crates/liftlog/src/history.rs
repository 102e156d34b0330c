use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use clap::Subcommand;
use colored::Colorize;

use liftlog_core::{HistorySource, LogRepository, SessionLog};
use liftlog_history::{
    entries_on, has_entry_on, history_stats, last_occurrence, normalize, sorted,
    year_separator_indices, HistoryStats, NormalizedDate,
};

use crate::record::summarize;
use crate::AppContext;

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List saved logs, newest first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the last time an exercise was performed
    Last {
        /// Exercise name, exactly as in the plan
        exercise: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Month calendar with training days marked
    Calendar {
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,

        /// Month number (1-12), defaults to the current month
        #[arg(long)]
        month: Option<u32>,
    },

    /// Delete a saved log
    Delete {
        /// Log ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub async fn handle_history_command(ctx: &AppContext, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::History { json } => {
            let history = ctx.db.load_history(&ctx.athlete).await?;
            let ordered = sorted(&history, &Local);

            if json {
                println!("{}", serde_json::to_string_pretty(&ordered)?);
            } else if ordered.is_empty() {
                println!("{}", "No sessions logged yet.".dimmed());
            } else {
                print_history_table(&ordered, &ctx.date_format);
            }
        }
        HistoryAction::Last { exercise, json } => {
            let history = ctx.db.load_history(&ctx.athlete).await?;
            let found = last_occurrence(&history, &exercise, &Local);

            if json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else {
                match found {
                    Some(last) => {
                        let date = normalize(&last.date, &Local);
                        println!(
                            "{} {}",
                            exercise.bold(),
                            format_date(&date, &ctx.date_format).dimmed()
                        );
                        println!("  {}", summarize(&last));
                        if !last.notes.is_empty() {
                            println!("  {} {}", "notes:".dimmed(), last.notes);
                        }
                    }
                    None => println!("{}", format!("No log contains {}.", exercise).dimmed()),
                }
            }
        }
        HistoryAction::Stats { json } => {
            let history = ctx.db.load_history(&ctx.athlete).await?;
            let stats = history_stats(&history, &Local::now());

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        HistoryAction::Calendar { year, month } => {
            let today = Local::now().date_naive();
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| anyhow::anyhow!("Invalid month: {}-{}", year, month))?;

            let history = ctx.db.load_history(&ctx.athlete).await?;
            print_calendar(&history, first, today);
        }
        HistoryAction::Delete { id, yes } => {
            if !yes {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!("Delete log {}?", id))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    return Ok(());
                }
            }

            if !ctx.db.delete(&id).await? {
                anyhow::bail!("No log with id {}", id);
            }
            println!("{} {}", "Deleted".bright_red(), id);
        }
    }

    Ok(())
}

fn format_date(date: &NormalizedDate, format: &str) -> String {
    match date.date() {
        Some(d) => d.format(format).to_string(),
        None => "unknown date".to_string(),
    }
}

fn print_history_table(logs: &[&SessionLog], date_format: &str) {
    println!(
        "{:<4} {:<4} {:<12} {:<18} {:<6} {:<5} {}",
        "MON".dimmed(),
        "DAY".dimmed(),
        "DATE".dimmed(),
        "SESSION".dimmed(),
        "SETS".dimmed(),
        "MIN".dimmed(),
        "ID".dimmed(),
    );

    let separators = year_separator_indices(logs, &Local);
    for (i, log) in logs.iter().enumerate() {
        let date = normalize(&log.date, &Local);
        let starts_year = (i == 0 && date.is_valid()) || separators.contains(&i);
        if starts_year {
            println!("{}", format!("--- {} ---", date.year()).bright_blue());
        }

        let done: usize = log
            .exercises
            .iter()
            .map(|e| e.sets.iter().filter(|s| s.completed).count())
            .sum();
        let total: usize = log.exercises.iter().map(|e| e.sets.len()).sum();
        let minutes = log
            .duration_minutes
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        let date_text = if date.is_valid() {
            format_date(&date, date_format)
        } else {
            log.date.clone()
        };

        println!(
            "{:<4} {:<4} {:<12} {:<18} {:<6} {:<5} {}",
            date.month_label(),
            date.day_label(),
            date_text,
            log.session_key.to_string(),
            format!("{}/{}", done, total),
            minutes,
            log.id.to_string().dimmed()
        );
    }
}

fn print_stats(stats: &HistoryStats) {
    println!("{}", "=== Training Statistics ===".bright_blue().bold());
    println!("{}  {}", "Total Sessions:".dimmed(), stats.total_sessions);
    println!("{}  {}", "Last 7 Days:".dimmed(), stats.this_week);
    println!(
        "{}  {} sessions, {} min",
        "This Month:".dimmed(),
        stats.this_month.count,
        stats.this_month.total_minutes
    );
    println!("{}  {} days", "Streak:".dimmed(), stats.streak);
    println!(
        "{}  {:.0} min",
        "Avg Duration:".dimmed(),
        stats.avg_duration_minutes
    );
    if stats.unknown_dates > 0 {
        println!(
            "{}  {}",
            "Undated Logs:".dimmed(),
            stats.unknown_dates.to_string().bright_yellow()
        );
    }

    if !stats.by_exercise.is_empty() {
        println!();
        println!("{}", "By Exercise:".dimmed());
        for e in stats.by_exercise.iter().take(10) {
            println!("  {:<24} {} sessions", e.exercise, e.sessions);
        }
    }
}

fn print_calendar(history: &[SessionLog], first: NaiveDate, today: NaiveDate) {
    let year = first.year();
    let month0 = first.month0();

    println!("{}", first.format("%B %Y").to_string().bold());
    println!("{}", "Mo Tu We Th Fr Sa Su".dimmed());

    let offset = first.weekday().num_days_from_monday() as usize;
    let mut line = "   ".repeat(offset);
    let mut trained = Vec::new();

    let mut day = first;
    while day.month0() == month0 {
        let label = format!("{:>2}", day.day());
        let cell = if has_entry_on(history, year, month0, day.day(), &Local) {
            trained.push(day);
            label.bright_green().bold().to_string()
        } else if day == today {
            label.underline().to_string()
        } else {
            label
        };
        line.push_str(&cell);
        line.push(' ');

        if day.weekday().num_days_from_monday() == 6 {
            println!("{}", line.trim_end());
            line.clear();
        }

        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }

    for day in trained {
        for log in entries_on(history, year, month0, day.day(), &Local) {
            println!(
                "  {} {}",
                format!("{:>2}", day.day()).bright_green(),
                log.session_key
            );
        }
    }
}
