use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::Subcommand;
use colored::Colorize;

use liftlog_core::{
    CoreError, Draft, FinalizeOptions, HistorySource, PlanFilter, PlanSource, RetroDate,
    SessionRecorder, SetField,
};
use liftlog_db::Database;
use liftlog_history::{previous_performance, LastOccurrence};

use crate::AppContext;

#[derive(Subcommand, Debug)]
pub enum RecordAction {
    /// Start recording a session from the plan
    Start {
        #[arg(long)]
        year: i32,

        /// Month number (1-12)
        #[arg(long)]
        month: u32,

        #[arg(long)]
        week: u32,

        /// Session code(s) to merge into one workout, in order
        #[arg(long = "session", required = true)]
        sessions: Vec<String>,
    },

    /// Edit a saved log
    Edit {
        /// Log ID
        id: String,
    },

    /// Show the in-progress draft
    Resume {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record reps and/or weight for a set
    Set {
        /// Exercise number as shown by `resume` (1-based)
        exercise: usize,

        /// Set number (1-based)
        set: usize,

        #[arg(long)]
        reps: Option<String>,

        #[arg(long)]
        weight: Option<String>,
    },

    /// Replace an exercise's notes
    Note {
        /// Exercise number (1-based)
        exercise: usize,

        text: String,
    },

    /// Comment on an exercise by name (empty text removes it)
    Comment {
        exercise: String,

        text: String,
    },

    /// Save the draft as a log
    Finish {
        /// Backfill to this date (YYYY-MM-DD)
        #[arg(long, conflicts_with_all = ["day", "month", "year"])]
        date: Option<String>,

        #[arg(long)]
        day: Option<u32>,

        #[arg(long)]
        month: Option<u32>,

        #[arg(long)]
        year: Option<i32>,
    },

    /// Discard the draft
    Cancel {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

type Recorder<'a> = SessionRecorder<&'a Database>;

/// Build a recorder over the durable slot and pick up any autosaved draft.
fn open_recorder(ctx: &AppContext) -> Result<Recorder<'_>> {
    let mut recorder = SessionRecorder::new(&ctx.db);
    recorder.recover().context("Failed to read the draft slot")?;
    Ok(recorder.with_logger(ctx.logger.clone()))
}

fn require_draft<'r>(recorder: &'r Recorder<'_>) -> Result<&'r Draft> {
    recorder
        .draft()
        .context("No draft in progress. Start one with `liftlog start` or `liftlog edit`.")
}

/// Convert a 1-based CLI position.
fn index(position: usize, what: &str) -> Result<usize> {
    position
        .checked_sub(1)
        .with_context(|| format!("{} numbers start at 1", what))
}

pub async fn handle_record_command(ctx: &AppContext, action: RecordAction) -> Result<()> {
    match action {
        RecordAction::Start {
            year,
            month,
            week,
            sessions,
        } => {
            let filter = PlanFilter {
                year,
                month_num: month,
                week,
                session_codes: sessions,
            };
            let entries = ctx.db.load_plan_entries(&filter).await?;

            let mut recorder = open_recorder(ctx)?;
            recorder.start_from_plan(&entries)?;
            print_draft(ctx, require_draft(&recorder)?).await?;
        }
        RecordAction::Edit { id } => {
            let log = ctx
                .db
                .logs()
                .get(&id)?
                .with_context(|| format!("No log with id {}", id))?;

            let mut recorder = open_recorder(ctx)?;
            recorder.start_from_log(log)?;
            print_draft(ctx, require_draft(&recorder)?).await?;
        }
        RecordAction::Resume { json } => {
            let mut recorder = SessionRecorder::new(&ctx.db).with_logger(ctx.logger.clone());
            match recorder.recover()? {
                Some(draft) if json => {
                    let snapshot = draft.snapshot(Utc::now());
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
                Some(draft) => print_draft(ctx, draft).await?,
                None => println!("{}", "No draft in progress.".dimmed()),
            }
        }
        RecordAction::Set {
            exercise,
            set,
            reps,
            weight,
        } => {
            if reps.is_none() && weight.is_none() {
                anyhow::bail!("Give --reps and/or --weight");
            }
            let exercise_index = index(exercise, "Exercise")?;
            let set_index = index(set, "Set")?;

            let mut recorder = open_recorder(ctx)?;
            require_draft(&recorder)?;
            if let Some(reps) = reps {
                recorder.update_set(exercise_index, set_index, SetField::Reps, &reps)?;
            }
            if let Some(weight) = weight {
                recorder.update_set(exercise_index, set_index, SetField::Weight, &weight)?;
            }
        }
        RecordAction::Note { exercise, text } => {
            let exercise_index = index(exercise, "Exercise")?;
            let mut recorder = open_recorder(ctx)?;
            require_draft(&recorder)?;
            recorder.update_notes(exercise_index, &text)?;
        }
        RecordAction::Comment { exercise, text } => {
            let mut recorder = open_recorder(ctx)?;
            require_draft(&recorder)?;
            recorder.set_comment(&exercise, &text)?;
        }
        RecordAction::Finish {
            date,
            day,
            month,
            year,
        } => {
            let options = finalize_options(date, day, month, year)?;
            let mut recorder = open_recorder(ctx)?;
            require_draft(&recorder)?;

            match recorder.finalize(options, &ctx.db).await {
                Ok(log) => println!("{}  {}", "ID:".dimmed(), log.id),
                Err(CoreError::SlotNotCleared { saved, source }) => {
                    println!("{}  {}", "ID:".dimmed(), saved.id);
                    return Err(anyhow::Error::new(source).context(
                        "Session saved, but the draft is still stored. Run `liftlog cancel --yes` before starting another.",
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }
        RecordAction::Cancel { yes } => {
            let mut recorder = open_recorder(ctx)?;
            let session = require_draft(&recorder)?.session_key().to_string();

            if !yes {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt(format!("Discard the draft for {}?", session))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("{}", "Kept the draft.".dimmed());
                    return Ok(());
                }
            }
            recorder.cancel()?;
        }
    }

    Ok(())
}

/// Retroactive when any date part is given, live otherwise.
fn finalize_options(
    date: Option<String>,
    day: Option<u32>,
    month: Option<u32>,
    year: Option<i32>,
) -> Result<FinalizeOptions> {
    if let Some(date) = date {
        let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("Invalid --date: {}", e))?;
        return Ok(FinalizeOptions::retroactive(RetroDate::from(parsed)));
    }

    if day.is_none() && month.is_none() && year.is_none() {
        return Ok(FinalizeOptions::live());
    }

    Ok(FinalizeOptions::retroactive(RetroDate { day, month, year }))
}

async fn print_draft(ctx: &AppContext, draft: &Draft) -> Result<()> {
    let history = ctx.db.load_history(&ctx.athlete).await?;
    let previous = previous_performance(draft.exercises(), draft.id(), &history, &Local);

    let mode = if draft.is_edit_mode() {
        format!("editing {}", draft.id()).bright_yellow()
    } else {
        "new".bright_cyan()
    };
    println!(
        "{} {} ({}, {}/{} sets done)",
        "===".bright_blue().bold(),
        draft.session_key().to_string().bold(),
        mode,
        draft.completed_sets(),
        draft.total_sets()
    );

    for (i, exercise) in draft.exercises().iter().enumerate() {
        println!();
        println!(
            "{} {} {}",
            format!("[{}]", i + 1).bright_blue(),
            exercise.exercise_name.bold(),
            format!("(session {})", exercise.original_session).dimmed()
        );
        if let Some(last) = previous.get(&exercise.exercise_name) {
            println!("    {} {}", "last:".dimmed(), summarize(last).dimmed());
        }
        for set in &exercise.sets {
            let mark = if set.completed {
                "✓".bright_green()
            } else {
                "·".dimmed()
            };
            println!(
                "    {} set {}  {:>6} reps  {:>7} kg",
                mark,
                set.set_number,
                blank_dash(&set.reps),
                blank_dash(&set.weight)
            );
        }
        if !exercise.notes.is_empty() {
            println!("    {} {}", "notes:".dimmed(), exercise.notes);
        }
        if let Some(comment) = draft.comments().get(&exercise.exercise_name) {
            println!("    {} {}", "comment:".dimmed(), comment);
        }
    }

    Ok(())
}

fn blank_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// "5x100, 5x100, 4x100" from the sets that were actually filled in.
pub fn summarize(last: &LastOccurrence) -> String {
    let sets: Vec<String> = last
        .sets
        .iter()
        .filter(|s| !s.reps.is_empty() || !s.weight.is_empty())
        .map(|s| format!("{}x{}", blank_dash(&s.reps), blank_dash(&s.weight)))
        .collect();

    if sets.is_empty() {
        "no sets recorded".to_string()
    } else {
        sets.join(", ")
    }
}
