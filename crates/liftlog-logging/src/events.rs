use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured log events for the session recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    DraftStarted {
        session: String,
        exercises: usize,
        sets: usize,
        edit: bool,
    },
    DraftRecovered {
        session: String,
        completed_sets: usize,
        total_sets: usize,
    },
    SetUpdated {
        exercise: String,
        set_number: u32,
        field: String,
        completed: bool,
    },
    DraftFinalized {
        id: String,
        date: String,
        duration_minutes: Option<u32>,
        retroactive: bool,
    },
    FinalizeFailed {
        error: String,
    },
    DraftCancelled,
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for recorder events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        if let Some(line) = self.render(event) {
            let _ = writeln!(std::io::stderr(), "{}", line);
        }
    }

    /// Console rendering of an event in this logger's format.
    pub fn render(&self, event: &LogEvent) -> Option<String> {
        match self.format {
            LogFormat::Json => serde_json::to_string(event).ok(),
            LogFormat::Pretty => Some(Self::render_pretty(event)),
            LogFormat::Compact => Some(Self::render_compact(event)),
        }
    }

    fn render_pretty(event: &LogEvent) -> String {
        match event {
            LogEvent::DraftStarted {
                session,
                exercises,
                sets,
                edit,
            } => {
                let label = if *edit { "Editing" } else { "Recording" };
                format!(
                    "{} {} {} ({} exercises, {} sets)",
                    "▶".bright_cyan(),
                    label.bright_cyan().bold(),
                    session.bold(),
                    exercises,
                    sets
                )
            }
            LogEvent::DraftRecovered {
                session,
                completed_sets,
                total_sets,
            } => format!(
                "{} {} {} ({}/{} sets done)",
                "↺".bright_yellow(),
                "Recovered draft".bright_yellow().bold(),
                session.bold(),
                completed_sets,
                total_sets
            ),
            LogEvent::SetUpdated {
                exercise,
                set_number,
                field,
                completed,
            } => {
                let mark = if *completed {
                    "✓".bright_green()
                } else {
                    "·".dimmed()
                };
                format!(
                    "  {} {} set {} {}",
                    mark,
                    exercise,
                    set_number,
                    format!("({})", field).dimmed()
                )
            }
            LogEvent::DraftFinalized {
                id,
                date,
                duration_minutes,
                retroactive,
            } => {
                let duration = duration_minutes
                    .map(|m| format!("{} min", m))
                    .unwrap_or_else(|| "-".to_string());
                let kind = if *retroactive { " (backfilled)" } else { "" };
                format!(
                    "{} {}{} {} {} {}",
                    "✓".bright_green(),
                    "Saved".bright_green().bold(),
                    kind,
                    id.dimmed(),
                    date,
                    duration
                )
            }
            LogEvent::FinalizeFailed { error } => format!(
                "{} Save failed, draft kept: {}",
                "✗".bright_red(),
                error.bright_red()
            ),
            LogEvent::DraftCancelled => {
                format!("{} {}", "✗".dimmed(), "Draft discarded".dimmed())
            }
        }
    }

    fn render_compact(event: &LogEvent) -> String {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        match event {
            LogEvent::DraftStarted {
                session,
                exercises,
                edit,
                ..
            } => format!(
                "[{}] draft:{} {} {}ex",
                timestamp,
                if *edit { "edit" } else { "start" },
                session,
                exercises
            ),
            LogEvent::DraftRecovered {
                session,
                completed_sets,
                total_sets,
            } => format!(
                "[{}] draft:recover {} {}/{}",
                timestamp, session, completed_sets, total_sets
            ),
            LogEvent::SetUpdated {
                exercise,
                set_number,
                field,
                completed,
            } => format!(
                "[{}] set:{} {}#{} done={}",
                timestamp, field, exercise, set_number, completed
            ),
            LogEvent::DraftFinalized {
                id,
                duration_minutes,
                ..
            } => format!(
                "[{}] draft:saved {} {}m",
                timestamp,
                id,
                duration_minutes.unwrap_or(0)
            ),
            LogEvent::FinalizeFailed { error } => format!("[{}] draft:error {}", timestamp, error),
            LogEvent::DraftCancelled => format!("[{}] draft:cancel", timestamp),
        }
    }
}
