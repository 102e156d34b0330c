use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use liftlog_db::{Database, DEFAULT_ATHLETE};
use liftlog_logging::{LogFormat, Logger};

mod config;
mod history;
mod plan;
mod record;

use config::LiftlogConfig;
use history::HistoryAction;
use plan::PlanAction;
use record::RecordAction;

#[derive(Parser, Debug)]
#[command(
    name = "liftlog",
    about = "Record workout sessions against a training plan",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database path (overrides liftlog.toml)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Athlete whose logs are read and written (overrides liftlog.toml)
    #[arg(long, global = true)]
    athlete: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import or browse the training plan
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    #[command(flatten)]
    Record(RecordAction),

    #[command(flatten)]
    History(HistoryAction),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

/// Everything a command handler needs, resolved from flags and config.
pub struct AppContext {
    pub db: Database,
    pub athlete: String,
    pub logger: Arc<Logger>,
    pub date_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let config = LiftlogConfig::discover(&working_dir)?;

    let log_format: LogFormat = cli.log_format.into();
    liftlog_logging::init_tracing(config.log_level(), log_format);

    let logger = match config.log_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => Logger::new(log_format),
    };

    let athlete = cli
        .athlete
        .clone()
        .or_else(|| config.athlete.clone())
        .unwrap_or_else(|| DEFAULT_ATHLETE.to_string());

    let db = match cli.db.clone().or_else(|| config.database.clone()) {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            Database::open_at(&path)
                .with_context(|| format!("Failed to open database {}", path.display()))?
        }
        None => Database::open().context("Failed to initialize database")?,
    };

    let ctx = AppContext {
        db: db.with_athlete(athlete.clone()),
        athlete,
        logger: Arc::new(logger),
        date_format: config.date_format().to_string(),
    };

    tracing::debug!(athlete = %ctx.athlete, "liftlog starting");

    match cli.command {
        Commands::Plan { action } => plan::handle_plan_command(&ctx, action).await,
        Commands::Record(action) => record::handle_record_command(&ctx, action).await,
        Commands::History(action) => history::handle_history_command(&ctx, action).await,
    }
}
