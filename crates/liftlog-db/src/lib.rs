//! Database layer for liftlog.
//!
//! Provides a unified `Database` struct that owns the SQLite connection
//! and provides access to domain-specific stores. `Database` also
//! implements the collaborator traits the recorder and history views use.

mod drafts;
mod logs;
mod plans;

pub use drafts::Drafts;
pub use logs::Logs;
pub use plans::Plans;

use async_trait::async_trait;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use liftlog_core::{
    Draft, DraftSlot, HistorySource, LogRepository, PlanEntry, PlanFilter, PlanSource, SessionLog,
    StoreError,
};

/// Athlete used when none is configured.
pub const DEFAULT_ATHLETE: &str = "default";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid JSON column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Sqlite(e) => StoreError::Database(e.to_string()),
            DbError::Json(e) => StoreError::Serialization(e),
            DbError::Io(e) => StoreError::Io(e),
        }
    }
}

/// The main database struct that owns the SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
    athlete: String,
}

impl Database {
    /// Open or create a database at the default location.
    ///
    /// The default location is `~/.local/share/liftlog/liftlog.db`.
    pub fn open() -> Result<Self, DbError> {
        let db_path = Self::default_path();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::open_at(&db_path)
    }

    /// Open or create a database at a specific path.
    pub fn open_at(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            athlete: DEFAULT_ATHLETE.to_string(),
        }
    }

    /// Get the default database path.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("liftlog")
            .join("liftlog.db")
    }

    /// Owner of logs written through [`LogRepository`].
    pub fn with_athlete(mut self, athlete: impl Into<String>) -> Self {
        self.athlete = athlete.into();
        self
    }

    pub fn athlete(&self) -> &str {
        &self.athlete
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves SQLite itself consistent
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Access the plan store.
    pub fn plans(&self) -> Plans<'_> {
        Plans::new(self.lock())
    }

    /// Access the session log store.
    pub fn logs(&self) -> Logs<'_> {
        Logs::new(self.lock())
    }

    /// Access the draft slot.
    pub fn drafts(&self) -> Drafts<'_> {
        Drafts::new(self.lock())
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS plan_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exercise TEXT NOT NULL,
                session_code TEXT NOT NULL,
                target_sets TEXT NOT NULL,
                target_reps TEXT NOT NULL,
                rest_seconds INTEGER,
                tempo TEXT NOT NULL,
                notes TEXT NOT NULL,
                video_url TEXT,
                year INTEGER NOT NULL,
                month_num INTEGER NOT NULL,
                week INTEGER NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS logs (
                id TEXT PRIMARY KEY,
                athlete TEXT NOT NULL,
                date TEXT NOT NULL,
                year INTEGER NOT NULL,
                month_num INTEGER NOT NULL,
                week INTEGER NOT NULL,
                session_code TEXT NOT NULL,
                exercises TEXT NOT NULL,
                duration_minutes INTEGER,
                comments TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS draft_slot (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_plan_entries_week
                ON plan_entries(year, month_num, week, session_code);
            CREATE INDEX IF NOT EXISTS idx_logs_athlete ON logs(athlete);
            "#,
        )
    }
}

#[async_trait]
impl PlanSource for Database {
    async fn load_plan_entries(&self, filter: &PlanFilter) -> Result<Vec<PlanEntry>, StoreError> {
        Ok(self.plans().list(filter)?)
    }
}

#[async_trait]
impl HistorySource for Database {
    async fn load_history(&self, athlete: &str) -> Result<Vec<SessionLog>, StoreError> {
        Ok(self.logs().list(athlete)?)
    }
}

#[async_trait]
impl LogRepository for Database {
    async fn persist(&self, log: SessionLog) -> Result<SessionLog, StoreError> {
        if !log.id.is_persisted() {
            return Err(StoreError::Backend(
                "Refusing to store a log without an id".to_string(),
            ));
        }
        self.logs().upsert(&self.athlete, &log)?;
        Ok(log)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.logs().delete(id)?)
    }
}

impl DraftSlot for Database {
    fn load(&self) -> Result<Option<Draft>, StoreError> {
        Ok(self.drafts().load()?)
    }

    fn save(&self, draft: &Draft) -> Result<(), StoreError> {
        Ok(self.drafts().save(draft)?)
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(self.drafts().clear()?)
    }
}
