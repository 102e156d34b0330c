//! Logs store for finalized workout sessions.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::MutexGuard;
use tracing::debug;

use liftlog_core::{LogId, SessionKey, SessionLog};

use crate::DbError;

const LOG_COLUMNS: &str =
    "id, date, year, month_num, week, session_code, exercises, duration_minutes, comments";

/// Logs store with a borrowed connection.
pub struct Logs<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> Logs<'db> {
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Insert or replace a log by id. The stored date is kept verbatim.
    pub fn upsert(&self, athlete: &str, log: &SessionLog) -> Result<(), DbError> {
        let exercises = serde_json::to_string(&log.exercises)?;
        let comments = serde_json::to_string(&log.comments)?;

        self.conn.execute(
            r#"
            INSERT INTO logs (id, athlete, date, year, month_num, week, session_code, exercises, duration_minutes, comments, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                athlete = excluded.athlete,
                date = excluded.date,
                year = excluded.year,
                month_num = excluded.month_num,
                week = excluded.week,
                session_code = excluded.session_code,
                exercises = excluded.exercises,
                duration_minutes = excluded.duration_minutes,
                comments = excluded.comments,
                updated_at = excluded.updated_at
            "#,
            params![
                log.id.as_str(),
                athlete,
                log.date,
                log.session_key.year,
                log.session_key.month_num,
                log.session_key.week,
                log.session_key.session_code,
                exercises,
                log.duration_minutes,
                comments,
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!(id = %log.id, athlete, "Stored log");
        Ok(())
    }

    /// Get a log by ID.
    pub fn get(&self, id: &str) -> Result<Option<SessionLog>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM logs WHERE id = ?1", LOG_COLUMNS),
                params![id],
                Self::row_to_raw,
            )
            .optional()?;

        row.map(RawLog::into_log).transpose()
    }

    /// All logs for an athlete, in storage order. Callers sort.
    pub fn list(&self, athlete: &str) -> Result<Vec<SessionLog>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM logs WHERE athlete = ?1",
            LOG_COLUMNS
        ))?;
        let rows = stmt.query_map(params![athlete], Self::row_to_raw)?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?.into_log()?);
        }

        Ok(logs)
    }

    /// Delete a log by ID.
    pub fn delete(&self, id: &str) -> Result<bool, DbError> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM logs WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    fn row_to_raw(row: &rusqlite::Row) -> Result<RawLog, rusqlite::Error> {
        Ok(RawLog {
            id: row.get(0)?,
            date: row.get(1)?,
            session_key: SessionKey {
                year: row.get(2)?,
                month_num: row.get(3)?,
                week: row.get(4)?,
                session_code: row.get(5)?,
            },
            exercises: row.get(6)?,
            duration_minutes: row.get(7)?,
            comments: row.get(8)?,
        })
    }
}

/// A log row before its JSON columns are decoded.
struct RawLog {
    id: String,
    date: String,
    session_key: SessionKey,
    exercises: String,
    duration_minutes: Option<u32>,
    comments: String,
}

impl RawLog {
    fn into_log(self) -> Result<SessionLog, DbError> {
        Ok(SessionLog {
            id: LogId::from(self.id),
            date: self.date,
            session_key: self.session_key,
            exercises: serde_json::from_str(&self.exercises)?,
            duration_minutes: self.duration_minutes,
            comments: serde_json::from_str(&self.comments)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use liftlog_core::{LogId, SessionKey, SessionLog};
    use std::collections::BTreeMap;

    fn log(id: &str, date: &str, week: u32) -> SessionLog {
        SessionLog {
            id: LogId::from(id),
            date: date.to_string(),
            session_key: SessionKey {
                year: 2023,
                month_num: 2,
                week,
                session_code: "1".to_string(),
            },
            exercises: Vec::new(),
            duration_minutes: None,
            comments: BTreeMap::new(),
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let db = Database::open_in_memory().unwrap();
        db.logs().upsert("sam", &log("a", "2023-02-14T12:00:00.000Z", 1)).unwrap();

        let stored = db.logs().get("a").unwrap().unwrap();
        assert_eq!(stored.id, LogId::Persisted("a".to_string()));
        assert_eq!(stored.session_key.week, 1);
        assert_eq!(stored.duration_minutes, None);

        db.logs().upsert("sam", &log("a", "2023-02-14T12:00:00.000Z", 2)).unwrap();
        assert_eq!(db.logs().get("a").unwrap().unwrap().session_key.week, 2);
        assert!(db.logs().get("missing").unwrap().is_none());
    }

    #[test]
    fn test_legacy_date_kept_verbatim() {
        let db = Database::open_in_memory().unwrap();
        db.logs().upsert("sam", &log("old", "14/02/2023 - Leg Day", 1)).unwrap();

        let history = db.logs().list("sam").unwrap();
        assert_eq!(history[0].date, "14/02/2023 - Leg Day");
    }

    #[test]
    fn test_list_scoped_to_athlete_and_delete() {
        let db = Database::open_in_memory().unwrap();
        db.logs().upsert("sam", &log("a", "2023-02-14T12:00:00.000Z", 1)).unwrap();
        db.logs().upsert("sam", &log("b", "2023-02-15T12:00:00.000Z", 1)).unwrap();
        db.logs().upsert("alex", &log("c", "2023-02-15T12:00:00.000Z", 1)).unwrap();

        assert_eq!(db.logs().list("sam").unwrap().len(), 2);
        assert!(db.logs().delete("a").unwrap());
        assert!(!db.logs().delete("a").unwrap());
        assert_eq!(db.logs().list("sam").unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_json_column_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.logs().upsert("sam", &log("a", "2023-02-14T12:00:00.000Z", 1)).unwrap();
        db.lock()
            .execute("UPDATE logs SET exercises = 'oops' WHERE id = 'a'", [])
            .unwrap();

        assert!(db.logs().get("a").is_err());
    }
}
