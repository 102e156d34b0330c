//! Plan store: the coach-authored training plan, one row per exercise.

use rusqlite::{params, Connection};
use std::sync::MutexGuard;
use tracing::info;

use liftlog_core::plan::sort_for_selection;
use liftlog_core::{PlanEntry, PlanFilter, SessionKey};

use crate::DbError;

const PLAN_COLUMNS: &str = "exercise, session_code, target_sets, target_reps, rest_seconds, tempo, notes, video_url, year, month_num, week, sort_order";

/// Plan store with a borrowed connection.
pub struct Plans<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> Plans<'db> {
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Append plan rows in a single transaction, returning how many were written.
    pub fn import(&self, entries: &[PlanEntry]) -> Result<usize, DbError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO plan_entries ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                PLAN_COLUMNS
            ))?;
            for entry in entries {
                stmt.execute(params![
                    entry.exercise,
                    entry.session_code,
                    entry.target_sets,
                    entry.target_reps,
                    entry.rest_seconds,
                    entry.tempo,
                    entry.notes,
                    entry.video_url,
                    entry.year,
                    entry.month_num,
                    entry.week,
                    entry.order,
                ])?;
            }
        }
        tx.commit()?;

        info!(rows = entries.len(), "Imported plan entries");
        Ok(entries.len())
    }

    /// Import a JSON array of plan entries.
    pub fn import_json(&self, json: &str) -> Result<usize, DbError> {
        let entries: Vec<PlanEntry> = serde_json::from_str(json)?;
        self.import(&entries)
    }

    /// Rows for one week, restricted to the filter's session codes when any
    /// are given. Picked codes are ordered the way they were picked.
    pub fn list(&self, filter: &PlanFilter) -> Result<Vec<PlanEntry>, DbError> {
        let mut sql = format!(
            "SELECT {} FROM plan_entries WHERE year = ? AND month_num = ? AND week = ?",
            PLAN_COLUMNS
        );
        let mut param_values: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(filter.year),
            Box::new(filter.month_num),
            Box::new(filter.week),
        ];

        if !filter.session_codes.is_empty() {
            let placeholders = vec!["?"; filter.session_codes.len()].join(", ");
            sql.push_str(&format!(" AND session_code IN ({})", placeholders));
            for code in &filter.session_codes {
                param_values.push(Box::new(code.clone()));
            }
        }

        sql.push_str(" ORDER BY session_code, sort_order, id");

        let params: Vec<&dyn rusqlite::ToSql> = param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), Self::row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        if !filter.session_codes.is_empty() {
            sort_for_selection(&mut entries, filter);
        }
        Ok(entries)
    }

    /// Every distinct (year, month, week, session code) in the plan.
    pub fn sessions(&self) -> Result<Vec<SessionKey>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT year, month_num, week, session_code FROM plan_entries ORDER BY year, month_num, week, session_code",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionKey {
                year: row.get(0)?,
                month_num: row.get(1)?,
                week: row.get(2)?,
                session_code: row.get(3)?,
            })
        })?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }

        Ok(keys)
    }

    /// Remove every plan row.
    pub fn clear(&self) -> Result<usize, DbError> {
        Ok(self.conn.execute("DELETE FROM plan_entries", [])?)
    }

    fn row_to_entry(row: &rusqlite::Row) -> Result<PlanEntry, rusqlite::Error> {
        Ok(PlanEntry {
            exercise: row.get(0)?,
            session_code: row.get(1)?,
            target_sets: row.get(2)?,
            target_reps: row.get(3)?,
            rest_seconds: row.get(4)?,
            tempo: row.get(5)?,
            notes: row.get(6)?,
            video_url: row.get(7)?,
            year: row.get(8)?,
            month_num: row.get(9)?,
            week: row.get(10)?,
            order: row.get(11)?,
        })
    }
}
