//! The single durable autosave slot for the in-progress draft.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::MutexGuard;

use liftlog_core::Draft;

use crate::DbError;

const SLOT_KEY: &str = "current";

/// Draft slot with a borrowed connection. Each save overwrites the last.
pub struct Drafts<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> Drafts<'db> {
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    pub fn load(&self) -> Result<Option<Draft>, DbError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM draft_slot WHERE key = ?1",
                params![SLOT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn save(&self, draft: &Draft) -> Result<(), DbError> {
        let payload = serde_json::to_string(draft)?;
        self.conn.execute(
            r#"
            INSERT INTO draft_slot (key, payload, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                saved_at = excluded.saved_at
            "#,
            params![SLOT_KEY, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM draft_slot WHERE key = ?1", params![SLOT_KEY])?;
        Ok(())
    }
}
