//! Converts a draft into an immutable session log.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::draft::Draft;
use crate::error::CoreError;
use crate::model::{LogId, SessionLog};

/// Placeholder duration for backfilled sessions.
pub const RETROACTIVE_DURATION_MINUTES: u32 = 60;

/// Serialize an instant the way stored logs expect: UTC, millisecond
/// precision, `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Mints identifiers for newly created logs.
pub trait IdSource: Send + Sync {
    fn mint(&self) -> String;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn mint(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// The day a backfilled session happened. Each part is picked separately by
/// the user and may still be missing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetroDate {
    pub day: Option<u32>,
    /// 1-based
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl RetroDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            day: Some(day),
            month: Some(month),
            year: Some(year),
        }
    }

    /// Resolve to a calendar date, failing when any part is missing or the
    /// combination does not exist.
    pub fn resolve(&self) -> Result<NaiveDate, CoreError> {
        let (Some(year), Some(month), Some(day)) = (self.year, self.month, self.day) else {
            return Err(CoreError::IncompleteDate);
        };
        NaiveDate::from_ymd_opt(year, month, day).ok_or(CoreError::InvalidDate { year, month, day })
    }
}

impl From<NaiveDate> for RetroDate {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::new(date.year(), date.month(), date.day())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOptions {
    /// `Some` when recording a session that happened on a past date
    pub retroactive: Option<RetroDate>,
}

impl FinalizeOptions {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn retroactive(date: RetroDate) -> Self {
        Self {
            retroactive: Some(date),
        }
    }
}

/// Noon on `date` in `tz`, so that shifting to UTC never changes the day.
fn local_noon<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    let noon = date.and_hms_opt(12, 0, 0)?;
    tz.from_local_datetime(&noon)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn elapsed_minutes(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let secs = (now - started_at).num_seconds().max(0);
    (secs as f64 / 60.0).round() as u32
}

/// Build the final log for `draft` without touching any storage.
///
/// Identity: the draft's own id when editing, a freshly minted one otherwise.
/// Date: the retroactive day at local noon, else the edited log's original
/// date, else `now`. Duration: a fixed placeholder for retroactive sessions,
/// else whole minutes since the draft started.
pub fn build_log<Tz: TimeZone>(
    draft: &Draft,
    options: &FinalizeOptions,
    now: DateTime<Utc>,
    tz: &Tz,
    ids: &dyn IdSource,
) -> Result<SessionLog, CoreError> {
    let (date, duration_minutes) = match options.retroactive {
        Some(retro) => {
            let day = retro.resolve()?;
            let at = local_noon(day, tz).ok_or(CoreError::InvalidDate {
                year: retro.year.unwrap_or_default(),
                month: retro.month.unwrap_or_default(),
                day: retro.day.unwrap_or_default(),
            })?;
            (iso_timestamp(at), RETROACTIVE_DURATION_MINUTES)
        }
        None => {
            let date = match draft.original_date() {
                Some(original) if draft.is_edit_mode() => original.to_string(),
                _ => iso_timestamp(now),
            };
            (date, elapsed_minutes(draft.started_at(), now))
        }
    };

    let id = if draft.is_edit_mode() {
        draft.id().clone()
    } else {
        LogId::Persisted(ids.mint())
    };

    Ok(SessionLog {
        id,
        date,
        session_key: draft.session_key().clone(),
        exercises: draft.exercises().to_vec(),
        duration_minutes: Some(duration_minutes),
        comments: draft.comments().clone(),
    })
}
