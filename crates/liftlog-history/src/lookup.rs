//! "What did I do last time" lookups.

use std::collections::BTreeMap;

use chrono::TimeZone;
use serde::Serialize;

use liftlog_core::{ExerciseLog, LogId, SessionLog, SetLog};

use crate::timeline::sorted;

/// The most recent logged performance of one exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastOccurrence {
    pub log_id: LogId,
    /// Date of the parent log, as stored.
    pub date: String,
    pub sets: Vec<SetLog>,
    pub notes: String,
}

/// Find the latest log containing `exercise_name`.
///
/// Matching is by exact name. Logs are walked newest first using the same
/// ordering as the history view, so logs with unreadable dates are only
/// consulted when no dated log contains the exercise.
pub fn last_occurrence<Tz: TimeZone>(
    history: &[SessionLog],
    exercise_name: &str,
    tz: &Tz,
) -> Option<LastOccurrence> {
    sorted(history, tz).into_iter().find_map(|log| {
        log.exercises
            .iter()
            .find(|e| e.exercise_name == exercise_name)
            .map(|e| LastOccurrence {
                log_id: log.id.clone(),
                date: log.date.clone(),
                sets: e.sets.clone(),
                notes: e.notes.clone(),
            })
    })
}

/// Last occurrence of every exercise in a draft, keyed by exercise name.
///
/// Logs sharing the draft's id are skipped so an edit does not show itself
/// as the previous performance. Exercises never done before are absent.
pub fn previous_performance<Tz: TimeZone>(
    exercises: &[ExerciseLog],
    exclude: &LogId,
    history: &[SessionLog],
    tz: &Tz,
) -> BTreeMap<String, LastOccurrence> {
    let others: Vec<SessionLog> = history
        .iter()
        .filter(|log| !exclude.is_persisted() || log.id != *exclude)
        .cloned()
        .collect();

    exercises
        .iter()
        .filter_map(|e| {
            last_occurrence(&others, &e.exercise_name, tz)
                .map(|found| (e.exercise_name.clone(), found))
        })
        .collect()
}
