//! Plan entry reader.
//!
//! Turns the flat plan table (one row per exercise) into the per-exercise
//! templates a recording session starts from.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{ExerciseLog, PlanEntry, SessionKey, SetLog};

/// Set count used when a target-sets string cannot be read.
pub const DEFAULT_SET_COUNT: u32 = 3;

/// Selects the plan rows for one recording session.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFilter {
    pub year: i32,
    pub month_num: u32,
    pub week: u32,
    /// Session codes to merge, in the order the user picked them
    pub session_codes: Vec<String>,
}

/// Derive the number of sets from a target-sets string.
///
/// "4" gives 4, a progression like "3-4-5" gives its last step (5), and
/// anything unreadable (including "0") falls back to [`DEFAULT_SET_COUNT`].
pub fn parse_set_count(target_sets: &str) -> u32 {
    let trimmed = target_sets.trim();

    let parsed = if trimmed.contains('-') {
        trimmed
            .rsplit('-')
            .next()
            .and_then(|last| last.trim().parse::<u32>().ok())
    } else {
        trimmed.parse::<u32>().ok()
    };

    match parsed {
        Some(n) if n > 0 => n,
        _ => {
            warn!(
                target_sets,
                default = DEFAULT_SET_COUNT,
                "Malformed target sets, using default"
            );
            DEFAULT_SET_COUNT
        }
    }
}

/// Build one exercise template per plan entry, preserving entry order.
pub fn build_exercise_logs(entries: &[PlanEntry]) -> Vec<ExerciseLog> {
    entries
        .iter()
        .map(|entry| {
            let count = parse_set_count(&entry.target_sets);
            ExerciseLog {
                exercise_name: entry.exercise.clone(),
                original_session: entry.session_code.clone(),
                notes: String::new(),
                sets: (1..=count).map(SetLog::empty).collect(),
            }
        })
        .collect()
}

/// Distinct session codes in first-seen order, joined with `+`.
pub fn merged_session_code(entries: &[PlanEntry]) -> String {
    let mut codes: Vec<&str> = Vec::new();
    for entry in entries {
        if !codes.contains(&entry.session_code.as_str()) {
            codes.push(&entry.session_code);
        }
    }
    codes.join("+")
}

/// Session key for a selection: calendar position from the first entry,
/// merged session code from all of them. `None` for an empty selection.
pub fn session_key_for(entries: &[PlanEntry]) -> Option<SessionKey> {
    let first = entries.first()?;
    Some(SessionKey {
        year: first.year,
        month_num: first.month_num,
        week: first.week,
        session_code: merged_session_code(entries),
    })
}

/// Order plan rows for display: by the position of their session code in
/// the filter, then by `order`.
pub fn sort_for_selection(entries: &mut [PlanEntry], filter: &PlanFilter) {
    let position = |code: &str| {
        filter
            .session_codes
            .iter()
            .position(|c| c == code)
            .unwrap_or(usize::MAX)
    };
    entries.sort_by(|a, b| {
        position(&a.session_code)
            .cmp(&position(&b.session_code))
            .then(a.order.cmp(&b.order))
    });
}
