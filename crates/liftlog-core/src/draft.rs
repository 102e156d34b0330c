//! The in-flight session draft.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::finalize::iso_timestamp;
use crate::model::{ExerciseLog, LogId, PlanEntry, SessionKey, SessionLog, SetField};
use crate::plan::{build_exercise_logs, session_key_for};

/// An in-progress, not-yet-finalized session log.
///
/// The number of sets per exercise is fixed when the draft is created.
/// This is also the record kept in the autosave slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    id: LogId,
    session_key: SessionKey,
    exercises: Vec<ExerciseLog>,
    comments: BTreeMap<String, String>,
    /// Date of the log being edited; `None` for new sessions
    original_date: Option<String>,
    original_duration: Option<u32>,
    started_at: DateTime<Utc>,
}

impl Draft {
    /// Start a new draft from a plan selection.
    pub fn from_plan(entries: &[PlanEntry], now: DateTime<Utc>) -> Result<Self, CoreError> {
        let session_key = session_key_for(entries).ok_or(CoreError::EmptySelection)?;
        Ok(Self {
            id: LogId::Unsaved,
            session_key,
            exercises: build_exercise_logs(entries),
            comments: BTreeMap::new(),
            original_date: None,
            original_duration: None,
            started_at: now,
        })
    }

    /// Re-enter drafting from an existing log chosen for editing.
    ///
    /// A persisted id puts the draft in edit mode. `now` becomes the start
    /// of the editing session.
    pub fn from_log(log: SessionLog, now: DateTime<Utc>) -> Self {
        let original_date = log.id.is_persisted().then(|| log.date.clone());
        Self {
            original_duration: log.duration_minutes.filter(|_| log.id.is_persisted()),
            id: log.id,
            session_key: log.session_key,
            exercises: log.exercises,
            comments: log.comments,
            original_date,
            started_at: now,
        }
    }

    /// Editing an already persisted log.
    pub fn is_edit_mode(&self) -> bool {
        self.id.is_persisted()
    }

    pub fn id(&self) -> &LogId {
        &self.id
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    pub fn exercises(&self) -> &[ExerciseLog] {
        &self.exercises
    }

    pub fn comments(&self) -> &BTreeMap<String, String> {
        &self.comments
    }

    pub fn original_date(&self) -> Option<&str> {
        self.original_date.as_deref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Write `value` into one field of a set.
    ///
    /// Once both reps and weight are non-empty the set is marked completed.
    /// Clearing a field later does not un-mark it.
    pub fn update_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        field: SetField,
        value: &str,
    ) -> Result<(), CoreError> {
        let exercise_count = self.exercises.len();
        let exercise = self
            .exercises
            .get_mut(exercise_index)
            .ok_or(CoreError::ExerciseOutOfRange {
                index: exercise_index,
                len: exercise_count,
            })?;

        let set_count = exercise.sets.len();
        let set = exercise
            .sets
            .get_mut(set_index)
            .ok_or(CoreError::SetOutOfRange {
                index: set_index,
                len: set_count,
            })?;

        match field {
            SetField::Reps => set.reps = value.to_string(),
            SetField::Weight => set.weight = value.to_string(),
        }

        if !set.reps.is_empty() && !set.weight.is_empty() {
            set.completed = true;
        }

        Ok(())
    }

    /// Replace the athlete's notes for one exercise.
    pub fn update_notes(&mut self, exercise_index: usize, notes: &str) -> Result<(), CoreError> {
        let len = self.exercises.len();
        let exercise = self
            .exercises
            .get_mut(exercise_index)
            .ok_or(CoreError::ExerciseOutOfRange {
                index: exercise_index,
                len,
            })?;
        exercise.notes = notes.to_string();
        Ok(())
    }

    /// Set or clear (empty text) the comment attached to an exercise name.
    pub fn set_comment(&mut self, exercise_name: &str, comment: &str) {
        if comment.is_empty() {
            self.comments.remove(exercise_name);
        } else {
            self.comments
                .insert(exercise_name.to_string(), comment.to_string());
        }
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter(|s| s.completed)
            .count()
    }

    /// The in-progress log as written to the autosave slot.
    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionLog {
        SessionLog {
            id: self.id.clone(),
            date: self
                .original_date
                .clone()
                .unwrap_or_else(|| iso_timestamp(now)),
            session_key: self.session_key.clone(),
            exercises: self.exercises.clone(),
            duration_minutes: self.original_duration,
            comments: self.comments.clone(),
        }
    }
}
