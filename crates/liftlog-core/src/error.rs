use thiserror::Error;

use crate::model::SessionLog;

/// Errors raised by the external collaborators (datastore, draft slot).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Retroactive date is incomplete: day, month and year are all required")]
    IncompleteDate,

    #[error("Invalid calendar date: {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("No plan entries selected")]
    EmptySelection,

    #[error("A draft is already in progress")]
    DraftInProgress,

    #[error("No draft in progress")]
    NoDraft,

    #[error("Operation not allowed while recorder is {0}")]
    InvalidPhase(&'static str),

    #[error("Exercise index {index} out of range ({len} exercises)")]
    ExerciseOutOfRange { index: usize, len: usize },

    #[error("Set index {index} out of range ({len} sets)")]
    SetOutOfRange { index: usize, len: usize },

    #[error("Persistence error: {0}")]
    Persistence(#[source] StoreError),

    #[error("Draft slot error: {0}")]
    Slot(#[source] StoreError),

    /// The log was persisted but the slot still holds the finished draft.
    #[error("Session saved as {} but the draft slot could not be cleared: {source}", .saved.id)]
    SlotNotCleared {
        saved: Box<SessionLog>,
        #[source]
        source: StoreError,
    },
}

impl CoreError {
    /// Validation failures leave all state untouched and can be fixed by the user.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::IncompleteDate | Self::InvalidDate { .. } | Self::EmptySelection
        )
    }
}
