//! # liftlog-core
//!
//! Recording a workout session: building set templates from a training
//! plan, drafting the session set-by-set with autosave, and finalizing it
//! into an immutable [`SessionLog`].
//!
//! ## Key Types
//!
//! - [`Draft`] - The in-flight session, an owned value
//! - [`SessionRecorder`] - Phase machine around the draft and its autosave slot
//! - [`FinalizeOptions`] - Live vs. retroactive finalization
//! - [`DraftSlot`], [`LogRepository`] - Collaborator contracts

mod draft;
mod error;
pub mod finalize;
mod model;
pub mod plan;
mod recorder;
pub mod store;

pub use draft::Draft;
pub use error::{CoreError, StoreError};
pub use finalize::{build_log, iso_timestamp, FinalizeOptions, IdSource, RetroDate, UuidIds};
pub use model::{ExerciseLog, LogId, PlanEntry, SessionKey, SessionLog, SetField, SetLog};
pub use plan::{build_exercise_logs, parse_set_count, session_key_for, PlanFilter};
pub use recorder::{Phase, SessionRecorder};
pub use store::{DraftSlot, HistorySource, LogRepository, MemoryDraftSlot, PlanSource};
