use std::sync::Arc;

use chrono::{Local, TimeZone, Utc};
use tracing::{debug, info, warn};

use liftlog_logging::{LogEvent, Logger};

use crate::draft::Draft;
use crate::error::CoreError;
use crate::finalize::{build_log, FinalizeOptions, IdSource, UuidIds};
use crate::model::{PlanEntry, SessionLog, SetField};
use crate::store::{DraftSlot, LogRepository};

/// Lifecycle of the single active draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Drafting,
    Finalizing,
    Saved,
    Cancelled,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Drafting => "drafting",
            Phase::Finalizing => "finalizing",
            Phase::Saved => "saved",
            Phase::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Puts the phase back to `Drafting` if a finalize is abandoned mid-flight.
struct FinalizeGuard<'a> {
    phase: &'a mut Phase,
    armed: bool,
}

impl<'a> FinalizeGuard<'a> {
    fn enter(phase: &'a mut Phase) -> Self {
        *phase = Phase::Finalizing;
        Self { phase, armed: true }
    }

    fn complete(mut self, phase: Phase) {
        *self.phase = phase;
        self.armed = false;
    }
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            *self.phase = Phase::Drafting;
        }
    }
}

/// Owns the one in-flight draft and its durable autosave slot.
///
/// Every mutation is followed by an autosave of the whole draft,
/// which is the only crash-recovery mechanism.
pub struct SessionRecorder<S: DraftSlot, Tz: TimeZone = Local> {
    slot: S,
    tz: Tz,
    ids: Box<dyn IdSource>,
    logger: Option<Arc<Logger>>,
    phase: Phase,
    draft: Option<Draft>,
}

impl<S: DraftSlot> SessionRecorder<S, Local> {
    pub fn new(slot: S) -> Self {
        Self::with_timezone(slot, Local)
    }
}

impl<S: DraftSlot, Tz: TimeZone> SessionRecorder<S, Tz> {
    /// Create a recorder whose retroactive dates are anchored in `tz`.
    pub fn with_timezone(slot: S, tz: Tz) -> Self {
        Self {
            slot,
            tz,
            ids: Box::new(UuidIds),
            logger: None,
            phase: Phase::Uninitialized,
            draft: None,
        }
    }

    pub fn with_ids(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    fn log_event(&self, event: LogEvent) {
        if let Some(ref logger) = self.logger {
            logger.log(&event);
        }
    }

    fn ensure_can_start(&self) -> Result<(), CoreError> {
        match self.phase {
            Phase::Drafting => Err(CoreError::DraftInProgress),
            Phase::Finalizing => Err(CoreError::InvalidPhase(self.phase.as_str())),
            _ => Ok(()),
        }
    }

    fn draft_mut(&mut self) -> Result<&mut Draft, CoreError> {
        if self.phase != Phase::Drafting {
            return Err(CoreError::InvalidPhase(self.phase.as_str()));
        }
        self.draft.as_mut().ok_or(CoreError::NoDraft)
    }

    fn autosave(&self) -> Result<(), CoreError> {
        let draft = self.draft.as_ref().ok_or(CoreError::NoDraft)?;
        self.slot.save(draft).map_err(CoreError::Slot)?;
        debug!(id = %draft.id(), "Draft autosaved");
        Ok(())
    }

    fn enter_drafting(&mut self, draft: Draft) -> Result<&Draft, CoreError> {
        self.draft = Some(draft);
        self.phase = Phase::Drafting;
        self.autosave()?;
        self.draft.as_ref().ok_or(CoreError::NoDraft)
    }

    /// Peek at the autosaved draft without entering it, so the caller can
    /// offer recovery.
    pub fn pending_draft(&self) -> Result<Option<Draft>, CoreError> {
        self.slot.load().map_err(CoreError::Slot)
    }

    /// Resume the autosaved draft if there is one. Its original start time
    /// is kept.
    pub fn recover(&mut self) -> Result<Option<&Draft>, CoreError> {
        self.ensure_can_start()?;
        let Some(draft) = self.slot.load().map_err(CoreError::Slot)? else {
            return Ok(None);
        };

        info!(session = %draft.session_key(), edit = draft.is_edit_mode(), "Recovered draft");
        self.log_event(LogEvent::DraftRecovered {
            session: draft.session_key().to_string(),
            completed_sets: draft.completed_sets(),
            total_sets: draft.total_sets(),
        });

        self.draft = Some(draft);
        self.phase = Phase::Drafting;
        Ok(self.draft.as_ref())
    }

    /// Start a new session from one or more merged plan sessions.
    pub fn start_from_plan(&mut self, entries: &[PlanEntry]) -> Result<&Draft, CoreError> {
        self.ensure_can_start()?;
        let draft = Draft::from_plan(entries, Utc::now())?;
        info!(session = %draft.session_key(), exercises = draft.exercises().len(), "Started draft");
        self.log_event(LogEvent::DraftStarted {
            session: draft.session_key().to_string(),
            exercises: draft.exercises().len(),
            sets: draft.total_sets(),
            edit: false,
        });
        self.enter_drafting(draft)
    }

    /// Start editing an existing log. Its id is kept when it is a real one.
    pub fn start_from_log(&mut self, log: SessionLog) -> Result<&Draft, CoreError> {
        self.ensure_can_start()?;
        let draft = Draft::from_log(log, Utc::now());
        info!(id = %draft.id(), session = %draft.session_key(), "Editing log");
        self.log_event(LogEvent::DraftStarted {
            session: draft.session_key().to_string(),
            exercises: draft.exercises().len(),
            sets: draft.total_sets(),
            edit: draft.is_edit_mode(),
        });
        self.enter_drafting(draft)
    }

    pub fn update_set(
        &mut self,
        exercise_index: usize,
        set_index: usize,
        field: SetField,
        value: &str,
    ) -> Result<(), CoreError> {
        let draft = self.draft_mut()?;
        draft.update_set(exercise_index, set_index, field, value)?;

        let exercise = &draft.exercises()[exercise_index];
        let set = &exercise.sets[set_index];
        let event = LogEvent::SetUpdated {
            exercise: exercise.exercise_name.clone(),
            set_number: set.set_number,
            field: format!("{:?}", field).to_lowercase(),
            completed: set.completed,
        };

        self.log_event(event);
        self.autosave()
    }

    pub fn update_notes(&mut self, exercise_index: usize, notes: &str) -> Result<(), CoreError> {
        self.draft_mut()?.update_notes(exercise_index, notes)?;
        self.autosave()
    }

    pub fn set_comment(&mut self, exercise_name: &str, comment: &str) -> Result<(), CoreError> {
        self.draft_mut()?.set_comment(exercise_name, comment);
        self.autosave()
    }

    /// Turn the draft into a persisted log.
    ///
    /// Validation failures change nothing. A persistence failure leaves the
    /// draft in place, back in `Drafting`, ready for a retry. If the log is
    /// saved but the slot cannot be cleared, the recorder still ends in
    /// `Saved` and the error carries the saved log.
    pub async fn finalize(
        &mut self,
        options: FinalizeOptions,
        repo: &dyn LogRepository,
    ) -> Result<SessionLog, CoreError> {
        if self.phase != Phase::Drafting {
            return Err(CoreError::InvalidPhase(self.phase.as_str()));
        }
        let draft = self.draft.as_ref().ok_or(CoreError::NoDraft)?;
        let log = build_log(draft, &options, Utc::now(), &self.tz, self.ids.as_ref())?;
        let retroactive = options.retroactive.is_some();

        let guard = FinalizeGuard::enter(&mut self.phase);
        match repo.persist(log).await {
            Ok(saved) => {
                let cleared = self.slot.clear();
                self.draft = None;
                guard.complete(Phase::Saved);

                info!(id = %saved.id, date = %saved.date, "Finalized session");
                self.log_event(LogEvent::DraftFinalized {
                    id: saved.id.to_string(),
                    date: saved.date.clone(),
                    duration_minutes: saved.duration_minutes,
                    retroactive,
                });

                if let Err(source) = cleared {
                    warn!(id = %saved.id, error = %source, "Saved session but draft slot was not cleared");
                    return Err(CoreError::SlotNotCleared {
                        saved: Box::new(saved),
                        source,
                    });
                }
                Ok(saved)
            }
            Err(e) => {
                guard.complete(Phase::Drafting);
                warn!(error = %e, "Failed to persist session, draft kept");
                self.log_event(LogEvent::FinalizeFailed {
                    error: e.to_string(),
                });
                Err(CoreError::Persistence(e))
            }
        }
    }

    /// Discard the draft and clear the autosave slot.
    pub fn cancel(&mut self) -> Result<(), CoreError> {
        if self.phase == Phase::Finalizing {
            return Err(CoreError::InvalidPhase(self.phase.as_str()));
        }
        self.slot.clear().map_err(CoreError::Slot)?;
        self.draft = None;
        self.phase = Phase::Cancelled;
        info!("Draft cancelled");
        self.log_event(LogEvent::DraftCancelled);
        Ok(())
    }
}
