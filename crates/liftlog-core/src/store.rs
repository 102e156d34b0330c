//! Contracts for the external collaborators the recorder talks to.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::draft::Draft;
use crate::error::StoreError;
use crate::model::{PlanEntry, SessionLog};
use crate::plan::PlanFilter;

/// Source of plan rows for a chosen year/month/week/session-code set.
#[async_trait]
pub trait PlanSource: Send + Sync {
    async fn load_plan_entries(&self, filter: &PlanFilter) -> Result<Vec<PlanEntry>, StoreError>;
}

/// Source of an athlete's full log collection, in no particular order.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn load_history(&self, athlete: &str) -> Result<Vec<SessionLog>, StoreError>;
}

/// Remote storage of finalized logs.
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Upsert by id, returning the stored record.
    async fn persist(&self, log: SessionLog) -> Result<SessionLog, StoreError>;

    /// Returns false when no record had that id.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// A single durable slot holding the in-progress draft.
///
/// The whole [`Draft`] is stored, start time included, so a recovered
/// draft measures its duration from when the session really began.
/// Every write overwrites the previous value; there is no history.
pub trait DraftSlot {
    fn load(&self) -> Result<Option<Draft>, StoreError>;
    fn save(&self, draft: &Draft) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

impl<T: DraftSlot + ?Sized> DraftSlot for &T {
    fn load(&self) -> Result<Option<Draft>, StoreError> {
        (**self).load()
    }

    fn save(&self, draft: &Draft) -> Result<(), StoreError> {
        (**self).save(draft)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// In-memory draft slot, useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryDraftSlot {
    value: Mutex<Option<String>>,
}

impl MemoryDraftSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StoreError> {
        self.value
            .lock()
            .map_err(|_| StoreError::Backend("Draft slot lock poisoned".to_string()))
    }
}

impl DraftSlot for MemoryDraftSlot {
    fn load(&self) -> Result<Option<Draft>, StoreError> {
        match self.lock()?.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, draft: &Draft) -> Result<(), StoreError> {
        let raw = serde_json::to_string(draft)?;
        *self.lock()? = Some(raw);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.lock()? = None;
        Ok(())
    }
}
