use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Utc};
use liftlog_core::{
    CoreError, Draft, DraftSlot, FinalizeOptions, IdSource, LogId, LogRepository,
    MemoryDraftSlot, Phase, PlanEntry, RetroDate, SessionKey, SessionLog, SessionRecorder,
    SetField, StoreError,
};

/// In-memory repository that can be switched into a failing mode.
#[derive(Default)]
struct FakeRepo {
    logs: Mutex<Vec<SessionLog>>,
    failing: AtomicBool,
}

#[async_trait]
impl LogRepository for FakeRepo {
    async fn persist(&self, log: SessionLog) -> Result<SessionLog, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("network unreachable".to_string()));
        }
        let mut logs = self.logs.lock().unwrap();
        logs.retain(|l| l.id != log.id);
        logs.push(log.clone());
        Ok(log)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut logs = self.logs.lock().unwrap();
        let before = logs.len();
        logs.retain(|l| l.id.as_str() != id);
        Ok(logs.len() != before)
    }
}

/// Slot whose `clear` always fails, as with a read-only database file.
#[derive(Default)]
struct StickySlot {
    inner: MemoryDraftSlot,
}

impl DraftSlot for StickySlot {
    fn load(&self) -> Result<Option<Draft>, StoreError> {
        self.inner.load()
    }

    fn save(&self, draft: &Draft) -> Result<(), StoreError> {
        self.inner.save(draft)
    }

    fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend("attempt to write a readonly database".to_string()))
    }
}

struct CountingIds(AtomicUsize);

impl IdSource for CountingIds {
    fn mint(&self) -> String {
        format!("log-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn plan_entry(exercise: &str, code: &str, target_sets: &str, order: i32) -> PlanEntry {
    PlanEntry {
        exercise: exercise.to_string(),
        session_code: code.to_string(),
        target_sets: target_sets.to_string(),
        target_reps: "8".to_string(),
        rest_seconds: Some(120),
        tempo: String::new(),
        notes: String::new(),
        video_url: None,
        year: 2024,
        month_num: 4,
        week: 3,
        order,
    }
}

fn selection() -> Vec<PlanEntry> {
    vec![
        plan_entry("Squat", "1", "3-4-5", 1),
        plan_entry("Bench Press", "2", "4", 1),
    ]
}

fn saved_log(id: &str, duration_minutes: u32) -> SessionLog {
    SessionLog {
        id: LogId::from(id),
        date: "2024-04-02T10:00:00.000Z".to_string(),
        session_key: SessionKey {
            year: 2024,
            month_num: 4,
            week: 3,
            session_code: "1".to_string(),
        },
        exercises: liftlog_core::build_exercise_logs(&[plan_entry("Squat", "1", "3", 1)]),
        duration_minutes: Some(duration_minutes),
        comments: Default::default(),
    }
}

fn recorder(slot: &MemoryDraftSlot) -> SessionRecorder<&MemoryDraftSlot> {
    SessionRecorder::new(slot).with_ids(CountingIds(AtomicUsize::new(0)))
}

// ============================================================
// Drafting
// ============================================================

#[test]
fn test_start_from_plan_autosaves_sentinel_draft() {
    let slot = MemoryDraftSlot::new();
    let mut rec = recorder(&slot);
    assert_eq!(rec.phase(), Phase::Uninitialized);

    let draft = rec.start_from_plan(&selection()).unwrap();
    assert_eq!(draft.exercises().len(), 2);
    assert_eq!(draft.exercises()[0].sets.len(), 5);
    assert_eq!(rec.phase(), Phase::Drafting);

    let saved = slot.load().unwrap().unwrap();
    assert_eq!(saved.id(), &LogId::Unsaved);
    assert_eq!(saved.session_key().session_code, "1+2");
    assert_eq!(saved.session_key().week, 3);
}

#[test]
fn test_only_one_draft_in_flight() {
    let slot = MemoryDraftSlot::new();
    let mut rec = recorder(&slot);
    rec.start_from_plan(&selection()).unwrap();

    let err = rec.start_from_plan(&selection()).unwrap_err();
    assert!(matches!(err, CoreError::DraftInProgress));
}

#[test]
fn test_every_mutation_is_autosaved() {
    let slot = MemoryDraftSlot::new();
    let mut rec = recorder(&slot);
    rec.start_from_plan(&selection()).unwrap();

    rec.update_set(1, 0, SetField::Reps, "8").unwrap();
    let saved = slot.load().unwrap().unwrap();
    assert_eq!(saved.exercises()[1].sets[0].reps, "8");
    assert!(!saved.exercises()[1].sets[0].completed);

    rec.update_set(1, 0, SetField::Weight, "80").unwrap();
    let saved = slot.load().unwrap().unwrap();
    assert!(saved.exercises()[1].sets[0].completed);

    rec.update_notes(0, "high bar").unwrap();
    rec.set_comment("Squat", "knees caved on set 3").unwrap();
    let saved = slot.load().unwrap().unwrap();
    assert_eq!(saved.exercises()[0].notes, "high bar");
    assert_eq!(saved.comments()["Squat"], "knees caved on set 3");
}

#[test]
fn test_mutation_without_draft_is_rejected() {
    let slot = MemoryDraftSlot::new();
    let mut rec = recorder(&slot);
    let err = rec.update_set(0, 0, SetField::Reps, "5").unwrap_err();
    assert!(matches!(err, CoreError::InvalidPhase("uninitialized")));
}

#[test]
fn test_recover_resumes_autosaved_draft() {
    let slot = MemoryDraftSlot::new();
    {
        let mut rec = recorder(&slot);
        rec.start_from_plan(&selection()).unwrap();
        rec.update_set(0, 2, SetField::Reps, "5").unwrap();
        rec.update_set(0, 2, SetField::Weight, "120").unwrap();
        // Dropped without finalizing, as after a crash
    }

    let mut rec = recorder(&slot);
    assert!(rec.pending_draft().unwrap().is_some());

    let draft = rec.recover().unwrap().unwrap();
    assert!(!draft.is_edit_mode());
    assert_eq!(draft.completed_sets(), 1);
    assert_eq!(draft.exercises()[0].sets[2].weight, "120");
    assert_eq!(rec.phase(), Phase::Drafting);
}

#[test]
fn test_recover_with_empty_slot() {
    let slot = MemoryDraftSlot::new();
    let mut rec = recorder(&slot);
    assert!(rec.recover().unwrap().is_none());
    assert_eq!(rec.phase(), Phase::Uninitialized);
}

#[test]
fn test_cancel_clears_slot() {
    let slot = MemoryDraftSlot::new();
    let mut rec = recorder(&slot);
    rec.start_from_plan(&selection()).unwrap();

    rec.cancel().unwrap();
    assert_eq!(rec.phase(), Phase::Cancelled);
    assert!(rec.draft().is_none());
    assert!(slot.load().unwrap().is_none());

    // A new session can start after cancelling
    rec.start_from_plan(&selection()).unwrap();
    assert_eq!(rec.phase(), Phase::Drafting);
}

// ============================================================
// Finalizing
// ============================================================

#[tokio::test]
async fn test_finalize_new_session() {
    let slot = MemoryDraftSlot::new();
    let repo = FakeRepo::default();
    let mut rec = recorder(&slot);
    rec.start_from_plan(&selection()).unwrap();
    rec.update_set(0, 0, SetField::Reps, "5").unwrap();
    rec.update_set(0, 0, SetField::Weight, "100").unwrap();

    let log = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap();

    assert_eq!(log.id, LogId::Persisted("log-1".to_string()));
    assert!(DateTime::parse_from_rfc3339(&log.date).is_ok());
    assert_eq!(log.duration_minutes, Some(0));
    assert_eq!(rec.phase(), Phase::Saved);
    assert!(rec.draft().is_none());
    assert!(slot.load().unwrap().is_none());
    assert_eq!(repo.logs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_edit_round_trip_preserves_id_and_date() {
    let slot = MemoryDraftSlot::new();
    let repo = FakeRepo::default();

    let mut rec = recorder(&slot);
    rec.start_from_plan(&selection()).unwrap();
    let original = rec
        .finalize(
            FinalizeOptions::retroactive(RetroDate::new(2024, 4, 2)),
            &repo,
        )
        .await
        .unwrap();

    let draft = rec.start_from_log(original.clone()).unwrap();
    assert!(draft.is_edit_mode());
    assert_eq!(slot.load().unwrap().unwrap().id(), &original.id);

    rec.update_set(1, 3, SetField::Reps, "6").unwrap();
    let edited = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap();

    assert_eq!(edited.id, original.id);
    assert_eq!(edited.date, original.date);
    assert_eq!(edited.exercises[1].sets[3].reps, "6");
    assert_eq!(repo.logs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_incomplete_retroactive_date_changes_nothing() {
    let slot = MemoryDraftSlot::new();
    let repo = FakeRepo::default();
    let mut rec = recorder(&slot);
    rec.start_from_plan(&selection()).unwrap();
    let saved_before = slot.load().unwrap();

    let options = FinalizeOptions::retroactive(RetroDate {
        day: None,
        month: Some(3),
        year: Some(2023),
    });
    let err = rec.finalize(options, &repo).await.unwrap_err();

    assert!(matches!(err, CoreError::IncompleteDate));
    assert_eq!(rec.phase(), Phase::Drafting);
    assert!(rec.draft().is_some());
    assert_eq!(slot.load().unwrap(), saved_before);
    assert!(repo.logs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_keeps_draft_for_retry() {
    let slot = MemoryDraftSlot::new();
    let repo = FakeRepo::default();
    let mut rec = recorder(&slot);
    rec.start_from_plan(&selection()).unwrap();
    rec.update_set(0, 0, SetField::Reps, "5").unwrap();

    repo.failing.store(true, Ordering::SeqCst);
    let err = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap_err();
    assert!(matches!(err, CoreError::Persistence(_)));
    assert_eq!(rec.phase(), Phase::Drafting);
    assert_eq!(rec.draft().unwrap().exercises()[0].sets[0].reps, "5");
    assert!(slot.load().unwrap().is_some());

    repo.failing.store(false, Ordering::SeqCst);
    let log = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap();
    assert_eq!(log.exercises[0].sets[0].reps, "5");
    assert_eq!(rec.phase(), Phase::Saved);
}

#[tokio::test]
async fn test_finalize_requires_drafting() {
    let slot = MemoryDraftSlot::new();
    let repo = FakeRepo::default();
    let mut rec = recorder(&slot);

    let err = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPhase("uninitialized")));

    rec.start_from_plan(&selection()).unwrap();
    rec.finalize(FinalizeOptions::live(), &repo).await.unwrap();

    let err = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidPhase("saved")));
}

#[tokio::test]
async fn test_retroactive_finalize_anchors_local_noon() {
    let slot = MemoryDraftSlot::new();
    let repo = FakeRepo::default();
    let tz = FixedOffset::west_opt(10 * 3600).unwrap();
    let mut rec = SessionRecorder::with_timezone(&slot, tz);
    rec.start_from_plan(&selection()).unwrap();

    let log = rec
        .finalize(
            FinalizeOptions::retroactive(RetroDate::new(2023, 3, 15)),
            &repo,
        )
        .await
        .unwrap();

    let local = DateTime::parse_from_rfc3339(&log.date)
        .unwrap()
        .with_timezone(&tz);
    assert_eq!((local.year(), local.month(), local.day()), (2023, 3, 15));
    assert_eq!(log.duration_minutes, Some(60));
}

// ============================================================
// Duration across recovery
// ============================================================

#[tokio::test]
async fn test_recovered_draft_measures_from_original_start() {
    let slot = MemoryDraftSlot::new();
    let repo = FakeRepo::default();

    // Autosaved 45 minutes into the session, then the process exited
    let started = Utc::now() - Duration::minutes(45);
    let draft = Draft::from_plan(&selection(), started).unwrap();
    slot.save(&draft).unwrap();

    let mut rec = recorder(&slot);
    let recovered = rec.recover().unwrap().unwrap();
    assert_eq!(recovered.started_at(), started);

    let log = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap();
    assert_eq!(log.duration_minutes, Some(45));
}

#[tokio::test]
async fn test_recovered_edit_measures_from_edit_start() {
    let slot = MemoryDraftSlot::new();
    let repo = FakeRepo::default();

    let original = saved_log("log-7", 30);
    let draft = Draft::from_log(original.clone(), Utc::now() - Duration::minutes(20));
    slot.save(&draft).unwrap();

    let mut rec = recorder(&slot);
    assert!(rec.recover().unwrap().unwrap().is_edit_mode());
    rec.update_set(0, 1, SetField::Reps, "5").unwrap();

    let edited = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap();
    assert_eq!(edited.id, original.id);
    assert_eq!(edited.date, original.date);
    assert_eq!(edited.duration_minutes, Some(20));
}

#[tokio::test]
async fn test_slot_clear_failure_after_save_is_reported() {
    let slot = StickySlot::default();
    let repo = FakeRepo::default();
    let mut rec = SessionRecorder::new(&slot).with_ids(CountingIds(AtomicUsize::new(0)));
    rec.start_from_plan(&selection()).unwrap();

    let err = rec.finalize(FinalizeOptions::live(), &repo).await.unwrap_err();
    match err {
        CoreError::SlotNotCleared { saved, .. } => {
            assert_eq!(saved.id, LogId::Persisted("log-1".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }

    // The log is stored once and the recorder does not offer it again
    assert_eq!(repo.logs.lock().unwrap().len(), 1);
    assert_eq!(rec.phase(), Phase::Saved);
    assert!(rec.draft().is_none());
    assert!(slot.load().unwrap().is_some());
}
