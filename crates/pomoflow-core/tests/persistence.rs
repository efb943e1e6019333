//! Persistence round trips through the controller: reopen, forward-compatible
//! merge, restoring a running session, storage failures, export and import.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pomoflow_core::storage::{Store, CORRUPT_BACKUP_KEY, DATA_KEY, LAST_ROLLOVER_KEY};
use pomoflow_core::{
    Controller, Event, ImportFormatError, ManualClock, MemoryStore, Settings, SqliteStore,
    StorageError, Theme, TimerMode, TimerState,
};

fn wednesday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap()
}

fn storage_failures(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::StorageFailed { .. }))
        .count()
}

/// Reads work, every write fails.
struct ReadOnlyStore(MemoryStore);

impl Store for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::WriteFailed {
            key: key.to_string(),
            message: "quota exceeded".into(),
        })
    }
}

#[test]
fn reopen_restores_everything() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(wednesday());
    let task_id;
    {
        let mut c = Controller::open(&store, &clock);
        task_id = c.add_task("write report", 3).unwrap();
        c.select_task(&task_id).unwrap();
        c.set_setting("longBreakDuration", "20").unwrap();
        c.switch_mode(TimerMode::LongBreak).unwrap();
        c.set_theme(Theme::Dark);
    }

    let c = Controller::open(&store, &clock);
    assert_eq!(c.tasks().len(), 1);
    assert_eq!(c.timer().active_task_id(), Some(task_id.as_str()));
    assert_eq!(c.settings().long_break_duration, 20);
    assert_eq!(c.timer().mode(), TimerMode::LongBreak);
    assert_eq!(c.timer().remaining_secs(), 20 * 60);
    assert_eq!(c.theme(), Theme::Dark);
}

#[test]
fn older_record_gets_defaults_for_new_fields() {
    let record = r#"{
        "version": "0.9.0",
        "lastSaved": "2024-03-06T08:00:00Z",
        "state": {
            "currentMode": "work",
            "timeRemaining": 600,
            "isRunning": false,
            "isPaused": true,
            "settings": { "workDuration": 30 },
            "stats": { "todayPomodoros": 3, "weekPomodoros": 3, "weeklyData": [1, 0, 2] }
        }
    }"#;
    let store = MemoryStore::with_entry(DATA_KEY, record);
    store.set(LAST_ROLLOVER_KEY, "2024-03-06").unwrap();

    let mut c = Controller::open(&store, ManualClock::new(wednesday()));
    assert_eq!(storage_failures(&c.drain_events()), 0);
    let s = c.settings();
    assert_eq!(s.work_duration, 30);
    assert_eq!(s.short_break_duration, 5);
    assert_eq!(s.long_break_interval, 4);
    assert!(!s.auto_start_breaks);
    assert!(!s.auto_start_pomodoros);
    assert_eq!(c.timer().state(), TimerState::Paused);
    assert_eq!(c.timer().remaining_secs(), 600);
    assert_eq!(c.stats().today_pomodoros, 3);
    assert_eq!(c.stats().weekly_data, [1, 0, 2, 0, 0, 0, 0]);
    assert_eq!(c.stats().tasks_completed, 0);
}

#[test]
fn legacy_rollover_date_triggers_new_day() {
    let record = r#"{"state": {"stats": {"todayPomodoros": 4, "weekPomodoros": 9}}}"#;
    let store = MemoryStore::with_entry(DATA_KEY, record);
    store.set(LAST_ROLLOVER_KEY, "Tue Mar 05 2024").unwrap();

    let c = Controller::open(&store, ManualClock::new(wednesday()));
    assert_eq!(c.stats().today_pomodoros, 0);
    assert_eq!(c.stats().week_pomodoros, 9);
    assert_eq!(
        store.get(LAST_ROLLOVER_KEY).unwrap().as_deref(),
        Some("2024-03-06")
    );
}

#[test]
fn corrupt_record_starts_from_defaults() {
    let store = MemoryStore::with_entry(DATA_KEY, "{\"state\": [");
    let mut c = Controller::open(&store, ManualClock::new(wednesday()));
    assert_eq!(storage_failures(&c.drain_events()), 1);
    assert!(c.tasks().is_empty());
    assert_eq!(c.settings(), &Settings::default());

    c.save();
    assert_eq!(
        store.get(CORRUPT_BACKUP_KEY).unwrap().as_deref(),
        Some("{\"state\": [")
    );
}

#[test]
fn null_setting_does_not_cost_saved_tasks() {
    let record = r#"{
        "version": "1.0.0",
        "state": {
            "tasks": [{
                "id": "t-1",
                "title": "finish slides",
                "estimatedPomodoros": 2,
                "completedPomodoros": 1,
                "completed": false,
                "createdAt": "2024-03-05T10:00:00Z"
            }],
            "settings": {"workDuration": 30, "soundVolume": null},
            "stats": {"todayPomodoros": 2, "weekPomodoros": 7, "tasksCompleted": null}
        }
    }"#;
    let store = MemoryStore::with_entry(DATA_KEY, record);
    store.set(LAST_ROLLOVER_KEY, "2024-03-06").unwrap();

    let mut c = Controller::open(&store, ManualClock::new(wednesday()));
    assert_eq!(storage_failures(&c.drain_events()), 0);
    assert_eq!(c.tasks().len(), 1);
    assert_eq!(c.settings().work_duration, 30);
    assert_eq!(c.settings().sound_volume, 50);
    assert_eq!(c.stats().week_pomodoros, 7);
    assert_eq!(c.stats().tasks_completed, 0);

    c.save();
    let stored: serde_json::Value =
        serde_json::from_str(&store.get(DATA_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored["state"]["tasks"][0]["title"], "finish slides");
    assert_eq!(stored["state"]["settings"]["soundVolume"], 50);
    assert!(store.get(CORRUPT_BACKUP_KEY).unwrap().is_none());
}

#[test]
fn running_session_catches_up_after_restart() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(wednesday());
    {
        let mut c = Controller::open(&store, &clock);
        c.start();
    }

    clock.advance_secs(30);
    let c = Controller::open(&store, &clock);
    assert!(c.timer().is_running());
    assert!(c.timer().ticker().is_some());
    assert_eq!(c.timer().remaining_secs(), 25 * 60 - 30);
}

#[test]
fn session_that_ended_while_closed_completes_once() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(wednesday());
    let task_id;
    {
        let mut c = Controller::open(&store, &clock);
        task_id = c.add_task("one pomodoro", 1).unwrap();
        c.start();
    }

    clock.advance(Duration::hours(2));
    let mut c = Controller::open(&store, &clock);
    let events = c.drain_events();
    let completions = events
        .iter()
        .filter(|e| matches!(e, Event::SessionCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
    assert_eq!(c.timer().mode(), TimerMode::ShortBreak);
    assert_eq!(c.timer().state(), TimerState::Idle);
    assert_eq!(c.stats().today_pomodoros, 1);
    assert_eq!(c.stats().tasks_completed, 1);
    assert!(c.tasks().get(&task_id).unwrap().completed);

    // The completion was saved; reopening again does not repeat it.
    let c = Controller::open(&store, &clock);
    assert_eq!(c.stats().today_pomodoros, 1);
    assert_eq!(c.timer().completed_work_sessions(), 1);
}

#[test]
fn failed_writes_keep_memory_and_prior_data() {
    let inner = MemoryStore::new();
    let clock = ManualClock::new(wednesday());
    {
        let mut c = Controller::open(&inner, &clock);
        c.add_task("saved", 1).unwrap();
    }
    let good = inner.get(DATA_KEY).unwrap();

    let mut c = Controller::open(ReadOnlyStore(inner), &clock);
    c.drain_events();
    c.add_task("unsaved", 1).unwrap();
    assert_eq!(c.tasks().len(), 2);
    assert_eq!(storage_failures(&c.drain_events()), 1);

    c.start();
    assert!(c.timer().is_running());
    assert_eq!(c.store().get(DATA_KEY).unwrap(), good);
}

#[test]
fn export_then_import_into_fresh_install() {
    let clock = ManualClock::new(wednesday());
    let mut source = Controller::open(MemoryStore::new(), &clock);
    source.add_task("carry me", 4).unwrap();
    source.set_setting("workDuration", "45").unwrap();
    let doc = source.export().to_json_pretty().unwrap();
    assert_eq!(source.export_file_name(), "pomoflow-backup-2024-03-06.json");

    let mut target = Controller::open(MemoryStore::new(), &clock);
    target.import(&doc).unwrap();
    assert_eq!(target.tasks(), source.tasks());
    assert_eq!(target.settings().work_duration, 45);
    assert_eq!(target.timer().remaining_secs(), 45 * 60);
}

#[test]
fn partial_import_leaves_other_groups() {
    let mut c = Controller::open(MemoryStore::new(), ManualClock::new(wednesday()));
    c.add_task("keep me", 1).unwrap();
    c.import(r#"{"settings": {"autoStartBreaks": true}}"#).unwrap();
    assert_eq!(c.tasks().len(), 1);
    assert!(c.settings().auto_start_breaks);
    assert_eq!(c.settings().work_duration, 25);
}

#[test]
fn bad_import_applies_nothing() {
    let mut c = Controller::open(MemoryStore::new(), ManualClock::new(wednesday()));
    c.add_task("keep me", 1).unwrap();
    let before = c.state().tasks.clone();

    // Valid tasks but invalid settings: the tasks must not be applied either.
    let doc = r#"{
        "tasks": [],
        "settings": { "workDuration": 0 }
    }"#;
    assert!(matches!(
        c.import(doc),
        Err(ImportFormatError::InvalidGroup { group: "settings", .. })
    ));
    assert_eq!(c.state().tasks, before);
    assert!(c.import("not json").is_err());
    assert_eq!(c.settings().work_duration, 25);
}

#[test]
fn import_dropping_active_task_clears_reference() {
    let mut c = Controller::open(MemoryStore::new(), ManualClock::new(wednesday()));
    let id = c.add_task("old", 1).unwrap();
    c.select_task(&id).unwrap();
    c.import(r#"{"tasks": [{"id": "n1", "title": "new", "createdAt": "2024-03-01T10:00:00Z"}]}"#)
        .unwrap();
    assert!(c.timer().active_task_id().is_none());
    c.start();
    assert_eq!(c.timer().active_task_id(), Some("n1"));
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomoflow.db");
    let clock = ManualClock::new(wednesday());
    {
        let mut c = Controller::open(SqliteStore::open_at(&path).unwrap(), &clock);
        c.add_task("persisted", 2).unwrap();
        c.toggle_theme();
    }
    let c = Controller::open(SqliteStore::open_at(&path).unwrap(), &clock);
    assert_eq!(c.tasks().tasks()[0].title, "persisted");
    assert_eq!(c.theme(), Theme::Dark);
}
