//! Versioned persisted record.
//!
//! Decoding is a field-by-field merge over the current defaults. A missing
//! field, a `null`, or a value of the wrong type keeps that field's default
//! and the rest of the record still loads. Tasks are decoded one by one, so a
//! single malformed entry costs only that entry. Unknown fields written by a
//! newer version are ignored.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::settings::Settings;
use crate::state::AppState;
use crate::stats::Statistics;
use crate::task::{Task, TaskRegistry};
use crate::timer::{Session, TimerEngine, TimerMode, TimerState};

pub const RECORD_VERSION: &str = "1.0.0";
const LEGACY_VERSION: &str = "0.0.0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub version: String,
    pub last_saved: Option<DateTime<Utc>>,
    pub state: PersistedState,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub current_mode: TimerMode,
    /// Seconds left; absent means "full interval for the current mode".
    pub time_remaining: Option<u64>,
    pub is_running: bool,
    pub is_paused: bool,
    pub current_task: Option<String>,
    /// Work sessions completed in the current long-break cycle.
    pub pomodoro_count: u32,
    /// Work sessions completed overall.
    pub completed_pomodoros: u32,
    pub tasks: Vec<Task>,
    pub settings: Settings,
    pub stats: Statistics,
}

/// A decoded record plus the paths of stored values that could not be used.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    pub record: PersistedRecord,
    pub skipped: Vec<String>,
}

impl PersistedRecord {
    pub fn capture(state: &AppState, at: DateTime<Utc>) -> Self {
        Self {
            version: RECORD_VERSION.to_string(),
            last_saved: Some(at),
            state: PersistedState::capture(state),
        }
    }

    /// Decode a stored record.
    ///
    /// # Errors
    ///
    /// Fails only when `raw` is not JSON or its top level is not an object.
    /// Anything below that is merged leniently and reported in `skipped`.
    pub fn decode(raw: &str) -> Result<DecodedRecord, serde_json::Error> {
        let root = match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => map,
            _ => return Err(serde_json::Error::custom("record is not a JSON object")),
        };
        let mut skipped = Vec::new();

        let version = field(&root, "version", "version", &mut skipped)
            .unwrap_or_else(|| LEGACY_VERSION.to_string());
        let last_saved = field(&root, "lastSaved", "lastSaved", &mut skipped);
        let state = match root.get("state") {
            None | Some(Value::Null) => PersistedState::default(),
            Some(Value::Object(map)) => PersistedState::decode(map, &mut skipped),
            Some(_) => {
                skipped.push("state".to_string());
                PersistedState::default()
            }
        };

        Ok(DecodedRecord {
            record: PersistedRecord {
                version,
                last_saved,
                state,
            },
            skipped,
        })
    }
}

impl PersistedState {
    fn decode(map: &Map<String, Value>, skipped: &mut Vec<String>) -> Self {
        let d = Self::default();
        Self {
            current_mode: field(map, "currentMode", "state.currentMode", skipped)
                .unwrap_or(d.current_mode),
            time_remaining: field(map, "timeRemaining", "state.timeRemaining", skipped),
            is_running: field(map, "isRunning", "state.isRunning", skipped)
                .unwrap_or(d.is_running),
            is_paused: field(map, "isPaused", "state.isPaused", skipped).unwrap_or(d.is_paused),
            current_task: field(map, "currentTask", "state.currentTask", skipped),
            pomodoro_count: field(map, "pomodoroCount", "state.pomodoroCount", skipped)
                .unwrap_or(d.pomodoro_count),
            completed_pomodoros: field(
                map,
                "completedPomodoros",
                "state.completedPomodoros",
                skipped,
            )
            .unwrap_or(d.completed_pomodoros),
            tasks: decode_tasks(map.get("tasks"), skipped),
            settings: merged_group("state.settings", map.get("settings"), skipped),
            stats: merged_group("state.stats", map.get("stats"), skipped),
        }
    }

    pub fn capture(state: &AppState) -> Self {
        let session = state.timer.session();
        let interval = state.settings.long_break_interval.max(1);
        Self {
            current_mode: session.mode,
            time_remaining: Some(session.remaining_secs),
            is_running: session.is_running(),
            is_paused: session.is_paused(),
            current_task: session.active_task_id.clone(),
            pomodoro_count: session.completed_work_sessions % interval,
            completed_pomodoros: session.completed_work_sessions,
            tasks: state.tasks.tasks().to_vec(),
            settings: state.settings.clone(),
            stats: state.stats.clone(),
        }
    }

    /// Rebuild live state, repairing anything a hand-edited or older record
    /// could get wrong (out-of-range settings, dangling task reference,
    /// running and paused both set).
    pub fn into_state(self) -> AppState {
        let settings = if self.settings.validate().is_ok() {
            self.settings
        } else {
            warn!("stored settings out of range; falling back to defaults for bad fields");
            self.settings.sanitized()
        };

        let tasks = TaskRegistry::from_tasks(self.tasks);
        let active_task_id = self.current_task.filter(|id| tasks.contains(id));

        let state = match (self.is_running, self.is_paused) {
            (_, true) => TimerState::Paused,
            (true, false) => TimerState::Running,
            (false, false) => TimerState::Idle,
        };
        let remaining_secs = self
            .time_remaining
            .unwrap_or_else(|| self.current_mode.duration_secs(&settings));

        let session = Session {
            mode: self.current_mode,
            state,
            remaining_secs,
            completed_work_sessions: self.completed_pomodoros,
            active_task_id,
        };

        AppState {
            timer: TimerEngine::restore(session, &settings),
            tasks,
            settings,
            stats: self.stats,
        }
    }
}

/// Decode one field. Absent and `null` give `None` silently; a value of the
/// wrong type gives `None` and is recorded under `path`.
fn field<T: DeserializeOwned>(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    skipped: &mut Vec<String>,
) -> Option<T> {
    match map.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(decoded) => Some(decoded),
            Err(_) => {
                skipped.push(path.to_string());
                None
            }
        },
    }
}

fn decode_tasks(value: Option<&Value>, skipped: &mut Vec<String>) -> Vec<Task> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            skipped.push("state.tasks".to_string());
            return Vec::new();
        }
    };
    let mut tasks: Vec<Task> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match serde_json::from_value::<Task>(item.clone()) {
            Ok(task) if !tasks.iter().any(|t| t.id == task.id) => tasks.push(task),
            _ => skipped.push(format!("state.tasks[{i}]")),
        }
    }
    tasks
}

/// Start from `T::default()` and overlay each stored key whose value still
/// decodes. Keys that would break decoding are skipped one at a time.
fn merged_group<T>(group: &str, value: Option<&Value>, skipped: &mut Vec<String>) -> T
where
    T: Default + Serialize + DeserializeOwned,
{
    let stored = match value {
        None | Some(Value::Null) => return T::default(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            skipped.push(group.to_string());
            return T::default();
        }
    };

    let mut merged = T::default();
    for (key, value) in stored {
        let Ok(Value::Object(mut candidate)) = serde_json::to_value(&merged) else {
            break;
        };
        candidate.insert(key.clone(), value.clone());
        match serde_json::from_value::<T>(Value::Object(candidate)) {
            Ok(next) => merged = next,
            Err(_) => skipped.push(format!("{group}.{key}")),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_uses_record_field_names() {
        let state = AppState::default();
        let json = serde_json::to_value(PersistedRecord::capture(&state, Utc::now())).unwrap();
        assert_eq!(json["version"], RECORD_VERSION);
        let s = &json["state"];
        assert_eq!(s["currentMode"], "work");
        assert_eq!(s["timeRemaining"], 25 * 60);
        assert_eq!(s["isRunning"], false);
        assert_eq!(s["isPaused"], false);
        assert!(s["currentTask"].is_null());
        assert_eq!(s["settings"]["longBreakInterval"], 4);
        assert_eq!(s["stats"]["weeklyData"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn older_record_merges_over_defaults() {
        let json = r#"{
            "version": "0.9.0",
            "state": {
                "currentMode": "short-break",
                "timeRemaining": 120,
                "settings": { "workDuration": 30, "shortBreakDuration": 7 },
                "stats": { "todayPomodoros": 2, "weekPomodoros": 5 }
            }
        }"#;
        let record = PersistedRecord::decode(json).unwrap().record;
        let state = record.state.into_state();
        assert_eq!(state.settings.work_duration, 30);
        assert_eq!(state.settings.short_break_duration, 7);
        assert_eq!(state.settings.long_break_interval, 4);
        assert!(!state.settings.auto_start_pomodoros);
        assert_eq!(state.stats.week_pomodoros, 5);
        assert_eq!(state.stats.tasks_completed, 0);
        assert_eq!(state.timer.mode(), TimerMode::ShortBreak);
        assert_eq!(state.timer.remaining_secs(), 120);
    }

    #[test]
    fn null_and_mistyped_values_keep_their_defaults() {
        let json = r#"{
            "version": "1.0.0",
            "state": {
                "currentMode": "nap",
                "timeRemaining": null,
                "tasks": [
                    {"id": "a", "title": "keep me", "createdAt": "2024-03-06T08:00:00Z"},
                    {"id": "b", "title": 7},
                    {"id": "a", "title": "duplicate", "createdAt": "2024-03-06T08:00:00Z"}
                ],
                "settings": { "workDuration": 40, "soundVolume": null, "enableSounds": "yes" },
                "stats": { "todayPomodoros": "three", "weekPomodoros": 6 }
            }
        }"#;
        let decoded = PersistedRecord::decode(json).unwrap();
        let mut skipped = decoded.skipped.clone();
        skipped.sort();
        assert_eq!(
            skipped,
            vec![
                "state.currentMode",
                "state.settings.enableSounds",
                "state.settings.soundVolume",
                "state.stats.todayPomodoros",
                "state.tasks[1]",
                "state.tasks[2]",
            ]
        );

        let state = decoded.record.state.into_state();
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks.tasks()[0].title, "keep me");
        assert_eq!(state.settings.work_duration, 40);
        assert_eq!(state.settings.sound_volume, 50);
        assert!(state.settings.enable_sounds);
        assert_eq!(state.stats.today_pomodoros, 0);
        assert_eq!(state.stats.week_pomodoros, 6);
        assert_eq!(state.timer.mode(), TimerMode::Work);
        assert_eq!(state.timer.remaining_secs(), 40 * 60);
    }

    #[test]
    fn non_object_record_is_an_error() {
        assert!(PersistedRecord::decode("[1, 2]").is_err());
        assert!(PersistedRecord::decode("{not json").is_err());
    }

    #[test]
    fn missing_time_remaining_uses_mode_duration() {
        let json = r#"{"state": {"currentMode": "long-break"}}"#;
        let record = PersistedRecord::decode(json).unwrap().record;
        assert_eq!(record.version, "0.0.0");
        let state = record.state.into_state();
        assert_eq!(state.timer.remaining_secs(), 15 * 60);
    }

    #[test]
    fn dangling_task_reference_is_dropped() {
        let json = r#"{"state": {"currentTask": "gone", "tasks": []}}"#;
        let record = PersistedRecord::decode(json).unwrap().record;
        let state = record.state.into_state();
        assert!(state.timer.active_task_id().is_none());
    }

    #[test]
    fn running_and_paused_together_restores_paused() {
        let json = r#"{"state": {"isRunning": true, "isPaused": true, "timeRemaining": 60}}"#;
        let record = PersistedRecord::decode(json).unwrap().record;
        let state = record.state.into_state();
        assert_eq!(state.timer.state(), TimerState::Paused);
        assert!(state.timer.ticker().is_none());
    }

    #[test]
    fn pomodoro_count_tracks_cycle_position() {
        let mut state = AppState::default();
        let now = Utc::now();
        for _ in 0..5 {
            state.timer.start(false, &state.settings, now);
            state.timer.finish(&state.settings);
            state
                .timer
                .switch_mode(TimerMode::Work, &state.settings, now)
                .unwrap();
        }
        let captured = PersistedState::capture(&state);
        assert_eq!(captured.completed_pomodoros, 5);
        assert_eq!(captured.pomodoro_count, 1);
    }
}
