use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerMode;

/// Every state change in the core produces an Event.
/// The presentation layer drains them after each command; nothing in the
/// core calls back into rendering, audio or notification code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        mode: TimerMode,
        remaining_secs: u64,
        task_id: Option<String>,
        /// True when fired by a deferred auto-start rather than the user.
        automatic: bool,
        at: DateTime<Utc>,
    },
    SessionPaused {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        mode: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionSkipped {
        mode: TimerMode,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        from: TimerMode,
        to: TimerMode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        mode: TimerMode,
        completed_work_sessions: u32,
        next_mode: TimerMode,
        at: DateTime<Utc>,
    },
    /// Time spent suspended was subtracted from the countdown.
    BackgroundCorrected {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    AutoStartScheduled {
        mode: TimerMode,
        due_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TaskAdded {
        task_id: String,
        title: String,
        at: DateTime<Utc>,
    },
    TaskSelected {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskProgressed {
        task_id: String,
        completed_pomodoros: u32,
        estimated_pomodoros: u32,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: String,
        title: String,
        at: DateTime<Utc>,
    },
    TaskReopened {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskEdited {
        task_id: String,
        title: String,
        at: DateTime<Utc>,
    },
    TaskDeleted {
        task_id: String,
        at: DateTime<Utc>,
    },
    TasksCleared {
        removed: usize,
        completed_only: bool,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        at: DateTime<Utc>,
    },
    StatsRolledOver {
        date: NaiveDate,
        week_reset: bool,
        at: DateTime<Utc>,
    },
    ThemeChanged {
        theme: String,
        at: DateTime<Utc>,
    },
    DataImported {
        tasks: bool,
        stats: bool,
        settings: bool,
        at: DateTime<Utc>,
    },
    /// A persistence read or write failed. In-memory state is unaffected.
    StorageFailed {
        message: String,
        at: DateTime<Utc>,
    },
    /// Transient user-visible message (e.g. "No completed tasks to clear").
    Notice {
        level: NoticeLevel,
        message: String,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl Event {
    pub fn info(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Event::Notice {
            level: NoticeLevel::Info,
            message: message.into(),
            at,
        }
    }

    pub fn warning(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Event::Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
            at,
        }
    }
}
