use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::settings::Settings;

/// Which interval of the Pomodoro cycle the session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TimerMode {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub const ALL: [TimerMode; 3] = [TimerMode::Work, TimerMode::ShortBreak, TimerMode::LongBreak];

    pub fn is_break(self) -> bool {
        !matches!(self, TimerMode::Work)
    }

    /// Configured length of this mode, in seconds.
    pub fn duration_secs(self, settings: &Settings) -> u64 {
        let minutes = match self {
            TimerMode::Work => settings.work_duration,
            TimerMode::ShortBreak => settings.short_break_duration,
            TimerMode::LongBreak => settings.long_break_duration,
        };
        u64::from(minutes).saturating_mul(60)
    }

    /// Human label used in notices and status lines.
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Work => "Focus Session",
            TimerMode::ShortBreak => "Short Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "short-break",
            TimerMode::LongBreak => "long-break",
        }
    }

    /// Break that follows the `completed_work_sessions`-th work session.
    pub fn break_after(completed_work_sessions: u32, long_break_interval: u32) -> TimerMode {
        let interval = long_break_interval.max(1);
        if completed_work_sessions > 0 && completed_work_sessions % interval == 0 {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" | "focus" => Ok(TimerMode::Work),
            "short-break" | "short" => Ok(TimerMode::ShortBreak),
            "long-break" | "long" => Ok(TimerMode::LongBreak),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("expected work, short-break or long-break, got '{other}'"),
            }),
        }
    }
}
