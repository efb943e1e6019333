//! Display helpers shared by front-ends.

use chrono::{DateTime, Local, Utc};

use crate::timer::{TimerMode, TimerState};

/// `M:SS`, minutes unpadded and unbounded (`90:00` for a 90-minute interval).
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Whole minutes as `1h 05m` or `25m`.
pub fn format_minutes(minutes: u32) -> String {
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

/// One-line description of where the session stands.
pub fn status_label(mode: TimerMode, state: TimerState) -> String {
    match state {
        TimerState::Running => format!("{} in progress...", mode.label()),
        TimerState::Paused => format!("{} paused", mode.label()),
        TimerState::Idle => format!("Ready for {}", mode.label().to_lowercase()),
    }
}

/// Age of `then` relative to `now`: `just now`, `5m ago`, `3h ago`, `2d ago`,
/// or the local date after a week.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - then;
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        then.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}
