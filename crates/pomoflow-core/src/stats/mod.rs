//! Daily and weekly usage statistics.
//!
//! Counters are kept as plain numbers inside the persisted record. Day and
//! week boundaries are applied lazily by [`Statistics::apply_daily_rollover`],
//! which the controller calls at startup (and again whenever a long-running
//! process crosses midnight).

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};

use crate::timer::TimerMode;

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub today_pomodoros: u32,
    #[serde(default)]
    pub week_pomodoros: u32,
    /// Minutes of completed work today.
    #[serde(default, rename = "todayFocusTime")]
    pub today_focus_time_minutes: u32,
    #[serde(default)]
    pub tasks_completed: u32,
    /// Completed work sessions per weekday, Monday first.
    #[serde(default, deserialize_with = "weekly_slots")]
    pub weekly_data: [u32; DAYS_PER_WEEK],
    /// Stored under its own key, not inside the record.
    #[serde(skip)]
    pub last_rollover_date: Option<NaiveDate>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            today_pomodoros: 0,
            week_pomodoros: 0,
            today_focus_time_minutes: 0,
            tasks_completed: 0,
            weekly_data: [0; DAYS_PER_WEEK],
            last_rollover_date: None,
        }
    }
}

/// Result of a rollover that actually reset something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollover {
    pub date: NaiveDate,
    pub week_reset: bool,
}

/// Slot in `weekly_data` for `weekday`: Monday is 0, Sunday is 6.
pub fn monday_index(weekday: Weekday) -> usize {
    match weekday.num_days_from_sunday() {
        0 => 6,
        d => d as usize - 1,
    }
}

impl Statistics {
    /// Count a finished interval. Only work sessions count.
    pub fn record_completion(&mut self, mode: TimerMode, work_minutes: u32, today: NaiveDate) -> bool {
        if mode != TimerMode::Work {
            return false;
        }
        self.today_pomodoros = self.today_pomodoros.saturating_add(1);
        self.week_pomodoros = self.week_pomodoros.saturating_add(1);
        self.today_focus_time_minutes = self.today_focus_time_minutes.saturating_add(work_minutes);
        let slot = &mut self.weekly_data[monday_index(today.weekday())];
        *slot = slot.saturating_add(1);
        true
    }

    /// Reset day-scoped counters when `today` differs from the last rollover
    /// date, and week-scoped counters too when `today` is a Monday.
    ///
    /// Idempotent for a given date.
    pub fn apply_daily_rollover(&mut self, today: NaiveDate) -> Option<Rollover> {
        if self.last_rollover_date == Some(today) {
            return None;
        }
        self.today_pomodoros = 0;
        self.today_focus_time_minutes = 0;
        let week_reset = today.weekday() == Weekday::Mon;
        if week_reset {
            self.week_pomodoros = 0;
            self.weekly_data = [0; DAYS_PER_WEEK];
        }
        self.last_rollover_date = Some(today);
        Some(Rollover {
            date: today,
            week_reset,
        })
    }

    pub fn task_completed(&mut self) {
        self.tasks_completed = self.tasks_completed.saturating_add(1);
    }

    pub fn task_reopened(&mut self) {
        self.tasks_completed = self.tasks_completed.saturating_sub(1);
    }

    pub fn weekly_total(&self) -> u32 {
        self.weekly_data.iter().sum()
    }
}

/// Accept any length for `weeklyData`: pad short arrays with zeros, drop
/// extra entries, treat `null` as empty.
fn weekly_slots<'de, D>(deserializer: D) -> Result<[u32; DAYS_PER_WEEK], D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<u32>> = Option::deserialize(deserializer)?;
    let mut slots = [0; DAYS_PER_WEEK];
    for (slot, value) in slots.iter_mut().zip(raw.unwrap_or_default()) {
        *slot = value;
    }
    Ok(slots)
}
