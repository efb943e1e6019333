//! Session state machine.
//!
//! The engine owns the countdown, the mode and the running/paused status. It
//! does not use internal threads: the caller installs a 1-second tick source
//! after `start()` and forwards each tick to `tick()`. The engine keeps a
//! handle for that source so at most one is ever live; `pause()`, `reset()`
//! and `finish()` drop it, and ticks arriving without a live source are
//! ignored.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> Idle
//!   ^        |                                    |
//!   +--------+----- reset / finish ---------------+
//! ```
//!
//! Mode (`Work`, `ShortBreak`, `LongBreak`) is orthogonal and may only change
//! while not `Running`.
//!
//! Completion side-effects (task credit, statistics, auto-start) belong to the
//! controller; the engine only reports what finished and what comes next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mode::TimerMode;
use crate::error::BusyError;
use crate::events::Event;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Persistable part of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub mode: TimerMode,
    pub state: TimerState,
    pub remaining_secs: u64,
    /// Completed work sessions; drives the long-break cadence.
    pub completed_work_sessions: u32,
    /// Weak reference into the task registry.
    pub active_task_id: Option<String>,
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        Self {
            mode: TimerMode::Work,
            state: TimerState::Idle,
            remaining_secs: TimerMode::Work.duration_secs(settings),
            completed_work_sessions: 0,
            active_task_id: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }
}

/// Identifies the installed tick source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickerId(u64);

/// Result of forwarding one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running, or no live tick source.
    Ignored,
    /// Countdown continues with this many seconds left.
    Counting(u64),
    /// Countdown reached zero; the caller must complete the session.
    Expired,
}

/// Outcome of a background-time correction on resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
}

impl Correction {
    pub fn expired(&self) -> bool {
        self.remaining_secs == 0
    }
}

/// What `finish()` closed and what the cycle moves to next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub mode: TimerMode,
    pub next_mode: TimerMode,
    pub completed_work_sessions: u32,
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    session: Session,
    /// Length of the interval the countdown was derived from.
    total_secs: u64,
    ticker: Option<TickerId>,
    next_ticker: u64,
    /// Set while the host is suspended with the timer running.
    suspended_at: Option<DateTime<Utc>>,
}

impl TimerEngine {
    /// Idle work session with the configured work duration.
    pub fn new(settings: &Settings) -> Self {
        Self::restore(Session::new(settings), settings)
    }

    /// Rebuild the engine around a loaded session. A running session gets a
    /// fresh tick source.
    pub fn restore(session: Session, settings: &Settings) -> Self {
        let total_secs = session.mode.duration_secs(settings).max(session.remaining_secs);
        let mut engine = Self {
            session,
            total_secs,
            ticker: None,
            next_ticker: 0,
            suspended_at: None,
        };
        if engine.session.is_running() {
            engine.install_ticker();
        }
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> TimerMode {
        self.session.mode
    }

    pub fn state(&self) -> TimerState {
        self.session.state
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.session.is_paused()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.session.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.session.completed_work_sessions
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.session.active_task_id.as_deref()
    }

    pub fn ticker(&self) -> Option<TickerId> {
        self.ticker
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        1.0 - (self.session.remaining_secs as f64 / self.total_secs as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change mode and re-derive the countdown. Refused while running.
    pub fn switch_mode(
        &mut self,
        target: TimerMode,
        settings: &Settings,
        at: DateTime<Utc>,
    ) -> Result<Event, BusyError> {
        if self.is_running() {
            return Err(BusyError { target });
        }
        let from = self.session.mode;
        self.session.mode = target;
        self.stop();
        self.rederive(settings);
        Ok(Event::ModeSwitched {
            from,
            to: target,
            remaining_secs: self.session.remaining_secs,
            at,
        })
    }

    /// Begin or continue the countdown. Returns `None` if already running.
    pub fn start(&mut self, automatic: bool, settings: &Settings, at: DateTime<Utc>) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        if self.session.remaining_secs == 0 {
            self.rederive(settings);
        }
        self.session.state = TimerState::Running;
        self.install_ticker();
        Some(Event::SessionStarted {
            mode: self.session.mode,
            remaining_secs: self.session.remaining_secs,
            task_id: self.session.active_task_id.clone(),
            automatic,
            at,
        })
    }

    pub fn pause(&mut self, at: DateTime<Utc>) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        self.session.state = TimerState::Paused;
        self.ticker = None;
        self.suspended_at = None;
        Some(Event::SessionPaused {
            mode: self.session.mode,
            remaining_secs: self.session.remaining_secs,
            at,
        })
    }

    /// Back to idle with a full countdown for the current mode, from any state.
    pub fn reset(&mut self, settings: &Settings, at: DateTime<Utc>) -> Event {
        self.stop();
        self.rederive(settings);
        Event::SessionReset {
            mode: self.session.mode,
            remaining_secs: self.session.remaining_secs,
            at,
        }
    }

    /// Skipping is only meaningful for a session that has been started.
    pub fn can_skip(&self) -> bool {
        matches!(self.session.state, TimerState::Running | TimerState::Paused)
    }

    /// Forward one tick from the installed source.
    pub fn tick(&mut self, source: TickerId) -> Tick {
        if !self.is_running() || self.ticker != Some(source) {
            return Tick::Ignored;
        }
        self.session.remaining_secs = self.session.remaining_secs.saturating_sub(1);
        if self.session.remaining_secs == 0 {
            Tick::Expired
        } else {
            Tick::Counting(self.session.remaining_secs)
        }
    }

    /// Record that the host stopped scheduling us. Only meaningful while running.
    pub fn suspend(&mut self, at: DateTime<Utc>) -> bool {
        if !self.is_running() || self.suspended_at.is_some() {
            return false;
        }
        self.suspended_at = Some(at);
        true
    }

    /// Subtract the whole seconds spent suspended from the countdown.
    ///
    /// Returns `None` if there was no matching `suspend()` or the timer
    /// stopped in between.
    pub fn resume(&mut self, at: DateTime<Utc>) -> Option<Correction> {
        let since = self.suspended_at.take()?;
        if !self.is_running() {
            return None;
        }
        let elapsed_secs = (at - since).num_seconds().max(0) as u64;
        self.session.remaining_secs = self.session.remaining_secs.saturating_sub(elapsed_secs);
        Some(Correction {
            elapsed_secs,
            remaining_secs: self.session.remaining_secs,
        })
    }

    /// Close the current interval: go idle, drop the tick source and bump the
    /// work counter when a work session ended. The mode is left unchanged so
    /// the caller can record statistics before switching.
    pub fn finish(&mut self, settings: &Settings) -> Completion {
        self.stop();
        self.session.remaining_secs = 0;
        let mode = self.session.mode;
        let next_mode = if mode == TimerMode::Work {
            self.session.completed_work_sessions =
                self.session.completed_work_sessions.saturating_add(1);
            TimerMode::break_after(
                self.session.completed_work_sessions,
                settings.long_break_interval,
            )
        } else {
            TimerMode::Work
        };
        Completion {
            mode,
            next_mode,
            completed_work_sessions: self.session.completed_work_sessions,
        }
    }

    pub fn set_active_task(&mut self, task_id: Option<String>) {
        self.session.active_task_id = task_id;
    }

    /// Drop the active reference if it points at `task_id`.
    pub fn forget_task(&mut self, task_id: &str) -> bool {
        if self.session.active_task_id.as_deref() == Some(task_id) {
            self.session.active_task_id = None;
            return true;
        }
        false
    }

    /// Re-derive the countdown after a settings change, unless a session is
    /// in flight.
    pub fn apply_settings(&mut self, settings: &Settings) -> bool {
        if self.session.state != TimerState::Idle {
            return false;
        }
        self.rederive(settings);
        true
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn stop(&mut self) {
        self.session.state = TimerState::Idle;
        self.ticker = None;
        self.suspended_at = None;
    }

    fn rederive(&mut self, settings: &Settings) {
        self.total_secs = self.session.mode.duration_secs(settings);
        self.session.remaining_secs = self.total_secs;
    }

    fn install_ticker(&mut self) {
        self.next_ticker += 1;
        self.ticker = Some(TickerId(self.next_ticker));
    }
}
