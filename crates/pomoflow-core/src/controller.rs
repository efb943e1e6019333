//! Application controller.
//!
//! Owns the root [`AppState`] and is the only place where the session, the
//! task registry and the statistics meet. Every command stamps itself with
//! the injected [`Clock`], queues [`Event`]s for the front-end and requests a
//! save. Saves are fire-and-forget: a failed write is reported as
//! [`Event::StorageFailed`] and never rolls back memory.
//!
//! The controller is single-threaded. A driver (the CLI's `timer run` loop,
//! a GUI event loop, a test) forwards ticks from the installed source,
//! polls the deferred auto-start and tells the controller when the host was
//! suspended.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{BusyError, ImportFormatError, StorageError, ValidationError};
use crate::events::Event;
use crate::format::{format_clock, status_label};
use crate::settings::Settings;
use crate::state::AppState;
use crate::stats::{Rollover, Statistics};
use crate::storage::{ExportDocument, ImportDocument, PersistenceGateway, Store, Theme};
use crate::task::{Task, TaskRegistry};
use crate::timer::{Correction, Tick, TickerId, TimerEngine, TimerMode, TimerState};

/// Delay before a session scheduled by auto-start begins.
pub const DEFAULT_AUTO_START_DELAY_SECS: i64 = 2;

/// A run of elapsed seconds at least this long is treated as time the host
/// did not schedule us, and is applied as background correction.
pub const CATCH_UP_AFTER_SECS: u64 = 3;
/// No session is longer than this, so larger gaps are clamped.
const MAX_GAP_SECS: u64 = 24 * 60 * 60;

/// A start that will fire on its own unless something supersedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingStart {
    pub mode: TimerMode,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveTask {
    pub id: String,
    pub title: String,
    pub completed_pomodoros: u32,
    pub estimated_pomodoros: u32,
    pub completed: bool,
}

/// Read-only snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub mode: TimerMode,
    pub mode_label: &'static str,
    pub state: TimerState,
    pub status_label: String,
    pub remaining_secs: u64,
    pub remaining: String,
    pub total_secs: u64,
    pub progress: f64,
    pub completed_work_sessions: u32,
    pub active_task: Option<ActiveTask>,
    pub auto_start: Option<PendingStart>,
}

pub struct Controller<S, C> {
    state: AppState,
    gateway: PersistenceGateway<S>,
    clock: C,
    theme: Theme,
    pending_start: Option<PendingStart>,
    auto_start_delay: Duration,
    events: Vec<Event>,
}

impl<S: Store, C: Clock> Controller<S, C> {
    /// Load persisted state and bring it up to date.
    ///
    /// Applies the daily rollover, then treats the time since the record was
    /// last saved as background time if it was saved while running. Load
    /// failures are reported as events; the controller always comes up.
    pub fn open(store: S, clock: C) -> Self {
        let gateway = PersistenceGateway::new(store);
        let mut events = Vec::new();
        let now = clock.now();

        let loaded = gateway.load();
        if let Some(e) = &loaded.error {
            events.push(storage_failed(e, now));
        }
        let mut state = loaded.state;

        let theme = gateway.theme().unwrap_or_else(|e| {
            events.push(storage_failed(&e, now));
            Theme::default()
        });
        state.stats.last_rollover_date = gateway.last_rollover().unwrap_or_else(|e| {
            events.push(storage_failed(&e, now));
            None
        });

        let mut controller = Self {
            state,
            gateway,
            clock,
            theme,
            pending_start: None,
            auto_start_delay: Duration::seconds(DEFAULT_AUTO_START_DELAY_SECS),
            events,
        };

        controller.apply_daily_rollover();
        if let Some(saved_at) = loaded.last_saved {
            if controller.resume_from(saved_at).is_some() {
                debug!(%saved_at, "caught up on time since last save");
            }
        }
        controller
    }

    pub fn with_auto_start_delay(mut self, delay: Duration) -> Self {
        self.auto_start_delay = delay.max(Duration::zero());
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.state.timer
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.state.tasks
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn stats(&self) -> &Statistics {
        &self.state.stats
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn pending_start(&self) -> Option<PendingStart> {
        self.pending_start
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        self.gateway.store()
    }

    pub fn status(&self) -> Status {
        let timer = &self.state.timer;
        let active_task = timer
            .active_task_id()
            .and_then(|id| self.state.tasks.get(id))
            .map(|t| ActiveTask {
                id: t.id.clone(),
                title: t.title.clone(),
                completed_pomodoros: t.completed_pomodoros,
                estimated_pomodoros: t.estimated_pomodoros,
                completed: t.completed,
            });
        Status {
            mode: timer.mode(),
            mode_label: timer.mode().label(),
            state: timer.state(),
            status_label: status_label(timer.mode(), timer.state()),
            remaining_secs: timer.remaining_secs(),
            remaining: format_clock(timer.remaining_secs()),
            total_secs: timer.total_secs(),
            progress: timer.progress(),
            completed_work_sessions: timer.completed_work_sessions(),
            active_task,
            auto_start: self.pending_start,
        }
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Change mode. Refused while running; supersedes a pending auto-start.
    pub fn switch_mode(&mut self, target: TimerMode) -> Result<(), BusyError> {
        let now = self.clock.now();
        let event = self
            .state
            .timer
            .switch_mode(target, &self.state.settings, now)?;
        self.cancel_pending("mode switched");
        debug!(mode = %target, "mode switched");
        self.events.push(event);
        self.save();
        Ok(())
    }

    /// Start or continue the countdown. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        self.cancel_pending("started manually");
        self.begin(false)
    }

    pub fn pause(&mut self) -> bool {
        let now = self.clock.now();
        match self.state.timer.pause(now) {
            Some(event) => {
                debug!(remaining = self.state.timer.remaining_secs(), "paused");
                self.events.push(event);
                self.save();
                true
            }
            None => false,
        }
    }

    /// Start when stopped, pause when running. Returns the new running flag.
    pub fn toggle(&mut self) -> bool {
        if self.state.timer.is_running() {
            self.pause();
        } else {
            self.start();
        }
        self.state.timer.is_running()
    }

    pub fn reset(&mut self) {
        let now = self.clock.now();
        self.cancel_pending("reset");
        let event = self.state.timer.reset(&self.state.settings, now);
        debug!(mode = %self.state.timer.mode(), "reset");
        self.events.push(event);
        self.save();
    }

    /// Complete a started session immediately. No-op when idle.
    pub fn skip(&mut self) -> bool {
        if !self.state.timer.can_skip() {
            let now = self.clock.now();
            self.events.push(Event::info("Nothing to skip", now));
            return false;
        }
        let now = self.clock.now();
        self.events.push(Event::SessionSkipped {
            mode: self.state.timer.mode(),
            at: now,
        });
        self.complete(now);
        true
    }

    /// Forward one tick from the installed source.
    pub fn tick(&mut self, source: TickerId) -> Tick {
        let tick = self.state.timer.tick(source);
        if tick == Tick::Expired {
            let now = self.clock.now();
            self.complete(now);
        }
        tick
    }

    /// Account for `secs` whole seconds of wall time on the installed source.
    ///
    /// Short runs are ticked one by one. Longer gaps go through the
    /// background correction, which completes at most once.
    pub fn advance(&mut self, secs: u64) {
        if secs >= CATCH_UP_AFTER_SECS {
            let gap = Duration::seconds(secs.min(MAX_GAP_SECS) as i64);
            let since = self.clock.now() - gap;
            self.resume_from(since);
            return;
        }
        for _ in 0..secs {
            match self.state.timer.ticker() {
                Some(id) => {
                    self.tick(id);
                }
                None => break,
            }
        }
    }

    /// The host stopped scheduling ticks (sleep, hidden window, exit).
    pub fn suspend(&mut self) -> bool {
        let now = self.clock.now();
        self.state.timer.suspend(now)
    }

    /// Apply the time spent suspended. Completes at most once.
    pub fn resume(&mut self) -> Option<Correction> {
        let now = self.clock.now();
        let correction = self.state.timer.resume(now)?;
        debug!(
            elapsed = correction.elapsed_secs,
            remaining = correction.remaining_secs,
            "background time applied"
        );
        self.events.push(Event::BackgroundCorrected {
            elapsed_secs: correction.elapsed_secs,
            remaining_secs: correction.remaining_secs,
            at: now,
        });
        if correction.expired() {
            self.complete(now);
        } else {
            self.save();
        }
        Some(correction)
    }

    /// Treat everything since `since` as suspended time. Used when the gap
    /// is only noticed afterwards (a restart, a missed run of ticks).
    pub fn resume_from(&mut self, since: DateTime<Utc>) -> Option<Correction> {
        if !self.state.timer.suspend(since) {
            return None;
        }
        self.resume()
    }

    /// Fire the pending auto-start if it is due. Returns `true` if it fired.
    pub fn poll_pending(&mut self) -> bool {
        let now = self.clock.now();
        let due = matches!(self.pending_start, Some(p) if p.due_at <= now);
        if !due {
            return false;
        }
        self.pending_start = None;
        self.begin(true)
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(&mut self, title: &str, estimate: u32) -> Result<String, ValidationError> {
        let now = self.clock.now();
        let task = self.state.tasks.add(title, estimate, now)?;
        let (task_id, title) = (task.id.clone(), task.title.clone());
        debug!(%task_id, "task added");
        self.events.push(Event::TaskAdded {
            task_id: task_id.clone(),
            title,
            at: now,
        });
        self.save();
        Ok(task_id)
    }

    pub fn select_task(&mut self, id: &str) -> Result<(), ValidationError> {
        if !self.state.tasks.contains(id) {
            return Err(ValidationError::UnknownTask(id.to_string()));
        }
        self.set_active(id.to_string());
        self.save();
        Ok(())
    }

    /// Flip completion and adjust `tasksCompleted` by one either way.
    pub fn toggle_task(&mut self, id: &str) -> Result<bool, ValidationError> {
        let now = self.clock.now();
        let completed = self.state.tasks.toggle(id, now)?;
        if completed {
            self.state.stats.task_completed();
            let title = self
                .state
                .tasks
                .get(id)
                .map(|t| t.title.clone())
                .unwrap_or_default();
            self.events.push(Event::TaskCompleted {
                task_id: id.to_string(),
                title,
                at: now,
            });
        } else {
            self.state.stats.task_reopened();
            self.events.push(Event::TaskReopened {
                task_id: id.to_string(),
                at: now,
            });
        }
        self.save();
        Ok(completed)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, ValidationError> {
        let now = self.clock.now();
        let task = self.state.tasks.delete(id)?;
        if self.state.timer.forget_task(id) {
            debug!(task_id = %id, "active task deleted");
        }
        self.events.push(Event::TaskDeleted {
            task_id: id.to_string(),
            at: now,
        });
        self.save();
        Ok(task)
    }

    /// Rename a task. A blank title is ignored and reported as `false`.
    pub fn edit_task(&mut self, id: &str, title: &str) -> Result<bool, ValidationError> {
        let now = self.clock.now();
        if !self.state.tasks.edit(id, title)? {
            return Ok(false);
        }
        self.events.push(Event::TaskEdited {
            task_id: id.to_string(),
            title: title.trim().to_string(),
            at: now,
        });
        self.save();
        Ok(true)
    }

    pub fn clear_completed(&mut self) -> usize {
        let now = self.clock.now();
        let removed = self.state.tasks.clear_completed();
        if removed.is_empty() {
            self.events.push(Event::info("No completed tasks to clear", now));
            return 0;
        }
        for id in &removed {
            self.state.timer.forget_task(id);
        }
        self.events.push(Event::TasksCleared {
            removed: removed.len(),
            completed_only: true,
            at: now,
        });
        self.save();
        removed.len()
    }

    pub fn clear_all(&mut self) -> usize {
        let now = self.clock.now();
        let removed = self.state.tasks.clear_all();
        if removed == 0 {
            self.events.push(Event::info("No tasks to clear", now));
            return 0;
        }
        self.state.timer.set_active_task(None);
        self.events.push(Event::TasksCleared {
            removed,
            completed_only: false,
            at: now,
        });
        self.save();
        removed
    }

    // ── Settings & theme ─────────────────────────────────────────────

    /// Replace all settings. The countdown is re-derived only when idle.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ValidationError> {
        settings.validate()?;
        self.replace_settings(settings);
        Ok(())
    }

    /// Set one setting by its record key, e.g. `workDuration`.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), ValidationError> {
        let updated = self.state.settings.with_value(key, value)?;
        self.update_settings(updated)
    }

    pub fn reset_settings(&mut self) {
        self.replace_settings(Settings::default());
    }

    /// Store already-valid settings and re-derive an idle countdown.
    fn replace_settings(&mut self, settings: Settings) {
        let now = self.clock.now();
        self.state.settings = settings;
        if self.state.timer.apply_settings(&self.state.settings) {
            debug!("countdown re-derived from new settings");
        }
        self.events.push(Event::SettingsUpdated { at: now });
        self.save();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        let now = self.clock.now();
        self.theme = theme;
        if let Err(e) = self.gateway.set_theme(theme) {
            self.report_storage(&e, now);
        }
        self.events.push(Event::ThemeChanged {
            theme: theme.to_string(),
            at: now,
        });
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.theme.toggled();
        self.set_theme(next);
        next
    }

    // ── Transfer ─────────────────────────────────────────────────────

    pub fn export(&self) -> ExportDocument {
        ExportDocument::capture(&self.state, self.clock.now())
    }

    pub fn export_file_name(&self) -> String {
        ExportDocument::file_name(self.clock.today())
    }

    /// Apply an import document. Every present group is validated before
    /// any of them is applied.
    pub fn import(&mut self, raw: &str) -> Result<(), ImportFormatError> {
        let now = self.clock.now();
        let resolved = ImportDocument::parse(raw)
            .and_then(|doc| doc.resolve(&self.state.stats, &self.state.settings))
            .inspect_err(|e| warn!(error = %e, "import rejected"))?;

        let (has_tasks, has_stats, has_settings) = (
            resolved.tasks.is_some(),
            resolved.stats.is_some(),
            resolved.settings.is_some(),
        );
        if let Some(tasks) = resolved.tasks {
            self.state.tasks = TaskRegistry::from_tasks(tasks);
            if let Some(active) = self.state.timer.active_task_id().map(str::to_string) {
                if !self.state.tasks.contains(&active) {
                    self.state.timer.set_active_task(None);
                }
            }
        }
        if let Some(stats) = resolved.stats {
            self.state.stats = stats;
        }
        if let Some(settings) = resolved.settings {
            self.state.settings = settings;
            self.state.timer.apply_settings(&self.state.settings);
        }

        info!(
            tasks = has_tasks,
            stats = has_stats,
            settings = has_settings,
            "data imported"
        );
        self.events.push(Event::DataImported {
            tasks: has_tasks,
            stats: has_stats,
            settings: has_settings,
            at: now,
        });
        self.save();
        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Reset day and week counters if the local date moved on.
    pub fn apply_daily_rollover(&mut self) -> Option<Rollover> {
        let today = self.clock.today();
        let now = self.clock.now();
        let rollover = self.state.stats.apply_daily_rollover(today)?;
        info!(date = %rollover.date, week_reset = rollover.week_reset, "daily rollover");
        if let Err(e) = self.gateway.set_last_rollover(today) {
            self.report_storage(&e, now);
        }
        self.events.push(Event::StatsRolledOver {
            date: rollover.date,
            week_reset: rollover.week_reset,
            at: now,
        });
        self.save();
        Some(rollover)
    }

    /// Write the whole state. Returns `false` (and queues a
    /// [`Event::StorageFailed`]) when the write failed.
    pub fn save(&mut self) -> bool {
        let now = self.clock.now();
        match self.gateway.save(&self.state, now) {
            Ok(()) => true,
            Err(e) => {
                self.report_storage(&e, now);
                false
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self, automatic: bool) -> bool {
        let now = self.clock.now();
        if self.state.timer.is_running() {
            return false;
        }
        if self.state.timer.active_task_id().is_none() {
            if let Some(id) = self.state.tasks.first_incomplete().map(|t| t.id.clone()) {
                self.set_active(id);
            }
        }
        match self.state.timer.start(automatic, &self.state.settings, now) {
            Some(event) => {
                debug!(mode = %self.state.timer.mode(), automatic, "started");
                self.events.push(event);
                self.save();
                true
            }
            None => false,
        }
    }

    /// Close the current interval and run its side-effects.
    fn complete(&mut self, now: DateTime<Utc>) {
        // A long-running process may have crossed midnight since startup.
        self.apply_daily_rollover();

        let done = self.state.timer.finish(&self.state.settings);
        if done.mode == TimerMode::Work {
            self.credit_active_task(now);
        }
        self.state.stats.record_completion(
            done.mode,
            self.state.settings.work_duration,
            self.clock.today(),
        );
        info!(
            mode = %done.mode,
            next = %done.next_mode,
            completed = done.completed_work_sessions,
            "session completed"
        );
        self.events.push(Event::SessionCompleted {
            mode: done.mode,
            completed_work_sessions: done.completed_work_sessions,
            next_mode: done.next_mode,
            at: now,
        });

        match self
            .state
            .timer
            .switch_mode(done.next_mode, &self.state.settings, now)
        {
            Ok(event) => self.events.push(event),
            Err(e) => warn!(error = %e, "could not advance mode after completion"),
        }

        let auto_start = if done.next_mode.is_break() {
            self.state.settings.auto_start_breaks
        } else {
            self.state.settings.auto_start_pomodoros
        };
        if auto_start {
            let pending = PendingStart {
                mode: done.next_mode,
                due_at: now + self.auto_start_delay,
            };
            debug!(mode = %pending.mode, due_at = %pending.due_at, "auto-start scheduled");
            self.events.push(Event::AutoStartScheduled {
                mode: pending.mode,
                due_at: pending.due_at,
                at: now,
            });
            self.pending_start = Some(pending);
        }

        self.save();
    }

    fn credit_active_task(&mut self, now: DateTime<Utc>) {
        let Some(id) = self.state.timer.active_task_id().map(str::to_string) else {
            return;
        };
        let Some(credit) = self.state.tasks.credit_pomodoro(&id, now) else {
            return;
        };
        self.events.push(Event::TaskProgressed {
            task_id: credit.task_id.clone(),
            completed_pomodoros: credit.completed_pomodoros,
            estimated_pomodoros: credit.estimated_pomodoros,
            at: now,
        });
        if credit.just_completed {
            self.state.stats.task_completed();
            info!(task_id = %credit.task_id, "task reached its estimate");
            self.events.push(Event::TaskCompleted {
                task_id: credit.task_id,
                title: credit.title,
                at: now,
            });
        }
    }

    fn set_active(&mut self, id: String) {
        let now = self.clock.now();
        self.state.timer.set_active_task(Some(id.clone()));
        self.events.push(Event::TaskSelected { task_id: id, at: now });
    }

    fn cancel_pending(&mut self, reason: &str) {
        if let Some(pending) = self.pending_start.take() {
            debug!(mode = %pending.mode, reason, "pending auto-start cancelled");
        }
    }

    fn report_storage(&mut self, error: &StorageError, at: DateTime<Utc>) {
        warn!(error = %error, "storage write failed");
        self.events.push(storage_failed(error, at));
    }
}

fn storage_failed(error: &StorageError, at: DateTime<Utc>) -> Event {
    Event::StorageFailed {
        message: error.to_string(),
        at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    type TestController = Controller<MemoryStore, ManualClock>;

    fn wednesday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 9, 0, 0).unwrap()
    }

    fn controller() -> TestController {
        Controller::open(MemoryStore::new(), ManualClock::new(wednesday()))
    }

    fn run_to_end(c: &mut TestController) {
        c.start();
        let id = c.timer().ticker().unwrap();
        while c.tick(id) != Tick::Expired {}
    }

    #[test]
    fn open_on_empty_store_rolls_over_once() {
        let mut c = controller();
        let events = c.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::StatsRolledOver { .. })));
        assert!(c.apply_daily_rollover().is_none());
        assert_eq!(
            c.store().get(crate::storage::LAST_ROLLOVER_KEY).unwrap().as_deref(),
            Some("2024-03-06")
        );
    }

    #[test]
    fn start_selects_first_incomplete_task() {
        let mut c = controller();
        let older = c.add_task("older", 1).unwrap();
        let newer = c.add_task("newer", 1).unwrap();
        c.toggle_task(&newer).unwrap();
        assert!(c.start());
        assert_eq!(c.timer().active_task_id(), Some(older.as_str()));
    }

    #[test]
    fn manual_switch_cancels_pending_auto_start() {
        let mut c = controller();
        let mut s = c.settings().clone();
        s.work_duration = 1;
        s.auto_start_breaks = true;
        c.update_settings(s).unwrap();
        run_to_end(&mut c);
        assert!(c.pending_start().is_some());
        c.switch_mode(TimerMode::Work).unwrap();
        assert!(c.pending_start().is_none());
        c.clock().advance_secs(10);
        assert!(!c.poll_pending());
        assert!(!c.timer().is_running());
    }

    #[test]
    fn pending_auto_start_fires_after_delay() {
        let mut c = controller();
        let mut s = c.settings().clone();
        s.work_duration = 1;
        s.auto_start_breaks = true;
        c.update_settings(s).unwrap();
        run_to_end(&mut c);
        assert_eq!(c.timer().mode(), TimerMode::ShortBreak);
        c.clock().advance_secs(1);
        assert!(!c.poll_pending());
        c.clock().advance_secs(1);
        assert!(c.poll_pending());
        assert!(c.timer().is_running());
        assert!(c.drain_events().iter().any(|e| matches!(
            e,
            Event::SessionStarted {
                automatic: true,
                mode: TimerMode::ShortBreak,
                ..
            }
        )));
    }

    #[test]
    fn skip_requires_started_session() {
        let mut c = controller();
        assert!(!c.skip());
        assert_eq!(c.stats().today_pomodoros, 0);
        c.start();
        c.pause();
        assert!(c.skip());
        assert_eq!(c.stats().today_pomodoros, 1);
        assert_eq!(c.timer().mode(), TimerMode::ShortBreak);
    }

    #[test]
    fn clear_completed_with_nothing_done_is_a_notice() {
        let mut c = controller();
        c.add_task("open", 1).unwrap();
        c.drain_events();
        assert_eq!(c.clear_completed(), 0);
        assert!(matches!(
            c.drain_events().as_slice(),
            [Event::Notice { .. }]
        ));
        assert_eq!(c.tasks().len(), 1);
    }

    #[test]
    fn settings_change_while_running_keeps_countdown() {
        let mut c = controller();
        c.start();
        c.set_setting("workDuration", "50").unwrap();
        assert_eq!(c.timer().remaining_secs(), 25 * 60);
        c.reset();
        assert_eq!(c.timer().remaining_secs(), 50 * 60);
    }

    #[test]
    fn reset_settings_restores_defaults_and_saves() {
        let mut c = controller();
        c.set_setting("workDuration", "45").unwrap();
        c.set_setting("autoStartBreaks", "true").unwrap();
        assert_eq!(c.timer().remaining_secs(), 45 * 60);
        c.drain_events();

        c.reset_settings();
        assert_eq!(c.settings(), &Settings::default());
        assert_eq!(c.timer().remaining_secs(), 25 * 60);
        assert!(c
            .drain_events()
            .iter()
            .any(|e| matches!(e, Event::SettingsUpdated { .. })));

        let reopened = Controller::open(c.store(), ManualClock::new(wednesday()));
        assert_eq!(reopened.settings(), &Settings::default());
    }

    #[test]
    fn theme_toggles_and_persists() {
        let mut c = controller();
        assert_eq!(c.theme(), Theme::Light);
        assert_eq!(c.toggle_theme(), Theme::Dark);
        assert_eq!(
            c.store().get(crate::storage::THEME_KEY).unwrap().as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn status_reflects_session() {
        let mut c = controller();
        let id = c.add_task("write", 2).unwrap();
        c.start();
        let status = c.status();
        assert_eq!(status.state, TimerState::Running);
        assert_eq!(status.remaining, "25:00");
        assert_eq!(status.status_label, "Focus Session in progress...");
        assert_eq!(status.active_task.unwrap().id, id);
    }
}
