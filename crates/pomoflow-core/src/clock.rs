//! Wall-clock source.
//!
//! The core never reads the system time directly; it asks a [`Clock`]. The
//! CLI uses [`SystemClock`], tests use [`ManualClock`] to step time and cross
//! day boundaries deterministically.

use std::cell::Cell;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the user's local time zone.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// `today()` is derived from `now()` in UTC so results do not depend on the
/// machine's time zone.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().date_naive()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Converts an arbitrary polling cadence into whole elapsed seconds.
///
/// The sub-second remainder carries over between polls: polling every 250 ms
/// yields one second on every fourth poll, a late poll yields several at once.
#[derive(Debug, Clone, Copy)]
pub struct SecondPacer {
    counted_to: DateTime<Utc>,
}

impl SecondPacer {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { counted_to: at }
    }

    /// Start counting afresh from `at`, dropping any partial second.
    pub fn restart(&mut self, at: DateTime<Utc>) {
        self.counted_to = at;
    }

    /// Whole seconds elapsed since the last second handed out.
    ///
    /// A clock that stepped backwards yields 0 and counting resumes from `now`.
    pub fn elapsed(&mut self, now: DateTime<Utc>) -> u64 {
        if now < self.counted_to {
            self.counted_to = now;
            return 0;
        }
        let secs = (now - self.counted_to).num_seconds();
        self.counted_to += Duration::seconds(secs);
        u64::try_from(secs).unwrap_or(0)
    }
}
