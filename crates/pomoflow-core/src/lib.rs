//! # PomoFlow Core Library
//!
//! Core logic for the PomoFlow Pomodoro timer: the session state machine,
//! the task registry, the statistics aggregator and merge-safe persistence.
//! Front-ends (the `pomoflow` CLI, or any GUI) are thin layers that forward
//! user commands and ticks to a [`Controller`] and render the [`Event`]s it
//! emits.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a deterministic state machine; the caller installs a
//!   1-second tick source and forwards each tick
//! - **Task Registry**: ordered task list with completion bookkeeping
//! - **Statistics**: daily/weekly counters with lazy rollover
//! - **Storage**: key-value [`Store`] backends (SQLite, memory), the
//!   versioned persisted record, export/import and TOML configuration
//!
//! ## Key Components
//!
//! - [`Controller`]: owns [`AppState`] and runs completion side-effects
//! - [`TimerEngine`]: countdown, mode and running/paused status
//! - [`PersistenceGateway`]: one-record save/load with forward-compatible merge
//! - [`Config`]: runtime configuration

pub mod clock;
pub mod controller;
pub mod error;
pub mod events;
pub mod format;
pub mod settings;
pub mod state;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use clock::{Clock, ManualClock, SecondPacer, SystemClock};
pub use controller::{ActiveTask, Controller, PendingStart, Status};
pub use error::{
    BusyError, ConfigError, CoreError, ImportFormatError, StorageError, ValidationError,
};
pub use events::{Event, NoticeLevel};
pub use settings::Settings;
pub use state::AppState;
pub use stats::Statistics;
pub use storage::{
    data_dir, Config, ExportDocument, MemoryStore, PersistenceGateway, SqliteStore, Store, Theme,
};
pub use task::{Task, TaskRegistry};
pub use timer::{Tick, TickerId, TimerEngine, TimerMode, TimerState};
