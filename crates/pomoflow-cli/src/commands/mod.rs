pub mod config;
pub mod data;
pub mod settings;
pub mod stats;
pub mod task;
pub mod theme;
pub mod timer;

use chrono::Duration;
use pomoflow_core::{Config, Controller, Event, NoticeLevel, SqliteStore, SystemClock};
use serde::Serialize;

const MAX_AUTO_START_DELAY_SECS: u64 = 3600;

pub type AppController = Controller<SqliteStore, SystemClock>;
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the on-disk state. Loading applies the daily rollover and catches up
/// a session left running by a previous process.
pub fn open_controller(config: &Config) -> Result<AppController, Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    let delay = config.runtime.auto_start_delay_secs.min(MAX_AUTO_START_DELAY_SECS) as i64;
    let mut controller =
        Controller::open(store, SystemClock).with_auto_start_delay(Duration::seconds(delay));
    report(&mut controller);
    Ok(controller)
}

/// Save and surface anything the controller wants the user to see.
pub fn close(mut controller: AppController) {
    controller.save();
    report(&mut controller);
}

/// Print notices and storage failures to stderr; everything else goes to
/// the debug log.
pub fn report(controller: &mut AppController) {
    for event in controller.drain_events() {
        match &event {
            Event::Notice { level, message, .. } => match level {
                NoticeLevel::Info => eprintln!("{message}"),
                NoticeLevel::Warning => eprintln!("warning: {message}"),
                NoticeLevel::Error => eprintln!("error: {message}"),
            },
            Event::StorageFailed { message, .. } => eprintln!("warning: {message}"),
            other => tracing::debug!(event = ?other, "event"),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
