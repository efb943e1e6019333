use crate::settings::Settings;
use crate::stats::Statistics;
use crate::task::TaskRegistry;
use crate::timer::TimerEngine;

/// Root application state. Owned by the [`Controller`](crate::Controller)
/// and handed to the persistence gateway as a whole.
#[derive(Debug, Clone)]
pub struct AppState {
    pub timer: TimerEngine,
    pub tasks: TaskRegistry,
    pub settings: Settings,
    pub stats: Statistics,
}

impl Default for AppState {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            timer: TimerEngine::new(&settings),
            tasks: TaskRegistry::new(),
            settings,
            stats: Statistics::default(),
        }
    }
}
