mod engine;
mod mode;

pub use engine::{Completion, Correction, Session, Tick, TickerId, TimerEngine, TimerState};
pub use mode::TimerMode;
