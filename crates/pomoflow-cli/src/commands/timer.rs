use std::time::Duration;

use clap::Subcommand;
use pomoflow_core::{Clock, Config, Event, SecondPacer, TimerMode};
use tokio::time::MissedTickBehavior;

use super::{close, open_controller, print_json, AppController, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Start or continue the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start when stopped, pause when running
    Toggle,
    /// Back to a full, idle countdown for the current mode
    Reset,
    /// Complete the current session now
    Skip,
    /// Switch mode (work, short-break, long-break)
    Mode {
        mode: TimerMode,
    },
    /// Drive the timer in the foreground until Ctrl-C
    Run {
        /// Stop after the first session completes
        #[arg(long)]
        exit_on_complete: bool,
    },
}

pub fn run(action: TimerAction, config: &Config) -> CmdResult {
    let mut c = open_controller(config)?;

    match action {
        TimerAction::Status => {}
        TimerAction::Start => {
            if !c.start() {
                eprintln!("timer already running");
            }
        }
        TimerAction::Pause => {
            if !c.pause() {
                eprintln!("timer is not running");
            }
        }
        TimerAction::Toggle => {
            c.toggle();
        }
        TimerAction::Reset => c.reset(),
        TimerAction::Skip => {
            c.skip();
        }
        TimerAction::Mode { mode } => c.switch_mode(mode)?,
        TimerAction::Run { exit_on_complete } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            return runtime.block_on(run_foreground(c, config, exit_on_complete));
        }
    }

    print_json(&c.status())?;
    close(c);
    Ok(())
}

/// Foreground loop. One interval polls the clock, and the countdown moves by
/// the whole seconds that actually elapsed. A second interval autosaves.
/// Each event is printed as one JSON line.
async fn run_foreground(mut c: AppController, config: &Config, exit_on_complete: bool) -> CmdResult {
    let poll_every = Duration::from_millis(config.runtime.poll_interval_ms.clamp(1, 1000));
    let save_every = Duration::from_secs(config.runtime.autosave_interval_secs.max(1));

    let mut poll = tokio::time::interval(poll_every);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut autosave = tokio::time::interval(save_every);
    autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Both intervals complete their first tick immediately.
    poll.tick().await;
    autosave.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    c.start();
    tracing::info!(mode = %c.timer().mode(), "foreground timer running");
    let mut pacer = SecondPacer::new(c.clock().now());

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let elapsed = pacer.elapsed(c.clock().now());
                c.advance(elapsed);
                if c.poll_pending() {
                    pacer.restart(c.clock().now());
                }

                if emit(&mut c)? && exit_on_complete {
                    break;
                }
            }
            _ = autosave.tick() => {
                c.apply_daily_rollover();
                c.save();
                emit(&mut c)?;
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "ctrl-c handler failed");
                }
                tracing::info!("interrupted; saving");
                break;
            }
        }
    }

    close(c);
    Ok(())
}

/// Print queued events as JSON lines. Returns `true` if a session completed.
fn emit(c: &mut AppController) -> Result<bool, Box<dyn std::error::Error>> {
    let mut completed = false;
    for event in c.drain_events() {
        match &event {
            Event::SessionCompleted { .. } => completed = true,
            Event::StorageFailed { message, .. } => eprintln!("warning: {message}"),
            _ => {}
        }
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(completed)
}
