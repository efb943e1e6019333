use clap::Subcommand;
use pomoflow_core::format::format_minutes;
use pomoflow_core::Config;
use serde::Serialize;

use super::{close, open_controller, print_json, CmdResult};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's and this week's counters
    Show,
    /// Completed work sessions per weekday
    Weekly {
        /// Bar chart instead of JSON
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Serialize)]
struct Summary {
    today_pomodoros: u32,
    week_pomodoros: u32,
    today_focus_time_minutes: u32,
    today_focus_time: String,
    tasks_completed: u32,
    completed_work_sessions: u32,
}

#[derive(Serialize)]
struct Day {
    day: &'static str,
    pomodoros: u32,
}

pub fn run(action: StatsAction, config: &Config) -> CmdResult {
    let c = open_controller(config)?;
    let stats = c.stats();

    match action {
        StatsAction::Show => {
            print_json(&Summary {
                today_pomodoros: stats.today_pomodoros,
                week_pomodoros: stats.week_pomodoros,
                today_focus_time_minutes: stats.today_focus_time_minutes,
                today_focus_time: format_minutes(stats.today_focus_time_minutes),
                tasks_completed: stats.tasks_completed,
                completed_work_sessions: c.timer().completed_work_sessions(),
            })?;
        }
        StatsAction::Weekly { plain } => {
            if plain {
                let max = stats.weekly_data.iter().copied().max().unwrap_or(0).max(1);
                for (day, count) in WEEKDAYS.iter().zip(stats.weekly_data) {
                    let width = (count * 20).div_ceil(max) as usize;
                    println!("{day}  {count:>3}  {}", "#".repeat(width));
                }
            } else {
                let days: Vec<Day> = WEEKDAYS
                    .iter()
                    .zip(stats.weekly_data)
                    .map(|(&day, pomodoros)| Day { day, pomodoros })
                    .collect();
                print_json(&days)?;
            }
        }
    }

    close(c);
    Ok(())
}
