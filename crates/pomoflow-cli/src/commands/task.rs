use clap::Subcommand;
use pomoflow_core::format::relative_time;
use pomoflow_core::{Clock, Config};

use super::{close, open_controller, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task at the top of the list
    Add {
        /// Task title
        title: String,
        /// Estimated pomodoros (1-20)
        #[arg(long, short, default_value = "1")]
        estimate: u32,
    },
    /// List tasks
    List {
        /// One line per task instead of JSON
        #[arg(long)]
        plain: bool,
    },
    /// Make a task the active one
    Select {
        id: String,
    },
    /// Flip a task between done and not done
    Toggle {
        id: String,
    },
    /// Rename a task
    Edit {
        id: String,
        title: String,
    },
    /// Delete a task
    Delete {
        id: String,
    },
    /// Remove every completed task
    ClearCompleted,
    /// Remove every task
    ClearAll,
}

pub fn run(action: TaskAction, config: &Config) -> CmdResult {
    let mut c = open_controller(config)?;

    match action {
        TaskAction::Add { title, estimate } => {
            let id = c.add_task(&title, estimate)?;
            if let Some(task) = c.tasks().get(&id) {
                print_json(task)?;
            }
        }
        TaskAction::List { plain } => {
            if plain {
                let now = c.clock().now();
                let active = c.timer().active_task_id();
                for task in c.tasks().tasks() {
                    let mark = if task.completed { "x" } else { " " };
                    let pointer = if active == Some(task.id.as_str()) { ">" } else { " " };
                    let last = task
                        .last_worked_on
                        .map(|at| format!("  last: {}", relative_time(at, now)))
                        .unwrap_or_default();
                    println!(
                        "{pointer}[{mark}] {}  {}/{}  ({}){last}",
                        task.title, task.completed_pomodoros, task.estimated_pomodoros, task.id
                    );
                }
            } else {
                print_json(&c.tasks())?;
            }
        }
        TaskAction::Select { id } => {
            c.select_task(&id)?;
            println!("selected {id}");
        }
        TaskAction::Toggle { id } => {
            let completed = c.toggle_task(&id)?;
            println!("{}", if completed { "completed" } else { "reopened" });
        }
        TaskAction::Edit { id, title } => {
            if c.edit_task(&id, &title)? {
                println!("renamed {id}");
            } else {
                println!("unchanged");
            }
        }
        TaskAction::Delete { id } => {
            let task = c.delete_task(&id)?;
            println!("deleted \"{}\"", task.title);
        }
        TaskAction::ClearCompleted => {
            let removed = c.clear_completed();
            if removed > 0 {
                println!("{removed} completed task(s) cleared");
            }
        }
        TaskAction::ClearAll => {
            let removed = c.clear_all();
            if removed > 0 {
                println!("{removed} task(s) cleared");
            }
        }
    }

    close(c);
    Ok(())
}
