use clap::Subcommand;
use pomoflow_core::{Config, Settings};

use super::{close, open_controller, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print all timer settings as JSON
    List,
    /// Print one setting
    Get {
        /// Record key (e.g. "workDuration")
        key: String,
    },
    /// Change one setting
    Set {
        key: String,
        value: String,
    },
    /// Restore default settings
    Reset,
}

pub fn run(action: SettingsAction, config: &Config) -> CmdResult {
    let mut c = open_controller(config)?;

    match action {
        SettingsAction::List => print_json(c.settings())?,
        SettingsAction::Get { key } => match c.settings().get(&key) {
            Some(value) => println!("{value}"),
            None => {
                return Err(format!(
                    "unknown setting: {key} (expected one of: {})",
                    Settings::keys().join(", ")
                )
                .into());
            }
        },
        SettingsAction::Set { key, value } => {
            c.set_setting(&key, &value)?;
            println!("ok");
        }
        SettingsAction::Reset => {
            c.reset_settings();
            println!("settings reset to defaults");
        }
    }

    close(c);
    Ok(())
}
