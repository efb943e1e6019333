use clap::Subcommand;
use pomoflow_core::{Config, Theme};

use super::{close, open_controller, CmdResult};

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Print the current theme
    Get,
    /// Set the theme (light or dark)
    Set {
        theme: Theme,
    },
    /// Switch between light and dark
    Toggle,
}

pub fn run(action: ThemeAction, config: &Config) -> CmdResult {
    let mut c = open_controller(config)?;

    let theme = match action {
        ThemeAction::Get => c.theme(),
        ThemeAction::Set { theme } => {
            c.set_theme(theme);
            theme
        }
        ThemeAction::Toggle => c.toggle_theme(),
    };
    println!("{theme}");

    close(c);
    Ok(())
}
