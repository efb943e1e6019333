use std::path::PathBuf;

use clap::Subcommand;
use pomoflow_core::Config;

use super::{close, open_controller, CmdResult};

#[derive(Subcommand)]
pub enum DataAction {
    /// Write tasks, stats and settings to a JSON backup
    Export {
        /// Target file (default: pomoflow-backup-<date>.json in the current directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Load a JSON backup. Groups missing from the file are left as they are.
    Import {
        path: PathBuf,
    },
}

pub fn run(action: DataAction, config: &Config) -> CmdResult {
    let mut c = open_controller(config)?;

    match action {
        DataAction::Export { output } => {
            let path = output.unwrap_or_else(|| PathBuf::from(c.export_file_name()));
            let json = c.export().to_json_pretty()?;
            std::fs::write(&path, json)?;
            tracing::info!(path = %path.display(), "exported");
            println!("{}", path.display());
        }
        DataAction::Import { path } => {
            let raw = std::fs::read_to_string(&path)?;
            c.import(&raw)?;
            println!("imported {}", path.display());
        }
    }

    close(c);
    Ok(())
}
