//! Persistence: key-value stores, the versioned state record, the
//! export/import documents and the TOML runtime configuration.

mod config;
pub mod database;
pub mod gateway;
pub mod record;
pub mod store;
pub mod transfer;

pub use config::{Config, LoggingConfig, RuntimeConfig, CONFIG_FILE};
pub use database::SqliteStore;
pub use gateway::{
    LoadOutcome, PersistenceGateway, Theme, CORRUPT_BACKUP_KEY, DATA_KEY, LAST_ROLLOVER_KEY,
    THEME_KEY,
};
pub use record::{DecodedRecord, PersistedRecord, PersistedState, RECORD_VERSION};
pub use store::{MemoryStore, Store};
pub use transfer::{ExportDocument, ImportDocument, ResolvedImport};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the PomoFlow data directory.
///
/// `POMOFLOW_DATA_DIR` wins when set. Otherwise `~/.config/pomoflow[-dev]/`,
/// with the `-dev` suffix selected by `POMOFLOW_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOFLOW_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOFLOW_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pomoflow-dev")
            } else {
                base_dir.join("pomoflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
