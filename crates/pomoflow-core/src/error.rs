//! Core error types for pomoflow-core.
//!
//! Every failure the core can report falls into one of four user-facing
//! kinds (validation, busy, storage, import format). Configuration and IO
//! errors only occur on the edges (config file, data directory).

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerMode;

/// Core error type for pomoflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid user input; no state was changed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An operation that requires a stopped timer was attempted while running.
    #[error("{0}")]
    Busy(#[from] BusyError),

    /// Persistence read/write failure. Never fatal.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Malformed import document; nothing was applied.
    #[error("Import error: {0}")]
    ImportFormat(#[from] ImportFormatError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("estimated pomodoros must be between {min} and {max}, got {value}")]
    EstimateOutOfRange { value: u32, min: u32, max: u32 },

    #[error("no task with id '{0}'")]
    UnknownTask(String),

    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Raised when the mode is switched while the countdown is running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot switch to {target} while the timer is running; pause it first")]
pub struct BusyError {
    pub target: TimerMode,
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Read failed for '{key}': {message}")]
    ReadFailed { key: String, message: String },

    #[error("Write failed for '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Stored record exists but could not be decoded
    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("Failed to encode record: {0}")]
    Encode(String),

    /// Store is locked by another process
    #[error("Store is locked")]
    Locked,
}

/// Import document errors.
#[derive(Error, Debug)]
pub enum ImportFormatError {
    #[error("document is not valid JSON: {0}")]
    Syntax(String),

    #[error("document must be a JSON object")]
    NotAnObject,

    #[error("invalid '{group}' section: {message}")]
    InvalidGroup { group: &'static str, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Home/data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl StorageError {
    /// Classify a SQLite failure for `key`, keeping lock contention distinct.
    pub(crate) fn from_sqlite(key: &str, write: bool, err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = &err {
            if matches!(
                inner.code,
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
            ) {
                return StorageError::Locked;
            }
        }
        let key = key.to_string();
        let message = err.to_string();
        if write {
            StorageError::WriteFailed { key, message }
        } else {
            StorageError::ReadFailed { key, message }
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
