//! Persistence gateway.
//!
//! Serializes the root state into one versioned record and reads it back,
//! plus two single-value entries (theme, last rollover date). The record is
//! fully encoded before anything touches the store, so a failure never leaves
//! a partial record behind.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::record::PersistedRecord;
use super::store::Store;
use crate::error::{StorageError, ValidationError};
use crate::state::AppState;

pub const DATA_KEY: &str = "pomoflow_data";
/// Copy of a record that could not be parsed, taken before it is overwritten.
pub const CORRUPT_BACKUP_KEY: &str = "pomoflow_data_corrupt";
pub const THEME_KEY: &str = "pomoflow_theme";
pub const LAST_ROLLOVER_KEY: &str = "pomoflow_last_update";

const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format older builds wrote the rollover date in ("Thu Mar 07 2024").
const LEGACY_DATE_FORMAT: &str = "%a %b %d %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ValidationError::InvalidValue {
                field: "theme".into(),
                message: format!("expected light or dark, got '{other}'"),
            }),
        }
    }
}

/// Result of [`PersistenceGateway::load`].
///
/// Loading never fails outright: a missing record yields defaults, an
/// unreadable or corrupt one yields defaults plus the error to report.
#[derive(Debug)]
pub struct LoadOutcome {
    pub state: AppState,
    pub last_saved: Option<DateTime<Utc>>,
    pub error: Option<StorageError>,
}

pub struct PersistenceGateway<S> {
    store: S,
}

impl<S: Store> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the whole state as one record.
    pub fn save(&self, state: &AppState, at: DateTime<Utc>) -> Result<(), StorageError> {
        let record = PersistedRecord::capture(state, at);
        let json =
            serde_json::to_string(&record).map_err(|e| StorageError::Encode(e.to_string()))?;
        self.store.set(DATA_KEY, &json)?;
        debug!(bytes = json.len(), "state saved");
        Ok(())
    }

    /// Read and merge the stored record over defaults.
    pub fn load(&self) -> LoadOutcome {
        let raw = match self.store.get(DATA_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no stored record; starting from defaults");
                return LoadOutcome {
                    state: AppState::default(),
                    last_saved: None,
                    error: None,
                };
            }
            Err(e) => {
                warn!(error = %e, "failed to read stored record");
                return LoadOutcome {
                    state: AppState::default(),
                    last_saved: None,
                    error: Some(e),
                };
            }
        };

        match PersistedRecord::decode(&raw) {
            Ok(decoded) => {
                if !decoded.skipped.is_empty() {
                    warn!(
                        fields = ?decoded.skipped,
                        "stored record has unusable values; defaults used for those fields"
                    );
                }
                debug!(version = %decoded.record.version, "stored record loaded");
                LoadOutcome {
                    last_saved: decoded.record.last_saved,
                    state: decoded.record.state.into_state(),
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "stored record is corrupt; starting from defaults");
                if let Err(backup) = self.store.set(CORRUPT_BACKUP_KEY, &raw) {
                    warn!(error = %backup, "could not back up corrupt record");
                }
                LoadOutcome {
                    state: AppState::default(),
                    last_saved: None,
                    error: Some(StorageError::Corrupt(e.to_string())),
                }
            }
        }
    }

    /// Stored theme, `Light` when unset or unrecognised.
    pub fn theme(&self) -> Result<Theme, StorageError> {
        Ok(self
            .store
            .get(THEME_KEY)?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    /// Last date a daily rollover was applied, if any.
    pub fn last_rollover(&self) -> Result<Option<NaiveDate>, StorageError> {
        Ok(self.store.get(LAST_ROLLOVER_KEY)?.and_then(|raw| {
            let raw = raw.trim();
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .or_else(|_| NaiveDate::parse_from_str(raw, LEGACY_DATE_FORMAT))
                .ok()
        }))
    }

    pub fn set_last_rollover(&self, date: NaiveDate) -> Result<(), StorageError> {
        self.store
            .set(LAST_ROLLOVER_KEY, &date.format(DATE_FORMAT).to_string())
    }
}
