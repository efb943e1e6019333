//! Export and import documents.
//!
//! Export writes `{tasks, stats, settings, exportDate, version}`. Import reads
//! the same shape with every group optional. Present groups are resolved in
//! full against the current state before the caller applies anything, so a
//! bad group rejects the whole document.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::RECORD_VERSION;
use crate::error::ImportFormatError;
use crate::settings::Settings;
use crate::state::AppState;
use crate::stats::Statistics;
use crate::task::{Task, MAX_ESTIMATE, MIN_ESTIMATE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub tasks: Vec<Task>,
    pub stats: Statistics,
    pub settings: Settings,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl ExportDocument {
    pub fn capture(state: &AppState, at: DateTime<Utc>) -> Self {
        Self {
            tasks: state.tasks.tasks().to_vec(),
            stats: state.stats.clone(),
            settings: state.settings.clone(),
            export_date: at,
            version: RECORD_VERSION.to_string(),
        }
    }

    /// Suggested download name, e.g. `pomoflow-backup-2024-03-07.json`.
    pub fn file_name(date: NaiveDate) -> String {
        format!("pomoflow-backup-{}.json", date.format("%Y-%m-%d"))
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Groups found in an import document. `None` means the group was absent
/// (or `null`) and the current value stays.
#[derive(Debug, Clone, Default)]
pub struct ImportDocument {
    tasks: Option<Vec<Task>>,
    stats: Option<Map<String, Value>>,
    settings: Option<Map<String, Value>>,
}

/// Fully validated replacement values, ready to apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedImport {
    pub tasks: Option<Vec<Task>>,
    pub stats: Option<Statistics>,
    pub settings: Option<Settings>,
}

impl ResolvedImport {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_none() && self.stats.is_none() && self.settings.is_none()
    }
}

impl ImportDocument {
    pub fn parse(raw: &str) -> Result<Self, ImportFormatError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ImportFormatError::Syntax(e.to_string()))?;
        let Value::Object(mut root) = value else {
            return Err(ImportFormatError::NotAnObject);
        };

        let tasks = match root.remove("tasks") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let tasks: Vec<Task> = decode("tasks", raw)?;
                validate_tasks(&tasks)?;
                Some(tasks)
            }
        };

        Ok(Self {
            tasks,
            stats: group_object("stats", root.remove("stats"))?,
            settings: group_object("settings", root.remove("settings"))?,
        })
    }

    /// Overlay the stats and settings groups on the current values and
    /// validate the result.
    pub fn resolve(
        &self,
        current_stats: &Statistics,
        current_settings: &Settings,
    ) -> Result<ResolvedImport, ImportFormatError> {
        let stats = match &self.stats {
            None => None,
            Some(overlay) => {
                let mut merged: Statistics = decode("stats", overlaid("stats", current_stats, overlay)?)?;
                merged.last_rollover_date = current_stats.last_rollover_date;
                Some(merged)
            }
        };

        let settings = match &self.settings {
            None => None,
            Some(overlay) => {
                let merged: Settings =
                    decode("settings", overlaid("settings", current_settings, overlay)?)?;
                merged
                    .validate()
                    .map_err(|e| invalid_group("settings", e.to_string()))?;
                Some(merged)
            }
        };

        Ok(ResolvedImport {
            tasks: self.tasks.clone(),
            stats,
            settings,
        })
    }
}

fn group_object(
    group: &'static str,
    value: Option<Value>,
) -> Result<Option<Map<String, Value>>, ImportFormatError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(invalid_group(group, "expected an object".into())),
    }
}

fn overlaid<T: Serialize>(
    group: &'static str,
    current: &T,
    overlay: &Map<String, Value>,
) -> Result<Value, ImportFormatError> {
    let mut base = serde_json::to_value(current).map_err(|e| invalid_group(group, e.to_string()))?;
    if let Value::Object(obj) = &mut base {
        for (key, value) in overlay {
            obj.insert(key.clone(), value.clone());
        }
    }
    Ok(base)
}

fn decode<T: DeserializeOwned>(group: &'static str, value: Value) -> Result<T, ImportFormatError> {
    serde_json::from_value(value).map_err(|e| invalid_group(group, e.to_string()))
}

fn validate_tasks(tasks: &[Task]) -> Result<(), ImportFormatError> {
    let mut seen = HashSet::new();
    for task in tasks {
        if task.id.trim().is_empty() {
            return Err(invalid_group("tasks", "task with empty id".into()));
        }
        if !seen.insert(task.id.as_str()) {
            return Err(invalid_group("tasks", format!("duplicate task id '{}'", task.id)));
        }
        if task.title.trim().is_empty() {
            return Err(invalid_group("tasks", format!("task '{}' has an empty title", task.id)));
        }
        if !(MIN_ESTIMATE..=MAX_ESTIMATE).contains(&task.estimated_pomodoros) {
            return Err(invalid_group(
                "tasks",
                format!(
                    "task '{}' estimate {} outside {MIN_ESTIMATE}..={MAX_ESTIMATE}",
                    task.id, task.estimated_pomodoros
                ),
            ));
        }
    }
    Ok(())
}

fn invalid_group(group: &'static str, message: String) -> ImportFormatError {
    ImportFormatError::InvalidGroup { group, message }
}
