//! Task registry.
//!
//! Tasks are kept most-recent-first. The session refers to a task only by id;
//! the registry never reaches back into the session, so every operation that
//! affects the active task or the `tasksCompleted` statistic reports what
//! happened and leaves the bookkeeping to the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const MIN_ESTIMATE: u32 = 1;
pub const MAX_ESTIMATE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: String,
    pub title: String,
    #[serde(default = "default_estimate")]
    pub estimated_pomodoros: u32,
    #[serde(default)]
    pub completed_pomodoros: u32,
    /// Sticky until the user toggles it back.
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_worked_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_estimate() -> u32 {
    MIN_ESTIMATE
}

/// Progress credited to a task by a finished work session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub task_id: String,
    pub title: String,
    pub completed_pomodoros: u32,
    pub estimated_pomodoros: u32,
    /// The estimate was reached by this credit.
    pub just_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// First task in list order that is not completed.
    pub fn first_incomplete(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| !t.completed)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Create a task at the front of the list.
    pub fn add(
        &mut self,
        title: &str,
        estimate: u32,
        at: DateTime<Utc>,
    ) -> Result<&Task, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if !(MIN_ESTIMATE..=MAX_ESTIMATE).contains(&estimate) {
            return Err(ValidationError::EstimateOutOfRange {
                value: estimate,
                min: MIN_ESTIMATE,
                max: MAX_ESTIMATE,
            });
        }
        self.tasks.insert(
            0,
            Task {
                id: Uuid::new_v4().to_string(),
                title: title.to_string(),
                estimated_pomodoros: estimate,
                completed_pomodoros: 0,
                completed: false,
                created_at: at,
                last_worked_on: None,
                completed_at: None,
            },
        );
        Ok(&self.tasks[0])
    }

    /// Flip completion. Returns the new `completed` value.
    pub fn toggle(&mut self, id: &str, at: DateTime<Utc>) -> Result<bool, ValidationError> {
        let task = self.get_mut(id)?;
        task.completed = !task.completed;
        task.completed_at = task.completed.then_some(at);
        Ok(task.completed)
    }

    pub fn delete(&mut self, id: &str) -> Result<Task, ValidationError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))?;
        Ok(self.tasks.remove(idx))
    }

    /// Rename a task. A blank title leaves it untouched and returns `false`.
    pub fn edit(&mut self, id: &str, new_title: &str) -> Result<bool, ValidationError> {
        let task = self.get_mut(id)?;
        let title = new_title.trim();
        if title.is_empty() || title == task.title {
            return Ok(false);
        }
        task.title = title.to_string();
        Ok(true)
    }

    /// Remove completed tasks, returning their ids.
    pub fn clear_completed(&mut self) -> Vec<String> {
        let (done, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|t| t.completed);
        self.tasks = keep;
        done.into_iter().map(|t| t.id).collect()
    }

    /// Remove every task, returning how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    /// Credit one finished work session to `id`.
    ///
    /// Completed tasks are not credited further; a missing task yields `None`.
    pub fn credit_pomodoro(&mut self, id: &str, at: DateTime<Utc>) -> Option<Credit> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        if task.completed {
            return None;
        }
        task.completed_pomodoros = task.completed_pomodoros.saturating_add(1);
        task.last_worked_on = Some(at);
        let just_completed = task.completed_pomodoros >= task.estimated_pomodoros;
        if just_completed {
            task.completed = true;
            task.completed_at = Some(at);
        }
        Some(Credit {
            task_id: task.id.clone(),
            title: task.title.clone(),
            completed_pomodoros: task.completed_pomodoros,
            estimated_pomodoros: task.estimated_pomodoros,
            just_completed,
        })
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task, ValidationError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTask(id.to_string()))
    }
}
