//! Tasks: units of work owned by exactly one brain.
//!
//! A task's id and owner are fixed at creation; only the status changes.
//! Anything exposing the [`TaskRecord`] accessors can be placed into a
//! routine schedule.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::info;

use crate::types::{BrainId, IdSource, TaskId};

/// Task status.
///
/// The set is open: the three conventional states get their own variants and
/// anything else is kept verbatim in [`TaskStatus::Other`]. Parsing and
/// display round-trip, so storage only ever sees the display string.
/// Equality and hashing go by that string, so `Other("Completed")` equals
/// `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Not started.
    Incomplete,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
    /// Any other caller-defined status.
    Other(String),
}

impl TaskStatus {
    /// The canonical text for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Incomplete => "Incomplete",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Other(s) => s,
        }
    }
}

impl PartialEq for TaskStatus {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for TaskStatus {}

impl Hash for TaskStatus {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s {
            "Incomplete" => Self::Incomplete,
            "In Progress" => Self::InProgress,
            "Completed" => Self::Completed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access shared by everything that behaves like a task.
pub trait TaskRecord {
    /// The task's identifier.
    fn id(&self) -> TaskId;
    /// Human-readable title.
    fn title(&self) -> &str;
    /// Current status.
    fn status(&self) -> &TaskStatus;
    /// The brain that owns the task.
    fn brain_id(&self) -> BrainId;
}

/// A unit of work owned by one brain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    status: TaskStatus,
    brain_id: BrainId,
}

impl Task {
    /// Build a task with an id that was allocated elsewhere (e.g. by storage).
    #[must_use]
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        status: impl Into<TaskStatus>,
        brain_id: BrainId,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            status: status.into(),
            brain_id,
        }
    }

    /// Create a task, drawing its id from `ids`.
    pub fn create(
        ids: &mut impl IdSource,
        title: impl Into<String>,
        status: impl Into<TaskStatus>,
        brain_id: BrainId,
    ) -> Self {
        let task = Self::new(TaskId(ids.next_id()), title, status, brain_id);
        info!(
            task = %task.id,
            brain = %brain_id,
            title = %task.title,
            status = %task.status,
            "Task created"
        );
        task
    }

    /// Current status.
    #[must_use]
    pub fn get_status(&self) -> &TaskStatus {
        &self.status
    }

    /// Title.
    #[must_use]
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Owning brain.
    #[must_use]
    pub fn get_brain_id(&self) -> BrainId {
        self.brain_id
    }

    /// Overwrite the status. No transition rules apply.
    pub fn set_status(&mut self, new_status: impl Into<TaskStatus>) {
        self.status = new_status.into();
        info!(task = %self.id, status = %self.status, "Task status updated");
    }
}

impl TaskRecord for Task {
    fn id(&self) -> TaskId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &TaskStatus {
        &self.status
    }

    fn brain_id(&self) -> BrainId {
        self.brain_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SequentialIds;

    #[test]
    fn create_assigns_monotonic_ids() {
        let mut ids = SequentialIds::new();
        let a = Task::create(&mut ids, "Complete Project", "Incomplete", BrainId(1));
        let b = Task::create(&mut ids, "Write report", "Incomplete", BrainId(1));
        assert_eq!(a.id(), TaskId(1));
        assert_eq!(b.id(), TaskId(2));
        assert_eq!(a.get_title(), "Complete Project");
        assert_eq!(a.get_brain_id(), BrainId(1));
    }

    #[test]
    fn set_status_accepts_any_string() {
        let mut task = Task::new(TaskId(7), "Dishes", TaskStatus::Incomplete, BrainId(2));
        task.set_status("In Progress");
        assert_eq!(task.get_status(), &TaskStatus::InProgress);

        task.set_status("Blocked on groceries");
        assert_eq!(
            task.get_status(),
            &TaskStatus::Other("Blocked on groceries".to_string())
        );
        assert_eq!(task.get_status().to_string(), "Blocked on groceries");
    }

    #[test]
    fn other_with_known_text_equals_named_variant() {
        let spelled = TaskStatus::Other("Completed".to_string());
        assert_eq!(spelled, TaskStatus::Completed);
        assert_ne!(spelled, TaskStatus::Incomplete);

        let set: std::collections::HashSet<_> =
            [spelled, TaskStatus::Completed].into_iter().collect();
        assert_eq!(set.len(), 1);

        let a = Task::new(TaskId(1), "t", TaskStatus::Other("In Progress".into()), BrainId(1));
        let b = Task::new(TaskId(1), "t", TaskStatus::InProgress, BrainId(1));
        assert_eq!(a, b);
    }

    #[test]
    fn status_serializes_as_plain_string() {
        let json = serde_json::to_string(&TaskStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"In Progress\"");
        let back: TaskStatus = serde_json::from_str("\"Completed\"").expect("deserialize");
        assert_eq!(back, TaskStatus::Completed);
    }
}
