//! Routine schedule: a weekly calendar of tasks.
//!
//! Two-level table: weekday → hour → task. Weekday names are matched
//! case-insensitively; hours are stored verbatim. One task per slot, and a
//! second write to the same slot replaces the first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::task::TaskRecord;
use crate::types::{BrainId, TaskId};

/// Normalise a weekday name for use as a schedule key.
#[must_use]
pub fn normalize_weekday(weekday: &str) -> String {
    weekday.to_lowercase()
}

/// One occupied slot, as yielded by [`RoutineSchedule::entries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSlot {
    /// Lower-cased weekday.
    pub weekday: String,
    /// Hour of the day (conventionally 0–23).
    pub hour: i32,
    /// Scheduled task.
    pub task_id: TaskId,
}

/// Per-brain weekday × hour schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSchedule {
    slots: BTreeMap<String, BTreeMap<i32, TaskId>>,
}

impl RoutineSchedule {
    /// Create an empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `task` into the `(weekday, hour)` slot, replacing whatever was
    /// there. `brain_id` is only recorded in the log.
    pub fn set(&mut self, task: &impl TaskRecord, brain_id: BrainId, weekday: &str, hour: i32) {
        let previous = self.insert(task.id(), weekday, hour);
        info!(
            brain = %brain_id,
            task = %task.id(),
            title = task.title(),
            weekday,
            hour,
            replaced = previous.map(|id| id.0),
            "Routine set"
        );
    }

    /// Look up the `(weekday, hour)` slot. A missing day or hour is `None`.
    #[must_use]
    pub fn get(&self, weekday: &str, hour: i32) -> Option<TaskId> {
        let found = self
            .slots
            .get(&normalize_weekday(weekday))
            .and_then(|hours| hours.get(&hour))
            .copied();
        match found {
            Some(task) => debug!(task = %task, weekday, hour, "Retrieved routine task"),
            None => warn!(weekday, hour, "No task found in routine"),
        }
        found
    }

    /// Raw insert by id, returning the task previously in the slot.
    pub(crate) fn insert(&mut self, task_id: TaskId, weekday: &str, hour: i32) -> Option<TaskId> {
        self.slots
            .entry(normalize_weekday(weekday))
            .or_default()
            .insert(hour, task_id)
    }

    /// Drop every slot that points at `task_id`. Returns how many were cleared.
    pub fn clear_task(&mut self, task_id: TaskId) -> usize {
        let mut cleared = 0;
        for hours in self.slots.values_mut() {
            let before = hours.len();
            hours.retain(|_, id| *id != task_id);
            cleared += before - hours.len();
        }
        self.slots.retain(|_, hours| !hours.is_empty());
        cleared
    }

    /// All occupied slots, ordered by weekday name then hour.
    pub fn entries(&self) -> impl Iterator<Item = RoutineSlot> + '_ {
        self.slots.iter().flat_map(|(weekday, hours)| {
            hours.iter().map(move |(hour, task_id)| RoutineSlot {
                weekday: weekday.clone(),
                hour: *hour,
                task_id: *task_id,
            })
        })
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.values().map(BTreeMap::len).sum()
    }

    /// Whether no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    fn task(id: u64, title: &str) -> Task {
        Task::new(TaskId(id), title, "Incomplete", BrainId(1))
    }

    #[test]
    fn weekday_lookup_is_case_insensitive() {
        let mut schedule = RoutineSchedule::new();
        let t = task(1, "Complete Project");
        schedule.set(&t, BrainId(1), "Monday", 10);

        assert_eq!(schedule.get("monday", 10), Some(TaskId(1)));
        assert_eq!(schedule.get("MONDAY", 10), Some(TaskId(1)));
    }

    #[test]
    fn missing_slot_is_none_not_error() {
        let mut schedule = RoutineSchedule::new();
        schedule.set(&task(1, "Gym"), BrainId(1), "Monday", 10);

        assert_eq!(schedule.get("tuesday", 10), None);
        assert_eq!(schedule.get("monday", 11), None);
        assert_eq!(RoutineSchedule::new().get("sunday", 0), None);
    }

    #[test]
    fn second_set_overwrites_slot() {
        let mut schedule = RoutineSchedule::new();
        schedule.set(&task(1, "Gym"), BrainId(1), "Friday", 7);
        schedule.set(&task(2, "Swim"), BrainId(1), "friday", 7);

        assert_eq!(schedule.get("Friday", 7), Some(TaskId(2)));
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn hours_are_not_range_checked() {
        let mut schedule = RoutineSchedule::new();
        schedule.set(&task(1, "Night shift"), BrainId(1), "Caturday", 42);
        assert_eq!(schedule.get("caturday", 42), Some(TaskId(1)));
    }

    #[test]
    fn clear_task_removes_every_slot() {
        let mut schedule = RoutineSchedule::new();
        let gym = task(1, "Gym");
        schedule.set(&gym, BrainId(1), "Monday", 7);
        schedule.set(&gym, BrainId(1), "Wednesday", 7);
        schedule.set(&task(2, "Read"), BrainId(1), "Wednesday", 21);

        assert_eq!(schedule.clear_task(TaskId(1)), 2);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.get("monday", 7), None);
        let remaining: Vec<_> = schedule.entries().collect();
        assert_eq!(
            remaining,
            vec![RoutineSlot {
                weekday: "wednesday".to_string(),
                hour: 21,
                task_id: TaskId(2),
            }]
        );
    }
}
