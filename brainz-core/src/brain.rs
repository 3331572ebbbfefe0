//! The `Brain` aggregate, one simulated individual.
//!
//! A brain owns its attribute collections (features, memories, emotions,
//! personality traits, groups, favourite songs), its task list, and its
//! [`RoutineSchedule`]. Friendships are not stored here; they live in the
//! [`FriendshipGraph`](crate::social::FriendshipGraph) so that both sides of
//! an edge are always updated together.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

use crate::error::{BrainzError, Result};
use crate::routine::RoutineSchedule;
use crate::task::{Task, TaskRecord, TaskStatus};
use crate::types::{BrainId, IdSource, TaskId};

/// Which attribute collection a dynamic write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Feature tags (list input).
    Features,
    /// Memories (single item).
    Memories,
    /// Emotions (single item).
    Emotions,
    /// Personality traits (single item).
    Personality,
    /// Group memberships (single item).
    Groups,
    /// Favourite songs (list input).
    FavSongs,
}

impl Attribute {
    /// Whether writes to this attribute take a whole list at once.
    #[must_use]
    pub fn takes_list(self) -> bool {
        matches!(self, Self::Features | Self::FavSongs)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Features => "features",
            Self::Memories => "memories",
            Self::Emotions => "emotions",
            Self::Personality => "personality",
            Self::Groups => "groups",
            Self::FavSongs => "fav_songs",
        };
        f.write_str(name)
    }
}

/// A simulated individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brain {
    pub(crate) id: BrainId,
    pub(crate) features: Vec<String>,
    pub(crate) memories: Vec<String>,
    pub(crate) emotions: Vec<String>,
    pub(crate) personality: Vec<String>,
    pub(crate) groups: Vec<String>,
    pub(crate) fav_songs: Vec<String>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) routine: RoutineSchedule,
}

impl Brain {
    /// Create an empty brain with a known id.
    #[must_use]
    pub fn new(id: BrainId) -> Self {
        Self {
            id,
            features: Vec::new(),
            memories: Vec::new(),
            emotions: Vec::new(),
            personality: Vec::new(),
            groups: Vec::new(),
            fav_songs: Vec::new(),
            tasks: Vec::new(),
            routine: RoutineSchedule::new(),
        }
    }

    /// Create an empty brain, drawing its id from `ids`.
    pub fn create(ids: &mut impl IdSource) -> Self {
        let brain = Self::new(BrainId(ids.next_id()));
        info!(brain = %brain.id, "Brain created");
        brain
    }

    /// This brain's id.
    #[must_use]
    pub fn id(&self) -> BrainId {
        self.id
    }

    // ------------------------------------------------------------------
    // Features
    // ------------------------------------------------------------------

    /// Feature tags in insertion order.
    #[must_use]
    pub fn get_features(&self) -> &[String] {
        debug!(brain = %self.id, count = self.features.len(), "Getting features");
        &self.features
    }

    /// Append every item to the feature list. Duplicates are kept.
    pub fn set_features<I, S>(&mut self, features: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.features.len();
        self.features.extend(features.into_iter().map(Into::into));
        info!(brain = %self.id, added = ?&self.features[before..], "Features added");
    }

    /// Distinct features this brain has in common with `other`.
    #[must_use]
    pub fn shared_features(&self, other: &Brain) -> BTreeSet<String> {
        let mine: BTreeSet<&String> = self.features.iter().collect();
        other
            .features
            .iter()
            .filter(|f| mine.contains(f))
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Memories
    // ------------------------------------------------------------------

    /// Memories in insertion order.
    #[must_use]
    pub fn get_memories(&self) -> &[String] {
        debug!(brain = %self.id, count = self.memories.len(), "Getting memories");
        &self.memories
    }

    /// Append one memory.
    pub fn add_memory(&mut self, memory: impl Into<String>) {
        let memory = memory.into();
        info!(brain = %self.id, memory = %memory, "Memory added");
        self.memories.push(memory);
    }

    /// Replace the memory at `index`.
    ///
    /// # Errors
    /// Returns [`BrainzError::IndexOutOfRange`] unless `index < len`.
    pub fn update_memory(&mut self, index: usize, memory: impl Into<String>) -> Result<()> {
        let len = self.memories.len();
        let slot = self
            .memories
            .get_mut(index)
            .ok_or(BrainzError::IndexOutOfRange { index, len })?;
        *slot = memory.into();
        info!(brain = %self.id, index, memory = %slot, "Memory updated");
        Ok(())
    }

    /// Remove and return the memory at `index`.
    ///
    /// # Errors
    /// Returns [`BrainzError::IndexOutOfRange`] unless `index < len`.
    pub fn delete_memory(&mut self, index: usize) -> Result<String> {
        let len = self.memories.len();
        if index >= len {
            return Err(BrainzError::IndexOutOfRange { index, len });
        }
        let removed = self.memories.remove(index);
        info!(brain = %self.id, index, "Memory deleted");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Emotions & personality
    // ------------------------------------------------------------------

    /// Emotions in insertion order.
    #[must_use]
    pub fn get_emotions(&self) -> &[String] {
        debug!(brain = %self.id, count = self.emotions.len(), "Getting emotions");
        &self.emotions
    }

    /// Append one emotion.
    pub fn add_emotion(&mut self, emotion: impl Into<String>) {
        let emotion = emotion.into();
        info!(brain = %self.id, emotion = %emotion, "Emotion added");
        self.emotions.push(emotion);
    }

    /// Personality traits in insertion order.
    #[must_use]
    pub fn get_personality(&self) -> &[String] {
        debug!(brain = %self.id, count = self.personality.len(), "Getting personality");
        &self.personality
    }

    /// Append one personality trait.
    pub fn add_personality(&mut self, trait_name: impl Into<String>) {
        let trait_name = trait_name.into();
        info!(brain = %self.id, personality = %trait_name, "Personality trait added");
        self.personality.push(trait_name);
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Group memberships in join order. A group joined twice appears twice.
    #[must_use]
    pub fn get_groups(&self) -> &[String] {
        debug!(brain = %self.id, count = self.groups.len(), "Getting groups");
        &self.groups
    }

    /// Join a group.
    pub fn join_group(&mut self, group: impl Into<String>) {
        let group = group.into();
        info!(brain = %self.id, group = %group, "Joined group");
        self.groups.push(group);
    }

    /// Leave a group: removes the first matching membership, if any.
    /// Returns whether a membership was removed.
    pub fn leave_group(&mut self, group: &str) -> bool {
        let Some(pos) = self.groups.iter().position(|g| g == group) else {
            return false;
        };
        self.groups.remove(pos);
        info!(brain = %self.id, group, "Left group");
        true
    }

    // ------------------------------------------------------------------
    // Favourite songs
    // ------------------------------------------------------------------

    /// Favourite songs in the order they were first added.
    #[must_use]
    pub fn get_fav_songs(&self) -> &[String] {
        debug!(brain = %self.id, count = self.fav_songs.len(), "Getting favorite songs");
        &self.fav_songs
    }

    /// Add songs to the favourites. A song already present is skipped.
    pub fn set_fav_songs<I, S>(&mut self, songs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.fav_songs.len();
        for song in songs {
            let song = song.into();
            if !self.fav_songs.contains(&song) {
                self.fav_songs.push(song);
            }
        }
        info!(brain = %self.id, added = ?&self.fav_songs[before..], "Favorite songs added");
    }

    // ------------------------------------------------------------------
    // Dynamic input
    // ------------------------------------------------------------------

    /// Write untyped input (e.g. from a JSON seed file) into a collection.
    ///
    /// List attributes ([`Attribute::takes_list`]) need an array of strings
    /// and append all of it; the others need a single string.
    ///
    /// # Errors
    /// Returns [`BrainzError::InvalidType`] when `value` has the wrong shape.
    /// Nothing is written in that case.
    pub fn extend_from_value(&mut self, attribute: Attribute, value: &Value) -> Result<()> {
        if attribute.takes_list() {
            let items = string_list(value).ok_or_else(|| BrainzError::InvalidType {
                attribute: attribute.to_string(),
                expected: "an array of strings",
            })?;
            match attribute {
                Attribute::Features => self.set_features(items),
                _ => self.set_fav_songs(items),
            }
            return Ok(());
        }

        let item = value.as_str().ok_or_else(|| BrainzError::InvalidType {
            attribute: attribute.to_string(),
            expected: "a string",
        })?;
        match attribute {
            Attribute::Memories => self.add_memory(item),
            Attribute::Emotions => self.add_emotion(item),
            Attribute::Personality => self.add_personality(item),
            _ => self.join_group(item),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Append a task to this brain's list. The task's owner id is not checked.
    pub fn add_task(&mut self, task: Task) {
        info!(brain = %self.id, task = %task.id(), title = task.title(), "Task added");
        self.tasks.push(task);
    }

    /// Tasks in the order they were added.
    #[must_use]
    pub fn get_tasks(&self) -> &[Task] {
        debug!(brain = %self.id, count = self.tasks.len(), "Getting tasks");
        &self.tasks
    }

    /// Find an owned task by id.
    #[must_use]
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == task_id)
    }

    /// Find an owned task by id for mutation.
    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id() == task_id)
    }

    /// Update the status of an owned task.
    ///
    /// # Errors
    /// Returns [`BrainzError::TaskNotFound`] if the task is not on this brain.
    pub fn set_task_status(&mut self, task_id: TaskId, status: impl Into<TaskStatus>) -> Result<()> {
        self.task_mut(task_id)
            .ok_or(BrainzError::TaskNotFound(task_id))?
            .set_status(status);
        Ok(())
    }

    /// Remove a task, also clearing any routine slots that referenced it.
    pub fn remove_task(&mut self, task_id: TaskId) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id() == task_id)?;
        let task = self.tasks.remove(pos);
        let cleared = self.routine.clear_task(task_id);
        info!(brain = %self.id, task = %task_id, cleared_slots = cleared, "Task removed");
        Some(task)
    }

    // ------------------------------------------------------------------
    // Routine
    // ------------------------------------------------------------------

    /// This brain's weekly schedule.
    #[must_use]
    pub fn routine(&self) -> &RoutineSchedule {
        &self.routine
    }

    /// Schedule an owned task at `(weekday, hour)`, replacing the slot.
    ///
    /// # Errors
    /// Returns [`BrainzError::TaskNotFound`] if the task is not on this brain.
    pub fn set_routine(&mut self, task_id: TaskId, weekday: &str, hour: i32) -> Result<()> {
        let task = self
            .tasks
            .iter()
            .find(|t| t.id() == task_id)
            .ok_or(BrainzError::TaskNotFound(task_id))?;
        self.routine.set(task, self.id, weekday, hour);
        Ok(())
    }

    /// The task scheduled at `(weekday, hour)`, if any.
    #[must_use]
    pub fn routine_task(&self, weekday: &str, hour: i32) -> Option<&Task> {
        self.routine
            .get(weekday, hour)
            .and_then(|task_id| self.task(task_id))
    }
}

fn string_list(value: &Value) -> Option<Vec<&str>> {
    value
        .as_array()?
        .iter()
        .map(Value::as_str)
        .collect::<Option<Vec<_>>>()
}
