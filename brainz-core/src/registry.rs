//! The brain registry. Owns every brain, the friendship graph, and the id
//! sources.
//!
//! Brains refer to each other only by [`BrainId`]; the registry resolves ids
//! and performs two-sided friendship updates as one operation. For callers on
//! several threads, [`SharedRegistry`] wraps the registry in a lock so each
//! friendship change is a single critical section.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::brain::Brain;
use crate::config::SocialConfig;
use crate::error::{BrainzError, Result};
use crate::social::{self, FriendshipGraph, InteractionReport};
use crate::task::{Task, TaskRecord, TaskStatus};
use crate::types::{BrainId, SequentialIds, TaskId};

/// Registry of brains and their friendships.
#[derive(Debug, Clone, Default)]
pub struct BrainRegistry {
    brains: BTreeMap<BrainId, Brain>,
    friendships: FriendshipGraph,
    brain_ids: SequentialIds,
    task_ids: SequentialIds,
    config: SocialConfig,
}

impl BrainRegistry {
    /// Create an empty registry with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with the given social settings.
    #[must_use]
    pub fn with_config(config: SocialConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Rebuild a registry from stored brains and friendship pairs.
    ///
    /// Id sources are seeded past the highest brain and task ids seen.
    /// Pairs naming a brain that is not in `brains` are skipped.
    ///
    /// # Errors
    /// Returns [`BrainzError::SelfFriendship`] if a pair links a brain to itself.
    pub fn restore(
        config: SocialConfig,
        brains: impl IntoIterator<Item = Brain>,
        pairs: impl IntoIterator<Item = (BrainId, BrainId)>,
    ) -> Result<Self> {
        let brains: BTreeMap<BrainId, Brain> = brains.into_iter().map(|b| (b.id(), b)).collect();
        let max_brain = brains.keys().next_back().map_or(0, |id| id.0);
        let max_task = brains
            .values()
            .flat_map(|b| b.get_tasks().iter().map(|t| t.id().0))
            .max()
            .unwrap_or(0);

        let mut friendships = FriendshipGraph::new();
        for (a, b) in pairs {
            if brains.contains_key(&a) && brains.contains_key(&b) {
                friendships.befriend(a, b)?;
            } else {
                debug!(brain = %a, other = %b, "Skipping friendship with unknown brain");
            }
        }

        info!(
            brains = brains.len(),
            friendships = friendships.len(),
            "Registry restored"
        );
        Ok(Self {
            brains,
            friendships,
            brain_ids: SequentialIds::starting_at(max_brain + 1),
            task_ids: SequentialIds::starting_at(max_task + 1),
            config,
        })
    }

    /// Make sure future brain and task ids start no lower than the given
    /// floors. Storage uses this to skip ids of rows that were deleted.
    pub fn reserve_ids(&mut self, next_brain: u64, next_task: u64) {
        self.brain_ids.advance_to(next_brain);
        self.task_ids.advance_to(next_task);
        debug!(
            next_brain = self.brain_ids.peek(),
            next_task = self.task_ids.peek(),
            "Id sources reserved"
        );
    }

    // ------------------------------------------------------------------
    // Brains
    // ------------------------------------------------------------------

    /// Create a new, empty brain and return its id.
    pub fn spawn_brain(&mut self) -> BrainId {
        let brain = Brain::create(&mut self.brain_ids);
        let id = brain.id();
        self.brains.insert(id, brain);
        id
    }

    /// Look up a brain.
    #[must_use]
    pub fn brain(&self, id: BrainId) -> Option<&Brain> {
        self.brains.get(&id)
    }

    /// Look up a brain for mutation.
    pub fn brain_mut(&mut self, id: BrainId) -> Option<&mut Brain> {
        self.brains.get_mut(&id)
    }

    fn require(&self, id: BrainId) -> Result<&Brain> {
        self.brains.get(&id).ok_or(BrainzError::BrainNotFound(id))
    }

    /// All brains in ascending id order.
    pub fn brains(&self) -> impl Iterator<Item = &Brain> {
        self.brains.values()
    }

    /// Number of brains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.brains.len()
    }

    /// Whether the registry holds no brains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.brains.is_empty()
    }

    /// Remove a brain and every friendship it had.
    pub fn remove_brain(&mut self, id: BrainId) -> Option<Brain> {
        let brain = self.brains.remove(&id)?;
        let former = self.friendships.remove_brain(id);
        info!(brain = %id, dropped_friendships = former.len(), "Brain removed");
        Some(brain)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Create a task owned by `owner`, add it to the owner's list, and return its id.
    ///
    /// # Errors
    /// Returns [`BrainzError::BrainNotFound`] if `owner` is unknown.
    pub fn assign_task(
        &mut self,
        owner: BrainId,
        title: impl Into<String>,
        status: impl Into<TaskStatus>,
    ) -> Result<TaskId> {
        let brain = self
            .brains
            .get_mut(&owner)
            .ok_or(BrainzError::BrainNotFound(owner))?;
        let task = Task::create(&mut self.task_ids, title, status, owner);
        let id = task.id();
        brain.add_task(task);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Friendship
    // ------------------------------------------------------------------

    /// Whether `a` and `b` are friends.
    #[must_use]
    pub fn is_friends_with(&self, a: BrainId, b: BrainId) -> bool {
        let friends = self.friendships.are_friends(a, b);
        debug!(brain = %a, other = %b, friends, "Checking friendship");
        friends
    }

    /// Make (`status == true`) or break (`false`) the friendship between `a`
    /// and `b`. Both sides change together; repeating a call is a no-op.
    /// Returns whether anything changed.
    ///
    /// # Errors
    /// Returns [`BrainzError::BrainNotFound`] for an unknown id and
    /// [`BrainzError::SelfFriendship`] when `a == b`.
    pub fn be_friends_with(&mut self, a: BrainId, b: BrainId, status: bool) -> Result<bool> {
        self.require(a)?;
        self.require(b)?;
        if a == b {
            return Err(BrainzError::SelfFriendship(a));
        }
        let changed = if status {
            self.friendships.befriend(a, b)?
        } else {
            self.friendships.unfriend(a, b)
        };
        if changed {
            if status {
                info!(brain = %a, other = %b, "Made friends");
            } else {
                info!(brain = %a, other = %b, "Broke friendship");
            }
        }
        Ok(changed)
    }

    /// Friends of `id`, in ascending id order.
    #[must_use]
    pub fn friends_of(&self, id: BrainId) -> Vec<BrainId> {
        self.friendships.friends_of(id)
    }

    /// The underlying friendship graph.
    #[must_use]
    pub fn friendships(&self) -> &FriendshipGraph {
        &self.friendships
    }

    /// Score an interaction between `a` and `b` using the configured weight.
    ///
    /// # Errors
    /// Returns [`BrainzError::BrainNotFound`] for an unknown id.
    pub fn simulate_interaction(&self, a: BrainId, b: BrainId) -> Result<InteractionReport> {
        let first = self.require(a)?;
        let second = self.require(b)?;
        Ok(social::simulate_interaction(
            first,
            second,
            &self.friendships,
            self.config.compatibility_weight,
        ))
    }

    /// Social settings in effect.
    #[must_use]
    pub fn config(&self) -> &SocialConfig {
        &self.config
    }
}

/// A [`BrainRegistry`] shared across threads.
///
/// Every method takes the lock once, so a friendship change is never seen
/// half-applied.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<BrainRegistry>>,
}

impl SharedRegistry {
    /// Wrap a registry for shared use.
    #[must_use]
    pub fn new(registry: BrainRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// See [`BrainRegistry::spawn_brain`].
    #[must_use]
    pub fn spawn_brain(&self) -> BrainId {
        self.inner.write().spawn_brain()
    }

    /// See [`BrainRegistry::be_friends_with`].
    ///
    /// # Errors
    /// Same as [`BrainRegistry::be_friends_with`].
    pub fn be_friends_with(&self, a: BrainId, b: BrainId, status: bool) -> Result<bool> {
        self.inner.write().be_friends_with(a, b, status)
    }

    /// See [`BrainRegistry::is_friends_with`].
    #[must_use]
    pub fn is_friends_with(&self, a: BrainId, b: BrainId) -> bool {
        self.inner.read().is_friends_with(a, b)
    }

    /// See [`BrainRegistry::simulate_interaction`].
    ///
    /// # Errors
    /// Same as [`BrainRegistry::simulate_interaction`].
    pub fn simulate_interaction(&self, a: BrainId, b: BrainId) -> Result<InteractionReport> {
        self.inner.read().simulate_interaction(a, b)
    }

    /// Run `f` with shared read access.
    pub fn read<R>(&self, f: impl FnOnce(&BrainRegistry) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access; use this to batch several mutations.
    pub fn write<R>(&self, f: impl FnOnce(&mut BrainRegistry) -> R) -> R {
        f(&mut self.inner.write())
    }
}
