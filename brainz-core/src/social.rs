//! Friendships and pairwise interaction scoring.
//!
//! Friendship is symmetric and irreflexive. The [`FriendshipGraph`] keeps an
//! adjacency set per brain and only exposes mutators that touch both ends of
//! an edge, so a one-sided friendship can never be observed.
//!
//! Interaction scoring is a plain function of two feature lists:
//! `score = weight × |shared features|`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::brain::Brain;
use crate::error::{BrainzError, Result};
use crate::types::BrainId;

/// Points per shared feature unless configured otherwise.
pub const DEFAULT_COMPATIBILITY_WEIGHT: u32 = 10;

/// Symmetric adjacency structure keyed by brain id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipGraph {
    edges: HashMap<BrainId, BTreeSet<BrainId>>,
}

impl FriendshipGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `a` and `b` are friends.
    #[must_use]
    pub fn are_friends(&self, a: BrainId, b: BrainId) -> bool {
        self.edges.get(&a).is_some_and(|friends| friends.contains(&b))
    }

    /// Link `a` and `b`. Returns `false` if they already were friends.
    ///
    /// # Errors
    /// Returns [`BrainzError::SelfFriendship`] when `a == b`.
    pub fn befriend(&mut self, a: BrainId, b: BrainId) -> Result<bool> {
        if a == b {
            return Err(BrainzError::SelfFriendship(a));
        }
        if self.are_friends(a, b) {
            return Ok(false);
        }
        self.edges.entry(a).or_default().insert(b);
        self.edges.entry(b).or_default().insert(a);
        Ok(true)
    }

    /// Unlink `a` and `b`. Returns `false` if they were not friends.
    pub fn unfriend(&mut self, a: BrainId, b: BrainId) -> bool {
        if !self.are_friends(a, b) {
            return false;
        }
        self.detach(a, b);
        self.detach(b, a);
        true
    }

    fn detach(&mut self, from: BrainId, to: BrainId) {
        if let Some(friends) = self.edges.get_mut(&from) {
            friends.remove(&to);
            if friends.is_empty() {
                self.edges.remove(&from);
            }
        }
    }

    /// Remove every edge touching `id`. Returns the former friends.
    pub fn remove_brain(&mut self, id: BrainId) -> BTreeSet<BrainId> {
        let friends = self.edges.remove(&id).unwrap_or_default();
        for friend in &friends {
            self.detach(*friend, id);
        }
        friends
    }

    /// Friends of `id`, in ascending id order.
    #[must_use]
    pub fn friends_of(&self, id: BrainId) -> Vec<BrainId> {
        self.edges
            .get(&id)
            .map(|friends| friends.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every friendship once, as `(lower, higher)` id pairs, sorted.
    #[must_use]
    pub fn pairs(&self) -> Vec<(BrainId, BrainId)> {
        let mut pairs: Vec<_> = self
            .edges
            .iter()
            .flat_map(|(a, friends)| {
                friends
                    .iter()
                    .filter(move |b| a < *b)
                    .map(move |b| (*a, *b))
            })
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Number of distinct friendships.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Whether the graph has no friendships.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Outcome of two brains interacting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionReport {
    /// Distinct features both brains have, sorted.
    pub shared_features: Vec<String>,
    /// `weight × shared_features.len()`.
    pub compatibility_score: u32,
    /// Whether the two brains are currently friends.
    pub friendship_status: bool,
}

/// Score an interaction between `a` and `b`. Pure; mutates nothing.
#[must_use]
pub fn simulate_interaction(
    a: &Brain,
    b: &Brain,
    graph: &FriendshipGraph,
    weight: u32,
) -> InteractionReport {
    let shared_features: Vec<String> = a.shared_features(b).into_iter().collect();
    let shared = u32::try_from(shared_features.len()).unwrap_or(u32::MAX);
    let compatibility_score = shared.saturating_mul(weight);
    let friendship_status = graph.are_friends(a.id(), b.id());
    info!(
        brain = %a.id(),
        other = %b.id(),
        shared = shared_features.len(),
        compatibility_score,
        "Simulated interaction"
    );
    debug!(features = ?shared_features, friendship_status, "Interaction detail");
    InteractionReport {
        shared_features,
        compatibility_score,
        friendship_status,
    }
}
