//! Core type definitions for the brainz model.
//!
//! Identifiers are plain integers handed out by an injected [`IdSource`],
//! so tests and storage layers can decide how ids are assigned.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a brain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrainId(pub u64);

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for BrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Id allocation
// ---------------------------------------------------------------------------

/// A source of fresh identifiers.
///
/// Implementations must never hand out the same value twice.
pub trait IdSource {
    /// Allocate the next identifier.
    fn next_id(&mut self) -> u64;
}

/// Monotonic counter starting at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    /// Create a counter whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Create a counter whose first id is `first`.
    ///
    /// Used when rebuilding state from storage: seed with `max_stored + 1`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self { next: first.max(1) }
    }

    /// Move the counter forward so the next id is at least `floor`.
    /// Never moves it back.
    pub fn advance_to(&mut self, floor: u64) {
        self.next = self.next.max(floor);
    }

    /// The id the next call to [`IdSource::next_id`] will return.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_are_monotonic() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn starting_at_zero_is_clamped() {
        let mut ids = SequentialIds::starting_at(0);
        assert_eq!(ids.next_id(), 1);

        let mut seeded = SequentialIds::starting_at(42);
        assert_eq!(seeded.next_id(), 42);
    }

    #[test]
    fn advance_to_only_moves_forward() {
        let mut ids = SequentialIds::starting_at(10);
        ids.advance_to(4);
        assert_eq!(ids.peek(), 10);
        ids.advance_to(25);
        assert_eq!(ids.next_id(), 25);
    }
}
