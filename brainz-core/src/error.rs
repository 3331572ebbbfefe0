//! Error types for the brainz core library.

use thiserror::Error;

use crate::types::{BrainId, TaskId};

/// Top-level error type for all brainz operations.
#[derive(Error, Debug)]
pub enum BrainzError {
    /// A collection-accepting operation received a value of the wrong shape.
    #[error("Invalid type for {attribute}: expected {expected}")]
    InvalidType {
        /// Which attribute or payload was being written.
        attribute: String,
        /// What shape was expected instead.
        expected: &'static str,
    },

    /// An index-addressed operation was given an index outside `0..len`.
    #[error("Index out of range: {index} (len: {len})")]
    IndexOutOfRange {
        /// The index that was requested.
        index: usize,
        /// The collection length at the time of the call.
        len: usize,
    },

    /// A brain was asked to befriend itself.
    #[error("Brain {0} cannot be friends with itself")]
    SelfFriendship(BrainId),

    /// Brain not present in the registry or store.
    #[error("Brain not found: {0}")]
    BrainNotFound(BrainId),

    /// Task not owned by the brain, or not present in the store.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, BrainzError>;
