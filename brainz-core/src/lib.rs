//! # brainz core library
//!
//! In-memory model for a small social simulation. Every individual is a
//! [`Brain`] carrying:
//!
//! - **Features**: tags used to score compatibility with other brains
//! - **Memories**, **emotions**, **personality traits**: ordered text lists
//! - **Groups** and **favourite songs**
//! - **Tasks**: units of work it owns, with a free-form status
//! - **Routine**: a weekday × hour schedule of its tasks
//!
//! Friendship is a symmetric, irreflexive relation kept by the
//! [`BrainRegistry`] as an adjacency structure keyed by [`BrainId`], so the
//! two sides of an edge always change together. Storage is a separate
//! adapter ([`persistence::PersistenceEngine`]) that the model never calls.
//!
//! ```
//! use brainz_core::BrainRegistry;
//!
//! let mut registry = BrainRegistry::new();
//! let a = registry.spawn_brain();
//! let b = registry.spawn_brain();
//! registry.brain_mut(a).expect("a").set_features(["music", "sports", "art"]);
//! registry.brain_mut(b).expect("b").set_features(["music", "books"]);
//! registry.be_friends_with(a, b, true)?;
//!
//! let report = registry.simulate_interaction(a, b)?;
//! assert_eq!(report.compatibility_score, 10);
//! assert!(report.friendship_status);
//! # Ok::<(), brainz_core::BrainzError>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod brain;
pub mod config;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod routine;
pub mod social;
pub mod task;
pub mod types;

pub use brain::{Attribute, Brain};
pub use config::BrainzConfig;
pub use error::BrainzError;
pub use registry::{BrainRegistry, SharedRegistry};
pub use routine::RoutineSchedule;
pub use social::{FriendshipGraph, InteractionReport};
pub use task::{Task, TaskRecord, TaskStatus};
pub use types::*;
