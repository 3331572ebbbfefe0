//! Command execution.

use std::path::Path;

use anyhow::{Context, Result, bail};
use brainz_core::persistence::PersistenceEngine;
use brainz_core::{Attribute, BrainId, BrainRegistry, BrainzConfig, TaskId, TaskStatus};
use serde_json::Value;
use tracing::info;

use crate::cli::TaskCommands;

/// What the demo flow produced, for printing and tests.
#[derive(Debug)]
pub struct DemoOutcome {
    /// The populated registry.
    pub registry: BrainRegistry,
    /// First brain (task owner).
    pub first: BrainId,
    /// Second brain.
    pub second: BrainId,
    /// The task scheduled on Monday at 10.
    pub task: TaskId,
}

/// Two brains, a task routed into Monday 10:00, and a friendship between them.
pub fn run_demo(config: &BrainzConfig) -> Result<DemoOutcome> {
    let mut registry = BrainRegistry::with_config(config.social.clone());
    let first = registry.spawn_brain();
    let second = registry.spawn_brain();

    let task = registry.assign_task(first, "Complete Project", TaskStatus::Incomplete)?;
    registry
        .brain_mut(first)
        .context("demo brain vanished")?
        .set_routine(task, "Monday", 10)?;

    registry.be_friends_with(first, second, true)?;

    Ok(DemoOutcome {
        registry,
        first,
        second,
        task,
    })
}

fn open(db: &Path, config: &BrainzConfig) -> Result<PersistenceEngine> {
    PersistenceEngine::open(db, &config.persistence)
        .with_context(|| format!("opening database {}", db.display()))
}

/// Persist a registry into `db`.
pub fn save(registry: &BrainRegistry, db: &Path, config: &BrainzConfig) -> Result<usize> {
    let engine = open(db, config)?;
    let saved = engine.save_registry(registry)?;
    Ok(saved)
}

/// Build a brain from a JSON seed object and store it under a fresh id.
///
/// Keys are attribute names. `features` and `fav_songs` take an array; the
/// other attributes take a string or an array of strings.
pub fn import(seed: &Value, db: &Path, config: &BrainzConfig) -> Result<BrainId> {
    let Some(fields) = seed.as_object() else {
        bail!("seed must be a JSON object keyed by attribute name");
    };

    let engine = open(db, config)?;
    let mut registry = engine.load_registry(config.social.clone())?;
    let id = registry.spawn_brain();
    let brain = registry.brain_mut(id).context("fresh brain missing")?;

    for (key, value) in fields {
        let attribute: Attribute = serde_json::from_value(Value::String(key.clone()))
            .with_context(|| format!("unknown attribute `{key}`"))?;
        match value {
            Value::Array(items) if !attribute.takes_list() => {
                for item in items {
                    brain.extend_from_value(attribute, item)?;
                }
            }
            _ => brain.extend_from_value(attribute, value)?,
        }
    }

    engine.save_brain(brain, &[])?;
    info!(brain = %id, "Imported seed");
    Ok(id)
}

/// Load a stored brain and render it as pretty JSON.
pub fn show(id: u64, db: &Path, config: &BrainzConfig) -> Result<String> {
    let engine = open(db, config)?;
    let stored = engine
        .load_brain(BrainId(id))?
        .with_context(|| format!("brain {id} is not stored in {}", db.display()))?;
    Ok(serde_json::to_string_pretty(&stored)?)
}

/// Ids of every stored brain.
pub fn list(db: &Path, config: &BrainzConfig) -> Result<Vec<BrainId>> {
    Ok(open(db, config)?.list_brains()?)
}

/// Apply a task subcommand. Returns a one-line summary.
pub fn task(action: TaskCommands, db: &Path, config: &BrainzConfig) -> Result<String> {
    let engine = open(db, config)?;
    match action {
        TaskCommands::Add {
            brain,
            title,
            status,
        } => {
            let mut registry = engine.load_registry(config.social.clone())?;
            let owner = BrainId(brain);
            let task_id = registry.assign_task(owner, title, status)?;
            let task = registry
                .brain(owner)
                .and_then(|b| b.task(task_id))
                .context("assigned task missing")?;
            engine.insert_task(task)?;
            Ok(format!("task {task_id} added to brain {owner}"))
        }
        TaskCommands::Status { id, status } => {
            let status = TaskStatus::from(status);
            if !engine.update_task_status(TaskId(id), &status)? {
                bail!("task {id} not found");
            }
            Ok(format!("task {id} is now {status}"))
        }
        TaskCommands::Delete { id } => {
            if !engine.delete_task(TaskId(id))? {
                bail!("task {id} not found");
            }
            Ok(format!("task {id} deleted"))
        }
    }
}
