//! SQLite persistence adapter for brains and tasks.
//!
//! The core model never touches storage; this module maps a [`Brain`] (plus
//! the raw ids of its friends) to rows and back. Schema:
//!
//! ```sql
//! brains(id, features, updated_at)            -- features: JSON array
//! features(id, brain_id, feature)
//! memories(id, brain_id, memory)
//! emotions(id, brain_id, emotion)
//! personalities(id, brain_id, personality_trait)
//! memberships(id, brain_id, group_name)
//! fav_songs(id, brain_id, song)
//! friends(brain1_id, brain2_id)               -- PK (brain1_id, brain2_id)
//! tasks(id, brain_id, title, status)
//! routines(brain_id, weekday, hour, task_id)  -- PK (brain_id, weekday, hour)
//! ```
//!
//! Friendship rows are directional as written but are always read back in
//! both directions. Every save runs in one transaction and replaces what was
//! previously stored for that brain.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::brain::Brain;
use crate::config::{PersistenceConfig, SocialConfig};
use crate::error::{BrainzError, Result};
use crate::registry::BrainRegistry;
use crate::task::{Task, TaskRecord, TaskStatus};
use crate::types::{BrainId, TaskId};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS brains (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    features   TEXT NOT NULL DEFAULT '[]',
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS features (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id INTEGER NOT NULL,
    feature  TEXT NOT NULL,
    FOREIGN KEY (brain_id) REFERENCES brains(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS memories (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id INTEGER NOT NULL,
    memory   TEXT NOT NULL,
    FOREIGN KEY (brain_id) REFERENCES brains(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS emotions (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id INTEGER NOT NULL,
    emotion  TEXT NOT NULL,
    FOREIGN KEY (brain_id) REFERENCES brains(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS personalities (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id          INTEGER NOT NULL,
    personality_trait TEXT NOT NULL,
    FOREIGN KEY (brain_id) REFERENCES brains(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS memberships (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id   INTEGER NOT NULL,
    group_name TEXT NOT NULL,
    FOREIGN KEY (brain_id) REFERENCES brains(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS fav_songs (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id INTEGER NOT NULL,
    song     TEXT NOT NULL,
    FOREIGN KEY (brain_id) REFERENCES brains(id) ON DELETE CASCADE
);

-- brain2_id has no foreign key: a brain may be saved before its friends.
CREATE TABLE IF NOT EXISTS friends (
    brain1_id INTEGER NOT NULL,
    brain2_id INTEGER NOT NULL,
    PRIMARY KEY (brain1_id, brain2_id),
    FOREIGN KEY (brain1_id) REFERENCES brains(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS tasks (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    brain_id INTEGER NOT NULL,
    title    TEXT NOT NULL,
    status   TEXT NOT NULL,
    FOREIGN KEY (brain_id) REFERENCES brains(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS routines (
    brain_id INTEGER NOT NULL,
    weekday  TEXT NOT NULL,
    hour     INTEGER NOT NULL,
    task_id  INTEGER NOT NULL,
    PRIMARY KEY (brain_id, weekday, hour),
    FOREIGN KEY (brain_id) REFERENCES brains(id) ON DELETE CASCADE,
    FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
);
";

/// Child tables keyed by `brain_id`, in delete order.
const CHILD_TABLES: [&str; 8] = [
    "routines",
    "tasks",
    "features",
    "memories",
    "emotions",
    "personalities",
    "memberships",
    "fav_songs",
];

/// A brain as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBrain {
    /// The restored brain.
    pub brain: Brain,
    /// Raw ids of its friends, ascending. Not resolved to live brains.
    pub friend_ids: Vec<BrainId>,
}

// ---------------------------------------------------------------------------
// PersistenceEngine
// ---------------------------------------------------------------------------

/// Handle to an open SQLite database holding brains.
///
/// # Usage
///
/// ```no_run
/// # use brainz_core::persistence::PersistenceEngine;
/// # use brainz_core::config::PersistenceConfig;
/// # use brainz_core::{Brain, BrainId};
/// let engine = PersistenceEngine::open("brain.db", &PersistenceConfig::default())?;
/// let mut brain = Brain::new(BrainId(1));
/// brain.set_features(["music", "art"]);
/// engine.save_brain(&brain, &[])?;
/// let loaded = engine.load_brain(BrainId(1))?;
/// # Ok::<(), brainz_core::error::BrainzError>(())
/// ```
pub struct PersistenceEngine {
    conn: Connection,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for PersistenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceEngine")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PersistenceEngine {
    /// Open (or create) an SQLite database at `path` and ensure the schema.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;
        if config.wal_mode {
            conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        let engine = Self::init(conn, config, db_path)?;

        info!(
            path = %engine.db_path.display(),
            wal = config.wal_mode,
            "Brain store opened"
        );
        Ok(engine)
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, config, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, config: &PersistenceConfig, db_path: PathBuf) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    // ------------------------------------------------------------------
    // Brains
    // ------------------------------------------------------------------

    /// Save a brain and its friendship edges, replacing any earlier copy.
    ///
    /// `friend_ids` are the brain's friends as raw ids; friendship rows
    /// touching this brain in either direction are rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Serialization`] if the feature list cannot be
    /// encoded, or [`BrainzError::Database`] on SQLite failures.
    pub fn save_brain(&self, brain: &Brain, friend_ids: &[BrainId]) -> Result<BrainId> {
        let start = Instant::now();
        let tx = self.conn.unchecked_transaction()?;
        write_brain(&tx, brain, friend_ids)?;
        tx.commit()?;

        debug!(
            brain = %brain.id(),
            friends = friend_ids.len(),
            tasks = brain.get_tasks().len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved brain"
        );
        Ok(brain.id())
    }

    /// Load a brain with its friend ids. `None` if no such brain is stored.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Serialization`] if the stored feature list is
    /// not a JSON array of strings, or [`BrainzError::Database`] on SQLite
    /// failures.
    pub fn load_brain(&self, brain_id: BrainId) -> Result<Option<StoredBrain>> {
        let start = Instant::now();
        let id = sql_id(brain_id.0)?;

        let features_json: Option<String> = self
            .conn
            .prepare_cached("SELECT features FROM brains WHERE id = ?1")?
            .query_row(params![id], |row| row.get(0))
            .optional()?;
        let Some(features_json) = features_json else {
            return Ok(None);
        };

        let mut brain = Brain::new(brain_id);
        brain.features = serde_json::from_str(&features_json)
            .map_err(|e| BrainzError::Serialization(e.to_string()))?;
        brain.memories = self.strings("SELECT memory FROM memories WHERE brain_id = ?1 ORDER BY id", id)?;
        brain.emotions = self.strings("SELECT emotion FROM emotions WHERE brain_id = ?1 ORDER BY id", id)?;
        brain.personality = self.strings(
            "SELECT personality_trait FROM personalities WHERE brain_id = ?1 ORDER BY id",
            id,
        )?;
        brain.groups = self.strings(
            "SELECT group_name FROM memberships WHERE brain_id = ?1 ORDER BY id",
            id,
        )?;
        brain.fav_songs = self.strings("SELECT song FROM fav_songs WHERE brain_id = ?1 ORDER BY id", id)?;
        brain.tasks = self.tasks_of(id)?;

        let mut stmt = self.conn.prepare_cached(
            "SELECT weekday, hour, task_id FROM routines WHERE brain_id = ?1 ORDER BY weekday, hour",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?, row.get::<_, i64>(2)?))
        })?;
        for row in rows {
            let (weekday, hour, task_id) = row?;
            brain.routine.insert(TaskId(rust_id(task_id)?), &weekday, hour);
        }

        let mut stmt = self.conn.prepare_cached(
            "SELECT brain2_id FROM friends WHERE brain1_id = ?1
             UNION
             SELECT brain1_id FROM friends WHERE brain2_id = ?1
             ORDER BY 1",
        )?;
        let mut friend_ids = Vec::new();
        for raw in stmt.query_map(params![id], |row| row.get::<_, i64>(0))? {
            friend_ids.push(BrainId(rust_id(raw?)?));
        }

        debug!(
            brain = %brain_id,
            friends = friend_ids.len(),
            tasks = brain.tasks.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded brain"
        );
        Ok(Some(StoredBrain { brain, friend_ids }))
    }

    /// Delete a brain, its rows in every child table, and friendship rows in
    /// both directions. Returns `true` if the brain existed.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn delete_brain(&self, brain_id: BrainId) -> Result<bool> {
        let id = sql_id(brain_id.0)?;
        let tx = self.conn.unchecked_transaction()?;
        clear_children(&tx, id)?;
        tx.execute(
            "DELETE FROM friends WHERE brain1_id = ?1 OR brain2_id = ?1",
            params![id],
        )?;
        let deleted = tx.execute("DELETE FROM brains WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// All stored brain ids, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn list_brains(&self) -> Result<Vec<BrainId>> {
        let mut stmt = self.conn.prepare_cached("SELECT id FROM brains ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut brains = Vec::new();
        for row in rows {
            let raw = row?;
            match u64::try_from(raw) {
                Ok(id) => brains.push(BrainId(id)),
                Err(_) => warn!(id = raw, "Skipping brain row with negative id"),
            }
        }
        Ok(brains)
    }

    /// Number of stored brains.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn brain_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM brains", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // ------------------------------------------------------------------
    // Whole registry
    // ------------------------------------------------------------------

    /// Save every brain in the registry in a single transaction.
    /// Returns how many brains were written.
    ///
    /// # Errors
    ///
    /// Same as [`PersistenceEngine::save_brain`].
    pub fn save_registry(&self, registry: &BrainRegistry) -> Result<usize> {
        let start = Instant::now();
        let tx = self.conn.unchecked_transaction()?;
        let mut saved = 0;
        for brain in registry.brains() {
            write_brain(&tx, brain, &registry.friends_of(brain.id()))?;
            saved += 1;
        }
        tx.commit()?;
        info!(
            brains = saved,
            friendships = registry.friendships().len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Registry saved"
        );
        Ok(saved)
    }

    /// Rebuild a registry from every stored brain, resolving friend ids.
    /// Friend ids with no stored brain are dropped.
    ///
    /// # Errors
    ///
    /// Same as [`PersistenceEngine::load_brain`].
    pub fn load_registry(&self, config: SocialConfig) -> Result<BrainRegistry> {
        let mut brains = Vec::new();
        let mut pairs = Vec::new();
        for id in self.list_brains()? {
            let Some(stored) = self.load_brain(id)? else {
                continue;
            };
            pairs.extend(stored.friend_ids.iter().map(|friend| (id, *friend)));
            brains.push(stored.brain);
        }
        let mut registry = BrainRegistry::restore(config, brains, pairs)?;
        registry.reserve_ids(
            self.sequence("brains")?.saturating_add(1),
            self.sequence("tasks")?.saturating_add(1),
        );
        Ok(registry)
    }

    /// Highest id ever handed out for `table`, including deleted rows.
    /// Zero if the table has never held a row.
    fn sequence(&self, table: &str) -> Result<u64> {
        let seq: Option<i64> = self
            .conn
            .prepare_cached("SELECT seq FROM sqlite_sequence WHERE name = ?1")?
            .query_row(params![table], |row| row.get(0))
            .optional()?;
        seq.map_or(Ok(0), rust_id)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Insert (or overwrite) a single task row. The owning brain must
    /// already be stored when foreign keys are enforced.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn insert_task(&self, task: &impl TaskRecord) -> Result<()> {
        upsert_task(&self.conn, task, sql_id(task.brain_id().0)?)?;
        info!(task = %task.id(), brain = %task.brain_id(), "Task stored");
        Ok(())
    }

    /// Fetch a task by id.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn get_task(&self, task_id: TaskId) -> Result<Option<Task>> {
        let id = sql_id(task_id.0)?;
        let row: Option<(i64, String, String)> = self
            .conn
            .prepare_cached("SELECT brain_id, title, status FROM tasks WHERE id = ?1")?
            .query_row(params![id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()?;
        let Some((brain_id, title, status)) = row else {
            return Ok(None);
        };
        Ok(Some(Task::new(task_id, title, status, BrainId(rust_id(brain_id)?))))
    }

    /// Overwrite a stored task's status. Returns `true` if the task exists.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn update_task_status(&self, task_id: TaskId, status: &TaskStatus) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![status.as_str(), sql_id(task_id.0)?],
        )?;
        if updated > 0 {
            info!(task = %task_id, status = %status, "Stored task status updated");
        }
        Ok(updated > 0)
    }

    /// Delete a stored task and any routine slots that referenced it.
    /// Returns `true` if the task existed.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn delete_task(&self, task_id: TaskId) -> Result<bool> {
        let id = sql_id(task_id.0)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM routines WHERE task_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        tx.commit()?;
        if deleted > 0 {
            info!(task = %task_id, "Stored task deleted");
        }
        Ok(deleted > 0)
    }

    // ------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------

    /// Copy the database to `dest_path` using SQLite's online-backup API.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Database backup completed"
        );
        Ok(())
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run SQLite's integrity check. `Ok(false)` means corruption was found.
    ///
    /// # Errors
    ///
    /// Returns [`BrainzError::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    fn strings(&self, sql: &str, brain_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params![brain_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn tasks_of(&self, brain_id: i64) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, title, status FROM tasks WHERE brain_id = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![brain_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        let owner = BrainId(rust_id(brain_id)?);
        let mut tasks = Vec::new();
        for row in rows {
            let (id, title, status) = row?;
            tasks.push(Task::new(TaskId(rust_id(id)?), title, status, owner));
        }
        Ok(tasks)
    }
}

// ---------------------------------------------------------------------------
// Row writers
// ---------------------------------------------------------------------------

fn write_brain(conn: &Connection, brain: &Brain, friend_ids: &[BrainId]) -> Result<()> {
    let id = sql_id(brain.id().0)?;
    let features_json =
        serde_json::to_string(&brain.features).map_err(|e| BrainzError::Serialization(e.to_string()))?;

    conn.execute(
        "INSERT INTO brains (id, features, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            features = excluded.features,
            updated_at = excluded.updated_at",
        params![id, features_json, Utc::now().to_rfc3339()],
    )?;

    clear_children(conn, id)?;
    insert_strings(conn, "INSERT INTO features (brain_id, feature) VALUES (?1, ?2)", id, &brain.features)?;
    insert_strings(conn, "INSERT INTO memories (brain_id, memory) VALUES (?1, ?2)", id, &brain.memories)?;
    insert_strings(conn, "INSERT INTO emotions (brain_id, emotion) VALUES (?1, ?2)", id, &brain.emotions)?;
    insert_strings(
        conn,
        "INSERT INTO personalities (brain_id, personality_trait) VALUES (?1, ?2)",
        id,
        &brain.personality,
    )?;
    insert_strings(conn, "INSERT INTO memberships (brain_id, group_name) VALUES (?1, ?2)", id, &brain.groups)?;
    insert_strings(conn, "INSERT INTO fav_songs (brain_id, song) VALUES (?1, ?2)", id, &brain.fav_songs)?;

    // Rows belong to the brain holding the task, whatever id the task carries.
    for task in &brain.tasks {
        upsert_task(conn, task, id)?;
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO routines (brain_id, weekday, hour, task_id) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for slot in brain.routine.entries() {
        stmt.execute(params![id, slot.weekday, slot.hour, sql_id(slot.task_id.0)?])?;
    }

    conn.execute(
        "DELETE FROM friends WHERE brain1_id = ?1 OR brain2_id = ?1",
        params![id],
    )?;
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO friends (brain1_id, brain2_id) VALUES (?1, ?2)",
    )?;
    for friend in friend_ids {
        if *friend == brain.id() {
            return Err(BrainzError::SelfFriendship(*friend));
        }
        stmt.execute(params![id, sql_id(friend.0)?])?;
    }
    Ok(())
}

fn clear_children(conn: &Connection, brain_id: i64) -> Result<()> {
    for table in CHILD_TABLES {
        conn.execute(&format!("DELETE FROM {table} WHERE brain_id = ?1"), params![brain_id])?;
    }
    Ok(())
}

fn insert_strings(conn: &Connection, sql: &str, brain_id: i64, values: &[String]) -> Result<()> {
    let mut stmt = conn.prepare_cached(sql)?;
    for value in values {
        stmt.execute(params![brain_id, value])?;
    }
    Ok(())
}

fn upsert_task(conn: &Connection, task: &impl TaskRecord, owner: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (id, brain_id, title, status) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            brain_id = excluded.brain_id,
            title = excluded.title,
            status = excluded.status",
        params![
            sql_id(task.id().0)?,
            owner,
            task.title(),
            task.status().as_str()
        ],
    )?;
    Ok(())
}

fn sql_id(raw: u64) -> Result<i64> {
    i64::try_from(raw)
        .map_err(|_| BrainzError::Serialization(format!("id {raw} exceeds the SQLite integer range")))
}

fn rust_id(raw: i64) -> Result<u64> {
    u64::try_from(raw).map_err(|_| BrainzError::Serialization(format!("negative id {raw} in store")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PersistenceEngine {
        PersistenceEngine::open_in_memory(&PersistenceConfig::default()).expect("open")
    }

    fn sample_brain(id: u64) -> Brain {
        let mut brain = Brain::new(BrainId(id));
        brain.set_features(["music", "sports", "art"]);
        brain.add_memory("first concert");
        brain.add_memory("broken arm in 2009");
        brain.add_emotion("joy");
        brain.add_personality("curious");
        brain.join_group("choir");
        brain.set_fav_songs(["Imagine"]);
        brain.add_task(Task::new(TaskId(id * 10), "Complete Project", "Incomplete", BrainId(id)));
        brain.add_task(Task::new(TaskId(id * 10 + 1), "Practice scales", "In Progress", BrainId(id)));
        brain
            .set_routine(TaskId(id * 10 + 1), "Monday", 18)
            .expect("schedule");
        brain
    }

    #[test]
    fn round_trip_save_load() {
        let engine = engine();
        let brain = sample_brain(1);

        let saved = engine.save_brain(&brain, &[BrainId(2)]).expect("save");
        assert_eq!(saved, BrainId(1));

        let stored = engine.load_brain(BrainId(1)).expect("load").expect("Some");
        assert_eq!(stored.brain, brain);
        assert_eq!(stored.friend_ids, vec![BrainId(2)]);
    }

    #[test]
    fn load_nonexistent_returns_none() {
        assert!(engine().load_brain(BrainId(5)).expect("load").is_none());
    }

    #[test]
    fn features_column_is_json() {
        let engine = engine();
        engine.save_brain(&sample_brain(1), &[]).expect("save");
        let raw: String = engine
            .conn
            .query_row("SELECT features FROM brains WHERE id = 1", [], |row| row.get(0))
            .expect("row");
        assert_eq!(raw, r#"["music","sports","art"]"#);
    }

    #[test]
    fn corrupt_features_column_is_serialization_error() {
        let engine = engine();
        engine.save_brain(&sample_brain(1), &[]).expect("save");
        engine
            .conn
            .execute("UPDATE brains SET features = '__import__(\"os\")' WHERE id = 1", [])
            .expect("corrupt");
        let err = engine.load_brain(BrainId(1)).expect_err("not JSON");
        assert!(matches!(err, BrainzError::Serialization(_)));
    }

    #[test]
    fn resave_replaces_children() {
        let engine = engine();
        let mut brain = sample_brain(1);
        engine.save_brain(&brain, &[BrainId(2), BrainId(3)]).expect("save1");

        brain.delete_memory(0).expect("delete");
        brain.remove_task(TaskId(11));
        engine.save_brain(&brain, &[BrainId(3)]).expect("save2");

        let stored = engine.load_brain(BrainId(1)).expect("load").expect("Some");
        assert_eq!(stored.brain.get_memories(), ["broken arm in 2009"]);
        assert_eq!(stored.brain.get_tasks().len(), 1);
        assert!(stored.brain.routine().is_empty());
        assert_eq!(stored.friend_ids, vec![BrainId(3)]);
    }

    #[test]
    fn friendship_rows_read_both_directions() {
        let engine = engine();
        engine.save_brain(&sample_brain(1), &[BrainId(2)]).expect("save 1");
        engine.save_brain(&Brain::new(BrainId(2)), &[BrainId(1)]).expect("save 2");
        engine.save_brain(&Brain::new(BrainId(3)), &[BrainId(2)]).expect("save 3");

        let two = engine.load_brain(BrainId(2)).expect("load").expect("Some");
        assert_eq!(two.friend_ids, vec![BrainId(1), BrainId(3)]);
    }

    #[test]
    fn self_friend_id_rejected_and_rolled_back() {
        let engine = engine();
        let err = engine
            .save_brain(&sample_brain(1), &[BrainId(1)])
            .expect_err("self friendship");
        assert!(matches!(err, BrainzError::SelfFriendship(BrainId(1))));
        assert_eq!(engine.brain_count().expect("count"), 0);
    }

    #[test]
    fn task_crud() {
        let engine = engine();
        engine.save_brain(&Brain::new(BrainId(1)), &[]).expect("owner");

        let task = Task::new(TaskId(1), "Complete Brain Model", "In Progress", BrainId(1));
        engine.insert_task(&task).expect("insert");
        assert_eq!(engine.get_task(TaskId(1)).expect("get"), Some(task));

        assert!(engine
            .update_task_status(TaskId(1), &TaskStatus::Completed)
            .expect("update"));
        let updated = engine.get_task(TaskId(1)).expect("get").expect("Some");
        assert_eq!(updated.get_status(), &TaskStatus::Completed);

        assert!(engine.delete_task(TaskId(1)).expect("delete"));
        assert!(!engine.delete_task(TaskId(1)).expect("delete again"));
        assert!(engine.get_task(TaskId(1)).expect("get").is_none());
        assert!(!engine
            .update_task_status(TaskId(1), &TaskStatus::Incomplete)
            .expect("update missing"));
    }

    #[test]
    fn foreign_owned_task_is_stored_with_holder() {
        let engine = engine();
        let mut holder = Brain::new(BrainId(1));
        holder.add_task(Task::new(TaskId(5), "Complete Project", "Incomplete", BrainId(2)));

        // Other brain not stored yet: must not trip the foreign key.
        engine.save_brain(&holder, &[]).expect("save without owner stored");
        let stored = engine.load_brain(BrainId(1)).expect("load").expect("Some");
        assert_eq!(stored.brain.get_tasks().len(), 1);
        assert_eq!(stored.brain.get_tasks()[0].get_title(), "Complete Project");
        assert_eq!(stored.brain.get_tasks()[0].get_status(), &TaskStatus::Incomplete);

        // Other brain stored: the row still stays with the holder.
        engine.save_brain(&Brain::new(BrainId(2)), &[]).expect("save 2");
        engine.save_brain(&holder, &[]).expect("resave");
        let stored = engine.load_brain(BrainId(1)).expect("load").expect("Some");
        assert_eq!(stored.brain.get_tasks()[0].get_title(), "Complete Project");
        let other = engine.load_brain(BrainId(2)).expect("load").expect("Some");
        assert!(other.brain.get_tasks().is_empty());
    }

    #[test]
    fn deleted_task_ids_are_not_reissued() {
        let engine = engine();
        let mut registry = BrainRegistry::new();
        let owner = registry.spawn_brain();
        registry.assign_task(owner, "First", "Incomplete").expect("first");
        let last = registry.assign_task(owner, "Second", "Incomplete").expect("second");
        engine.save_registry(&registry).expect("save");
        assert!(engine.delete_task(last).expect("delete"));

        let mut restored = engine.load_registry(SocialConfig::default()).expect("load");
        let next = restored.assign_task(owner, "Third", "Incomplete").expect("third");
        assert!(next > last, "{next} reuses an id at or below {last}");
    }

    #[test]
    fn deleted_brain_ids_are_not_reissued() {
        let engine = engine();
        engine.save_brain(&Brain::new(BrainId(1)), &[]).expect("save 1");
        engine.save_brain(&Brain::new(BrainId(2)), &[]).expect("save 2");
        assert!(engine.delete_brain(BrainId(2)).expect("delete"));

        let mut restored = engine.load_registry(SocialConfig::default()).expect("load");
        assert_eq!(restored.spawn_brain(), BrainId(3));
    }

    #[test]
    fn task_for_unknown_brain_violates_foreign_key() {
        let engine = engine();
        let task = Task::new(TaskId(1), "Orphan", "Incomplete", BrainId(9));
        assert!(matches!(
            engine.insert_task(&task),
            Err(BrainzError::Database(_))
        ));
    }

    #[test]
    fn delete_task_clears_routine_rows() {
        let engine = engine();
        engine.save_brain(&sample_brain(1), &[]).expect("save");
        assert!(engine.delete_task(TaskId(11)).expect("delete"));
        let stored = engine.load_brain(BrainId(1)).expect("load").expect("Some");
        assert!(stored.brain.routine().is_empty());
        assert_eq!(stored.brain.get_tasks().len(), 1);
    }

    #[test]
    fn delete_brain_removes_everything() {
        let engine = engine();
        engine.save_brain(&sample_brain(1), &[BrainId(2)]).expect("save 1");
        engine.save_brain(&Brain::new(BrainId(2)), &[BrainId(1)]).expect("save 2");

        assert!(engine.delete_brain(BrainId(1)).expect("delete"));
        assert!(!engine.delete_brain(BrainId(1)).expect("delete again"));
        assert!(engine.load_brain(BrainId(1)).expect("load").is_none());
        assert!(engine.get_task(TaskId(10)).expect("task").is_none());

        let two = engine.load_brain(BrainId(2)).expect("load").expect("Some");
        assert!(two.friend_ids.is_empty());
        assert_eq!(engine.list_brains().expect("list"), vec![BrainId(2)]);
    }

    #[test]
    fn registry_round_trip() {
        let engine = engine();
        let mut registry = BrainRegistry::new();
        let a = registry.spawn_brain();
        let b = registry.spawn_brain();
        let c = registry.spawn_brain();
        registry.brain_mut(a).expect("a").set_features(["music", "art"]);
        registry.brain_mut(b).expect("b").set_features(["music"]);
        registry.assign_task(c, "Water plants", "Incomplete").expect("task");
        registry.be_friends_with(a, b, true).expect("a-b");
        registry.be_friends_with(c, b, true).expect("c-b");

        assert_eq!(engine.save_registry(&registry).expect("save"), 3);
        let mut restored = engine.load_registry(SocialConfig::default()).expect("load");

        assert_eq!(restored.len(), 3);
        assert!(restored.is_friends_with(b, a));
        assert!(restored.is_friends_with(b, c));
        assert!(!restored.is_friends_with(a, c));
        assert_eq!(
            restored.simulate_interaction(a, b).expect("interact").compatibility_score,
            10
        );
        assert_eq!(restored.spawn_brain(), BrainId(4));
    }

    #[test]
    fn integrity_check_passes() {
        assert!(engine().integrity_check().expect("check"));
    }

    #[test]
    fn file_based_open_and_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("brain.db");
        let config = PersistenceConfig::default();

        let engine = PersistenceEngine::open(&db_path, &config).expect("open");
        engine.save_brain(&sample_brain(1), &[]).expect("save");

        let backup_path = dir.path().join("brain_backup.db");
        engine.backup(&backup_path).expect("backup");

        let backup_engine = PersistenceEngine::open(&backup_path, &config).expect("open backup");
        let stored = backup_engine
            .load_brain(BrainId(1))
            .expect("load from backup")
            .expect("Some");
        assert_eq!(stored.brain.get_features(), ["music", "sports", "art"]);
        assert_eq!(backup_engine.db_path(), backup_path.as_path());
    }
}
