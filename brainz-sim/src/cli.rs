//! Command-line surface.
//!
//! Parsing lives here, execution in `commands`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// brainz social simulation driver
#[derive(Debug, Parser)]
#[command(name = "brainz")]
#[command(about = "Run the brainz demo flow and inspect saved brains", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Two brains, one task, a Monday 10:00 routine slot and a friendship
    Demo {
        /// Save the resulting brains to this SQLite file
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Create a brain from a JSON seed file and save it
    Import {
        /// JSON object keyed by attribute name (features, memories, ...)
        seed: PathBuf,
        /// SQLite file to write into
        #[arg(long)]
        db: PathBuf,
    },

    /// Print a stored brain as JSON
    Show {
        /// Brain id
        id: u64,
        /// SQLite file to read from
        #[arg(long)]
        db: PathBuf,
    },

    /// List stored brain ids
    List {
        /// SQLite file to read from
        #[arg(long)]
        db: PathBuf,
    },

    /// Task operations against a stored database
    Task {
        /// SQLite file to operate on
        #[arg(long)]
        db: PathBuf,
        #[command(subcommand)]
        action: TaskCommands,
    },
}

/// Task subcommands
#[derive(Debug, Subcommand)]
pub enum TaskCommands {
    /// Give a stored brain a new task
    Add {
        /// Owning brain id
        brain: u64,
        /// Task title
        title: String,
        /// Initial status
        #[arg(long, default_value = "Incomplete")]
        status: String,
    },

    /// Change a task's status
    Status {
        /// Task id
        id: u64,
        /// New status ("Incomplete", "In Progress", "Completed", or any text)
        status: String,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: u64,
    },
}
