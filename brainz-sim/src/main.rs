//! `brainz`: drive the social simulation from the command line.
//!
//! Logging goes to stderr through `tracing-subscriber`. `RUST_LOG` wins over
//! the `general.log_level` from the config file.

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]

mod cli;
mod commands;

use std::path::Path;

use anyhow::{Context, Result};
use brainz_core::BrainzConfig;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn load_config(path: Option<&Path>) -> Result<BrainzConfig> {
    match path {
        Some(path) => BrainzConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(BrainzConfig::default()),
    }
}

fn init_tracing(config: &BrainzConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config);
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Demo { db } => {
            let outcome = commands::run_demo(&config)?;
            debug!(task = %outcome.task, brain = %outcome.first, "Routine slot monday/10 filled");
            println!(
                "{}",
                outcome
                    .registry
                    .is_friends_with(outcome.first, outcome.second)
            );
            if let Some(db) = db {
                let saved = commands::save(&outcome.registry, &db, &config)?;
                println!("saved {saved} brains to {}", db.display());
            }
        }
        Commands::Import { seed, db } => {
            let raw = std::fs::read_to_string(&seed)
                .with_context(|| format!("reading seed {}", seed.display()))?;
            let value = serde_json::from_str(&raw)
                .with_context(|| format!("parsing seed {}", seed.display()))?;
            let id = commands::import(&value, &db, &config)?;
            println!("imported brain {id}");
        }
        Commands::Show { id, db } => {
            println!("{}", commands::show(id, &db, &config)?);
        }
        Commands::List { db } => {
            for id in commands::list(&db, &config)? {
                println!("{id}");
            }
        }
        Commands::Task { db, action } => {
            println!("{}", commands::task(action, &db, &config)?);
        }
    }
    Ok(())
}
