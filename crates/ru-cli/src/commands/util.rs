//! Shared utilities for CLI commands.

use anyhow::{Context, Result};
use ru_core::{Registry, UsageRecord};
use ru_db::Database;

use crate::Config;

/// Opens the snapshot database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Loads the saved registry, failing with a hint if nothing was saved yet.
pub fn load_registry(config: &Config) -> Result<Registry> {
    let db = open_database(config)?;
    db.load_registry()
        .context("failed to load usage snapshot")?
        .context("No usage snapshot found. Run 'ru reload' or 'ru import' first.")
}

/// Builds a fresh registry from usage records.
pub fn build_registry<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Result<Registry> {
    let mut registry = Registry::new();
    for record in records {
        registry
            .apply(record)
            .with_context(|| format!("invalid usage record for {} {}", record.building, record.room))?;
    }
    Ok(registry)
}

/// Saves `registry` as the current snapshot and reports what was written.
pub fn save_registry(config: &Config, registry: &Registry, source: &str) -> Result<usize> {
    let mut db = open_database(config)?;
    let written = db
        .save_registry(registry, source)
        .context("failed to save usage snapshot")?;
    tracing::info!(
        blocks = written,
        rooms = registry.room_count(),
        buildings = registry.building_count(),
        source,
        "saved usage snapshot"
    );
    Ok(written)
}
