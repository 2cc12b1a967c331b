//! Status command for showing what the stored snapshot contains.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;
use crate::commands::util;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = util::open_database(config)?;

    writeln!(writer, "Room usage status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    let Some(info) = db.snapshot_info().context("failed to read snapshot metadata")? else {
        writeln!(writer, "No usage snapshot. Run 'ru reload' or 'ru import'.")?;
        return Ok(());
    };
    let registry = db
        .load_registry()
        .context("failed to load usage snapshot")?
        .unwrap_or_default();

    writeln!(
        writer,
        "Saved: {} (from {})",
        info.saved_at.format("%Y-%m-%d %H:%M:%S UTC"),
        info.source
    )?;
    writeln!(writer, "Buildings: {}", registry.building_count())?;
    writeln!(writer, "Rooms: {}", registry.room_count())?;
    writeln!(writer, "Blocks: {}", registry.block_count())?;
    Ok(())
}
