//! Import command for rebuilding the usage snapshot from JSONL records.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use ru_core::{MinuteOfDay, UsageRecord, Weekday};
use serde::Deserialize;

use crate::Config;
use crate::commands::util;

/// Source recorded for snapshots built by this command.
const SOURCE: &str = "import";

/// Reads usage records from `reader`, rebuilds the registry from them, and
/// saves it. Nothing is saved if any line is malformed.
pub fn run<R: BufRead, W: Write>(writer: &mut W, reader: R, config: &Config) -> Result<()> {
    let records = parse_records(reader)?;
    let registry = util::build_registry(&records)?;
    let blocks = util::save_registry(config, &registry, SOURCE)?;

    writeln!(
        writer,
        "Imported {} records: {} buildings, {} rooms, {blocks} blocks.",
        records.len(),
        registry.building_count(),
        registry.room_count(),
    )?;
    Ok(())
}

fn parse_records<R: BufRead>(reader: R) -> Result<Vec<UsageRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let parsed: ImportRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        let record = parsed
            .into_record()
            .with_context(|| format!("invalid usage record on line {}", idx + 1))?;
        records.push(record);
    }
    tracing::debug!(count = records.len(), "parsed usage records");
    Ok(records)
}

/// One JSONL line, with clock times written as `9:00am`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportRecord {
    building: String,
    room: String,
    days: Vec<Weekday>,
    start: String,
    end: String,
}

impl ImportRecord {
    fn into_record(self) -> Result<UsageRecord> {
        if self.building.trim().is_empty() {
            anyhow::bail!("building cannot be empty");
        }
        if self.room.trim().is_empty() {
            anyhow::bail!("room cannot be empty");
        }
        if self.days.is_empty() {
            anyhow::bail!("days cannot be empty");
        }
        let start = MinuteOfDay::decode(&self.start).context("invalid start time")?;
        let end = MinuteOfDay::decode(&self.end).context("invalid end time")?;
        if start > end {
            anyhow::bail!("start time {start} is after end time {end}");
        }

        Ok(UsageRecord {
            building: self.building,
            room: self.room,
            days: self.days.into_iter().collect(),
            start,
            end,
        })
    }
}
