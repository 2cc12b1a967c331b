//! Snapshot storage for the room usage registry.
//!
//! Persists a [`Registry`] to `SQLite` using `rusqlite` so that queries do not
//! need a fresh crawl of the course catalog.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Usage Blocks
//!
//! `usage_blocks` holds one row per stored block: building, room, weekday
//! (full English name, e.g. `Monday`), and start/end as minutes since
//! midnight. A save replaces the whole table; there is no incremental update.
//!
//! ## Snapshot Metadata
//!
//! `snapshot_meta` is a key/value table. `saved_at` (RFC 3339, UTC) and
//! `source` (e.g. `catalog`, `import`) are written on every save. A database
//! with no `saved_at` has never held a snapshot.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use ru_core::{Interval, MinuteOfDay, Registry, Weekday};

const META_SAVED_AT: &str = "saved_at";
const META_SOURCE: &str = "source";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored usage block could not be turned back into registry data.
    #[error("corrupt usage block for {building} {room}: {message}")]
    CorruptRow {
        building: String,
        room: String,
        message: String,
    },
    /// Failed to parse the snapshot timestamp.
    #[error("invalid snapshot timestamp: {timestamp}")]
    TimestampParse {
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// When and from where the stored snapshot was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub saved_at: DateTime<Utc>,
    pub source: String,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshot_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- One row per merged block of room use
            -- day: full weekday name (e.g. 'Monday')
            -- start_minute/end_minute: minutes since midnight, 0-1439
            CREATE TABLE IF NOT EXISTS usage_blocks (
                building TEXT NOT NULL,
                room TEXT NOT NULL,
                day TEXT NOT NULL,
                start_minute INTEGER NOT NULL,
                end_minute INTEGER NOT NULL,
                PRIMARY KEY (building, room, day, start_minute)
            );
            ",
        )?;
        Ok(())
    }

    /// Replaces the stored snapshot with `registry`.
    ///
    /// Returns the number of blocks written.
    pub fn save_registry(&mut self, registry: &Registry, source: &str) -> Result<usize, DbError> {
        self.save_registry_at(registry, source, Utc::now())
    }

    fn save_registry_at(
        &mut self,
        registry: &Registry,
        source: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM usage_blocks", [])?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO usage_blocks (building, room, day, start_minute, end_minute)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for block in registry.blocks() {
                written += stmt.execute(params![
                    block.building,
                    block.room,
                    block.day.as_str(),
                    block.interval.start().get(),
                    block.interval.end().get(),
                ])?;
            }

            let mut meta = tx.prepare(
                "
                INSERT INTO snapshot_meta (key, value) VALUES (?, ?)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value
                ",
            )?;
            meta.execute(params![META_SAVED_AT, format_timestamp(saved_at)])?;
            meta.execute(params![META_SOURCE, source])?;
        }
        tx.commit()?;
        tracing::debug!(blocks = written, source, "saved registry snapshot");
        Ok(written)
    }

    /// Rebuilds the registry from the stored snapshot.
    ///
    /// Returns `None` if no snapshot has ever been saved.
    pub fn load_registry(&self) -> Result<Option<Registry>, DbError> {
        if self.meta(META_SAVED_AT)?.is_none() {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "
            SELECT building, room, day, start_minute, end_minute
            FROM usage_blocks
            ORDER BY building ASC, room ASC, day ASC, start_minute ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(BlockRow {
                building: row.get(0)?,
                room: row.get(1)?,
                day: row.get(2)?,
                start: row.get(3)?,
                end: row.get(4)?,
            })
        })?;

        let mut days: BTreeMap<(String, String, Weekday), Vec<Interval>> = BTreeMap::new();
        for row in rows {
            let row = row?;
            let (day, interval) = row.decode()?;
            days.entry((row.building, row.room, day))
                .or_default()
                .push(interval);
        }

        let mut registry = Registry::new();
        for ((building, room, day), intervals) in days {
            registry.restore_day(&building, &room, day, intervals);
        }
        tracing::debug!(blocks = registry.block_count(), "loaded registry snapshot");
        Ok(Some(registry))
    }

    /// Returns when and from where the snapshot was saved, if one exists.
    pub fn snapshot_info(&self) -> Result<Option<SnapshotInfo>, DbError> {
        let Some(saved_at) = self.meta(META_SAVED_AT)? else {
            return Ok(None);
        };
        let saved_at = parse_timestamp(&saved_at)?;
        let source = self
            .meta(META_SOURCE)?
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Some(SnapshotInfo { saved_at, source }))
    }

    fn meta(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM snapshot_meta WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

struct BlockRow {
    building: String,
    room: String,
    day: String,
    start: i64,
    end: i64,
}

impl BlockRow {
    fn decode(&self) -> Result<(Weekday, Interval), DbError> {
        let corrupt = |message: String| DbError::CorruptRow {
            building: self.building.clone(),
            room: self.room.clone(),
            message,
        };
        let day: Weekday = self.day.parse().map_err(|e| corrupt(format!("{e}")))?;
        let start = decode_minute(self.start).map_err(&corrupt)?;
        let end = decode_minute(self.end).map_err(&corrupt)?;
        let interval = Interval::new(start, end).map_err(|e| corrupt(e.to_string()))?;
        Ok((day, interval))
    }
}

fn decode_minute(value: i64) -> Result<MinuteOfDay, String> {
    u32::try_from(value)
        .map_err(|_| format!("minute {value} is negative"))
        .and_then(|v| MinuteOfDay::new(v).map_err(|e| e.to_string()))
}

fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
