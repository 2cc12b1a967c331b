//! Command-line argument definitions.

use std::path::PathBuf;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use ru_core::{Interval, MinuteOfDay, Weekday};

/// Room usage aggregator.
///
/// Collects class meeting times from the course catalog and reports when
/// each room is in use across the week.
#[derive(Debug, Parser)]
#[command(name = "ru", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Crawl the course catalog and rebuild the usage snapshot.
    Reload,

    /// Rebuild the usage snapshot from JSONL usage records on stdin.
    Import,

    /// List buildings, or the rooms in the given buildings.
    List(ListArgs),

    /// Show when rooms are in use.
    Usage(UsageArgs),

    /// Show what the stored snapshot contains.
    Status,

    /// Start an interactive session with a current building and room.
    Shell,
}

/// Arguments for `list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Buildings whose rooms to list, separated by ';' (e.g. A;B).
    #[arg(value_delimiter = ';')]
    pub buildings: Vec<String>,
}

/// Arguments for `usage`.
#[derive(Debug, Args)]
pub struct UsageArgs {
    /// Buildings to report, separated by ';'. Required unless a building is set.
    #[arg(short = 'b', long = "building", value_delimiter = ';')]
    pub buildings: Vec<String>,

    /// Rooms to report, separated by ';'. Only valid with a single building.
    #[arg(short = 'r', long = "room", value_delimiter = ';')]
    pub rooms: Vec<String>,

    /// Days to report, separated by ';': M, T, W, R, F, S. Defaults to all.
    #[arg(short = 'd', long = "day", value_delimiter = ';')]
    pub days: Vec<Weekday>,

    /// Time range to report, as [hours]:[mins][am/pm] (e.g. 9:00am 12:30pm).
    #[arg(short = 't', long = "time", num_args = 2, value_names = ["START", "END"])]
    pub time: Vec<MinuteOfDay>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl UsageArgs {
    /// The requested time range, or the whole day.
    pub fn range(&self) -> anyhow::Result<Interval> {
        match self.time.as_slice() {
            [] => Ok(Interval::FULL_DAY),
            [start, end] => Ok(Interval::new(*start, *end)?),
            _ => bail!("--time takes exactly a start and an end"),
        }
    }
}

/// One line typed into `ru shell`.
#[derive(Debug, Parser)]
#[command(multicall = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

/// Commands available inside `ru shell`.
#[derive(Debug, Subcommand)]
pub enum ShellCommand {
    /// Crawl the course catalog and rebuild the usage snapshot.
    Reload,

    /// Set the current building, or the current room once a building is set.
    Set {
        /// Building or room name.
        name: String,
    },

    /// Clear the current room, or the current building if no room is set.
    Clear,

    /// List buildings, or the rooms in the given (or current) building.
    List(ListArgs),

    /// Show when rooms are in use.
    Usage(UsageArgs),

    /// Leave the shell.
    Exit,
}
