//! Room usage aggregator CLI library.
//!
//! This crate provides the `ru` command surface: argument definitions,
//! configuration, and the command implementations.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ListArgs, ShellCommand, ShellLine, UsageArgs};
pub use config::Config;
