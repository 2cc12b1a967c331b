//! CLI subcommand implementations.

pub mod import;
pub mod list;
pub mod reload;
pub mod shell;
pub mod status;
pub mod usage;
pub mod util;

/// Building and room that apply when a command does not name them.
///
/// Empty outside `ru shell`; inside it, set with `set` and cleared with `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub building: Option<String>,
    pub room: Option<String>,
}
