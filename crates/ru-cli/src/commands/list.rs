//! List command for buildings and rooms.

use std::io::Write;

use anyhow::Result;
use ru_core::Registry;

use crate::cli::ListArgs;
use crate::commands::Selection;

/// Runs the list command.
///
/// With no buildings given, lists the rooms of the selected building, or all
/// buildings when none is selected. With buildings given, lists
/// `BUILDING ROOM` for every room in them.
pub fn run<W: Write>(
    writer: &mut W,
    registry: &Registry,
    args: &ListArgs,
    selection: &Selection,
) -> Result<()> {
    let mut lines = Vec::new();
    if args.buildings.is_empty() {
        match &selection.building {
            Some(building) => lines.extend(registry.list_rooms(building)?),
            None => lines.extend(registry.list_buildings()),
        }
    } else {
        for building in &args.buildings {
            for room in registry.list_rooms(building)? {
                lines.push(format!("{building} {room}"));
            }
        }
        lines.sort();
    }

    for line in lines {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}
