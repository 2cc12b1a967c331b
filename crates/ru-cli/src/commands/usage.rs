//! Usage command for showing when rooms are in use.
//!
//! Resolves the requested buildings, rooms, days, and time range against the
//! registry, then renders one row per room and day as text or JSON.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{Result, bail};
use ru_core::{Interval, Registry, Weekday};
use serde::Serialize;

use crate::cli::UsageArgs;
use crate::commands::Selection;

/// A resolved usage request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageQuery {
    /// `(building, room)` pairs in output order.
    pub rooms: Vec<(String, String)>,
    /// Days to report, Monday first.
    pub days: Vec<Weekday>,
    pub range: Interval,
}

/// Blocks of use for one room on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRow {
    pub building: String,
    pub room: String,
    pub day: Weekday,
    pub blocks: Vec<Interval>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    building: &'a str,
    room: &'a str,
    day: Weekday,
    blocks: Vec<JsonBlock>,
}

#[derive(Serialize)]
struct JsonBlock {
    start: String,
    end: String,
}

/// Runs the usage command.
pub fn run<W: Write>(
    writer: &mut W,
    registry: &Registry,
    args: &UsageArgs,
    selection: &Selection,
) -> Result<()> {
    let query = resolve(registry, args, selection)?;
    let rows = collect_rows(registry, &query)?;

    if args.json {
        writeln!(writer, "{}", render_json(&rows)?)?;
    } else {
        write!(writer, "{}", render_text(&rows, query.days.len()))?;
    }
    Ok(())
}

/// Validates the arguments against the registry and the shell selection.
pub fn resolve(registry: &Registry, args: &UsageArgs, selection: &Selection) -> Result<UsageQuery> {
    let buildings: Vec<String> = if args.buildings.is_empty() {
        match &selection.building {
            Some(building) => vec![building.clone()],
            None => bail!("No building set or given. Pass -b or set a building first."),
        }
    } else {
        args.buildings.clone()
    };

    if !args.rooms.is_empty() && buildings.len() > 1 {
        bail!("Rooms can only be given with a single building.");
    }

    let range = args.range()?;

    let mut rooms = Vec::new();
    for building in &buildings {
        let names = registry.list_rooms(building)?;
        if !args.rooms.is_empty() {
            for room in &args.rooms {
                registry.room(building, room)?;
                rooms.push((building.clone(), room.clone()));
            }
        } else if let Some(room) = selected_room(selection, building, buildings.len()) {
            rooms.push((building.clone(), room.to_string()));
        } else {
            rooms.extend(names.into_iter().map(|room| (building.clone(), room)));
        }
    }

    let days: Vec<Weekday> = if args.days.is_empty() {
        Weekday::ALL.to_vec()
    } else {
        args.days.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
    };

    Ok(UsageQuery { rooms, days, range })
}

/// The shell's current room applies only when reporting its own building alone.
fn selected_room<'a>(selection: &'a Selection, building: &str, buildings: usize) -> Option<&'a str> {
    if buildings != 1 || selection.building.as_deref() != Some(building) {
        return None;
    }
    selection.room.as_deref()
}

/// Runs the query for every room and day.
pub fn collect_rows(registry: &Registry, query: &UsageQuery) -> Result<Vec<UsageRow>> {
    let mut rows = Vec::with_capacity(query.rooms.len() * query.days.len());
    for (building, room) in &query.rooms {
        for &day in &query.days {
            let blocks = registry.query_usage(building, room, day, query.range)?;
            rows.push(UsageRow {
                building: building.clone(),
                room: room.clone(),
                day,
                blocks,
            });
        }
    }
    Ok(rows)
}

/// Renders rows as text.
///
/// With a single day each room takes one line. With several days each room
/// gets a header followed by one line per day.
pub fn render_text(rows: &[UsageRow], day_count: usize) -> String {
    let mut output = String::new();
    let mut current: Option<(&str, &str)> = None;

    for row in rows {
        let blocks = format_blocks(&row.blocks);
        if day_count == 1 {
            output.push_str(&format!("{} {}: {blocks}\n", row.building, row.room));
            continue;
        }

        let key = (row.building.as_str(), row.room.as_str());
        if current != Some(key) {
            output.push_str(&format!("=== {} {}\n", row.building, row.room));
            current = Some(key);
        }
        output.push_str(&format!("{}: {blocks}\n", row.day));
    }
    output
}

/// Renders rows as a pretty-printed JSON array.
pub fn render_json(rows: &[UsageRow]) -> Result<String> {
    let rows: Vec<JsonRow<'_>> = rows
        .iter()
        .map(|row| JsonRow {
            building: &row.building,
            room: &row.room,
            day: row.day,
            blocks: row
                .blocks
                .iter()
                .map(|block| JsonBlock {
                    start: block.start().encode(),
                    end: block.end().encode(),
                })
                .collect(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

fn format_blocks(blocks: &[Interval]) -> String {
    if blocks.is_empty() {
        return "(none)".to_string();
    }
    blocks
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use ru_core::MinuteOfDay;

    fn m(value: u32) -> MinuteOfDay {
        MinuteOfDay::new(value).unwrap()
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        let mwf = [Weekday::Monday, Weekday::Wednesday, Weekday::Friday];
        registry.insert_usage("CARVR", "0204", mwf, m(540), m(590)).unwrap();
        registry.insert_usage("CARVR", "0204", mwf, m(600), m(650)).unwrap();
        registry.insert_usage("CARVR", "0204", [Weekday::Monday], m(780), m(855)).unwrap();
        registry
            .insert_usage("CARVR", "0101", [Weekday::Tuesday, Weekday::Thursday], m(660), m(735))
            .unwrap();
        registry.insert_usage("BEARD", "0140", [Weekday::Friday], m(480), m(530)).unwrap();
        registry
    }

    fn args() -> UsageArgs {
        UsageArgs {
            buildings: Vec::new(),
            rooms: Vec::new(),
            days: Vec::new(),
            time: Vec::new(),
            json: false,
        }
    }

    fn render(args: &UsageArgs, selection: &Selection) -> Result<String> {
        let mut output = Vec::new();
        run(&mut output, &registry(), args, selection)?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn single_day_prints_one_line_per_room() {
        let args = UsageArgs {
            buildings: vec!["CARVR".to_string()],
            days: vec![Weekday::Monday],
            ..args()
        };
        let output = render(&args, &Selection::default()).unwrap();
        assert_snapshot!(output, @r"
        CARVR 0101: (none)
        CARVR 0204: 9:00am-10:50am, 1:00pm-2:15pm
        ");
    }

    #[test]
    fn several_days_print_a_header_per_room() {
        let args = UsageArgs {
            buildings: vec!["CARVR".to_string()],
            rooms: vec!["0204".to_string()],
            days: vec![Weekday::Wednesday, Weekday::Monday],
            ..args()
        };
        let output = render(&args, &Selection::default()).unwrap();
        assert_snapshot!(output, @r"
        === CARVR 0204
        Monday: 9:00am-10:50am, 1:00pm-2:15pm
        Wednesday: 9:00am-10:50am
        ");
    }

    #[test]
    fn time_range_keeps_whole_blocks() {
        let args = UsageArgs {
            buildings: vec!["CARVR".to_string()],
            rooms: vec!["0204".to_string()],
            days: vec![Weekday::Monday],
            time: vec![m(700), m(790)],
            ..args()
        };
        let output = render(&args, &Selection::default()).unwrap();
        assert_snapshot!(output, @"CARVR 0204: 1:00pm-2:15pm");
    }

    #[test]
    fn json_output_encodes_times() {
        let args = UsageArgs {
            buildings: vec!["BEARD".to_string()],
            days: vec![Weekday::Friday],
            json: true,
            ..args()
        };
        let output = render(&args, &Selection::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "building": "BEARD",
                "room": "0140",
                "day": "Friday",
                "blocks": [{"start": "8:00am", "end": "8:50am"}],
            }])
        );
    }

    #[test]
    fn selection_supplies_building_and_room() {
        let selection = Selection {
            building: Some("CARVR".to_string()),
            room: Some("0101".to_string()),
        };
        let query = resolve(&registry(), &args(), &selection).unwrap();
        assert_eq!(query.rooms, vec![("CARVR".to_string(), "0101".to_string())]);
        assert_eq!(query.days, Weekday::ALL.to_vec());
        assert_eq!(query.range, Interval::FULL_DAY);

        let other_building = UsageArgs {
            buildings: vec!["BEARD".to_string()],
            ..args()
        };
        let query = resolve(&registry(), &other_building, &selection).unwrap();
        assert_eq!(query.rooms, vec![("BEARD".to_string(), "0140".to_string())]);
    }

    #[test]
    fn building_is_required() {
        let err = resolve(&registry(), &args(), &Selection::default()).unwrap_err();
        assert!(err.to_string().contains("No building set"));
    }

    #[test]
    fn rooms_need_a_single_building() {
        let args = UsageArgs {
            buildings: vec!["CARVR".to_string(), "BEARD".to_string()],
            rooms: vec!["0204".to_string()],
            ..args()
        };
        let err = resolve(&registry(), &args, &Selection::default()).unwrap_err();
        assert!(err.to_string().contains("single building"));
    }

    #[test]
    fn unknown_names_are_errors() {
        let unknown_building = UsageArgs {
            buildings: vec!["NOPE".to_string()],
            ..args()
        };
        let err = resolve(&registry(), &unknown_building, &Selection::default()).unwrap_err();
        assert_eq!(err.to_string(), "NOPE is not a building");

        let unknown_room = UsageArgs {
            buildings: vec!["CARVR".to_string()],
            rooms: vec!["9999".to_string()],
            ..args()
        };
        let err = resolve(&registry(), &unknown_room, &Selection::default()).unwrap_err();
        assert_eq!(err.to_string(), "9999 is not a room in CARVR");
    }

    #[test]
    fn inverted_time_range_is_an_error() {
        let args = UsageArgs {
            buildings: vec!["CARVR".to_string()],
            time: vec![m(780), m(540)],
            ..args()
        };
        assert!(resolve(&registry(), &args, &Selection::default()).is_err());
    }
}
