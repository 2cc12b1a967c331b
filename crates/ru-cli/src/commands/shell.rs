//! Interactive shell with a current building and room.
//!
//! Each line is parsed with the same clap definitions as the top-level
//! commands. A failing command prints its error and the loop continues.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::Parser;
use ru_core::{Registry, RegistryError};

use crate::Config;
use crate::cli::{ShellCommand, ShellLine};
use crate::commands::{Selection, list, reload, usage, util};

/// Shell state: the loaded registry and the current selection.
struct Session<'a> {
    config: &'a Config,
    registry: Option<Registry>,
    selection: Selection,
}

enum Flow {
    Continue,
    Exit,
}

/// Runs the shell until `exit` or end of input.
pub fn run<R: BufRead, W: Write>(input: R, output: &mut W, config: &Config) -> Result<()> {
    writeln!(output, "Room usage aggregator")?;
    writeln!(output, "Type 'help' to get a listing of commands")?;

    let registry = match util::load_registry(config) {
        Ok(registry) => {
            writeln!(output, "Found saved usage snapshot.")?;
            Some(registry)
        }
        Err(e) => {
            writeln!(output, "ERROR: {e:#}")?;
            None
        }
    };
    let mut session = Session {
        config,
        registry,
        selection: Selection::default(),
    };

    let mut lines = input.lines();
    loop {
        write!(output, "{}", session.prompt())?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line.context("failed to read shell input")?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        let command = match ShellLine::try_parse_from(tokens) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                write!(output, "{}", e.render())?;
                continue;
            }
        };
        match session.execute(command, output) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(e) => writeln!(output, "ERROR: {e:#}")?,
        }
    }
    Ok(())
}

impl Session<'_> {
    fn prompt(&self) -> String {
        format!(
            "{}/{}>",
            self.selection.building.as_deref().unwrap_or_default(),
            self.selection.room.as_deref().unwrap_or_default()
        )
    }

    fn registry(&self) -> Result<&Registry> {
        match &self.registry {
            Some(registry) => Ok(registry),
            None => bail!("No usage snapshot loaded. Run 'reload' first."),
        }
    }

    fn execute<W: Write>(&mut self, command: ShellCommand, output: &mut W) -> Result<Flow> {
        match command {
            ShellCommand::Reload => {
                let registry = reload::run(output, self.config)?;
                self.keep_valid_selection(&registry);
                self.registry = Some(registry);
            }
            ShellCommand::Set { name } => self.set(name)?,
            ShellCommand::Clear => {
                if self.selection.room.take().is_none() {
                    self.selection.building = None;
                }
            }
            ShellCommand::List(args) => list::run(output, self.registry()?, &args, &self.selection)?,
            ShellCommand::Usage(args) => usage::run(output, self.registry()?, &args, &self.selection)?,
            ShellCommand::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }

    /// Sets the building if none is set, otherwise a room in it.
    fn set(&mut self, name: String) -> Result<()> {
        let registry = self.registry()?;
        match &self.selection.building {
            None => {
                if !registry.contains_building(&name) {
                    return Err(RegistryError::UnknownBuilding(name).into());
                }
                self.selection.building = Some(name);
            }
            Some(building) => {
                registry.room(building, &name)?;
                self.selection.room = Some(name);
            }
        }
        Ok(())
    }

    /// Drops the parts of the selection a reloaded registry no longer has.
    fn keep_valid_selection(&mut self, registry: &Registry) {
        let Some(building) = &self.selection.building else {
            return;
        };
        if !registry.contains_building(building) {
            self.selection = Selection::default();
        } else if self
            .selection
            .room
            .as_ref()
            .is_some_and(|room| registry.room(building, room).is_err())
        {
            self.selection.room = None;
        }
    }
}
