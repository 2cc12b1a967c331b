use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ru_cli::commands::{Selection, import, list, reload, shell, status, usage, util};
use ru_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(Commands::Reload) => {
            reload::run(&mut stdout, &config)?;
        }
        Some(Commands::Import) => {
            import::run(&mut stdout, io::stdin().lock(), &config)?;
        }
        Some(Commands::List(args)) => {
            let registry = util::load_registry(&config)?;
            list::run(&mut stdout, &registry, args, &Selection::default())?;
        }
        Some(Commands::Usage(args)) => {
            let registry = util::load_registry(&config)?;
            usage::run(&mut stdout, &registry, args, &Selection::default())?;
        }
        Some(Commands::Status) => {
            status::run(&mut stdout, &config)?;
        }
        Some(Commands::Shell) => {
            shell::run(io::stdin().lock(), &mut stdout, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
