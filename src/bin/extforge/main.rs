//! extforge CLI - builds native Python extensions with conan and CMake

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use extforge::util::diagnostic::emit;
use extforge::ExtforgeError;

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Overrides the default log filter.
const LOG_ENV: &str = "EXTFORGE_LOG";

/// Options shared by every command.
pub struct GlobalArgs {
    pub verbose: bool,
    pub python: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        report_error(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("extforge=debug")
        } else {
            EnvFilter::new("extforge=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = GlobalArgs {
        verbose: cli.verbose,
        python: cli.python,
    };

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &global),
        Commands::Develop(args) => commands::develop::execute(args, &global),
        Commands::Descriptor(args) => commands::descriptor::execute(args, &global),
        Commands::Presets(args) => commands::presets::execute(args, &global),
        Commands::Check => commands::check::execute(&global),
    }
}

/// Print an error, with hints when it is one of ours.
fn report_error(e: &anyhow::Error, color: bool) {
    let Some(err) = e.chain().find_map(|c| c.downcast_ref::<ExtforgeError>()) else {
        eprintln!("error: {:#}", e);
        return;
    };

    // Outer context messages, outermost first
    let diag = e
        .chain()
        .take_while(|c| c.downcast_ref::<ExtforgeError>().is_none())
        .fold(err.to_diagnostic(), |d, c| d.with_context(c.to_string()));
    emit(&diag, color);
}
