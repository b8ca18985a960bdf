mod cli;
mod commands;
mod config;
mod engine;
mod manifest;
mod paths;
mod progress;
mod resources;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use declarative::CancelToken;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use config::Overrides;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Provider settings given on the command line or environment
    pub overrides: Overrides,
    /// Deadline for the whole run
    pub timeout: Option<Duration>,
    pub state_path: Option<PathBuf>,
}

impl Context {
    /// Cancellation token for one command, carrying the `--timeout` deadline.
    pub fn cancel_token(&self) -> CancelToken {
        self.timeout
            .map_or_else(CancelToken::new, CancelToken::with_timeout)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        overrides: Overrides {
            url: cli.url,
            api_key: cli.api_key,
            api_key_secret: cli.api_secret,
            insecure: cli.insecure,
        },
        timeout: cli.timeout.map(Duration::from_secs),
        state_path: cli.state.map(|p| paths::expand(&p.to_string_lossy())),
    };

    match cli.command {
        Command::Kinds => commands::kinds::run(),
        Command::Plan { manifest } => commands::plan::run(&ctx, &manifest),
        Command::Apply {
            manifest,
            yes,
            jobs,
        } => commands::apply::run(&ctx, &manifest, yes, jobs),
        Command::Refresh { jobs } => commands::refresh::run(&ctx, jobs),
        Command::Import { address, kind, id } => {
            commands::import::run(&ctx, &address, &kind, &id)
        }
        Command::Destroy {
            addresses,
            yes,
            jobs,
        } => commands::destroy::run(&ctx, &addresses, yes, jobs),
        Command::Show { address } => commands::show::run(&ctx, address.as_deref()),
        Command::Lookup(cmd) => commands::lookup::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "kasmctl", &mut io::stdout());
            Ok(())
        }
    }
}
