//! safe CLI - password-based file encryption with line-level tokens
//!
//! This is the command-line interface for safe. It provides a user-friendly
//! interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;

use clap::Parser;
use safe_core::VERSION;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{config as config_cmd, convert, files, init, misc, shell};
use crate::constants::LOG_ENV;
use crate::errors::{exit_code_for, hint_for};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {}", e);
        if let Some(hint) = hint_for(&e) {
            eprintln!("{}", hint);
        }
        std::process::exit(exit_code_for(&e));
    }
}

/// Logs go to stderr so stdout stays clean for `shell` and `list --json`.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init) => {
            init::handle_init(ctx)?;
        }
        Some(Commands::Convert(args)) => {
            convert::handle_convert(ctx, args)?;
        }
        Some(Commands::Config(args)) => {
            config_cmd::handle_config(ctx, args)?;
        }
        Some(Commands::Shell(args)) => {
            shell::handle_shell(ctx, args)?;
        }
        Some(Commands::List(args)) => {
            files::handle_list(ctx, args)?;
        }
        Some(Commands::Untrack(args)) => {
            files::handle_untrack(ctx, args)?;
        }
        Some(Commands::Completions(args)) => {
            misc::handle_completions(args)?;
        }
        None => {
            println!("safe {}", VERSION);
            println!("Run `safe --help` for usage.");
        }
    }
    Ok(())
}
