// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WADI - credit-gated streaming text generation.
//!
//! This is the binary entry point: it loads configuration and dispatches to
//! the server or the operator subcommands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod credits;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use wadi_config::WadiConfig;

/// WADI - credit-gated streaming text generation.
#[derive(Parser, Debug)]
#[command(name = "wadi", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP, SSE and WebSocket gateway (default).
    Serve,
    /// Inspect and adjust user credit balances.
    Credits {
        #[command(subcommand)]
        action: CreditsCommand,
    },
    /// Configuration utilities.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CreditsCommand {
    /// Add credits to a user's balance.
    Grant {
        user: String,
        amount: i64,
        #[arg(long, default_value = "grant")]
        reason: String,
    },
    /// Print a user's balance.
    Balance { user: String },
    /// Print a user's recent ledger entries, newest first.
    History {
        user: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate configuration and print the effective settings.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> WadiConfig {
    let loaded = match path {
        Some(path) => wadi_config::load_and_validate_path(path),
        None => wadi_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            wadi_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Credits { action } => match action {
            CreditsCommand::Grant {
                user,
                amount,
                reason,
            } => credits::grant(&config, &user, amount, &reason).await,
            CreditsCommand::Balance { user } => credits::balance(&config, &user).await,
            CreditsCommand::History { user, limit } => {
                credits::history(&config, &user, limit).await
            }
        },
        Commands::Config {
            action: ConfigCommand::Check,
        } => {
            eprintln!("wadi: configuration is valid");
            println!("{config:#?}");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
