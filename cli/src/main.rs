// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Launchpad CLI
//!
//! The `launchpad` binary is both ends of a deployment:
//!
//! - `launchpad config <api-key> <server-url>` - Save credentials
//! - `launchpad [<server-url>]` - Pack the current directory and upload it
//! - `launchpad deploy [<server-url>] [--dir <path>]` - Same, explicit form
//! - `launchpad agent --api-key <key>` - Run the receiving agent

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use launchpad_cli::commands::{self, AgentArgs, DeployArgs};

/// Launchpad - push a directory, run its DEPLOY.sh on the other side
#[derive(Parser)]
#[command(name = "launchpad")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LAUNCHPAD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Agent URL to deploy the current directory to
    #[arg(value_name = "SERVER_URL")]
    server_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save the API key and default agent URL
    #[command(name = "config")]
    Config {
        /// Key the agent was started with
        api_key: String,
        /// Agent base URL, e.g. http://host:9999
        server_url: String,
    },

    /// Pack a directory and upload it to an agent
    #[command(name = "deploy")]
    Deploy(DeployArgs),

    /// Run the receiving agent
    #[command(name = "agent")]
    Agent(AgentArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Config { api_key, server_url }) => {
            commands::config::handle_command(api_key, server_url).await
        }
        Some(Commands::Deploy(args)) => commands::deploy::handle_command(args).await,
        Some(Commands::Agent(args)) => commands::agent::handle_command(args).await,
        None => {
            commands::deploy::handle_command(DeployArgs {
                server_url: cli.server_url,
                dir: PathBuf::from("."),
            })
            .await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
