// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! berth - command line client for the berth hosting daemon

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod color;
mod commands;
mod daemon_process;
mod env;
mod output;
mod table;

use anyhow::{anyhow, Result};
use berth_core::UserId;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use crate::client::DaemonClient;
use crate::commands::{admin, daemon, env as env_cmd, provision, target};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "berth",
    version,
    about = "berth - keep hosted scripts and repositories running"
)]
pub(crate) struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    /// Act as this user id (default: $BERTH_USER)
    #[arg(long = "as", value_name = "UID", global = true)]
    caller: Option<UserId>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Daemon management
    Daemon(daemon::DaemonArgs),
    /// Start, stop and inspect targets
    Target(target::TargetArgs),
    /// Register a single script
    Upload(provision::UploadArgs),
    /// Clone a git repository as a new workspace
    Clone(provision::CloneArgs),
    /// Choose the entry file of a cloned repository
    Select(provision::SelectArgs),
    /// Install a workspace's Python and Node dependencies
    Install(provision::InstallArgs),
    /// Per-target environment variables
    Env(env_cmd::EnvArgs),
    /// Operator panel
    Admin(admin::AdminArgs),
}

/// The clap command with the berth help palette applied.
pub(crate) fn cli_command() -> clap::Command {
    Cli::command().styles(color::styles())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(1);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// When the top-level message already contains every source message (common
/// with `#[error("... {0}")]` plus `#[from]`), the chain is dropped.
/// Otherwise it is rendered like anyhow's Debug output.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

/// `--as` wins over `BERTH_USER`; a malformed `BERTH_USER` is an error
/// rather than silently acting as nobody.
fn resolve_caller(explicit: Option<UserId>, from_env: Option<String>) -> Result<Option<UserId>> {
    if explicit.is_some() {
        return Ok(explicit);
    }
    match from_env {
        Some(raw) => raw
            .parse::<UserId>()
            .map(Some)
            .map_err(|_| anyhow!("BERTH_USER is not a numeric user id: {raw:?}")),
        None => Ok(None),
    }
}

/// Read-only commands connect without starting or restarting the daemon.
fn client_for(query: bool) -> Result<DaemonClient> {
    let client = if query {
        DaemonClient::for_query()?
    } else {
        DaemonClient::for_action()?
    };
    Ok(client)
}

async fn run() -> Result<()> {
    let matches = cli_command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let format = cli.output;

    let Some(command) = cli.command else {
        cli_command().print_help()?;
        println!();
        return Ok(());
    };

    // Daemon management does not need a connection up front
    if let Commands::Daemon(args) = command {
        return daemon::daemon(args, format).await;
    }

    let caller = resolve_caller(cli.caller, crate::env::user())?;

    match command {
        Commands::Target(args) => {
            let client = client_for(args.command.is_query())?;
            target::handle(args.command, &client, caller, format).await?
        }
        Commands::Upload(args) => {
            let client = client_for(false)?;
            provision::upload(args, &client, caller, format).await?
        }
        Commands::Clone(args) => {
            let client = client_for(false)?;
            provision::clone(args, &client, caller, format).await?
        }
        Commands::Select(args) => {
            let client = client_for(false)?;
            provision::select(args, &client, caller, format).await?
        }
        Commands::Install(args) => {
            let client = client_for(false)?;
            provision::install(args, &client, caller, format).await?
        }
        Commands::Env(args) => {
            let client = client_for(args.command.is_query())?;
            env_cmd::handle(args.command, &client, caller, format).await?
        }
        Commands::Admin(args) => {
            let client = client_for(args.command.is_query())?;
            admin::handle(args.command, &client, caller, format).await?
        }
        Commands::Daemon(args) => daemon::daemon(args, format).await?,
    }

    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
