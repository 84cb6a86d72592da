// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth daemon` - Daemon management commands

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::{daemon_stop, ClientError, DaemonClient, DaemonStatus};
use crate::daemon_process::daemon_dir;
use crate::output::{display_log, format_uptime, print_json, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop the daemon; targets resume on the next start
    Stop {
        /// Also stop every target so nothing resumes on the next start
        #[arg(long)]
        stop_targets: bool,
    },
    /// Stop and start the daemon
    Restart,
    /// Check daemon status
    Status,
    /// View the daemon log
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Follow log output
        #[arg(long, short)]
        follow: bool,
    },
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop { stop_targets } => stop(stop_targets).await,
        DaemonCommand::Restart => restart().await,
        DaemonCommand::Status => status(format).await,
        DaemonCommand::Logs { limit, follow } => logs(limit, follow, format).await,
    }
}

async fn start() -> Result<()> {
    if let Ok(client) = DaemonClient::connect() {
        if let Ok(status) = client.status().await {
            println!(
                "Daemon already running (uptime: {})",
                format_uptime(status.uptime_secs)
            );
            return Ok(());
        }
    }

    DaemonClient::for_action().map_err(|e| anyhow!("{}", e))?;
    println!("Daemon started");
    Ok(())
}

async fn stop(stop_targets: bool) -> Result<()> {
    match daemon_stop(stop_targets).await {
        Ok(true) => {
            println!("Daemon stopped");
            Ok(())
        }
        Ok(false) => {
            println!("Daemon not running");
            Ok(())
        }
        Err(e) => Err(anyhow!("Failed to stop daemon: {}", e)),
    }
}

async fn restart() -> Result<()> {
    let was_running = daemon_stop(false)
        .await
        .map_err(|e| anyhow!("Failed to stop daemon: {}", e))?;

    if was_running {
        // Grace period for the OS to release the socket
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    DaemonClient::for_action().map_err(|e| anyhow!("{}", e))?;
    println!("Daemon restarted");
    Ok(())
}

async fn status(format: OutputFormat) -> Result<()> {
    let not_running = || -> Result<()> {
        match format {
            OutputFormat::Text => println!("Daemon not running"),
            OutputFormat::Json => print_json(&serde_json::json!({ "status": "not_running" }))?,
        }
        Ok(())
    };

    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => return not_running(),
    };

    // A socket file can outlive its daemon
    let status = match client.status().await {
        Ok(status) => status,
        Err(ClientError::DaemonNotRunning) => return not_running(),
        Err(ClientError::Io(ref e))
            if matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ) =>
        {
            return not_running();
        }
        Err(e) => return Err(anyhow!("{}", e)),
    };
    let version = client
        .hello()
        .await
        .unwrap_or_else(|_| "unknown".to_string());

    match format {
        OutputFormat::Text => print!("{}", render_status(&status, &version)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": "running",
            "version": version,
            "uptime_secs": status.uptime_secs,
            "uptime": format_uptime(status.uptime_secs),
            "targets_total": status.targets_total,
            "targets_running": status.targets_running,
            "watchdog_enabled": status.watchdog_enabled,
            "uploads_root": status.uploads_root,
        }))?,
    }

    Ok(())
}

fn render_status(status: &DaemonStatus, version: &str) -> String {
    format!(
        "Status: running\nVersion: {}\nUptime: {}\nTargets: {} ({} running)\nWatchdog: {}\nUploads: {}\n",
        version,
        format_uptime(status.uptime_secs),
        status.targets_total,
        status.targets_running,
        if status.watchdog_enabled { "on" } else { "off" },
        status.uploads_root.display(),
    )
}

async fn logs(limit: usize, follow: bool, format: OutputFormat) -> Result<()> {
    let log_path = daemon_dir()?.join("daemon.log");

    if !log_path.exists() {
        match format {
            OutputFormat::Text => println!("No log file found at {}", log_path.display()),
            OutputFormat::Json => print_json(&serde_json::json!({
                "log_path": log_path.to_string_lossy(),
                "lines": [],
            }))?,
        }
        return Ok(());
    }

    let content = read_last_lines(&log_path, limit)?;
    display_log(&log_path, &content, follow, format, "daemon").await
}

fn read_last_lines(path: &Path, n: usize) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
