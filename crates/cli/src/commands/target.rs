// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth target` - Per-target lifecycle, logs and files

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Result;
use berth_core::{TargetId, UserId};
use berth_daemon::{Request, Response};
use berth_engine::{StartOutcome, TargetSummary};
use clap::{Args, Subcommand};

use super::{require_caller, unexpected};
use crate::client::DaemonClient;
use crate::output::{display_log, print_ack, print_json, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct TargetArgs {
    #[command(subcommand)]
    pub command: TargetCommand,
}

#[derive(Subcommand)]
pub enum TargetCommand {
    /// List targets (the operator sees every target)
    List,
    /// Show whether a target is running, using its access key
    Status {
        id: String,
        /// Access key returned by upload, clone or select
        #[arg(long)]
        key: String,
    },
    /// Start a target
    Start { id: String },
    /// Stop a target and keep it stopped
    Stop { id: String },
    /// Stop then start a target
    Restart { id: String },
    /// Stop a target and remove its files and record
    Delete { id: String },
    /// Show the tail of a target's log
    Logs {
        id: String,
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "100")]
        lines: usize,
        /// Keep printing new output
        #[arg(long, short)]
        follow: bool,
    },
    /// Truncate a target's log
    ClearLogs { id: String },
    /// List files in a target's workspace
    Files { id: String },
    /// Print a workspace file
    Cat { id: String, path: String },
    /// Write a workspace file from a local file or stdin
    Put {
        id: String,
        /// Path inside the workspace
        path: String,
        /// Local file to upload (default: stdin)
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

impl TargetCommand {
    /// Commands that only read state connect without auto-starting.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            TargetCommand::List
                | TargetCommand::Status { .. }
                | TargetCommand::Logs { .. }
                | TargetCommand::Files { .. }
                | TargetCommand::Cat { .. }
        )
    }
}

pub async fn handle(
    command: TargetCommand,
    client: &DaemonClient,
    caller: Option<UserId>,
    format: OutputFormat,
) -> Result<()> {
    match command {
        TargetCommand::List => {
            let caller = require_caller(caller)?;
            let Response::Targets { targets } = client.call(&Request::ListTargets { caller }).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text if targets.is_empty() => println!("No targets"),
                OutputFormat::Text => targets_table(&targets).print(),
                OutputFormat::Json => print_json(&targets)?,
            }
        }
        TargetCommand::Status { id, key } => {
            let id = TargetId::new(id);
            let request = Request::TargetStatus {
                id: id.clone(),
                key,
            };
            let Response::TargetState { state } = client.call(&request).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text => println!("{}: {}", id, crate::color::status(&state.to_string())),
                OutputFormat::Json => print_json(&serde_json::json!({ "id": id, "state": state }))?,
            }
        }
        TargetCommand::Start { id } => {
            let caller = require_caller(caller)?;
            let id = TargetId::new(id);
            let request = Request::Start {
                caller,
                id: id.clone(),
            };
            let Response::Started { outcome } = client.call(&request).await? else {
                return Err(unexpected());
            };
            print_started(&id, &outcome, format)?;
        }
        TargetCommand::Restart { id } => {
            let caller = require_caller(caller)?;
            let id = TargetId::new(id);
            let request = Request::Restart {
                caller,
                id: id.clone(),
            };
            let Response::Started { outcome } = client.call(&request).await? else {
                return Err(unexpected());
            };
            print_started(&id, &outcome, format)?;
        }
        TargetCommand::Stop { id } => {
            let caller = require_caller(caller)?;
            let id = TargetId::new(id);
            client
                .send_simple(&Request::Stop {
                    caller,
                    id: id.clone(),
                })
                .await?;
            print_ack(format, &format!("Stopped {id}"))?;
        }
        TargetCommand::Delete { id } => {
            let caller = require_caller(caller)?;
            let id = TargetId::new(id);
            client
                .send_simple(&Request::Delete {
                    caller,
                    id: id.clone(),
                })
                .await?;
            print_ack(format, &format!("Deleted {id}"))?;
        }
        TargetCommand::Logs { id, lines, follow } => {
            let caller = require_caller(caller)?;
            let id = TargetId::new(id);
            let request = Request::Logs {
                caller,
                id: id.clone(),
                lines,
            };
            let Response::Logs { log_path, content } = client.call(&request).await? else {
                return Err(unexpected());
            };
            display_log(&log_path, &content, follow, format, id.as_str()).await?;
        }
        TargetCommand::ClearLogs { id } => {
            let caller = require_caller(caller)?;
            let id = TargetId::new(id);
            client
                .send_simple(&Request::ClearLogs {
                    caller,
                    id: id.clone(),
                })
                .await?;
            print_ack(format, &format!("Cleared logs of {id}"))?;
        }
        TargetCommand::Files { id } => {
            let caller = require_caller(caller)?;
            let request = Request::ListFiles {
                caller,
                id: TargetId::new(id),
            };
            let Response::Files { files } = client.call(&request).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text => {
                    for file in &files {
                        println!("{file}");
                    }
                }
                OutputFormat::Json => print_json(&files)?,
            }
        }
        TargetCommand::Cat { id, path } => {
            let caller = require_caller(caller)?;
            let request = Request::ReadFile {
                caller,
                id: TargetId::new(id),
                path: path.clone(),
            };
            let Response::FileContent { content } = client.call(&request).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text => std::io::stdout().lock().write_all(&content)?,
                OutputFormat::Json => print_json(&serde_json::json!({
                    "path": path,
                    "content": String::from_utf8_lossy(&content),
                }))?,
            }
        }
        TargetCommand::Put { id, path, from } => {
            let caller = require_caller(caller)?;
            let content = match from {
                Some(local) => std::fs::read(&local)
                    .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", local.display()))?,
                None => {
                    let mut buf = Vec::new();
                    std::io::stdin().lock().read_to_end(&mut buf)?;
                    buf
                }
            };
            let size = content.len();
            client
                .send_simple(&Request::WriteFile {
                    caller,
                    id: TargetId::new(id),
                    path: path.clone(),
                    content,
                })
                .await?;
            print_ack(format, &format!("Wrote {size} bytes to {path}"))?;
        }
    }
    Ok(())
}

fn print_started(id: &TargetId, outcome: &StartOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if let Some(chosen) = &outcome.chosen {
                println!("Entry: {chosen}");
            }
            println!(
                "{} {} (pid {}): {}",
                crate::color::status("started"),
                id,
                outcome.pid,
                outcome.command
            );
        }
        OutputFormat::Json => print_json(outcome)?,
    }
    Ok(())
}

/// Display state: running, down (should run but is not), or stopped.
pub(crate) fn state_label(target: &TargetSummary) -> &'static str {
    match (target.running, target.desired_running) {
        (true, _) => "running",
        (false, true) => "down",
        (false, false) => "stopped",
    }
}

pub(crate) fn targets_table(targets: &[TargetSummary]) -> Table {
    let mut table = Table::new(vec![
        Column::left("ID").with_max(48),
        Column::right("OWNER"),
        Column::muted("KIND"),
        Column::status("STATE"),
        Column::right("PID"),
        Column::left("ENTRY"),
    ]);
    for target in targets {
        table.row(vec![
            target.id.to_string(),
            target.owner.to_string(),
            target.kind.clone(),
            state_label(target).to_string(),
            target.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            target.entry.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
