// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth admin` - Operator panel

use anyhow::Result;
use berth_core::{TargetId, UserId};
use berth_daemon::{Request, Response};
use berth_engine::{AccessList, AutoStartReport, ProcessStatus};
use clap::{Args, Subcommand};

use super::{require_caller, unexpected};
use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_uptime, print_json, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Count targets and running processes
    Stats,
    /// List running processes
    Running,
    /// List targets that should run but are not
    Down,
    /// Stop every target and clear its desired-running flag
    StopAll,
    /// Start every target marked desired-running
    RestartAll,
    /// Show the operator and the allowed users
    Users,
    /// Allow a user to provision targets
    Allow { user: UserId },
    /// Revoke a user's access
    Deny { user: UserId },
    /// Move the ownership store aside and start empty
    StoreReset {
        /// Required; the store cannot be restored from the CLI
        #[arg(long)]
        yes: bool,
    },
}

impl AdminCommand {
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            AdminCommand::Stats | AdminCommand::Running | AdminCommand::Down | AdminCommand::Users
        )
    }
}

pub async fn handle(
    command: AdminCommand,
    client: &DaemonClient,
    caller: Option<UserId>,
    format: OutputFormat,
) -> Result<()> {
    let caller = require_caller(caller)?;
    match command {
        AdminCommand::Stats => {
            let Response::Stats { stats } = client.call(&Request::Stats { caller }).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text => {
                    println!("Targets: {}", stats.total);
                    println!("Running: {}", stats.running);
                }
                OutputFormat::Json => print_json(&stats)?,
            }
        }
        AdminCommand::Running => {
            let Response::Running { processes } = client.call(&Request::ListRunning { caller }).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text if processes.is_empty() => println!("Nothing running"),
                OutputFormat::Text => running_table(&processes).print(),
                OutputFormat::Json => print_json(&processes)?,
            }
        }
        AdminCommand::Down => {
            let Response::Down { ids } = client.call(&Request::ListDown { caller }).await? else {
                return Err(unexpected());
            };
            print_ids(&ids, "Every desired target is running", format)?;
        }
        AdminCommand::StopAll => {
            let Response::Stopped { ids } = client.call(&Request::StopAll { caller }).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text => println!("Stopped {} target(s)", ids.len()),
                OutputFormat::Json => print_json(&ids)?,
            }
        }
        AdminCommand::RestartAll => {
            let Response::AutoStarted { report } = client.call(&Request::RestartAll { caller }).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text => print!("{}", restart_summary(&report)),
                OutputFormat::Json => print_json(&report)?,
            }
        }
        AdminCommand::Users => {
            let Response::Access { access } = client.call(&Request::AccessList { caller }).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text => print!("{}", render_access(&access)),
                OutputFormat::Json => print_json(&access)?,
            }
        }
        AdminCommand::Allow { user } => {
            let request = Request::AccessAdd { caller, user };
            let Response::AccessChanged { changed } = client.call(&request).await? else {
                return Err(unexpected());
            };
            print_changed(changed, &format!("Allowed {user}"), &format!("{user} was already allowed"), format)?;
        }
        AdminCommand::Deny { user } => {
            let request = Request::AccessRemove { caller, user };
            let Response::AccessChanged { changed } = client.call(&request).await? else {
                return Err(unexpected());
            };
            print_changed(changed, &format!("Denied {user}"), &format!("{user} was not allowed"), format)?;
        }
        AdminCommand::StoreReset { yes } => {
            if !yes {
                anyhow::bail!("store-reset discards every ownership record; pass --yes to confirm");
            }
            let Response::StoreReset { backup } = client.call(&Request::StoreReset { caller }).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text => match backup {
                    Some(path) => println!("Store reset; previous store moved to {}", path.display()),
                    None => println!("Store reset; there was no previous store"),
                },
                OutputFormat::Json => print_json(&serde_json::json!({ "backup": backup }))?,
            }
        }
    }
    Ok(())
}

fn print_ids(ids: &[TargetId], empty: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text if ids.is_empty() => println!("{empty}"),
        OutputFormat::Text => {
            for id in ids {
                println!("{} {}", color::status("down"), id);
            }
        }
        OutputFormat::Json => print_json(ids)?,
    }
    Ok(())
}

fn print_changed(changed: bool, yes: &str, no: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text if changed => println!("{}", color::green(yes)),
        OutputFormat::Text => println!("{}", color::yellow(no)),
        OutputFormat::Json => print_json(&serde_json::json!({ "changed": changed }))?,
    }
    Ok(())
}

fn running_table(processes: &[ProcessStatus]) -> Table {
    let mut table = Table::new(vec![
        Column::left("ID").with_max(48),
        Column::right("PID"),
        Column::right("UPTIME"),
        Column::muted("COMMAND").with_max(60),
    ]);
    for process in processes {
        table.row(vec![
            process.id.to_string(),
            process.pid.to_string(),
            format_uptime(process.uptime_secs),
            process.command.clone(),
        ]);
    }
    table
}

fn restart_summary(report: &AutoStartReport) -> String {
    let mut out = format!("Started {} target(s)\n", report.started.len());
    for (id, error) in &report.failed {
        out.push_str(&format!("failed {id}: {error}\n"));
    }
    out
}

fn render_access(access: &AccessList) -> String {
    let mut out = format!("operator {}\n", access.operator);
    for user in &access.allowed {
        out.push_str(&format!("allowed  {user}\n"));
    }
    out
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
