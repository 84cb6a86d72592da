// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth env` - Per-target environment variables

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use berth_core::{TargetId, UserId};
use berth_daemon::{Request, Response};
use clap::{Args, Subcommand};

use super::{require_caller, unexpected};
use crate::client::DaemonClient;
use crate::output::{print_ack, print_json, OutputFormat};

#[derive(Args)]
pub struct EnvArgs {
    #[command(subcommand)]
    pub command: EnvCommand,
}

#[derive(Subcommand)]
pub enum EnvCommand {
    /// Show a target's variables
    List { id: String },
    /// Set one variable (KEY=VALUE or KEY VALUE)
    Set {
        id: String,
        key: String,
        value: Option<String>,
    },
    /// Remove one variable
    Unset { id: String, key: String },
    /// Append raw KEY=VALUE lines from a file or stdin
    Append {
        id: String,
        /// File with KEY=VALUE lines (default: stdin)
        #[arg(long)]
        from: Option<std::path::PathBuf>,
    },
}

impl EnvCommand {
    pub fn is_query(&self) -> bool {
        matches!(self, EnvCommand::List { .. })
    }
}

pub async fn handle(
    command: EnvCommand,
    client: &DaemonClient,
    caller: Option<UserId>,
    format: OutputFormat,
) -> Result<()> {
    let caller = require_caller(caller)?;
    match command {
        EnvCommand::List { id } => {
            let request = Request::EnvGet {
                caller,
                id: TargetId::new(id),
            };
            let Response::Env { vars } = client.call(&request).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text if vars.is_empty() => println!("No variables"),
                OutputFormat::Text => print!("{}", render_vars(&vars)),
                OutputFormat::Json => print_json(&vars)?,
            }
        }
        EnvCommand::Set { id, key, value } => {
            let (key, value) = split_assignment(&key, value)?;
            client
                .send_simple(&Request::EnvSet {
                    caller,
                    id: TargetId::new(id),
                    key: key.clone(),
                    value,
                })
                .await?;
            print_ack(format, &format!("Set {key}"))?;
        }
        EnvCommand::Unset { id, key } => {
            let request = Request::EnvUnset {
                caller,
                id: TargetId::new(id),
                key: key.clone(),
            };
            let Response::EnvUnset { existed } = client.call(&request).await? else {
                return Err(unexpected());
            };
            match format {
                OutputFormat::Text if existed => println!("Removed {key}"),
                OutputFormat::Text => println!("{key} was not set"),
                OutputFormat::Json => print_json(&serde_json::json!({ "existed": existed }))?,
            }
        }
        EnvCommand::Append { id, from } => {
            let text = match from {
                Some(path) => std::fs::read_to_string(&path)
                    .map_err(|e| anyhow!("cannot read {}: {e}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            client
                .send_simple(&Request::EnvAppend {
                    caller,
                    id: TargetId::new(id),
                    text,
                })
                .await?;
            print_ack(format, "Appended")?;
        }
    }
    Ok(())
}

/// Accept both `KEY VALUE` and `KEY=VALUE`.
fn split_assignment(key: &str, value: Option<String>) -> Result<(String, String)> {
    match value {
        Some(value) => Ok((key.to_string(), value)),
        None => key
            .split_once('=')
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .ok_or_else(|| anyhow!("expected KEY=VALUE or KEY VALUE")),
    }
}

fn render_vars(vars: &BTreeMap<String, String>) -> String {
    vars.iter().map(|(k, v)| format!("{k}={v}\n")).collect()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
