// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `berth upload`, `berth clone`, `berth select`, `berth install`

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use berth_core::{TargetId, UserId};
use berth_daemon::{Request, Response};
use berth_engine::{CloneOutcome, EntrySelection};
use clap::Args;

use super::{require_caller, unexpected};
use crate::client::DaemonClient;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct UploadArgs {
    /// Local .py, .js or .sh file
    pub path: PathBuf,
    /// Name to register instead of the local file name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct CloneArgs {
    /// Git repository URL
    pub url: String,
}

#[derive(Args)]
pub struct SelectArgs {
    /// Placeholder id printed by `berth clone`
    pub placeholder: String,
    /// Entry file, relative to the repository root
    pub file: String,
    /// Start the target right away
    #[arg(long)]
    pub start: bool,
}

#[derive(Args)]
pub struct InstallArgs {
    pub id: String,
}

pub async fn upload(
    args: UploadArgs,
    client: &DaemonClient,
    caller: Option<UserId>,
    format: OutputFormat,
) -> Result<()> {
    let caller = require_caller(caller)?;
    let file_name = upload_name(&args.path, args.name.as_deref())?;
    let content = std::fs::read(&args.path)
        .map_err(|e| anyhow!("cannot read {}: {e}", args.path.display()))?;

    let request = Request::Upload {
        caller,
        file_name,
        content,
    };
    let Response::Uploaded { outcome } = client.call(&request).await? else {
        return Err(unexpected());
    };
    match format {
        OutputFormat::Text => {
            println!("Uploaded {}", outcome.id);
            println!("Key: {}", outcome.key);
        }
        OutputFormat::Json => print_json(&outcome)?,
    }
    Ok(())
}

/// Registered name: the override, or the local file's name.
fn upload_name(path: &Path, name: Option<&str>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name.to_string());
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("cannot take a file name from {}", path.display()))
}

pub async fn clone(
    args: CloneArgs,
    client: &DaemonClient,
    caller: Option<UserId>,
    format: OutputFormat,
) -> Result<()> {
    let caller = require_caller(caller)?;
    let request = Request::Clone {
        caller,
        url: args.url,
    };
    let Response::Cloned { outcome } = client.call(&request).await? else {
        return Err(unexpected());
    };
    match format {
        OutputFormat::Text => print!("{}", clone_summary(&outcome)),
        OutputFormat::Json => print_json(&outcome)?,
    }
    Ok(())
}

fn clone_summary(outcome: &CloneOutcome) -> String {
    let mut out = format!("Cloned {}\nKey: {}\n", outcome.id, outcome.key);
    if outcome.install_started {
        out.push_str("Installing dependencies in the background\n");
    }
    if outcome.runnable.is_empty() {
        out.push_str("No runnable files found\n");
        return out;
    }
    out.push_str("Runnable files:\n");
    for file in &outcome.runnable {
        out.push_str(&format!("  {file}\n"));
    }
    out.push_str(&format!(
        "Choose one with: berth select '{}' <file>\n",
        outcome.id
    ));
    out
}

pub async fn select(
    args: SelectArgs,
    client: &DaemonClient,
    caller: Option<UserId>,
    format: OutputFormat,
) -> Result<()> {
    let caller = require_caller(caller)?;
    let request = Request::SelectEntry {
        caller,
        id: TargetId::new(args.placeholder),
        file: args.file,
        start: args.start,
    };
    let Response::EntrySelected { selection } = client.call(&request).await? else {
        return Err(unexpected());
    };
    match format {
        OutputFormat::Text => print!("{}", selection_summary(&selection)),
        OutputFormat::Json => print_json(&selection)?,
    }
    Ok(())
}

fn selection_summary(selection: &EntrySelection) -> String {
    let mut out = format!("Selected {}\nKey: {}\n", selection.id, selection.key);
    if let Some(started) = &selection.started {
        out.push_str(&format!("Started (pid {}): {}\n", started.pid, started.command));
    }
    out
}

pub async fn install(
    args: InstallArgs,
    client: &DaemonClient,
    caller: Option<UserId>,
    format: OutputFormat,
) -> Result<()> {
    let caller = require_caller(caller)?;
    let request = Request::InstallDeps {
        caller,
        id: TargetId::new(args.id),
    };
    let Response::InstallStarted { started } = client.call(&request).await? else {
        return Err(unexpected());
    };
    match format {
        OutputFormat::Text if started => {
            println!("Dependency install started; results go to the target log")
        }
        OutputFormat::Text => println!("No requirements.txt or package.json found"),
        OutputFormat::Json => print_json(&serde_json::json!({ "started": started }))?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod tests;
