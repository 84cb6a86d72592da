// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-command detection.
//!
//! Decides how to launch a workspace, in order of precedence:
//! 1. `npm start` when `package.json` defines `scripts.start` and the
//!    explicit entry (if any) is a `.js` file
//! 2. the explicit entry, by extension
//! 3. the first well-known entry file that exists
//! 4. the first `.py`, `.js`, or `.sh` file in the sorted workspace listing

use std::path::Path;

use thiserror::Error;

use crate::files::{is_runnable, list_files, MAX_LISTED_FILES};

/// Entry files tried in order when no explicit entry is given.
pub const CANDIDATES: [&str; 7] = [
    "main.py",
    "app.py",
    "server.py",
    "bot.py",
    "index.js",
    "server.js",
    "start.sh",
];

/// How to launch a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Runner {
    NpmStart,
    Node(String),
    Bash(String),
    Python(String),
}

impl Runner {
    /// Choose an interpreter by the extension after the last `.`,
    /// case-insensitively. Anything unrecognized runs under Python.
    pub fn for_entry(rel: &str) -> Self {
        let ext = rel.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
        match ext.as_str() {
            "js" => Runner::Node(rel.to_string()),
            "sh" => Runner::Bash(rel.to_string()),
            _ => Runner::Python(rel.to_string()),
        }
    }

    /// Argument vector, with `python` naming the Python interpreter.
    pub fn argv(&self, python: &str) -> Vec<String> {
        match self {
            Runner::NpmStart => vec!["npm".into(), "start".into()],
            Runner::Node(p) => vec!["node".into(), p.clone()],
            Runner::Bash(p) => vec!["bash".into(), p.clone()],
            Runner::Python(p) => vec![python.into(), "-u".into(), p.clone()],
        }
    }
}

/// Detection result: the runner and the entry file it runs, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    pub runner: Runner,
    /// `None` for `npm start`
    pub chosen: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no runnable entry found in {0}")]
pub struct NoRunnableEntry(pub String);

pub fn detect(work_dir: &Path, explicit: Option<&str>) -> Result<Detected, NoRunnableEntry> {
    if has_npm_start(work_dir) && explicit.is_none_or(|e| e.ends_with(".js")) {
        return Ok(Detected {
            runner: Runner::NpmStart,
            chosen: None,
        });
    }

    if let Some(entry) = explicit {
        return Ok(detected(entry));
    }

    if let Some(candidate) = CANDIDATES.iter().find(|c| work_dir.join(c).is_file()) {
        return Ok(detected(candidate));
    }

    list_files(work_dir, MAX_LISTED_FILES)
        .into_iter()
        .find(|rel| is_runnable(rel))
        .map(|rel| detected(&rel))
        .ok_or_else(|| NoRunnableEntry(work_dir.display().to_string()))
}

fn detected(entry: &str) -> Detected {
    Detected {
        runner: Runner::for_entry(entry),
        chosen: Some(entry.to_string()),
    }
}

/// A manifest that fails to read or parse counts as absent.
fn has_npm_start(work_dir: &Path) -> bool {
    let Ok(content) = std::fs::read(work_dir.join("package.json")) else {
        return false;
    };
    let Ok(manifest) = serde_json::from_slice::<serde_json::Value>(&content) else {
        tracing::debug!(work_dir = %work_dir.display(), "ignoring unparsable package.json");
        return false;
    };
    manifest
        .get("scripts")
        .and_then(|s| s.get("start"))
        .is_some()
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
