// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workspace environment files (dotenv-style).
//!
//! Read at spawn time to build the child's environment, and edited through
//! the host's env operations.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Parse a dotenv-style file into key-value pairs. Later lines override
/// earlier ones. Returns an empty map if the file doesn't exist; invalid
/// UTF-8 is decoded lossily.
pub fn read_env_file(path: &Path) -> std::io::Result<BTreeMap<String, String>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e),
    };
    Ok(parse_env(&String::from_utf8_lossy(&bytes)))
}

/// Parse dotenv content string into key-value pairs.
pub(crate) fn parse_env(content: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                map.insert(key.to_string(), unquote(value.trim()).to_string());
            }
        }
    }
    map
}

/// Strip one layer of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Quote values that would not survive [`parse_env`] unchanged.
fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value != value.trim()
        || (value.len() >= 2
            && ['"', '\''].iter().any(|q| value.starts_with(*q) && value.ends_with(*q)));
    if needs_quotes {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// Write a BTreeMap back to a dotenv-style file, one sorted `KEY=VALUE` per
/// line. Creates parent directories if needed. Removes the file if the map
/// is empty.
pub fn write_env_file(path: &Path, vars: &BTreeMap<String, String>) -> std::io::Result<()> {
    if vars.is_empty() {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    } else {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content: String = vars
            .iter()
            .map(|(k, v)| format!("{k}={}", quote_if_needed(v)))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(path, content + "\n")
    }
}

/// Append raw text to the env file, starting on a fresh line.
pub fn append_env_line(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let needs_newline = match std::fs::read(path) {
        Ok(existing) => existing.last().is_some_and(|b| *b != b'\n'),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(e),
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    if needs_newline {
        file.write_all(b"\n")?;
    }
    file.write_all(text.trim_end_matches('\n').as_bytes())?;
    file.write_all(b"\n")
}

/// The environment a target runs with: the daemon's own environment
/// overlaid with the target's env file. The file always wins.
pub fn build_env(env_file: &Path) -> std::io::Result<BTreeMap<String, String>> {
    let inherited = std::env::vars_os().map(|(k, v)| {
        (
            k.to_string_lossy().into_owned(),
            v.to_string_lossy().into_owned(),
        )
    });
    build_env_from(inherited, env_file)
}

pub(crate) fn build_env_from(
    inherited: impl IntoIterator<Item = (String, String)>,
    env_file: &Path,
) -> std::io::Result<BTreeMap<String, String>> {
    let mut env: BTreeMap<String, String> = inherited.into_iter().collect();
    env.extend(read_env_file(env_file)?);
    Ok(env)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
