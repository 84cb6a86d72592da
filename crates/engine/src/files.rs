// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace file listing and access.
//!
//! Callers pass relative paths from untrusted clients; every access goes
//! through [`resolve_within`] first.

use std::path::Path;

use berth_core::resolve_within;

use crate::HostError;

/// Default cap on listed files.
pub const MAX_LISTED_FILES: usize = 400;

/// Largest file [`read_file`] returns.
pub const MAX_READ_BYTES: u64 = 2 * 1024 * 1024;

const SKIPPED_DIRS: [&str; 2] = [".git", "node_modules"];

/// Recursive listing of regular files under `work_dir`: relative
/// `/`-joined paths, sorted, at most `cap` entries. Skips `.git/` and
/// `node_modules/` subtrees, `.pyc` files, and symlinks. A missing
/// directory lists as empty.
pub fn list_files(work_dir: &Path, cap: usize) -> Vec<String> {
    let mut out = Vec::new();
    walk(work_dir, "", cap, &mut out);
    out.sort();
    out
}

fn walk(dir: &Path, prefix: &str, cap: usize, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if out.len() >= cap {
            return;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        if file_type.is_dir() {
            if !SKIPPED_DIRS.contains(&name.as_str()) {
                walk(&entry.path(), &rel, cap, out);
            }
        } else if file_type.is_file() && !name.ends_with(".pyc") {
            out.push(rel);
        }
    }
}

/// Files the detector would accept as an entry point.
pub fn is_runnable(rel: &str) -> bool {
    [".py", ".js", ".sh"].iter().any(|ext| rel.ends_with(ext))
}

pub fn read_file(work_dir: &Path, rel: &str) -> Result<Vec<u8>, HostError> {
    let path = resolve_within(work_dir, rel)?;
    let meta = match std::fs::metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HostError::NotFound(rel.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if !meta.is_file() {
        return Err(HostError::NotFound(rel.to_string()));
    }
    if meta.len() > MAX_READ_BYTES {
        return Err(HostError::Invalid(format!(
            "{rel} is {} bytes, larger than the {MAX_READ_BYTES} byte limit",
            meta.len()
        )));
    }
    Ok(std::fs::read(&path)?)
}

/// Write `bytes` to `rel` under `work_dir`, creating parent directories.
pub fn write_file(work_dir: &Path, rel: &str, bytes: &[u8]) -> Result<(), HostError> {
    let path = resolve_within(work_dir, rel)?;
    if path == work_dir {
        return Err(HostError::Invalid(format!("{rel} is the workspace itself")));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, bytes)?;
    Ok(())
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
