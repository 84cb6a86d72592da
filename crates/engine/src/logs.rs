// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target output logs.
//!
//! Each target's stdout and stderr are appended to
//! `<uploads_root>/<id with | replaced by _>.log`.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use berth_core::TargetId;

pub const MIN_TAIL_LINES: usize = 10;
pub const MAX_TAIL_LINES: usize = 400;
pub const DEFAULT_TAIL_LINES: usize = 50;

pub const NO_LOG_FILE: &str = "(no log file)";
pub const EMPTY_LOG: &str = "(empty)";

const CHUNK: u64 = 64 * 1024;

pub fn log_path(uploads_root: &Path, id: &TargetId) -> PathBuf {
    uploads_root.join(format!("{}.log", id.file_stem()))
}

/// Last `lines` lines of the target's log, with `lines` clamped to
/// 10..=400. Returns a placeholder string when the log is missing or empty.
pub fn tail(uploads_root: &Path, id: &TargetId, lines: usize) -> std::io::Result<String> {
    let wanted = lines.clamp(MIN_TAIL_LINES, MAX_TAIL_LINES);
    let mut file = match File::open(log_path(uploads_root, id)) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(NO_LOG_FILE.to_string()),
        Err(e) => return Err(e),
    };

    let bytes = read_tail_bytes(&mut file, wanted)?;
    let text = String::from_utf8_lossy(&bytes);
    let all: Vec<&str> = text.lines().collect();
    if all.is_empty() {
        return Ok(EMPTY_LOG.to_string());
    }
    let start = all.len().saturating_sub(wanted);
    Ok(all[start..].join("\n"))
}

/// Read backwards in chunks until the buffer holds more than `lines`
/// newlines or the whole file.
fn read_tail_bytes(file: &mut File, lines: usize) -> std::io::Result<Vec<u8>> {
    let len = file.metadata()?.len();
    let mut pos = len;
    let mut buf: Vec<u8> = Vec::new();
    while pos > 0 {
        let step = CHUNK.min(pos);
        pos -= step;
        file.seek(SeekFrom::Start(pos))?;
        let mut chunk = vec![0; step as usize];
        file.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&buf);
        buf = chunk;
        if buf.iter().filter(|b| **b == b'\n').count() > lines {
            break;
        }
    }
    // Drop a partial first line when we stopped mid-file
    if pos > 0 {
        if let Some(nl) = buf.iter().position(|b| *b == b'\n') {
            buf.drain(..=nl);
        }
    }
    Ok(buf)
}

/// Truncate the target's log. A missing log is left missing.
pub fn clear(uploads_root: &Path, id: &TargetId) -> std::io::Result<()> {
    match std::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(log_path(uploads_root, id))
    {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Append a daemon-authored note to the target's log.
pub fn append(uploads_root: &Path, id: &TargetId, text: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(uploads_root)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path(uploads_root, id))?;
    file.write_all(text.as_bytes())
}

pub fn remove(uploads_root: &Path, id: &TargetId) -> std::io::Result<()> {
    match std::fs::remove_file(log_path(uploads_root, id)) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
