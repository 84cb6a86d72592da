// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format an uptime in seconds (e.g., "5s", "2m", "1h", "3d")
pub fn format_uptime(secs: u64) -> String {
    berth_core::format_elapsed(secs)
}

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a `done` line in text mode, or `{"ok": true, ...}` in JSON mode.
pub fn print_ack(format: OutputFormat, text: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{text}"),
        OutputFormat::Json => print_json(&serde_json::json!({ "ok": true }))?,
    }
    Ok(())
}

/// Display log content with optional follow mode, handling text/json output.
pub async fn display_log(
    log_path: &Path,
    content: &str,
    follow: bool,
    format: OutputFormat,
    id: &str,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if !content.is_empty() {
                print!("{}", content);
                if !content.ends_with('\n') {
                    println!();
                }
            } else {
                eprintln!("No log output for {}", id);
                if !follow {
                    return Ok(());
                }
            }

            if follow {
                tail_file(log_path).await?;
            }
        }
        OutputFormat::Json => {
            print_json(&log_json(log_path, content))?;
            if follow {
                eprintln!("warning: --follow is not supported with --output json");
            }
        }
    }
    Ok(())
}

fn log_json(log_path: &Path, content: &str) -> serde_json::Value {
    serde_json::json!({
        "log_path": log_path.to_string_lossy(),
        "lines": content.lines().collect::<Vec<_>>(),
    })
}

/// Tail a file, printing new lines as they appear, until ctrl-c.
pub async fn tail_file(path: &Path) -> anyhow::Result<()> {
    use notify::{Event, EventKind, RecursiveMode, Watcher};
    use std::io::{BufRead, BufReader, Seek, SeekFrom};

    let mut file = std::fs::File::open(path)
        .map_err(|_| anyhow::anyhow!("Log file not found: {}", path.display()))?;
    // The tail was already printed
    file.seek(SeekFrom::End(0))?;
    let mut reader = BufReader::new(file);

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_)) {
                let _ = tx.blocking_send(());
            }
        }
    })?;
    let watch_dir = path.parent().unwrap_or(path);
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            print!("{}", line);
            line.clear();
        }

        tokio::select! {
            _ = rx.recv() => {}
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}
