// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Berth Daemon (berthd)
//!
//! Background process that owns every hosted target: it starts and stops
//! them, restarts them when they die, and answers the `berth` CLI.
//!
//! Architecture:
//! - Listener Task: Spawned task handling socket I/O
//! - Watchdog Task: Periodic health check and alerting
//! - Main: waits for a shutdown request or signal

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod lifecycle;
mod listener;
mod protocol;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("berthd {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("berthd {VERSION}");
                println!("Berth Daemon - keeps hosted scripts and repositories running");
                println!();
                println!("USAGE:");
                println!("    berthd");
                println!();
                println!("The daemon is typically started by the `berth` CLI. It listens on a");
                println!("Unix socket for commands from `berth`.");
                println!();
                println!("ENVIRONMENT:");
                println!("    BERTH_OPERATOR_ID    Numeric id of the operator (required)");
                println!("    BERTH_STATE_DIR      State directory (default ~/.local/state/berth)");
                println!("    BERTH_ENABLE_ALERTS  Set to 0 to disable the watchdog");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: berthd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);

    // Before tracing setup, so the CLI can find where this attempt begins
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting daemon");

    let StartupResult {
        mut daemon,
        listener: unix_listener,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            let version = std::fs::read_to_string(&config.version_path)
                .unwrap_or_default()
                .trim()
                .to_string();

            eprintln!("berthd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            if !version.is_empty() {
                if version == VERSION {
                    eprintln!("  version: {version}");
                } else {
                    eprintln!("  version: {version} (outdated, current: {VERSION})");
                }
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Write synchronously; the non-blocking writer may not flush in time
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown_notify = Arc::new(Notify::new());

    let listener = Listener::new(
        unix_listener,
        ListenCtx {
            host: Arc::clone(&daemon.host),
            start_time: daemon.start_time,
            watchdog_enabled: daemon.watchdog_enabled(),
            shutdown: Arc::clone(&shutdown_notify),
        },
    );
    tokio::spawn(listener.run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Daemon ready, listening on {}", config.socket_path.display());

    // Signal ready for parent process (e.g., systemd, CLI waiting for startup)
    println!("READY");

    // Resume after READY so the CLI is not kept waiting on slow starts
    daemon.resume_targets().await;
    daemon.spawn_watchdog();

    tokio::select! {
        _ = shutdown_notify.notified() => info!("Shutdown requested via command"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    daemon.shutdown()?;
    info!("Daemon stopped");
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- berthd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- berthd: starting (pid: ";

/// Rotate the daemon log once it passes this size (10 MiB)
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated copies kept: daemon.log.1 (newest) through daemon.log.3
pub const MAX_ROTATIONS: u32 = 3;

/// Shift `log` to `log.1` (and older copies up by one) when it is too big.
fn rotate_log_if_needed(log: &Path) {
    let Ok(meta) = std::fs::metadata(log) else {
        return;
    };
    if meta.len() <= MAX_LOG_SIZE {
        return;
    }
    let rotated = |n: u32| -> PathBuf {
        let mut name = log.as_os_str().to_owned();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    };
    let _ = std::fs::remove_file(rotated(MAX_ROTATIONS));
    for n in (1..MAX_ROTATIONS).rev() {
        let from = rotated(n);
        if from.exists() {
            let _ = std::fs::rename(&from, rotated(n + 1));
        }
    }
    let _ = std::fs::rename(log, rotated(1));
}

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
