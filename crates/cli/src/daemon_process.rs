// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management utilities.
//!
//! Locating, spawning, signalling and cleaning up after `berthd`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::client::ClientError;

const DAEMON_BINARY: &str = "berthd";

/// Startup marker prefix that daemon writes to log before anything else.
const STARTUP_MARKER_PREFIX: &str = "--- berthd: starting (pid: ";

/// Start the daemon in the background, returning the child process handle
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let path = find_daemon_binary();

    Command::new(&path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {e}", path.display())))
}

/// Wait for a process to exit
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(crate::client::poll_interval()).await;
    }
    false
}

/// Find the daemon binary: explicit override, dev build, sibling, then PATH
fn find_daemon_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().ok();

    // Dev builds only; a release CLI must not pick up a debug daemon
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .is_some_and(|s| s.contains("target/debug"));
    if is_debug_build {
        if let Some(manifest_dir) = crate::env::cargo_manifest_dir() {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug").join(DAEMON_BINARY));
            if let Some(path) = dev_path.filter(|p| p.exists()) {
                return path;
            }
        }
    }

    if let Some(sibling) = current_exe
        .as_ref()
        .and_then(|exe| exe.parent())
        .map(|dir| dir.join(DAEMON_BINARY))
        .filter(|p| p.exists())
    {
        return sibling;
    }

    PathBuf::from(DAEMON_BINARY)
}

/// Get the state directory of the daemon.
pub fn daemon_dir() -> Result<PathBuf, ClientError> {
    crate::env::state_dir()
}

pub fn daemon_socket() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.sock"))
}

pub fn daemon_version_path() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.version"))
}

/// Clean up orphaned PID file during shutdown.
pub fn cleanup_stale_pid(dir: &Path) {
    let pid_path = dir.join("daemon.pid");
    if pid_path.exists() {
        let _ = std::fs::remove_file(&pid_path);
    }
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid() -> Result<Option<u32>, ClientError> {
    let pid_path = daemon_dir()?.join("daemon.pid");
    Ok(std::fs::read_to_string(pid_path)
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok()))
}

fn send_signal(pid: u32, signal: Option<Signal>) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    kill(Pid::from_raw(raw), signal).is_ok()
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    send_signal(pid, None)
}

pub fn terminate_daemon(pid: u32) -> bool {
    send_signal(pid, Some(Signal::SIGTERM))
}

/// Force kill a daemon process
pub fn force_kill_daemon(pid: u32) -> bool {
    send_signal(pid, Some(Signal::SIGKILL))
}

/// Read daemon log from the last startup marker, looking for errors.
pub fn read_startup_error() -> Option<String> {
    let log_path = daemon_dir().ok()?.join("daemon.log");
    let content = std::fs::read_to_string(log_path).ok()?;
    parse_startup_error(&content)
}

/// Errors logged since the most recent startup marker.
fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let errors: Vec<&str> = content[start_pos..]
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg))
        .collect();

    if messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(messages.join("\n"))
    }
}

/// Wrap an error with startup log info if available.
pub fn wrap_with_startup_error(err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }
    match read_startup_error() {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Remove stale socket and PID files when the daemon is not running.
///
/// Called when the socket file exists but refuses connections. Files of a
/// live daemon are left alone.
pub fn cleanup_stale_socket() -> Result<(), ClientError> {
    let dir = daemon_dir()?;
    let socket_path = dir.join("daemon.sock");
    let pid_path = dir.join("daemon.pid");

    let daemon_alive = read_daemon_pid()?.is_some_and(process_exists);
    if !daemon_alive {
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&pid_path);
    }
    Ok(())
}

/// Stop the daemon synchronously using SIGTERM + polling, then SIGKILL.
///
/// Used for a version-mismatch restart, which runs before any request.
pub fn stop_daemon_sync() {
    if let Ok(Some(pid)) = read_daemon_pid() {
        let timeout = crate::client::timeout_exit();
        terminate_daemon(pid);
        if !poll_exit_sync(pid, timeout) {
            force_kill_daemon(pid);
            poll_exit_sync(pid, timeout);
        }
    }

    if let Ok(dir) = daemon_dir() {
        cleanup_stale_pid(&dir);
    }
}

fn poll_exit_sync(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    !process_exists(pid)
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
