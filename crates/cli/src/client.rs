// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::daemon_process::{
    cleanup_stale_pid, cleanup_stale_socket, daemon_dir, daemon_socket, daemon_version_path,
    force_kill_daemon, probe_socket, process_exists, read_daemon_pid, read_startup_error,
    start_daemon_background, stop_daemon_sync, wait_for_exit, wrap_with_startup_error,
};

use berth_daemon::protocol::{self, ProtocolError};
use berth_daemon::{Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::net::UnixStream;

/// Timeout for ordinary IPC requests
pub fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for requests that clone repositories or walk every target
pub fn timeout_long() -> Duration {
    crate::env::timeout_long_ms().unwrap_or(Duration::from_secs(600))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(2))
}

/// Polling interval for connection retries
pub fn poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For commands that change state: auto-start with version check, at
    /// most one restart per process.
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start_once()
    }

    /// For read-only commands: connect only, no restart.
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    fn connect_or_start_once() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        if RESTARTED.load(Ordering::SeqCst) {
            return Self::connect();
        }

        if let Ok(daemon_version) = std::fs::read_to_string(daemon_version_path()?) {
            if daemon_version.trim() != PROTOCOL_VERSION {
                RESTARTED.store(true, Ordering::SeqCst);
                eprintln!(
                    "warn: daemon version {} does not match cli version {}, restarting daemon",
                    daemon_version.trim(),
                    PROTOCOL_VERSION
                );
                stop_daemon_sync();
            }
        }

        match Self::connect() {
            Ok(client) => {
                // A crashed daemon leaves its socket file behind
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Ok(Some(status)) = child.try_wait() {
                // Exited during startup; the log may lag behind the exit
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = read_startup_error() {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    std::thread::sleep(poll_interval());
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect() {
                Ok(client) if probe_socket(&client.socket_path) => return Ok(client),
                Ok(_) | Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::send(&mut writer, request, write_timeout).await?;
        Ok(protocol::recv(&mut reader, read_timeout).await?)
    }

    /// Send a request and receive the raw response
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let read_timeout = if request.is_long_running() {
            timeout_long()
        } else {
            timeout_ipc()
        };
        match self
            .send_with_timeout(request, read_timeout, timeout_ipc())
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&e);
                Err(e)
            }
        }
    }

    /// Send a request, turning an error response into `Rejected`
    pub async fn call(&self, request: &Request) -> Result<Response, ClientError> {
        into_result(self.send(request).await?)
    }

    /// Send a request that answers with a bare `Ok`
    pub async fn send_simple(&self, request: &Request) -> Result<(), ClientError> {
        match self.call(request).await? {
            Response::Ok => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.call(&Request::Status).await? {
            Response::Status {
                uptime_secs,
                targets_total,
                targets_running,
                watchdog_enabled,
                uploads_root,
            } => Ok(DaemonStatus {
                uptime_secs,
                targets_total,
                targets_running,
                watchdog_enabled,
                uploads_root,
            }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self, stop_targets: bool) -> Result<(), ClientError> {
        match self.call(&Request::Shutdown { stop_targets }).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: PROTOCOL_VERSION.to_string(),
        };
        match self.call(&request).await? {
            Response::Hello { version } => Ok(version),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

/// Daemon status as reported by a `Status` request
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub targets_total: usize,
    pub targets_running: usize,
    pub watchdog_enabled: bool,
    pub uploads_root: PathBuf,
}

fn into_result(response: Response) -> Result<Response, ClientError> {
    match response {
        Response::Error { message } => Err(ClientError::Rejected(message)),
        other => Ok(other),
    }
}

/// Stop the daemon (graceful first, then forceful).
/// Returns true if daemon was stopped, false if it wasn't running
pub async fn daemon_stop(stop_targets: bool) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            if let Ok(dir) = daemon_dir() {
                cleanup_stale_pid(&dir);
            }
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let shutdown_result = client.shutdown(stop_targets).await;

    if let Some(pid) = read_daemon_pid()? {
        if shutdown_result.is_ok() {
            wait_for_exit(pid, timeout_exit()).await;
        }

        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    if let Ok(dir) = daemon_dir() {
        cleanup_stale_pid(&dir);
    }

    Ok(true)
}

/// Append a diagnostic line to `cli.log` in the state directory.
fn write_cli_log(message: String) {
    use std::io::Write;
    use std::time::SystemTime;

    let Ok(dir) = daemon_dir() else {
        return;
    };
    let log_path = dir.join("cli.log");
    let _ = std::fs::create_dir_all(&dir);

    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let state_dir = crate::env::state_dir_raw().unwrap_or_else(|| "(not set)".to_string());

        let _ = writeln!(
            file,
            "[ts={}] pid={} BERTH_STATE_DIR={} {}",
            timestamp,
            std::process::id(),
            state_dir,
            message
        );
    }
}

/// Record a failed daemon connection in `cli.log`.
pub fn log_connection_error(error: &ClientError) {
    let socket_path = daemon_socket()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    write_cli_log(format!("socket={} error={}", socket_path, error));
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
