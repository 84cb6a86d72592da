// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, resume, shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use berth_adapters::{
    subprocess, CommandNotifyAdapter, DesktopNotifyAdapter, NotifyAdapter, NotifyError,
    SysinfoProbe, TracedProcess, UnixProcessAdapter,
};
use berth_core::{RandomKeyGen, SystemClock, UserId};
use berth_engine::{Host, HostConfig, Supervisor, SupervisorConfig, Watchdog, WatchdogConfig};
use berth_storage::{AllowedUsers, OwnershipStore};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Process adapter used by the daemon (wrapped with tracing)
pub type DaemonProcesses = TracedProcess<UnixProcessAdapter>;

pub type DaemonSupervisor = Supervisor<DaemonProcesses, SystemClock>;

pub type DaemonHost = Host<DaemonProcesses, SystemClock, RandomKeyGen>;

pub type DaemonWatchdog = Watchdog<DaemonProcesses, DaemonNotifier, SysinfoProbe, SystemClock>;

/// Alert delivery chosen at startup: an operator hook when
/// `BERTH_ALERT_COMMAND` is set, desktop notifications otherwise.
#[derive(Clone, Debug)]
pub enum DaemonNotifier {
    Desktop(DesktopNotifyAdapter),
    Command(CommandNotifyAdapter),
}

impl DaemonNotifier {
    pub fn from_command(command: Option<&str>) -> Self {
        match command {
            Some(program) => DaemonNotifier::Command(CommandNotifyAdapter::new(program)),
            None => DaemonNotifier::Desktop(DesktopNotifyAdapter::new()),
        }
    }
}

#[async_trait]
impl NotifyAdapter for DaemonNotifier {
    async fn notify(&self, recipient: UserId, title: &str, message: &str) -> Result<(), NotifyError> {
        match self {
            DaemonNotifier::Desktop(n) => n.notify(recipient, title, message).await,
            DaemonNotifier::Command(n) => n.notify(recipient, title, message).await,
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/berth)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    pub ownership_path: PathBuf,
    pub allowed_path: PathBuf,
    /// Root of every workspace and target log
    pub uploads_root: PathBuf,
    pub operator: UserId,
    pub python: String,
    /// `None` when alerts are disabled
    pub watchdog: Option<WatchdogConfig>,
    pub alert_command: Option<String>,
}

impl Config {
    /// Load configuration for the daemon from the environment.
    ///
    /// Uses fixed paths under `~/.local/state/berth/` (or `$XDG_STATE_HOME/berth/`).
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;
        let operator = crate::env::operator_id()?;
        let uploads_root = crate::env::uploads_dir().unwrap_or_else(|| state_dir.join("scripts"));

        let watchdog = crate::env::alerts_enabled().then(|| {
            let mut wd = WatchdogConfig::new(operator);
            if let Some(interval) = crate::env::healthcheck_interval() {
                wd.interval = interval;
            }
            if let Some(cooldown) = crate::env::alert_cooldown() {
                wd.cooldown = cooldown;
            }
            if let Some(cpu) = crate::env::cpu_alert_percent() {
                wd.cpu_alert_percent = cpu;
            }
            if let Some(ram) = crate::env::ram_alert_mb() {
                wd.ram_alert_mb = ram;
            }
            wd
        });

        Ok(Self::in_dir(state_dir, operator)
            .with_uploads_root(uploads_root)
            .with_python(crate::env::python())
            .with_watchdog(watchdog)
            .with_alert_command(crate::env::alert_command()))
    }

    /// Default layout under `state_dir` with alerts disabled.
    pub fn in_dir(state_dir: impl Into<PathBuf>, operator: UserId) -> Self {
        let state_dir = state_dir.into();
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            ownership_path: state_dir.join("ownership.json"),
            allowed_path: state_dir.join("allowed_users.json"),
            uploads_root: state_dir.join("scripts"),
            operator,
            python: "python3".to_string(),
            watchdog: None,
            alert_command: None,
            state_dir,
        }
    }

    pub fn with_uploads_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.uploads_root = root.into();
        self
    }

    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn with_watchdog(mut self, watchdog: Option<WatchdogConfig>) -> Self {
        self.watchdog = watchdog;
        self
    }

    pub fn with_alert_command(mut self, command: Option<String>) -> Self {
        self.alert_command = command;
        self
    }
}

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as a Listener task.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Shared with the listener and the watchdog
    pub host: Arc<DaemonHost>,
    /// When daemon started
    pub start_time: Instant,
    watchdog: Option<JoinHandle<()>>,
}

/// Result of daemon startup - includes both the daemon state and the listener.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
}

impl DaemonState {
    /// Start every target whose desired-running flag survived the last
    /// shutdown. Failures are logged per target and never abort startup.
    pub async fn resume_targets(&self) {
        match self.host.supervisor().auto_start().await {
            Ok(report) => {
                for (id, reason) in &report.failed {
                    warn!(target_id = %id, reason = %reason, "auto-start failed");
                }
                info!(
                    started = report.started.len(),
                    failed = report.failed.len(),
                    "resumed desired targets"
                );
            }
            Err(e) if e.is_corrupt() => {
                error!("ownership store is unreadable, nothing resumed: {}", e);
            }
            Err(e) => error!("failed to load ownership store: {}", e),
        }
    }

    /// Spawn the watchdog if alerts are enabled. Idempotent.
    pub fn spawn_watchdog(&mut self) -> bool {
        if self.watchdog.is_some() {
            return true;
        }
        let Some(config) = self.config.watchdog.clone() else {
            info!("alerts disabled, watchdog not started");
            return false;
        };
        info!(
            interval_secs = config.interval.as_secs(),
            cooldown_secs = config.cooldown.as_secs(),
            "starting watchdog"
        );
        let watchdog: DaemonWatchdog = Watchdog::new(
            Arc::clone(self.host.supervisor()),
            DaemonNotifier::from_command(self.config.alert_command.as_deref()),
            SysinfoProbe::new(),
            config,
        );
        self.watchdog = Some(Arc::new(watchdog).spawn());
        true
    }

    pub fn watchdog_enabled(&self) -> bool {
        self.config.watchdog.is_some()
    }

    /// Shutdown the daemon gracefully.
    ///
    /// Running targets are terminated but keep their desired-running flag,
    /// so the next startup brings them back. `Shutdown { stop_targets: true }`
    /// clears the flags in the listener before this runs.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        if let Some(handle) = self.watchdog.take() {
            handle.abort();
        }

        let terminated = self.host.supervisor().shutdown_all();
        if terminated > 0 {
            info!(terminated, "terminated running targets");
        }

        for (what, path) in [
            ("socket", &self.config.socket_path),
            ("PID", &self.config.lock_path),
            ("version", &self.config.version_path),
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove {} file: {}", what, e);
                }
            }
        }

        // Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("BERTH_OPERATOR_ID is not set")]
    NoOperator,

    #[error("BERTH_OPERATOR_ID is not a numeric user id: {0:?}")]
    InvalidOperator(String),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Files behind a held lock belong to the running daemon
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Open without truncating so a failed lock leaves the running daemon's PID intact
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    std::fs::create_dir_all(&config.uploads_root)?;
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    let store = Arc::new(OwnershipStore::new(config.ownership_path.clone()));
    match store.load() {
        Ok(records) => info!("Loaded {} ownership records", records.len()),
        // Startup continues; every operation reports the corruption until repaired or reset
        Err(e) => error!("ownership store failed to load: {}", e),
    }
    let allowed = Arc::new(AllowedUsers::new(config.allowed_path.clone()));

    let supervisor = Arc::new(Supervisor::new(
        TracedProcess::new(UnixProcessAdapter::new()),
        SystemClock,
        store,
        SupervisorConfig {
            uploads_root: config.uploads_root.clone(),
            python: config.python.clone(),
        },
    ));
    let host = Arc::new(Host::new(
        supervisor,
        allowed,
        RandomKeyGen,
        HostConfig {
            uploads_root: config.uploads_root.clone(),
            operator: config.operator,
            python: config.python.clone(),
            install_timeout: subprocess::install_timeout(),
            clone_timeout: subprocess::clone_timeout(),
        },
    ));

    // Bind LAST, only after all validation passes
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(operator = %config.operator, uploads = %config.uploads_root.display(), "Daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            host,
            start_time: Instant::now(),
            watchdog: None,
        },
        listener,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [&config.socket_path, &config.version_path, &config.lock_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
