// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process supervisor.
//!
//! Owns the in-memory registry of running targets. Start and stop for one
//! target are serialized by a per-target async mutex held for the whole
//! operation; the registry itself sits behind a short-lived coarse lock
//! that is never held across an await.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use berth_adapters::{ProcessAdapter, ProcessHandle, SpawnSpec};
use berth_core::{
    contains_path, resolve_paths, resolve_within, Clock, PathError, TargetId, TargetKind,
    TargetPaths, PLACEHOLDER_ENTRY,
};
use berth_storage::{OwnershipStore, StoreError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;

use crate::detect::detect;
use crate::provision::is_safe_component;
use crate::{env, logs, HostError};

pub struct SupervisorConfig {
    /// Root under which every workspace and log lives
    pub uploads_root: PathBuf,
    /// Interpreter for Python entries
    pub python: String,
}

struct RunningEntry {
    handle: Box<dyn ProcessHandle>,
    started: Instant,
    started_at_ms: u64,
    command: String,
    chosen: Option<String>,
}

/// A live process as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatus {
    pub id: TargetId,
    pub pid: u32,
    pub started_at_ms: u64,
    pub uptime_secs: u64,
    pub command: String,
    pub entry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOutcome {
    pub pid: u32,
    pub command: String,
    pub chosen: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoStartReport {
    pub started: Vec<TargetId>,
    pub failed: Vec<(TargetId, String)>,
}

/// Marks a workspace as having a dependency install (or clone) in flight.
/// Released on drop.
pub struct InstallGuard {
    installs: Arc<Mutex<HashSet<PathBuf>>>,
    work_dir: PathBuf,
}

impl InstallGuard {
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        self.installs.lock().remove(&self.work_dir);
    }
}

pub struct Supervisor<P, C> {
    processes: P,
    clock: C,
    store: Arc<OwnershipStore>,
    config: SupervisorConfig,
    registry: Mutex<HashMap<TargetId, RunningEntry>>,
    target_locks: Mutex<HashMap<TargetId, Arc<tokio::sync::Mutex<()>>>>,
    installs: Arc<Mutex<HashSet<PathBuf>>>,
}

impl<P, C> Supervisor<P, C>
where
    P: ProcessAdapter,
    C: Clock,
{
    pub fn new(processes: P, clock: C, store: Arc<OwnershipStore>, config: SupervisorConfig) -> Self {
        Self {
            processes,
            clock,
            store,
            config,
            registry: Mutex::new(HashMap::new()),
            target_locks: Mutex::new(HashMap::new()),
            installs: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &Arc<OwnershipStore> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn uploads_root(&self) -> &Path {
        &self.config.uploads_root
    }

    pub fn python(&self) -> &str {
        &self.config.python
    }

    /// Workspace layout for `id`. Refused when the identifier names its
    /// workspace with anything but a plain path component, or when a derived
    /// path lands outside the uploads root.
    pub fn paths(&self, id: &TargetId) -> Result<TargetPaths, HostError> {
        let root = &self.config.uploads_root;
        let named = match id.kind() {
            TargetKind::Repo { slug, .. } => is_safe_component(&slug),
            TargetKind::Legacy { name } => is_safe_component(&name),
            TargetKind::UserFile { .. } => true,
        };
        let paths = resolve_paths(root, id);
        let inside = [&paths.work_dir, &paths.env_file, &paths.requirements_file]
            .into_iter()
            .all(|p| contains_path(root, p));
        if !named || !inside {
            return Err(PathError::Traversal(id.to_string()).into());
        }
        Ok(paths)
    }

    /// Acquire the per-target lock. Held for a whole start or stop, and by
    /// env edits.
    pub async fn lock_target(&self, id: &TargetId) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(self.target_locks.lock().entry(id.clone()).or_default());
        lock.lock_owned().await
    }

    /// Drop the per-target lock of a target that no longer has a record. A
    /// lock still held or awaited elsewhere is kept.
    pub fn forget(&self, id: &TargetId) {
        let mut locks = self.target_locks.lock();
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
    }

    /// Start (or restart) a target. Any previous process group for it is
    /// terminated first.
    pub async fn start(&self, id: &TargetId) -> Result<StartOutcome, HostError> {
        let _lock = self.lock_target(id).await;
        self.start_locked(id).await
    }

    pub async fn restart(&self, id: &TargetId) -> Result<StartOutcome, HostError> {
        self.start(id).await
    }

    /// Start `id` only if it is still desired and not alive, rechecked under
    /// the target lock. Returns `None` when there was nothing to do.
    pub async fn revive(&self, id: &TargetId) -> Result<Option<StartOutcome>, HostError> {
        let _lock = self.lock_target(id).await;
        let desired = self.store.get(id)?.is_some_and(|r| r.desired_running);
        if !desired || self.is_running(id) {
            return Ok(None);
        }
        self.start_locked(id).await.map(Some)
    }

    async fn start_locked(&self, id: &TargetId) -> Result<StartOutcome, HostError> {
        let paths = self.paths(id)?;
        if self.is_installing(&paths.work_dir) {
            return Err(HostError::InstallInProgress(id.to_string()));
        }

        self.terminate_entry(id);

        let explicit = self.explicit_entry(id, &paths)?;
        if let Some(entry) = &explicit {
            resolve_within(&paths.work_dir, entry)?;
        }
        let detected = match detect(&paths.work_dir, explicit.as_deref()) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(target_id = %id, error = %e, "cannot start");
                return Err(HostError::NoRunnableEntry(id.clone()));
            }
        };

        if id.is_repo() {
            if let Err(e) = self.store.set_entry_point(id, detected.chosen.clone()) {
                tracing::error!(target_id = %id, error = %e, "failed to persist chosen entry");
            }
        }

        std::fs::create_dir_all(&paths.work_dir)?;
        std::fs::create_dir_all(&self.config.uploads_root)?;
        let spec = SpawnSpec {
            command: detected.runner.argv(&self.config.python),
            cwd: paths.work_dir.clone(),
            env: env::build_env(&paths.env_file)?,
            log_path: logs::log_path(&self.config.uploads_root, id),
        };

        let result = self.processes.spawn(&spec).await;
        // Desired even when the spawn failed, so the watchdog keeps retrying
        self.mark_desired(id, true);

        let handle = result.map_err(|e| {
            tracing::error!(target_id = %id, error = %e, "spawn failed");
            HostError::SpawnFailed {
                id: id.clone(),
                message: e.to_string(),
            }
        })?;

        let outcome = StartOutcome {
            pid: handle.pid(),
            command: spec.command_line(),
            chosen: detected.chosen.clone(),
        };
        tracing::info!(target_id = %id, pid = outcome.pid, command = %outcome.command, "started");
        self.registry.lock().insert(
            id.clone(),
            RunningEntry {
                handle,
                started: self.clock.now(),
                started_at_ms: self.clock.epoch_ms(),
                command: outcome.command.clone(),
                chosen: detected.chosen,
            },
        );
        Ok(outcome)
    }

    /// Repo targets run their recorded entry, falling back to the path in
    /// the identifier (a placeholder falls back to auto-detection). Other
    /// kinds run the script the identifier names.
    fn explicit_entry(&self, id: &TargetId, paths: &TargetPaths) -> Result<Option<String>, StoreError> {
        match id.kind() {
            TargetKind::Repo { rel_path, .. } => {
                let recorded = self.store.entry_point(id)?;
                Ok(recorded.or_else(|| (rel_path != PLACEHOLDER_ENTRY).then_some(rel_path)))
            }
            TargetKind::UserFile { .. } | TargetKind::Legacy { .. } => Ok(Some(paths.script_rel.clone())),
        }
    }

    /// Stop a target and clear its desired-running flag. Idempotent.
    pub async fn stop(&self, id: &TargetId) -> Result<(), HostError> {
        let _lock = self.lock_target(id).await;
        if let Some(pid) = self.terminate_entry(id) {
            tracing::info!(target_id = %id, pid, "stopped");
        }
        self.store.set_desired_running(id, false)?;
        Ok(())
    }

    /// Remove the registry entry and signal its group. Errors are logged.
    fn terminate_entry(&self, id: &TargetId) -> Option<u32> {
        let entry = self.registry.lock().remove(id)?;
        let pid = entry.handle.pid();
        if let Err(e) = entry.handle.terminate_tree() {
            tracing::warn!(target_id = %id, pid, error = %e, "terminate failed");
        }
        Some(pid)
    }

    fn mark_desired(&self, id: &TargetId, desired: bool) {
        if let Err(e) = self.store.set_desired_running(id, desired) {
            tracing::error!(target_id = %id, desired, error = %e, "failed to record desired state");
        }
    }

    pub fn is_running(&self, id: &TargetId) -> bool {
        self.registry
            .lock()
            .get(id)
            .is_some_and(|e| e.handle.is_alive())
    }

    /// Pid of the live process for `id`.
    pub fn pid(&self, id: &TargetId) -> Option<u32> {
        self.registry
            .lock()
            .get(id)
            .filter(|e| e.handle.is_alive())
            .map(|e| e.handle.pid())
    }

    /// Sorted ids of targets with a live process.
    pub fn running_ids(&self) -> Vec<TargetId> {
        let mut ids: Vec<TargetId> = self
            .registry
            .lock()
            .iter()
            .filter(|(_, e)| e.handle.is_alive())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn status_snapshot(&self) -> Vec<ProcessStatus> {
        let now = self.clock.now();
        let mut out: Vec<ProcessStatus> = self
            .registry
            .lock()
            .iter()
            .filter(|(_, e)| e.handle.is_alive())
            .map(|(id, e)| ProcessStatus {
                id: id.clone(),
                pid: e.handle.pid(),
                started_at_ms: e.started_at_ms,
                uptime_secs: now.saturating_duration_since(e.started).as_secs(),
                command: e.command.clone(),
                entry: e.chosen.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Stop every registered target, clearing desired flags. Returns the
    /// ids that were stopped.
    pub async fn stop_all(&self) -> Vec<TargetId> {
        let mut ids: Vec<TargetId> = self.registry.lock().keys().cloned().collect();
        ids.sort();
        for id in &ids {
            if let Err(e) = self.stop(id).await {
                tracing::error!(target_id = %id, error = %e, "stop failed");
            }
        }
        ids
    }

    /// Terminate every process group without touching desired flags, so the
    /// next boot restores the same set. Used on daemon shutdown.
    pub fn shutdown_all(&self) -> usize {
        let entries: Vec<(TargetId, RunningEntry)> = self.registry.lock().drain().collect();
        for (id, entry) in &entries {
            if let Err(e) = entry.handle.terminate_tree() {
                tracing::warn!(target_id = %id, error = %e, "terminate failed during shutdown");
            }
        }
        entries.len()
    }

    /// Start every target whose record says it should be running. Each
    /// failure is logged and does not stop the others.
    pub async fn auto_start(&self) -> Result<AutoStartReport, StoreError> {
        let records = self.store.load()?;
        let mut report = AutoStartReport::default();
        for (id, _) in records.iter().filter(|(_, r)| r.desired_running) {
            match self.start(id).await {
                Ok(outcome) => {
                    tracing::info!(target_id = %id, pid = outcome.pid, "auto-started");
                    report.started.push(id.clone());
                }
                Err(e) => {
                    tracing::error!(target_id = %id, error = %e, "auto-start failed");
                    report.failed.push((id.clone(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Claim the install guard for `work_dir`.
    pub fn begin_install(&self, work_dir: &Path) -> Result<InstallGuard, HostError> {
        if !self.installs.lock().insert(work_dir.to_path_buf()) {
            return Err(HostError::InstallInProgress(work_dir.display().to_string()));
        }
        Ok(InstallGuard {
            installs: Arc::clone(&self.installs),
            work_dir: work_dir.to_path_buf(),
        })
    }

    pub fn is_installing(&self, work_dir: &Path) -> bool {
        self.installs.lock().contains(work_dir)
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
