// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host facade.
//!
//! Every client-facing operation goes through here. Each takes the calling
//! user explicitly and checks it against three roles: the operator may do
//! everything, members (operator or allowed users) may provision new
//! targets, and owners may act on their own targets.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use berth_adapters::ProcessAdapter;
use berth_core::{
    resolve_within, AccessKey, Clock, IdGen, OwnershipRecord, PathError, TargetId, TargetKind,
    TargetType, UserId, PLACEHOLDER_ENTRY,
};
use berth_storage::{AllowedUsers, OwnershipStore};
use serde::{Deserialize, Serialize};

use crate::files::{self, is_runnable, MAX_LISTED_FILES};
use crate::provision::{self, is_safe_component, CLONE_LISTING_LIMIT};
use crate::supervisor::{InstallGuard, ProcessStatus, StartOutcome, Supervisor};
use crate::{env, logs, HostError};

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub uploads_root: PathBuf,
    pub operator: UserId,
    pub python: String,
    pub install_timeout: Duration,
    pub clone_timeout: Duration,
}

/// Answer to a capability-token status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    Running,
    Stopped,
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetState::Running => f.write_str("running"),
            TargetState::Stopped => f.write_str("stopped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub id: TargetId,
    pub owner: UserId,
    /// `file`, `repo` or `legacy`
    pub kind: String,
    pub desired_running: bool,
    pub running: bool,
    pub entry: Option<String>,
    pub pid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub id: TargetId,
    pub key: AccessKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOutcome {
    /// Placeholder identifier, `<slug>|PLACEHOLDER`
    pub id: TargetId,
    pub key: AccessKey,
    /// Candidate entry files, at most 20
    pub runnable: Vec<String>,
    /// A dependency install was started in the background
    pub install_started: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySelection {
    pub id: TargetId,
    pub key: AccessKey,
    pub started: Option<StartOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStats {
    pub total: usize,
    pub running: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    pub operator: UserId,
    pub allowed: Vec<UserId>,
}

pub struct Host<P, C, G> {
    supervisor: Arc<Supervisor<P, C>>,
    store: Arc<OwnershipStore>,
    allowed: Arc<AllowedUsers>,
    keys: G,
    config: HostConfig,
}

impl<P, C, G> Host<P, C, G>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    pub fn new(
        supervisor: Arc<Supervisor<P, C>>,
        allowed: Arc<AllowedUsers>,
        keys: G,
        config: HostConfig,
    ) -> Self {
        Self {
            store: Arc::clone(supervisor.store()),
            supervisor,
            allowed,
            keys,
            config,
        }
    }

    pub fn supervisor(&self) -> &Arc<Supervisor<P, C>> {
        &self.supervisor
    }

    pub fn operator(&self) -> UserId {
        self.config.operator
    }

    // -- access --

    pub fn is_operator(&self, caller: UserId) -> bool {
        caller == self.config.operator
    }

    pub fn is_member(&self, caller: UserId) -> Result<bool, HostError> {
        Ok(self.is_operator(caller) || self.allowed.contains(caller)?)
    }

    fn require_member(&self, caller: UserId) -> Result<(), HostError> {
        if self.is_member(caller)? {
            Ok(())
        } else {
            Err(HostError::Forbidden(format!("user {caller} is not allowed")))
        }
    }

    fn require_operator(&self, caller: UserId) -> Result<(), HostError> {
        if self.is_operator(caller) {
            Ok(())
        } else {
            Err(HostError::Forbidden("operator only".to_string()))
        }
    }

    /// The operator may act on any identifier, recorded or not. Anyone else
    /// needs a record they own.
    fn authorize(&self, caller: UserId, id: &TargetId) -> Result<Option<OwnershipRecord>, HostError> {
        let record = self.store.get(id)?;
        if self.is_operator(caller) {
            return Ok(record);
        }
        match record {
            Some(r) if r.is_owned_by(caller) => Ok(Some(r)),
            _ => Err(HostError::Forbidden(format!("{id} is not yours"))),
        }
    }

    /// Workspace directory for file operations. Legacy scripts live directly
    /// in the uploads root, so only the operator may browse there.
    fn workspace(&self, caller: UserId, id: &TargetId) -> Result<PathBuf, HostError> {
        self.authorize(caller, id)?;
        if matches!(id.kind(), TargetKind::Legacy { .. }) && !self.is_operator(caller) {
            return Err(HostError::Forbidden(format!("{id} has no private workspace")));
        }
        Ok(self.supervisor.paths(id)?.work_dir)
    }

    // -- per-target operations --

    /// Capability-token status check. No caller identity involved.
    pub fn status(&self, id: &TargetId, key: &str) -> Result<TargetState, HostError> {
        match self.store.secret_key(id)? {
            Some(k) if k == key => {}
            _ => return Err(HostError::Forbidden("invalid key".to_string())),
        }
        Ok(if self.supervisor.is_running(id) {
            TargetState::Running
        } else {
            TargetState::Stopped
        })
    }

    pub fn logs(&self, caller: UserId, id: &TargetId, lines: usize) -> Result<String, HostError> {
        self.authorize(caller, id)?;
        Ok(logs::tail(&self.config.uploads_root, id, lines)?)
    }

    pub fn clear_logs(&self, caller: UserId, id: &TargetId) -> Result<(), HostError> {
        self.authorize(caller, id)?;
        Ok(logs::clear(&self.config.uploads_root, id)?)
    }

    pub async fn start(&self, caller: UserId, id: &TargetId) -> Result<StartOutcome, HostError> {
        self.authorize(caller, id)?;
        self.supervisor.start(id).await
    }

    pub async fn stop(&self, caller: UserId, id: &TargetId) -> Result<(), HostError> {
        self.authorize(caller, id)?;
        self.supervisor.stop(id).await
    }

    pub async fn restart(&self, caller: UserId, id: &TargetId) -> Result<StartOutcome, HostError> {
        self.authorize(caller, id)?;
        self.supervisor.restart(id).await
    }

    /// Stop the target, drop its record, then remove its files and log.
    pub async fn delete(&self, caller: UserId, id: &TargetId) -> Result<(), HostError> {
        self.authorize(caller, id)?;
        self.supervisor.stop(id).await?;
        self.store.delete(id)?;
        self.supervisor.forget(id);

        let root = &self.config.uploads_root;
        match id.kind() {
            TargetKind::Repo { slug, .. } => {
                if is_safe_component(&slug) {
                    remove_if_present(&root.join(&slug), true)?;
                }
            }
            TargetKind::UserFile { .. } => {
                let script = self
                    .supervisor
                    .paths(id)
                    .and_then(|p| resolve_within(&p.work_dir, &p.script_rel).map_err(HostError::from));
                if let Ok(script) = script {
                    remove_if_present(&script, false)?;
                }
            }
            TargetKind::Legacy { name } => {
                if is_safe_component(&name) {
                    remove_if_present(&root.join(&name), false)?;
                }
            }
        }
        logs::remove(root, id)?;
        tracing::info!(target_id = %id, %caller, "deleted");
        Ok(())
    }

    /// Every target for the operator, otherwise the caller's own.
    pub fn list_targets(&self, caller: UserId) -> Result<Vec<TargetSummary>, HostError> {
        let operator = self.is_operator(caller);
        let records = self.store.load()?;
        Ok(records
            .into_iter()
            .filter(|(_, r)| operator || r.is_owned_by(caller))
            .map(|(id, r)| {
                let pid = self.supervisor.pid(&id);
                TargetSummary {
                    kind: id.kind().label().to_string(),
                    owner: r.owner,
                    desired_running: r.desired_running,
                    running: pid.is_some(),
                    entry: r.entry,
                    pid,
                    id,
                }
            })
            .collect())
    }

    // -- env overrides --

    pub fn env_get(&self, caller: UserId, id: &TargetId) -> Result<BTreeMap<String, String>, HostError> {
        self.authorize(caller, id)?;
        Ok(env::read_env_file(&self.supervisor.paths(id)?.env_file)?)
    }

    pub async fn env_set(
        &self,
        caller: UserId,
        id: &TargetId,
        key: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.authorize(caller, id)?;
        validate_env_key(key)?;
        if value.contains(['\n', '\r']) {
            return Err(HostError::Invalid("env values must be a single line".to_string()));
        }
        let _lock = self.supervisor.lock_target(id).await;
        let path = self.supervisor.paths(id)?.env_file;
        let mut vars = env::read_env_file(&path)?;
        vars.insert(key.to_string(), value.to_string());
        env::write_env_file(&path, &vars)?;
        Ok(())
    }

    /// Returns whether the key was present.
    pub async fn env_unset(&self, caller: UserId, id: &TargetId, key: &str) -> Result<bool, HostError> {
        self.authorize(caller, id)?;
        let _lock = self.supervisor.lock_target(id).await;
        let path = self.supervisor.paths(id)?.env_file;
        let mut vars = env::read_env_file(&path)?;
        let existed = vars.remove(key).is_some();
        if existed {
            env::write_env_file(&path, &vars)?;
        }
        Ok(existed)
    }

    /// Append raw `KEY=VALUE` lines as typed.
    pub async fn env_append(&self, caller: UserId, id: &TargetId, text: &str) -> Result<(), HostError> {
        self.authorize(caller, id)?;
        let _lock = self.supervisor.lock_target(id).await;
        env::append_env_line(&self.supervisor.paths(id)?.env_file, text)?;
        Ok(())
    }

    // -- workspace files --

    pub fn list_files(&self, caller: UserId, id: &TargetId) -> Result<Vec<String>, HostError> {
        let work_dir = self.workspace(caller, id)?;
        Ok(files::list_files(&work_dir, MAX_LISTED_FILES))
    }

    pub fn read_file(&self, caller: UserId, id: &TargetId, rel: &str) -> Result<Vec<u8>, HostError> {
        let work_dir = self.workspace(caller, id)?;
        files::read_file(&work_dir, rel)
    }

    pub fn write_file(
        &self,
        caller: UserId,
        id: &TargetId,
        rel: &str,
        bytes: &[u8],
    ) -> Result<(), HostError> {
        let work_dir = self.workspace(caller, id)?;
        files::write_file(&work_dir, rel, bytes)
    }

    // -- provisioning --

    /// Store an uploaded script under the caller's workspace and register it
    /// with a fresh key. Re-uploading replaces both the file and the record.
    pub async fn upload(&self, caller: UserId, file_name: &str, bytes: &[u8]) -> Result<UploadOutcome, HostError> {
        self.require_member(caller)?;
        provision::validate_upload_name(file_name)?;

        let id = TargetId::user_file(caller, file_name);
        if self.supervisor.is_running(&id) {
            self.supervisor.stop(&id).await?;
        }
        let paths = self.supervisor.paths(&id)?;
        files::write_file(&paths.work_dir, &paths.script_rel, bytes)?;

        let key = self.fresh_key();
        self.store.upsert(
            &id,
            OwnershipRecord::new(
                caller,
                TargetType::File,
                key.clone(),
                Some(file_name.to_string()),
                self.supervisor.clock().epoch_secs(),
            ),
        )?;
        tracing::info!(target_id = %id, %caller, bytes = bytes.len(), "uploaded");
        Ok(UploadOutcome { id, key })
    }

    /// Clone a repository into `<slug>_u<caller>`, replacing any previous
    /// clone, and register a placeholder record. Dependencies install in the
    /// background afterwards.
    pub async fn clone_repo(&self, caller: UserId, url: &str) -> Result<CloneOutcome, HostError> {
        self.require_member(caller)?;
        let slug = provision::repo_slug(url, caller)?;
        let work_dir = self.config.uploads_root.join(&slug);
        let guard = self.supervisor.begin_install(&work_dir)?;

        for running in self.supervisor.running_ids() {
            if matches!(running.kind(), TargetKind::Repo { slug: s, .. } if s == slug) {
                self.supervisor.stop(&running).await?;
            }
        }
        remove_if_present(&work_dir, true)?;
        std::fs::create_dir_all(&self.config.uploads_root)?;

        tracing::info!(%caller, %slug, "cloning");
        provision::git_clone(url, &work_dir, self.config.clone_timeout).await?;

        let id = TargetId::repo(&slug, PLACEHOLDER_ENTRY);
        let key = self.fresh_key();
        self.store.upsert(
            &id,
            OwnershipRecord::new(
                caller,
                TargetType::Repo,
                key.clone(),
                None,
                self.supervisor.clock().epoch_secs(),
            ),
        )?;

        let runnable = files::list_files(&work_dir, MAX_LISTED_FILES)
            .into_iter()
            .filter(|rel| is_runnable(rel))
            .take(CLONE_LISTING_LIMIT)
            .collect();
        let install_started = self.spawn_install(guard, id.clone());
        Ok(CloneOutcome {
            id,
            key,
            runnable,
            install_started,
        })
    }

    /// Point a cloned repository at `file`. The placeholder record is renamed
    /// to `<slug>|<file>` keeping its key; if it is gone a fresh record is
    /// created. Optionally starts the result.
    pub async fn select_entry(
        &self,
        caller: UserId,
        placeholder: &TargetId,
        file: &str,
        start: bool,
    ) -> Result<EntrySelection, HostError> {
        let TargetKind::Repo { slug, .. } = placeholder.kind() else {
            return Err(HostError::Invalid(format!("{placeholder} is not a repository target")));
        };
        if !is_safe_component(&slug) {
            return Err(PathError::Traversal(slug).into());
        }
        let record = self.store.get(placeholder)?;
        let allowed = self.is_operator(caller)
            || match &record {
                Some(r) => r.is_owned_by(caller),
                None => slug.ends_with(&format!("_u{caller}")),
            };
        if !allowed {
            return Err(HostError::Forbidden(format!("{placeholder} is not yours")));
        }

        let work_dir = self.config.uploads_root.join(&slug);
        if !resolve_within(&work_dir, file)?.is_file() {
            return Err(HostError::NotFound(file.to_string()));
        }

        let id = TargetId::repo(&slug, file);
        if id != *placeholder && self.supervisor.is_running(placeholder) {
            self.supervisor.stop(placeholder).await?;
        }
        let moved = id == *placeholder || self.store.rename(placeholder, &id)?;
        if id != *placeholder {
            self.supervisor.forget(placeholder);
        }
        if moved || self.store.get(&id)?.is_some() {
            self.store.set_entry_point(&id, Some(file.to_string()))?;
        } else {
            self.store.upsert(
                &id,
                OwnershipRecord::new(
                    caller,
                    TargetType::Repo,
                    self.fresh_key(),
                    Some(file.to_string()),
                    self.supervisor.clock().epoch_secs(),
                ),
            )?;
        }
        let key = self
            .store
            .secret_key(&id)?
            .ok_or_else(|| HostError::NotFound(id.to_string()))?;
        tracing::info!(target_id = %id, %caller, "entry selected");

        let started = if start {
            Some(self.supervisor.start(&id).await?)
        } else {
            None
        };
        Ok(EntrySelection { id, key, started })
    }

    /// Install dependencies for the target's workspace in the background.
    /// Returns `false` when the workspace has no manifests.
    pub fn install_deps(&self, caller: UserId, id: &TargetId) -> Result<bool, HostError> {
        let work_dir = self.workspace(caller, id)?;
        if !has_manifest(&work_dir) {
            return Ok(false);
        }
        let guard = self.supervisor.begin_install(&work_dir)?;
        Ok(self.spawn_install(guard, id.clone()))
    }

    /// Run the install holding `guard` until it finishes. The summary goes
    /// to the target log and the daemon log.
    fn spawn_install(&self, guard: InstallGuard, id: TargetId) -> bool {
        if !has_manifest(guard.work_dir()) {
            return false;
        }
        let python = self.config.python.clone();
        let timeout = self.config.install_timeout;
        let root = self.config.uploads_root.clone();
        tokio::spawn(async move {
            let summary = provision::install_deps(guard.work_dir(), &python, timeout).await;
            if summary.succeeded() {
                tracing::info!(target_id = %id, steps = summary.steps.len(), "dependencies installed");
            } else {
                tracing::warn!(target_id = %id, summary = %summary.render(), "dependency install failed");
            }
            if let Err(e) = logs::append(&root, &id, &summary.render()) {
                tracing::warn!(target_id = %id, error = %e, "cannot append install summary");
            }
            drop(guard);
        });
        true
    }

    fn fresh_key(&self) -> AccessKey {
        AccessKey::new(self.keys.next())
    }

    // -- operator panel --

    pub fn stats(&self, caller: UserId) -> Result<HostStats, HostError> {
        self.require_member(caller)?;
        Ok(HostStats {
            total: self.store.load()?.len(),
            running: self.supervisor.running_ids().len(),
        })
    }

    pub fn list_running(&self, caller: UserId) -> Result<Vec<ProcessStatus>, HostError> {
        self.require_operator(caller)?;
        Ok(self.supervisor.status_snapshot())
    }

    /// Targets meant to run that have no live process.
    pub fn list_down(&self, caller: UserId) -> Result<Vec<TargetId>, HostError> {
        self.require_operator(caller)?;
        Ok(self
            .store
            .load()?
            .into_iter()
            .filter(|(id, r)| r.desired_running && !self.supervisor.is_running(id))
            .map(|(id, _)| id)
            .collect())
    }

    pub async fn stop_all(&self, caller: UserId) -> Result<Vec<TargetId>, HostError> {
        self.require_operator(caller)?;
        Ok(self.supervisor.stop_all().await)
    }

    pub async fn restart_all(&self, caller: UserId) -> Result<crate::AutoStartReport, HostError> {
        self.require_operator(caller)?;
        Ok(self.supervisor.auto_start().await?)
    }

    pub fn access_list(&self, caller: UserId) -> Result<AccessList, HostError> {
        self.require_operator(caller)?;
        Ok(AccessList {
            operator: self.config.operator,
            allowed: self.allowed.list()?,
        })
    }

    /// Returns whether the user was newly added.
    pub fn allow(&self, caller: UserId, user: UserId) -> Result<bool, HostError> {
        self.require_operator(caller)?;
        Ok(self.allowed.add(user)?)
    }

    /// Returns whether the user had been allowed.
    pub fn deny(&self, caller: UserId, user: UserId) -> Result<bool, HostError> {
        self.require_operator(caller)?;
        if user == self.config.operator {
            return Err(HostError::Invalid("the operator cannot be denied".to_string()));
        }
        Ok(self.allowed.remove(user)?)
    }

    /// Move a corrupt (or any) ownership store aside and start empty.
    pub fn store_reset(&self, caller: UserId) -> Result<Option<PathBuf>, HostError> {
        self.require_operator(caller)?;
        Ok(self.store.reset()?)
    }
}

fn has_manifest(work_dir: &std::path::Path) -> bool {
    work_dir.join("requirements.txt").is_file() || work_dir.join("package.json").is_file()
}

fn validate_env_key(key: &str) -> Result<(), HostError> {
    let valid = !key.is_empty()
        && !key.starts_with('#')
        && !key.contains(|c: char| c == '=' || c.is_whitespace() || c.is_control());
    if valid {
        Ok(())
    } else {
        Err(HostError::Invalid(format!("{key:?} is not a valid variable name")))
    }
}

fn remove_if_present(path: &std::path::Path, dir: bool) -> std::io::Result<()> {
    let result = if dir {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
