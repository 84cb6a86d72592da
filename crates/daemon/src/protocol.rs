// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication.

use std::collections::BTreeMap;
use std::path::PathBuf;

use berth_core::{TargetId, UserId};
use berth_engine::{
    AccessList, AutoStartReport, CloneOutcome, EntrySelection, HostStats, ProcessStatus,
    StartOutcome, TargetState, TargetSummary, UploadOutcome,
};
use serde::{Deserialize, Serialize};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_message, recv, send, write_message, ProtocolError, DEFAULT_TIMEOUT,
    MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Request from CLI to daemon. Every target operation names the calling
/// user; the daemon checks it against the operator, the allowed users, and
/// the target's owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Get daemon status
    Status,

    /// Request daemon shutdown
    Shutdown {
        /// Also clear every target's desired-running flag, so nothing comes
        /// back on the next start
        #[serde(default)]
        stop_targets: bool,
    },

    /// Capability-token status check; no caller identity
    TargetStatus { id: TargetId, key: String },

    Logs {
        caller: UserId,
        id: TargetId,
        lines: usize,
    },

    ClearLogs { caller: UserId, id: TargetId },

    Start { caller: UserId, id: TargetId },

    Stop { caller: UserId, id: TargetId },

    Restart { caller: UserId, id: TargetId },

    /// Stop, unregister, and remove the target's files
    Delete { caller: UserId, id: TargetId },

    ListTargets { caller: UserId },

    EnvGet { caller: UserId, id: TargetId },

    EnvSet {
        caller: UserId,
        id: TargetId,
        key: String,
        value: String,
    },

    EnvUnset {
        caller: UserId,
        id: TargetId,
        key: String,
    },

    /// Append raw `KEY=VALUE` lines
    EnvAppend {
        caller: UserId,
        id: TargetId,
        text: String,
    },

    ListFiles { caller: UserId, id: TargetId },

    ReadFile {
        caller: UserId,
        id: TargetId,
        path: String,
    },

    WriteFile {
        caller: UserId,
        id: TargetId,
        path: String,
        content: Vec<u8>,
    },

    /// Register a single-file upload
    Upload {
        caller: UserId,
        file_name: String,
        content: Vec<u8>,
    },

    /// Clone a git repository into a new workspace
    Clone { caller: UserId, url: String },

    /// Choose the entry file of a cloned repository
    SelectEntry {
        caller: UserId,
        id: TargetId,
        file: String,
        #[serde(default)]
        start: bool,
    },

    InstallDeps { caller: UserId, id: TargetId },

    Stats { caller: UserId },

    ListRunning { caller: UserId },

    ListDown { caller: UserId },

    StopAll { caller: UserId },

    /// Start every target marked desired-running
    RestartAll { caller: UserId },

    AccessList { caller: UserId },

    AccessAdd { caller: UserId, user: UserId },

    AccessRemove { caller: UserId, user: UserId },

    /// Move the ownership store aside and start empty
    StoreReset { caller: UserId },
}

impl Request {
    /// Requests that may legitimately outlive the default IPC timeout.
    pub fn is_long_running(&self) -> bool {
        matches!(
            self,
            Request::Clone { .. }
                | Request::StopAll { .. }
                | Request::RestartAll { .. }
                | Request::Shutdown { .. }
        )
    }
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Daemon status
    Status {
        uptime_secs: u64,
        targets_total: usize,
        targets_running: usize,
        watchdog_enabled: bool,
        uploads_root: PathBuf,
    },

    /// Error response
    Error { message: String },

    TargetState { state: TargetState },

    Logs { log_path: PathBuf, content: String },

    Started { outcome: StartOutcome },

    Targets { targets: Vec<TargetSummary> },

    Env { vars: BTreeMap<String, String> },

    EnvUnset { existed: bool },

    Files { files: Vec<String> },

    FileContent { content: Vec<u8> },

    Uploaded { outcome: UploadOutcome },

    Cloned { outcome: CloneOutcome },

    EntrySelected { selection: EntrySelection },

    InstallStarted { started: bool },

    Stats { stats: HostStats },

    Running { processes: Vec<ProcessStatus> },

    Down { ids: Vec<TargetId> },

    Stopped { ids: Vec<TargetId> },

    AutoStarted { report: AutoStartReport },

    Access { access: AccessList },

    AccessChanged { changed: bool },

    StoreReset { backup: Option<PathBuf> },
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
