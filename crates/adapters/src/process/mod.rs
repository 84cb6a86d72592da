// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised child process adapters

mod unix;

pub use unix::UnixProcessAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessAdapter, SpawnCall};

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("empty command line")]
    EmptyCommand,
    #[error("cannot open log {}: {source}", path.display())]
    Log {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("signal failed: {0}")]
    Signal(String),
}

/// Everything needed to launch one supervised process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    /// Program followed by its arguments
    pub command: Vec<String>,
    pub cwd: PathBuf,
    /// Complete environment; nothing else is inherited
    pub env: BTreeMap<String, String>,
    /// Opened in append mode; receives both stdout and stderr
    pub log_path: PathBuf,
}

impl SpawnSpec {
    /// Command line joined with spaces, for display.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// A live (or recently live) process group.
pub trait ProcessHandle: Send + Sync {
    fn pid(&self) -> u32;

    /// Non-blocking liveness poll. An exited child is reaped and reports false.
    fn is_alive(&self) -> bool;

    /// Send SIGTERM to the whole process group. Does not wait.
    fn terminate_tree(&self) -> Result<(), ProcessError>;
}

/// Adapter for launching process groups
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Spawn `spec` as the leader of a new process group
    async fn spawn(&self, spec: &SpawnSpec) -> Result<Box<dyn ProcessHandle>, ProcessError>;
}
