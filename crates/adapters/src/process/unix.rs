// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX process groups.
//!
//! Each target runs as the leader of its own process group so a single
//! `killpg` reaches every descendant it forked.

use std::fs::OpenOptions;
use std::process::Stdio;

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::process::{Child, Command};

use super::{ProcessAdapter, ProcessError, ProcessHandle, SpawnSpec};

#[derive(Clone, Copy, Debug, Default)]
pub struct UnixProcessAdapter;

impl UnixProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessAdapter for UnixProcessAdapter {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let (program, args) = spec
            .command
            .split_first()
            .ok_or(ProcessError::EmptyCommand)?;

        let log_err = |source| ProcessError::Log {
            path: spec.log_path.clone(),
            source,
        };
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&spec.log_path)
            .map_err(log_err)?;
        let stderr = stdout.try_clone().map_err(log_err)?;

        let child = Command::new(program)
            .args(args)
            .current_dir(&spec.cwd)
            .env_clear()
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed(format!("{program}: {e}")))?;

        let pid = child
            .id()
            .ok_or_else(|| ProcessError::SpawnFailed(format!("{program}: exited before pid was read")))?;

        Ok(Box::new(UnixProcessHandle {
            pid,
            child: Mutex::new(child),
        }))
    }
}

/// Dropping the handle does not kill the group; tokio reaps the child in
/// the background once it exits.
struct UnixProcessHandle {
    pid: u32,
    child: Mutex<Child>,
}

impl ProcessHandle for UnixProcessHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        matches!(self.child.lock().try_wait(), Ok(None))
    }

    fn terminate_tree(&self) -> Result<(), ProcessError> {
        let pgid = Pid::from_raw(self.pid as i32);
        match killpg(pgid, Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(ProcessError::Signal(format!("killpg {}: {e}", self.pid))),
        }
    }
}

#[cfg(test)]
#[path = "unix_tests.rs"]
mod tests;
