// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessAdapter, ProcessError, ProcessHandle, SpawnSpec};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Recorded spawn
#[derive(Debug, Clone)]
pub struct SpawnCall {
    pub spec: SpawnSpec,
    pub pid: u32,
}

#[derive(Debug, Clone, Copy)]
struct FakeProcess {
    alive: bool,
    terminated: bool,
}

struct FakeProcessState {
    processes: HashMap<u32, FakeProcess>,
    calls: Vec<SpawnCall>,
    next_pid: u32,
    spawn_error: Option<String>,
}

/// Fake process adapter for testing. Processes stay alive until terminated
/// or killed with [`FakeProcessAdapter::kill`].
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                processes: HashMap::new(),
                calls: Vec::new(),
                next_pid: 1000,
                spawn_error: None,
            })),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SpawnCall> {
        self.inner.lock().calls.clone()
    }

    pub fn last_pid(&self) -> Option<u32> {
        self.inner.lock().calls.last().map(|c| c.pid)
    }

    /// Simulate the process dying on its own (crash or external kill)
    pub fn kill(&self, pid: u32) {
        if let Some(p) = self.inner.lock().processes.get_mut(&pid) {
            p.alive = false;
        }
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.inner
            .lock()
            .processes
            .get(&pid)
            .is_some_and(|p| p.alive)
    }

    /// Whether `terminate_tree` was called on this pid
    pub fn was_terminated(&self, pid: u32) -> bool {
        self.inner
            .lock()
            .processes
            .get(&pid)
            .is_some_and(|p| p.terminated)
    }

    /// Pids still alive, sorted
    pub fn live_pids(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self
            .inner
            .lock()
            .processes
            .iter()
            .filter(|(_, p)| p.alive)
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort_unstable();
        pids
    }

    /// Make subsequent spawns fail with `message`; `None` restores success
    pub fn set_spawn_error(&self, message: Option<&str>) {
        self.inner.lock().spawn_error = message.map(str::to_string);
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        if spec.command.is_empty() {
            return Err(ProcessError::EmptyCommand);
        }
        let mut inner = self.inner.lock();
        if let Some(message) = &inner.spawn_error {
            return Err(ProcessError::SpawnFailed(message.clone()));
        }
        let pid = inner.next_pid;
        inner.next_pid += 1;
        inner.processes.insert(
            pid,
            FakeProcess {
                alive: true,
                terminated: false,
            },
        );
        inner.calls.push(SpawnCall {
            spec: spec.clone(),
            pid,
        });
        Ok(Box::new(FakeHandle {
            pid,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct FakeHandle {
    pid: u32,
    inner: Arc<Mutex<FakeProcessState>>,
}

impl ProcessHandle for FakeHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        self.inner
            .lock()
            .processes
            .get(&self.pid)
            .is_some_and(|p| p.alive)
    }

    fn terminate_tree(&self) -> Result<(), ProcessError> {
        if let Some(p) = self.inner.lock().processes.get_mut(&self.pid) {
            p.alive = false;
            p.terminated = true;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
