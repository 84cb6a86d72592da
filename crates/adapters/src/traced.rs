// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::process::{ProcessAdapter, ProcessError, ProcessHandle, SpawnSpec};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    async fn spawn(&self, spec: &SpawnSpec) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let span = tracing::info_span!("process.spawn", cwd = %spec.cwd.display());
        async {
            tracing::info!(
                command = %spec.command_line(),
                env_count = spec.env.len(),
                log = %spec.log_path.display(),
                "starting"
            );
            let start = std::time::Instant::now();
            let result = self.inner.spawn(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match result {
                Ok(handle) => {
                    tracing::info!(pid = handle.pid(), elapsed_ms, "process spawned");
                    Ok(Box::new(TracedHandle { inner: handle }) as Box<dyn ProcessHandle>)
                }
                Err(e) => {
                    tracing::error!(elapsed_ms, error = %e, "spawn failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

struct TracedHandle {
    inner: Box<dyn ProcessHandle>,
}

impl ProcessHandle for TracedHandle {
    fn pid(&self) -> u32 {
        self.inner.pid()
    }

    fn is_alive(&self) -> bool {
        let alive = self.inner.is_alive();
        tracing::trace!(pid = self.inner.pid(), alive, "checked");
        alive
    }

    fn terminate_tree(&self) -> Result<(), ProcessError> {
        let pid = self.inner.pid();
        let result = self.inner.terminate_tree();
        tracing::info_span!("process.terminate", pid).in_scope(|| match &result {
            Ok(()) => tracing::info!("sent SIGTERM to process group"),
            Err(e) => tracing::warn!(error = %e, "terminate failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
