// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process resource sampling for the watchdog.

use std::sync::Arc;

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// CPU and memory of one process at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    /// Percent of one core since the previous sample; may exceed 100
    pub cpu_percent: f32,
    /// Resident set size in bytes
    pub rss_bytes: u64,
}

impl ResourceSample {
    pub fn rss_mb(&self) -> f64 {
        self.rss_bytes as f64 / (1024.0 * 1024.0)
    }
}

pub trait ResourceProbe: Clone + Send + Sync + 'static {
    /// `None` when the process is gone or cannot be read
    fn sample(&self, pid: u32) -> Option<ResourceSample>;
}

/// sysinfo-backed probe. CPU usage is measured between consecutive samples
/// of the same pid, so the first sample of a process reads near zero.
#[derive(Clone)]
pub struct SysinfoProbe {
    system: Arc<Mutex<System>>,
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl ResourceProbe for SysinfoProbe {
    fn sample(&self, pid: u32) -> Option<ResourceSample> {
        let pid = Pid::from_u32(pid);
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        let process = system.process(pid)?;
        Some(ResourceSample {
            cpu_percent: process.cpu_usage(),
            rss_bytes: process.memory(),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeResourceProbe;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::{ResourceProbe, ResourceSample};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Returns whatever sample was set for a pid; `None` otherwise.
    #[derive(Clone, Default)]
    pub struct FakeResourceProbe {
        samples: Arc<Mutex<HashMap<u32, ResourceSample>>>,
    }

    impl FakeResourceProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set(&self, pid: u32, cpu_percent: f32, rss_mb: u64) {
            self.samples.lock().insert(
                pid,
                ResourceSample {
                    cpu_percent,
                    rss_bytes: rss_mb * 1024 * 1024,
                },
            );
        }
    }

    impl ResourceProbe for FakeResourceProbe {
        fn sample(&self, pid: u32) -> Option<ResourceSample> {
            self.samples.lock().get(&pid).copied()
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
