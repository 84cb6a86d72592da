// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: child processes, resource sampling, alerts

mod env;
pub mod notify;
pub mod probe;
pub mod process;
pub mod subprocess;
pub mod traced;

pub use notify::{CommandNotifyAdapter, DesktopNotifyAdapter, NotifyAdapter, NotifyError};
pub use probe::{ResourceProbe, ResourceSample, SysinfoProbe};
pub use process::{ProcessAdapter, ProcessError, ProcessHandle, SpawnSpec, UnixProcessAdapter};
pub use traced::TracedProcess;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use probe::FakeResourceProbe;
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcessAdapter, SpawnCall};
