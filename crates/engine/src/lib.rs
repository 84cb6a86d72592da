// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth hosting engine: run detection, supervision, watchdog, host facade

pub mod detect;
pub mod env;
mod error;
pub mod files;
mod host;
pub mod logs;
mod provision;
mod supervisor;
mod watchdog;

#[cfg(test)]
mod test_helpers;

pub use detect::{detect, Detected, Runner};
pub use error::HostError;
pub use host::{
    AccessList, CloneOutcome, EntrySelection, Host, HostConfig, HostStats, TargetState, TargetSummary,
    UploadOutcome,
};
pub use supervisor::{
    AutoStartReport, InstallGuard, ProcessStatus, StartOutcome, Supervisor, SupervisorConfig,
};
pub use watchdog::{TickReport, Watchdog, WatchdogConfig};
pub use provision::InstallSummary;
