// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

pub fn clone_timeout() -> Option<Duration> {
    parse_duration_secs("BERTH_CLONE_TIMEOUT_SEC")
}

pub fn install_timeout() -> Option<Duration> {
    parse_duration_secs("BERTH_INSTALL_TIMEOUT_SEC")
}
