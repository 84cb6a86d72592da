// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use berth_core::UserId;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: BERTH_STATE_DIR > XDG_STATE_HOME/berth > ~/.local/state/berth
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("BERTH_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("berth"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/berth"))
}

/// Uploads root override; defaults to `<state_dir>/scripts`
pub fn uploads_dir() -> Option<PathBuf> {
    std::env::var("BERTH_UPLOADS_DIR").ok().map(PathBuf::from)
}

/// The operator's user id. Required.
pub fn operator_id() -> Result<UserId, LifecycleError> {
    let raw = std::env::var("BERTH_OPERATOR_ID").map_err(|_| LifecycleError::NoOperator)?;
    raw.trim()
        .parse::<UserId>()
        .map_err(|_| LifecycleError::InvalidOperator(raw))
}

/// `BERTH_ENABLE_ALERTS=0` turns the watchdog off entirely
pub fn alerts_enabled() -> bool {
    std::env::var("BERTH_ENABLE_ALERTS")
        .map(|v| v.trim() != "0")
        .unwrap_or(true)
}

pub fn healthcheck_interval() -> Option<Duration> {
    parse_var::<u64>("BERTH_HEALTHCHECK_INTERVAL_SEC")
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

pub fn alert_cooldown() -> Option<Duration> {
    parse_var::<u64>("BERTH_ALERT_COOLDOWN_SEC").map(Duration::from_secs)
}

pub fn cpu_alert_percent() -> Option<f32> {
    parse_var::<f32>("BERTH_CPU_ALERT_PERCENT").filter(|p| p.is_finite() && *p > 0.0)
}

pub fn ram_alert_mb() -> Option<u64> {
    parse_var::<u64>("BERTH_RAM_ALERT_MB").filter(|mb| *mb > 0)
}

/// Alert hook program; unset means desktop notifications
pub fn alert_command() -> Option<String> {
    std::env::var("BERTH_ALERT_COMMAND")
        .ok()
        .filter(|s| !s.trim().is_empty())
}

pub fn python() -> String {
    std::env::var("BERTH_PYTHON")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "python3".to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
