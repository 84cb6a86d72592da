// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for `git clone`.
pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default timeout for dependency installs (pip, npm).
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for one alert hook invocation.
pub const ALERT_HOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Clone timeout, overridable with `BERTH_CLONE_TIMEOUT_SEC`.
pub fn clone_timeout() -> Duration {
    crate::env::clone_timeout().unwrap_or(DEFAULT_CLONE_TIMEOUT)
}

/// Install timeout, overridable with `BERTH_INSTALL_TIMEOUT_SEC`.
pub fn install_timeout() -> Duration {
    crate::env::install_timeout().unwrap_or(DEFAULT_INSTALL_TIMEOUT)
}

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child is killed
/// when the timeout elapses.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Last `max_lines` lines of combined stdout and stderr, for summaries.
pub fn output_tail(output: &Output, max_lines: usize) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
