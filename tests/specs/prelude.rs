// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the `berth` CLI against an isolated
//! `berthd`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts for fast tests.
const BERTH_TIMEOUT_CONNECT_MS: &str = "3000";
const BERTH_TIMEOUT_EXIT_MS: &str = "1000";
const BERTH_TIMEOUT_IPC_MS: &str = "2000";
const BERTH_CONNECT_POLL_MS: &str = "5";

/// Operator id every spec daemon runs with.
pub const OPERATOR: &str = "1";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 3000;

/// Returns the path to a binary, checking the llvm-cov target directory
/// first, then the standard one, then the test binary's own directory.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // target/debug/deps/specs-<hash> -> target/debug/
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn berth_binary() -> PathBuf {
    binary_path("berth")
}

pub fn berthd_binary() -> PathBuf {
    binary_path("berthd")
}

/// Create a CLI builder for berth commands
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
    removed: Vec<String>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: vec![
                (
                    "BERTH_DAEMON_BINARY".into(),
                    berthd_binary().to_string_lossy().into(),
                ),
                ("BERTH_TIMEOUT_CONNECT_MS".into(), BERTH_TIMEOUT_CONNECT_MS.into()),
                ("BERTH_TIMEOUT_EXIT_MS".into(), BERTH_TIMEOUT_EXIT_MS.into()),
                ("BERTH_TIMEOUT_IPC_MS".into(), BERTH_TIMEOUT_IPC_MS.into()),
                ("BERTH_CONNECT_POLL_MS".into(), BERTH_CONNECT_POLL_MS.into()),
                ("BERTH_ENABLE_ALERTS".into(), "0".into()),
                ("NO_COLOR".into(), "1".into()),
            ],
            removed: vec!["BERTH_USER".into(), "COLOR".into()],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Remove an environment variable the builder would otherwise set
    pub fn env_remove(mut self, key: &str) -> Self {
        self.envs.retain(|(k, _)| k != key);
        self.removed.push(key.to_string());
        self
    }

    /// Act as the given user (`--as`)
    pub fn user(self, uid: &str) -> Self {
        self.args(&["--as", uid])
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(berth_binary());
        cmd.args(&self.args);
        for key in &self.removed {
            cmd.env_remove(key);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Parse stdout as JSON (for `-o json` runs)
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.output.stdout).unwrap_or_else(|e| {
            panic!("stdout is not JSON ({e}):\n{}", self.stdout())
        })
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Host
// =============================================================================

/// Shell script that keeps running until killed.
pub const LOOP_SCRIPT: &str = "echo hello from bot\nwhile true; do sleep 1; done\n";

/// An isolated berth installation: its own state directory (and with it
/// socket, stores and uploads root) plus a scratch directory for local
/// files to upload.
pub struct Host {
    state_dir: tempfile::TempDir,
    scratch: tempfile::TempDir,
}

impl Host {
    pub fn new() -> Self {
        Self {
            state_dir: tempfile::tempdir().unwrap(),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.state_path().join("scripts")
    }

    /// Write a local file to upload later; returns its path
    pub fn local_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.scratch.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Run berth against this host's daemon
    pub fn berth(&self) -> CliBuilder {
        cli()
            .env("BERTH_STATE_DIR", self.state_path())
            .env("BERTH_OPERATOR_ID", OPERATOR)
    }

    /// Run berth as the operator
    pub fn operator(&self) -> CliBuilder {
        self.berth().user(OPERATOR)
    }

    /// Upload `LOOP_SCRIPT` as `name` for `uid`; returns (id, key)
    pub fn upload_loop(&self, uid: &str, name: &str) -> (String, String) {
        let path = self.local_file(name, LOOP_SCRIPT);
        let out = self
            .berth()
            .user(uid)
            .args(&["-o", "json", "upload", path.to_str().unwrap()])
            .passes()
            .json();
        (
            out["id"].as_str().unwrap().to_string(),
            out["key"].as_str().unwrap().to_string(),
        )
    }

    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("daemon.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    pub fn daemon_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.state_path().join("daemon.pid"))
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        // Always stop the daemon and every target (no-op if not running)
        let mut cmd = self
            .berth()
            .args(&["daemon", "stop", "--stop-targets"])
            .command();
        cmd.stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        let _ = cmd.status();
    }
}
