// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace provisioning: upload name checks, git clone, dependency install.

use std::path::Path;
use std::time::Duration;

use berth_adapters::subprocess::{output_tail, run_with_timeout};
use berth_core::UserId;
use tokio::process::Command;

use crate::HostError;

/// Extensions accepted for direct uploads.
pub const UPLOAD_EXTENSIONS: [&str; 3] = [".py", ".js", ".sh"];

/// Runnable files reported after a clone.
pub const CLONE_LISTING_LIMIT: usize = 20;

const TAIL_LINES: usize = 20;

/// True when `name` is one plain path component: no separators, not `.` or
/// `..`, and free of the identifier separator.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', berth_core::SEPARATOR, '\0'])
}

pub fn validate_upload_name(name: &str) -> Result<(), HostError> {
    if !is_safe_component(name) {
        return Err(HostError::InvalidUpload(format!(
            "{name:?} must be a single file name"
        )));
    }
    if !UPLOAD_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        return Err(HostError::InvalidUpload(format!(
            "{name:?} must end in .py, .js or .sh"
        )));
    }
    Ok(())
}

/// Workspace name for a clone: the last URL path segment without `.git`,
/// suffixed with the owner, e.g. `https://host/me/site.git` -> `site_u42`.
pub fn repo_slug(url: &str, owner: UserId) -> Result<String, HostError> {
    let base = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let base = base.strip_suffix(".git").unwrap_or(base);
    let slug = format!("{base}_u{owner}");
    if base.is_empty() || !is_safe_component(&slug) {
        return Err(HostError::Clone(format!("cannot derive a workspace name from {url:?}")));
    }
    Ok(slug)
}

/// `git clone -- <url> <dest>`, bounded by `timeout`.
pub async fn git_clone(url: &str, dest: &Path, timeout: Duration) -> Result<(), HostError> {
    let mut cmd = Command::new("git");
    cmd.arg("clone")
        .arg("--")
        .arg(url)
        .arg(dest)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");
    let output = run_with_timeout(cmd, timeout, "git clone")
        .await
        .map_err(HostError::Clone)?;
    if !output.status.success() {
        return Err(HostError::Clone(output_tail(&output, TAIL_LINES)));
    }
    Ok(())
}

/// Outcome of one install step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStep {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallSummary {
    pub steps: Vec<InstallStep>,
}

impl InstallSummary {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.ok)
    }

    /// Text appended to the target log.
    pub fn render(&self) -> String {
        if self.steps.is_empty() {
            return "[berth] no dependency manifests found\n".to_string();
        }
        let mut out = String::new();
        for step in &self.steps {
            let status = if step.ok { "ok" } else { "failed" };
            out.push_str(&format!("[berth] {}: {status}\n", step.name));
            if !step.ok && !step.detail.is_empty() {
                out.push_str(&step.detail);
                out.push('\n');
            }
        }
        out
    }
}

/// Install Python then Node dependencies for whichever manifests exist.
/// Each step has its own timeout; a failed step does not skip the next.
pub async fn install_deps(work_dir: &Path, python: &str, timeout: Duration) -> InstallSummary {
    let mut summary = InstallSummary::default();

    if work_dir.join("requirements.txt").is_file() {
        let mut cmd = Command::new(python);
        cmd.args(["-m", "pip", "install", "-r", "requirements.txt"])
            .current_dir(work_dir);
        summary.steps.push(run_step("pip install", cmd, timeout).await);
    }

    if work_dir.join("package.json").is_file() {
        let mut cmd = Command::new("npm");
        cmd.arg("install").current_dir(work_dir);
        summary.steps.push(run_step("npm install", cmd, timeout).await);
    }

    summary
}

async fn run_step(name: &'static str, cmd: Command, timeout: Duration) -> InstallStep {
    match run_with_timeout(cmd, timeout, name).await {
        Ok(output) => InstallStep {
            name,
            ok: output.status.success(),
            detail: output_tail(&output, TAIL_LINES),
        },
        Err(detail) => InstallStep {
            name,
            ok: false,
            detail,
        },
    }
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod tests;
