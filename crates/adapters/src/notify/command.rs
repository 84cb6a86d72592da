// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert hook adapter.
//!
//! Delivers each alert by running an operator-configured program as
//! `<program> <recipient> <title>` with a JSON payload
//! `{"recipient", "title", "message"}` on stdin. Chat front ends install a
//! hook that forwards the payload to the recipient.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use berth_core::UserId;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{NotifyAdapter, NotifyError};
use crate::subprocess::ALERT_HOOK_TIMEOUT;

#[derive(Clone, Debug)]
pub struct CommandNotifyAdapter {
    program: PathBuf,
}

impl CommandNotifyAdapter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl NotifyAdapter for CommandNotifyAdapter {
    async fn notify(&self, recipient: UserId, title: &str, message: &str) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "recipient": recipient.get(),
            "title": title,
            "message": message,
        })
        .to_string();

        let mut child = Command::new(&self.program)
            .arg(recipient.to_string())
            .arg(title)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NotifyError::SendFailed(format!("{}: {e}", self.program.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A hook that ignores stdin may close it early
            let _ = stdin.write_all(payload.as_bytes()).await;
        }

        let output = tokio::time::timeout(ALERT_HOOK_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                NotifyError::SendFailed(format!(
                    "alert hook timed out after {}s",
                    ALERT_HOOK_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;

        if output.status.success() {
            tracing::debug!(%recipient, title, "alert hook delivered");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(NotifyError::SendFailed(format!(
                "alert hook exited with {}: {}",
                output.status,
                stderr.trim()
            )))
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
