// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification adapter using notify-rust.
//!
//! Used when no alert hook is configured, so a single-host operator still
//! sees alerts. The recipient is shown in the notification body.

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use berth_core::UserId;

#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotifyAdapter;

impl DesktopNotifyAdapter {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            // mac-notification-sys otherwise runs a bundle lookup that blocks
            // forever in daemon processes without Automation permissions
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn notify(&self, recipient: UserId, title: &str, message: &str) -> Result<(), NotifyError> {
        let title = title.to_string();
        let body = format!("to {recipient}\n{message}");
        // show() is synchronous on some platforms
        let result = tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .summary(&title)
                .body(&body)
                .show()
                .map(|_| ())
                .map_err(|e| NotifyError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotifyError::SendFailed(e.to_string()))?;
        if result.is_ok() {
            tracing::info!(%recipient, "desktop notification sent");
        }
        result
    }
}
