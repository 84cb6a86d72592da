// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert delivery adapters

mod command;
mod desktop;

pub use command::CommandNotifyAdapter;
pub use desktop::DesktopNotifyAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use berth_core::UserId;
use thiserror::Error;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Adapter for delivering alerts to a user
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    /// Send an alert with a title and message body to `recipient`
    async fn notify(&self, recipient: UserId, title: &str, message: &str) -> Result<(), NotifyError>;
}
