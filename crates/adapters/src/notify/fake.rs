// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use berth_core::UserId;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded alert
#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub recipient: UserId,
    pub title: String,
    pub message: String,
}

#[derive(Default)]
struct FakeNotifyState {
    calls: Vec<NotifyCall>,
    failing: bool,
}

/// Fake notification adapter for testing
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    inner: Arc<Mutex<FakeNotifyState>>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded alerts, including ones that were made to fail
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.inner.lock().calls.clone()
    }

    /// Alerts whose title contains `needle`
    pub fn calls_titled(&self, needle: &str) -> Vec<NotifyCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.title.contains(needle))
            .collect()
    }

    /// Make subsequent sends return an error
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().failing = failing;
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(&self, recipient: UserId, title: &str, message: &str) -> Result<(), NotifyError> {
        let mut inner = self.inner.lock();
        inner.calls.push(NotifyCall {
            recipient,
            title: title.to_string(),
            message: message.to_string(),
        });
        if inner.failing {
            return Err(NotifyError::SendFailed("fake failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
