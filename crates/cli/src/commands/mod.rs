// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod admin;
pub mod daemon;
pub mod env;
pub mod provision;
pub mod target;

use anyhow::{anyhow, Result};
use berth_core::UserId;

use crate::client::ClientError;

/// The caller id, which every target operation needs.
pub fn require_caller(caller: Option<UserId>) -> Result<UserId> {
    caller.ok_or_else(|| anyhow!("no caller id: pass --as <UID> or set BERTH_USER"))
}

/// Error for a well-formed response of the wrong variant.
pub(crate) fn unexpected() -> anyhow::Error {
    ClientError::UnexpectedResponse.into()
}
