// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable JSON stores for berth: target ownership and the allowed-user list

mod allowed;
mod json_file;
mod ownership;

pub use allowed::AllowedUsers;
pub use json_file::StoreError;
pub use ownership::{OwnershipMap, OwnershipStore};
