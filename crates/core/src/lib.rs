// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-core: target identifiers, path resolution, and ownership records

pub mod clock;
pub mod containment;
pub mod id;
pub mod ownership;
pub mod target;
pub mod time_fmt;
pub mod user;

pub use clock::{Clock, SystemClock};
pub use containment::{contains_path, resolve_within, PathError};
pub use id::{IdGen, RandomKeyGen, ShortId};
pub use ownership::{AccessKey, OwnershipRecord, TargetType};
pub use target::{classify, resolve_paths, TargetId, TargetKind, TargetPaths, PLACEHOLDER_ENTRY, SEPARATOR};
pub use time_fmt::format_elapsed;
pub use user::UserId;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use clock::FakeClock;
#[cfg(any(test, feature = "test-support"))]
pub use id::SequentialIdGen;
