// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for host operations

use berth_core::{PathError, TargetId};
use berth_storage::StoreError;
use thiserror::Error;

/// Errors returned by the host facade and the supervisor
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    PathTraversal(#[from] PathError),
    #[error("no runnable entry found for {0}")]
    NoRunnableEntry(TargetId),
    #[error("failed to start {id}: {message}")]
    SpawnFailed { id: TargetId, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("dependency install in progress for {0}")]
    InstallInProgress(String),
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
    #[error("clone failed: {0}")]
    Clone(String),
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
