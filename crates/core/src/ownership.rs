// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership records.
//!
//! One record per target identifier, persisted as
//! `{"owner": 42, "type": "file", "key": "...", "last_run": false, "entry": "bot.py", "created_at": 1700000000}`.

use serde::{Deserialize, Serialize};

use crate::user::UserId;

crate::define_id! {
    /// Secret capability token for status queries. Generated once per record.
    pub struct AccessKey;
}

/// Workspace kind stored in the record's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    File,
    Repo,
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::File => f.write_str("file"),
            TargetType::Repo => f.write_str("repo"),
        }
    }
}

/// Durable metadata for one hosted target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub owner: UserId,
    #[serde(rename = "type")]
    pub kind: TargetType,
    pub key: AccessKey,
    /// Whether the target should be running; survives service restarts.
    #[serde(rename = "last_run", default)]
    pub desired_running: bool,
    /// Chosen entry point relative to the workspace.
    #[serde(default)]
    pub entry: Option<String>,
    /// Creation time, seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
}

impl OwnershipRecord {
    /// A record for a freshly provisioned target; not yet desired running.
    pub fn new(
        owner: UserId,
        kind: TargetType,
        key: AccessKey,
        entry: Option<String>,
        created_at: i64,
    ) -> Self {
        Self {
            owner,
            kind,
            key,
            desired_running: false,
            entry,
            created_at,
        }
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod tests;
