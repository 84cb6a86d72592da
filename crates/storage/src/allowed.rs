// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Users the operator has admitted. Persisted as a JSON array of ids.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use berth_core::UserId;
use parking_lot::Mutex;

use crate::json_file::{read_json, write_json_atomic, StoreError};

pub struct AllowedUsers {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AllowedUsers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sorted list of allowed users.
    pub fn list(&self) -> Result<Vec<UserId>, StoreError> {
        Ok(self.load()?.into_iter().collect())
    }

    pub fn contains(&self, user: UserId) -> Result<bool, StoreError> {
        Ok(self.load()?.contains(&user))
    }

    /// Returns false when the user was already allowed.
    pub fn add(&self, user: UserId) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut set = self.load()?;
        if !set.insert(user) {
            return Ok(false);
        }
        write_json_atomic(&self.path, &set)?;
        Ok(true)
    }

    /// Returns false when the user was not in the list.
    pub fn remove(&self, user: UserId) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let mut set = self.load()?;
        if !set.remove(&user) {
            return Ok(false);
        }
        write_json_atomic(&self.path, &set)?;
        Ok(true)
    }

    fn load(&self) -> Result<BTreeSet<UserId>, StoreError> {
        read_json(&self.path)
    }
}

#[cfg(test)]
#[path = "allowed_tests.rs"]
mod tests;
