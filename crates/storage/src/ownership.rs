// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable map of target identifiers to ownership records.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use berth_core::{AccessKey, OwnershipRecord, TargetId, UserId};
use parking_lot::Mutex;
use tracing::{error, warn};

use crate::json_file::{move_aside, read_json, write_json_atomic, StoreError};

pub type OwnershipMap = BTreeMap<TargetId, OwnershipRecord>;

/// JSON-file backed ownership store.
///
/// Every mutation re-reads the file, applies the change and atomically
/// replaces it. Writers in this process are serialized by `write_lock`;
/// the daemon's lock file rules out writers in other processes.
pub struct OwnershipStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OwnershipStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<OwnershipMap, StoreError> {
        read_json(&self.path)
    }

    pub fn get(&self, id: &TargetId) -> Result<Option<OwnershipRecord>, StoreError> {
        Ok(self.load()?.remove(id))
    }

    pub fn owner(&self, id: &TargetId) -> Result<Option<UserId>, StoreError> {
        Ok(self.get(id)?.map(|r| r.owner))
    }

    pub fn secret_key(&self, id: &TargetId) -> Result<Option<AccessKey>, StoreError> {
        Ok(self.get(id)?.map(|r| r.key))
    }

    /// The record's chosen entry, if the record exists and has one.
    pub fn entry_point(&self, id: &TargetId) -> Result<Option<String>, StoreError> {
        Ok(self.get(id)?.and_then(|r| r.entry))
    }

    pub fn upsert(&self, id: &TargetId, record: OwnershipRecord) -> Result<(), StoreError> {
        self.mutate(|map| {
            map.insert(id.clone(), record);
            ((), true)
        })
    }

    /// Remove a record. Returns whether one existed.
    pub fn delete(&self, id: &TargetId) -> Result<bool, StoreError> {
        self.mutate(|map| {
            let removed = map.remove(id).is_some();
            (removed, removed)
        })
    }

    /// Move the record at `from` to `to`, keeping its key. Any record already
    /// at `to` is replaced. Returns whether `from` existed.
    pub fn rename(&self, from: &TargetId, to: &TargetId) -> Result<bool, StoreError> {
        self.mutate(|map| match map.remove(from) {
            Some(record) => {
                map.insert(to.clone(), record);
                (true, true)
            }
            None => (false, false),
        })
    }

    /// Returns whether a record existed to update.
    pub fn set_desired_running(&self, id: &TargetId, desired: bool) -> Result<bool, StoreError> {
        self.mutate(|map| match map.get_mut(id) {
            Some(record) => {
                let changed = record.desired_running != desired;
                record.desired_running = desired;
                (true, changed)
            }
            None => (false, false),
        })
    }

    /// Returns whether a record existed to update.
    pub fn set_entry_point(&self, id: &TargetId, entry: Option<String>) -> Result<bool, StoreError> {
        self.mutate(|map| match map.get_mut(id) {
            Some(record) => {
                let changed = record.entry != entry;
                record.entry = entry;
                (true, changed)
            }
            None => (false, false),
        })
    }

    /// Move the store file aside to a rotating backup and start empty.
    /// Returns the backup path when a file was moved.
    pub fn reset(&self) -> Result<Option<PathBuf>, StoreError> {
        let _guard = self.write_lock.lock();
        let bak = move_aside(&self.path)?;
        if let Some(bak) = &bak {
            warn!(path = %self.path.display(), bak = %bak.display(), "ownership store reset");
        }
        Ok(bak)
    }

    /// Load, apply `f`, and write back when `f` reports a change.
    fn mutate<T>(&self, f: impl FnOnce(&mut OwnershipMap) -> (T, bool)) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock();
        let mut map = self.load().inspect_err(|e| {
            if e.is_corrupt() {
                error!(error = %e, "refusing to write ownership store");
            }
        })?;
        let (out, changed) = f(&mut map);
        if changed {
            write_json_atomic(&self.path, &map)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod tests;
