// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use berth_adapters::{FakeNotifyAdapter, FakeProcessAdapter, FakeResourceProbe};
use berth_core::{AccessKey, FakeClock, OwnershipRecord, SequentialIdGen, TargetId, TargetType, UserId};
use berth_storage::{AllowedUsers, OwnershipStore};
use tempfile::TempDir;

use crate::{Host, HostConfig, Supervisor, SupervisorConfig, Watchdog, WatchdogConfig};

pub(crate) const OPERATOR: UserId = UserId(1);

pub(crate) type TestSupervisor = Supervisor<FakeProcessAdapter, FakeClock>;
pub(crate) type TestWatchdog =
    Watchdog<FakeProcessAdapter, FakeNotifyAdapter, FakeResourceProbe, FakeClock>;
pub(crate) type TestHost = Host<FakeProcessAdapter, FakeClock, SequentialIdGen>;

/// Everything a test needs, wired against fakes and a temp state dir.
pub(crate) struct TestContext {
    pub dir: TempDir,
    pub root: PathBuf,
    pub processes: FakeProcessAdapter,
    pub clock: FakeClock,
    pub notifier: FakeNotifyAdapter,
    pub probe: FakeResourceProbe,
    pub store: Arc<OwnershipStore>,
    pub allowed: Arc<AllowedUsers>,
    pub supervisor: Arc<TestSupervisor>,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("scripts");
        std::fs::create_dir_all(&root).unwrap();
        let processes = FakeProcessAdapter::new();
        let clock = FakeClock::new();
        let store = Arc::new(OwnershipStore::new(dir.path().join("ownership.json")));
        let allowed = Arc::new(AllowedUsers::new(dir.path().join("allowed_users.json")));
        let supervisor = Arc::new(Supervisor::new(
            processes.clone(),
            clock.clone(),
            Arc::clone(&store),
            SupervisorConfig {
                uploads_root: root.clone(),
                python: "python3".to_string(),
            },
        ));
        Self {
            dir,
            root,
            processes,
            clock,
            notifier: FakeNotifyAdapter::new(),
            probe: FakeResourceProbe::new(),
            store,
            allowed,
            supervisor,
        }
    }

    pub fn watchdog(&self) -> TestWatchdog {
        Watchdog::new(
            Arc::clone(&self.supervisor),
            self.notifier.clone(),
            self.probe.clone(),
            WatchdogConfig::new(OPERATOR),
        )
    }

    pub fn host(&self) -> TestHost {
        Host::new(
            Arc::clone(&self.supervisor),
            Arc::clone(&self.allowed),
            SequentialIdGen::new("key"),
            HostConfig {
                uploads_root: self.root.clone(),
                operator: OPERATOR,
                python: "python3".to_string(),
                install_timeout: Duration::from_secs(5),
                clone_timeout: Duration::from_secs(5),
            },
        )
    }

    /// Write `rel` into the workspace of `id`, creating parents.
    pub fn write_script(&self, id: &TargetId, rel: &str, body: &str) -> PathBuf {
        let path = self.supervisor.paths(id).unwrap().work_dir.join(rel);
        write(&path, body);
        path
    }

    /// Upload-style fixture: a script on disk plus its record.
    pub fn user_file(&self, owner: UserId, file: &str) -> TargetId {
        let id = TargetId::user_file(owner, file);
        self.write_script(&id, file, "print('hi')\n");
        self.store
            .upsert(
                &id,
                OwnershipRecord::new(
                    owner,
                    TargetType::File,
                    AccessKey::new(format!("key-{file}")),
                    Some(file.to_string()),
                    0,
                ),
            )
            .unwrap();
        id
    }

    pub fn pid_of(&self, id: &TargetId) -> u32 {
        self.supervisor.pid(id).unwrap()
    }

    pub fn desired(&self, id: &TargetId) -> bool {
        self.store.get(id).unwrap().is_some_and(|r| r.desired_running)
    }
}

pub(crate) fn write(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
}
