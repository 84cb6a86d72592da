// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::{Duration, Instant};

use berth_adapters::FakeProcessAdapter;
use berth_core::{FakeClock, SequentialIdGen, TargetId, UserId};
use berth_engine::{Host, HostConfig, Supervisor, SupervisorConfig, TargetState};
use berth_storage::{AllowedUsers, OwnershipStore};
use tempfile::TempDir;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;

use super::{handle_request, ListenCtx, Listener};
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

const OPERATOR: UserId = UserId(1);
const ALICE: UserId = UserId(42);
const BOB: UserId = UserId(43);

type TestCtx = ListenCtx<FakeProcessAdapter, FakeClock, SequentialIdGen>;

struct Fixture {
    dir: TempDir,
    processes: FakeProcessAdapter,
    ctx: TestCtx,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("scripts");
    std::fs::create_dir_all(&root).unwrap();
    let processes = FakeProcessAdapter::new();
    let store = Arc::new(OwnershipStore::new(dir.path().join("ownership.json")));
    let allowed = Arc::new(AllowedUsers::new(dir.path().join("allowed_users.json")));
    allowed.add(ALICE).unwrap();
    let supervisor = Arc::new(Supervisor::new(
        processes.clone(),
        FakeClock::new(),
        store,
        SupervisorConfig {
            uploads_root: root.clone(),
            python: "python3".to_string(),
        },
    ));
    let host = Host::new(
        supervisor,
        allowed,
        SequentialIdGen::new("key"),
        HostConfig {
            uploads_root: root,
            operator: OPERATOR,
            python: "python3".to_string(),
            install_timeout: Duration::from_secs(5),
            clone_timeout: Duration::from_secs(5),
        },
    );
    Fixture {
        dir,
        processes,
        ctx: ListenCtx {
            host: Arc::new(host),
            start_time: Instant::now(),
            watchdog_enabled: false,
            shutdown: Arc::new(Notify::new()),
        },
    }
}

async fn upload(ctx: &TestCtx, caller: UserId, name: &str) -> (TargetId, String) {
    let response = handle_request(
        Request::Upload {
            caller,
            file_name: name.to_string(),
            content: b"print('hi')\n".to_vec(),
        },
        ctx,
    )
    .await;
    match response {
        Response::Uploaded { outcome } => (outcome.id, outcome.key.to_string()),
        other => panic!("Expected Uploaded, got {:?}", other),
    }
}

fn error_message(response: Response) -> String {
    match response {
        Response::Error { message } => message,
        other => panic!("Expected Error, got {:?}", other),
    }
}

#[tokio::test]
async fn ping_and_hello() {
    let f = fixture();
    assert_eq!(handle_request(Request::Ping, &f.ctx).await, Response::Pong);
    assert_eq!(
        handle_request(
            Request::Hello {
                version: "0.0.0".to_string()
            },
            &f.ctx
        )
        .await,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn upload_start_status_stop() {
    let f = fixture();
    let (id, key) = upload(&f.ctx, ALICE, "bot.py").await;
    assert_eq!(id, TargetId::new("u42|bot.py"));
    assert_eq!(key, "key-1");

    let started = handle_request(
        Request::Start {
            caller: ALICE,
            id: id.clone(),
        },
        &f.ctx,
    )
    .await;
    let Response::Started { outcome } = started else {
        panic!("Expected Started");
    };
    assert_eq!(f.processes.live_pids(), vec![outcome.pid]);

    let status = handle_request(
        Request::TargetStatus {
            id: id.clone(),
            key: key.clone(),
        },
        &f.ctx,
    )
    .await;
    assert_eq!(
        status,
        Response::TargetState {
            state: TargetState::Running
        }
    );

    let wrong = handle_request(
        Request::TargetStatus {
            id: id.clone(),
            key: "nope".to_string(),
        },
        &f.ctx,
    )
    .await;
    assert!(error_message(wrong).contains("invalid key"));

    assert_eq!(
        handle_request(Request::Stop { caller: ALICE, id: id.clone() }, &f.ctx).await,
        Response::Ok
    );
    assert!(f.processes.live_pids().is_empty());
}

#[tokio::test]
async fn host_errors_become_error_responses() {
    let f = fixture();
    let (id, _) = upload(&f.ctx, ALICE, "bot.py").await;

    let denied = handle_request(
        Request::Upload {
            caller: BOB,
            file_name: "bot.py".to_string(),
            content: Vec::new(),
        },
        &f.ctx,
    )
    .await;
    assert!(error_message(denied).starts_with("forbidden"));

    let not_yours = handle_request(Request::Stop { caller: BOB, id }, &f.ctx).await;
    assert!(error_message(not_yours).contains("not yours"));

    let panel = handle_request(Request::StopAll { caller: ALICE }, &f.ctx).await;
    assert!(error_message(panel).contains("operator only"));
}

#[tokio::test]
async fn env_roundtrip() {
    let f = fixture();
    let (id, _) = upload(&f.ctx, ALICE, "bot.py").await;

    let set = handle_request(
        Request::EnvSet {
            caller: ALICE,
            id: id.clone(),
            key: "TOKEN".to_string(),
            value: "abc".to_string(),
        },
        &f.ctx,
    )
    .await;
    assert_eq!(set, Response::Ok);

    let Response::Env { vars } = handle_request(Request::EnvGet { caller: ALICE, id: id.clone() }, &f.ctx).await
    else {
        panic!("Expected Env");
    };
    assert_eq!(vars.get("TOKEN").map(String::as_str), Some("abc"));

    let unset = handle_request(
        Request::EnvUnset {
            caller: ALICE,
            id,
            key: "TOKEN".to_string(),
        },
        &f.ctx,
    )
    .await;
    assert_eq!(unset, Response::EnvUnset { existed: true });
}

#[tokio::test]
async fn status_counts_targets() {
    let f = fixture();
    let (id, _) = upload(&f.ctx, ALICE, "bot.py").await;
    upload(&f.ctx, ALICE, "other.py").await;
    handle_request(Request::Start { caller: ALICE, id }, &f.ctx).await;

    let Response::Status {
        targets_total,
        targets_running,
        watchdog_enabled,
        uploads_root,
        ..
    } = handle_request(Request::Status, &f.ctx).await
    else {
        panic!("Expected Status");
    };
    assert_eq!(targets_total, 2);
    assert_eq!(targets_running, 1);
    assert!(!watchdog_enabled);
    assert_eq!(uploads_root, f.dir.path().join("scripts"));
}

#[tokio::test]
async fn list_targets_is_sorted() {
    let f = fixture();
    upload(&f.ctx, ALICE, "zeta.py").await;
    upload(&f.ctx, ALICE, "alpha.py").await;

    let Response::Targets { targets } = handle_request(Request::ListTargets { caller: ALICE }, &f.ctx).await else {
        panic!("Expected Targets");
    };
    let ids: Vec<&str> = targets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["u42|alpha.py", "u42|zeta.py"]);
}

#[tokio::test]
async fn shutdown_notifies_and_keeps_flags_unless_asked() {
    let f = fixture();
    let (id, _) = upload(&f.ctx, ALICE, "bot.py").await;
    handle_request(Request::Start { caller: ALICE, id: id.clone() }, &f.ctx).await;

    let response = handle_request(Request::Shutdown { stop_targets: false }, &f.ctx).await;
    assert_eq!(response, Response::ShuttingDown);
    tokio::time::timeout(Duration::from_secs(1), f.ctx.shutdown.notified())
        .await
        .unwrap();

    let store = f.ctx.host.supervisor().store();
    assert!(store.get(&id).unwrap().unwrap().desired_running);

    handle_request(Request::Shutdown { stop_targets: true }, &f.ctx).await;
    assert!(!store.get(&id).unwrap().unwrap().desired_running);
    assert!(f.processes.live_pids().is_empty());
}

#[tokio::test]
async fn access_management_is_operator_only() {
    let f = fixture();

    let denied = handle_request(Request::AccessAdd { caller: ALICE, user: BOB }, &f.ctx).await;
    assert!(error_message(denied).contains("operator only"));

    assert_eq!(
        handle_request(Request::AccessAdd { caller: OPERATOR, user: BOB }, &f.ctx).await,
        Response::AccessChanged { changed: true }
    );
    let Response::Access { access } = handle_request(Request::AccessList { caller: OPERATOR }, &f.ctx).await else {
        panic!("Expected Access");
    };
    assert_eq!(access.operator, OPERATOR);
    assert!(access.allowed.contains(&BOB));
}

#[tokio::test]
async fn listener_serves_requests_over_socket() {
    let f = fixture();
    let socket_path = f.dir.path().join("test.sock");
    let socket = UnixListener::bind(&socket_path).unwrap();
    let Fixture { ctx, dir: _dir, .. } = f;
    let task = tokio::spawn(Listener::new(socket, ctx).run());

    let stream = UnixStream::connect(&socket_path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    let data = protocol::encode(&Request::Ping).unwrap();
    protocol::write_message(&mut writer, &data).await.unwrap();

    let bytes = tokio::time::timeout(DEFAULT_TIMEOUT, protocol::read_message(&mut reader))
        .await
        .unwrap()
        .unwrap();
    let response: Response = protocol::decode(&bytes).unwrap();
    assert_eq!(response, Response::Pong);

    task.abort();
}
