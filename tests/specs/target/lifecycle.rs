// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target start/stop/status/logs specs

use crate::prelude::*;

#[test]
fn upload_start_stop_delete() {
    let host = Host::new();
    let (id, key) = host.upload_loop(OPERATOR, "bot.sh");

    host.berth()
        .args(&["target", "status", &id, "--key", &key])
        .passes()
        .stdout_eq("u1|bot.sh: stopped\n");

    host.operator()
        .args(&["target", "start", &id])
        .passes()
        .stdout_has("started u1|bot.sh")
        .stdout_has("bash");

    host.berth()
        .args(&["target", "status", &id, "--key", &key])
        .passes()
        .stdout_eq("u1|bot.sh: running\n");

    host.operator()
        .args(&["target", "list"])
        .passes()
        .stdout_has("u1|bot.sh")
        .stdout_has("running");

    host.operator()
        .args(&["target", "stop", &id])
        .passes()
        .stdout_eq("Stopped u1|bot.sh\n");

    host.berth()
        .args(&["target", "status", &id, "--key", &key])
        .passes()
        .stdout_eq("u1|bot.sh: stopped\n");

    host.operator()
        .args(&["target", "delete", &id])
        .passes()
        .stdout_eq("Deleted u1|bot.sh\n");

    host.operator()
        .args(&["target", "list"])
        .passes()
        .stdout_eq("No targets\n");
}

#[test]
fn logs_capture_target_output() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");
    host.operator().args(&["target", "start", &id]).passes();

    let logged = wait_for(SPEC_WAIT_MAX_MS, || {
        host.operator()
            .args(&["target", "logs", &id])
            .passes()
            .stdout()
            .contains("hello from bot")
    });
    assert!(logged, "no output in target log\n{}", host.daemon_log());

    host.operator().args(&["target", "clear-logs", &id]).passes();
    host.operator().args(&["target", "stop", &id]).passes();
    host.operator()
        .args(&["target", "logs", &id])
        .passes()
        .stdout_lacks("hello from bot");
}

#[test]
fn wrong_key_is_rejected() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");

    host.berth()
        .args(&["target", "status", &id, "--key", "not-the-key"])
        .fails()
        .stderr_has("invalid key");
}

#[test]
fn reupload_rotates_key() {
    let host = Host::new();
    let (id, first) = host.upload_loop(OPERATOR, "bot.sh");
    let (again, second) = host.upload_loop(OPERATOR, "bot.sh");

    assert_eq!(id, again);
    assert_ne!(first, second);
    host.berth()
        .args(&["target", "status", &id, "--key", &first])
        .fails()
        .stderr_has("invalid key");
}

#[test]
fn members_cannot_touch_other_targets() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");
    host.operator().args(&["admin", "allow", "43"]).passes();

    host.berth()
        .user("43")
        .args(&["target", "start", &id])
        .fails()
        .stderr_has("is not yours");

    host.berth()
        .user("43")
        .args(&["target", "list"])
        .passes()
        .stdout_eq("No targets\n");
}

#[test]
fn upload_with_name_override() {
    let host = Host::new();
    let path = host.local_file("local.sh", LOOP_SCRIPT);

    let out = host
        .operator()
        .args(&["-o", "json", "upload", path.to_str().unwrap(), "--name", "main.sh"])
        .passes()
        .json();
    assert_eq!(out["id"], "u1|main.sh");
}
