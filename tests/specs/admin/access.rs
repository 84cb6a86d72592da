// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access list specs

use crate::prelude::*;

#[test]
fn strangers_cannot_upload() {
    let host = Host::new();
    let path = host.local_file("bot.sh", LOOP_SCRIPT);

    host.berth()
        .user("43")
        .args(&["upload", path.to_str().unwrap()])
        .fails()
        .stderr_has("user 43 is not allowed");
}

#[test]
fn allow_then_upload_then_deny() {
    let host = Host::new();

    host.operator()
        .args(&["admin", "allow", "43"])
        .passes()
        .stdout_eq("Allowed 43\n");
    host.operator()
        .args(&["admin", "allow", "43"])
        .passes()
        .stdout_eq("43 was already allowed\n");

    let (id, _) = host.upload_loop("43", "bot.sh");
    assert_eq!(id, "u43|bot.sh");

    host.operator()
        .args(&["admin", "deny", "43"])
        .passes()
        .stdout_eq("Denied 43\n");

    let path = host.local_file("other.sh", LOOP_SCRIPT);
    host.berth()
        .user("43")
        .args(&["upload", path.to_str().unwrap()])
        .fails()
        .stderr_has("not allowed");
}

#[test]
fn operator_cannot_be_denied() {
    let host = Host::new();
    host.operator()
        .args(&["admin", "deny", OPERATOR])
        .fails()
        .stderr_has("the operator cannot be denied");
}

#[test]
fn users_lists_operator_and_allowed() {
    let host = Host::new();
    host.operator().args(&["admin", "allow", "42"]).passes();

    let access = host.operator().args(&["-o", "json", "admin", "users"]).passes().json();
    assert_eq!(access["operator"], 1);
    assert_eq!(access["allowed"], serde_json::json!([42]));
}

#[test]
fn operator_commands_reject_members() {
    let host = Host::new();
    host.operator().args(&["admin", "allow", "42"]).passes();

    for command in ["users", "running", "down", "stop-all"] {
        host.berth()
            .user("42")
            .args(&["admin", command])
            .fails()
            .stderr_has("operator only");
    }
}
