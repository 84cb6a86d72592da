// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator panel specs

use crate::prelude::*;

#[test]
fn stats_count_targets() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "a.sh");
    host.upload_loop(OPERATOR, "b.sh");
    host.operator().args(&["target", "start", &id]).passes();

    host.operator()
        .args(&["admin", "stats"])
        .passes()
        .stdout_eq("Targets: 2\nRunning: 1\n");
}

#[test]
fn running_and_stop_all() {
    let host = Host::new();
    for name in ["a.sh", "b.sh"] {
        let (id, _) = host.upload_loop(OPERATOR, name);
        host.operator().args(&["target", "start", &id]).passes();
    }

    host.operator()
        .args(&["admin", "running"])
        .passes()
        .stdout_has("u1|a.sh")
        .stdout_has("u1|b.sh");

    host.operator()
        .args(&["admin", "stop-all"])
        .passes()
        .stdout_eq("Stopped 2 target(s)\n");

    host.operator()
        .args(&["admin", "down"])
        .passes()
        .stdout_lacks("u1|a.sh");

    host.operator()
        .args(&["admin", "stats"])
        .passes()
        .stdout_eq("Targets: 2\nRunning: 0\n");
}

#[test]
fn restart_all_starts_nothing_after_stop_all() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "a.sh");
    host.operator().args(&["target", "start", &id]).passes();
    host.operator().args(&["admin", "stop-all"]).passes();

    host.operator()
        .args(&["admin", "restart-all"])
        .passes()
        .stdout_eq("Started 0 target(s)\n");
}

#[test]
fn store_reset_forgets_ownership() {
    let host = Host::new();
    host.upload_loop(OPERATOR, "a.sh");

    host.operator()
        .args(&["admin", "store-reset", "--yes"])
        .passes()
        .stdout_has("Store reset");

    host.operator()
        .args(&["target", "list"])
        .passes()
        .stdout_lacks("u1|a.sh");
}
