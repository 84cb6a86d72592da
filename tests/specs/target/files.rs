// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace file browsing specs

use crate::prelude::*;

#[test]
fn files_and_cat() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");

    host.operator()
        .args(&["target", "files", &id])
        .passes()
        .stdout_has("bot.sh");

    host.operator()
        .args(&["target", "cat", &id, "bot.sh"])
        .passes()
        .stdout_eq(LOOP_SCRIPT);
}

#[test]
fn put_writes_into_workspace() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");
    let local = host.local_file("notes.txt", "remember the milk\n");

    host.operator()
        .args(&["target", "put", &id, "data/notes.txt", "--from", local.to_str().unwrap()])
        .passes()
        .stdout_has("Wrote 18 bytes to data/notes.txt");

    host.operator()
        .args(&["target", "cat", &id, "data/notes.txt"])
        .passes()
        .stdout_eq("remember the milk\n");
}

#[test]
fn paths_cannot_escape_workspace() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");

    host.operator()
        .args(&["target", "cat", &id, "../../daemon.pid"])
        .fails();
}
