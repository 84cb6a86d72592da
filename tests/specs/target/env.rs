// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target environment specs

use crate::prelude::*;

#[test]
fn set_list_unset() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");

    host.operator()
        .args(&["env", "list", &id])
        .passes()
        .stdout_eq("No variables\n");

    host.operator()
        .args(&["env", "set", &id, "TOKEN=abc"])
        .passes()
        .stdout_eq("Set TOKEN\n");
    host.operator().args(&["env", "set", &id, "MODE", "prod"]).passes();

    host.operator()
        .args(&["env", "list", &id])
        .passes()
        .stdout_eq("MODE=prod\nTOKEN=abc\n");

    host.operator()
        .args(&["env", "unset", &id, "TOKEN"])
        .passes()
        .stdout_eq("Removed TOKEN\n");
    host.operator()
        .args(&["env", "unset", &id, "TOKEN"])
        .passes()
        .stdout_eq("TOKEN was not set\n");
}

#[test]
fn append_from_file() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");
    let env = host.local_file("vars.env", "A=1\n# comment\nB=2\n");

    host.operator()
        .args(&["env", "append", &id, "--from", env.to_str().unwrap()])
        .passes();

    let vars = host.operator().args(&["-o", "json", "env", "list", &id]).passes().json();
    assert_eq!(vars["A"], "1");
    assert_eq!(vars["B"], "2");
}

#[test]
fn invalid_variable_name_is_rejected() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");

    host.operator()
        .args(&["env", "set", &id, "1BAD", "x"])
        .fails()
        .stderr_has("is not a valid variable name");
}

#[test]
fn started_process_sees_variables() {
    let host = Host::new();
    let path = host.local_file("env.sh", "echo mode=$MODE\nwhile true; do sleep 1; done\n");
    let out = host
        .operator()
        .args(&["-o", "json", "upload", path.to_str().unwrap()])
        .passes()
        .json();
    let id = out["id"].as_str().unwrap().to_string();

    host.operator().args(&["env", "set", &id, "MODE", "prod"]).passes();
    host.operator().args(&["target", "start", &id]).passes();

    let seen = wait_for(SPEC_WAIT_MAX_MS, || {
        host.operator()
            .args(&["target", "logs", &id])
            .passes()
            .stdout()
            .contains("mode=prod")
    });
    assert!(seen, "variable not visible to the process");
}
