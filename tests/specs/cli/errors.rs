// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI error handling specs

use crate::prelude::*;

#[test]
fn target_command_without_caller_fails() {
    let host = Host::new();
    host.berth().args(&["daemon", "start"]).passes();

    host.berth()
        .args(&["target", "list"])
        .fails()
        .stderr_has("no caller id");
}

#[test]
fn malformed_berth_user_is_rejected() {
    let host = Host::new();
    host.berth()
        .env("BERTH_USER", "alice")
        .args(&["target", "list"])
        .fails()
        .stderr_has("BERTH_USER is not a numeric user id");
}

#[test]
fn non_numeric_as_flag_is_a_usage_error() {
    cli()
        .args(&["--as", "alice", "target", "list"])
        .fails()
        .stderr_has("invalid value");
}

#[test]
fn query_without_daemon_reports_not_running() {
    let host = Host::new();
    host.operator()
        .args(&["target", "list"])
        .fails()
        .stderr_has("Daemon not running");
}

#[test]
fn daemon_without_operator_fails_to_start() {
    let host = Host::new();
    host.berth()
        .env_remove("BERTH_OPERATOR_ID")
        .args(&["daemon", "start"])
        .fails()
        .stderr_has("Failed to start daemon");
}

#[test]
fn store_reset_needs_confirmation() {
    let host = Host::new();
    host.berth().args(&["daemon", "start"]).passes();

    host.operator()
        .args(&["admin", "store-reset"])
        .fails()
        .stderr_has("pass --yes to confirm");
}
