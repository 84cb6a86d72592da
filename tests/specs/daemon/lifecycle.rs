// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs

use crate::prelude::*;

#[test]
fn start_status_stop() {
    let host = Host::new();

    host.berth()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon started");

    host.berth()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running")
        .stdout_has("Targets: 0 (0 running)")
        .stdout_has("Watchdog: off");

    host.berth()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon stopped");

    host.berth()
        .args(&["daemon", "status"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn second_start_reports_running_daemon() {
    let host = Host::new();
    host.berth().args(&["daemon", "start"]).passes();

    host.berth()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon already running");
}

#[test]
fn stop_without_daemon() {
    let host = Host::new();
    host.berth()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_has("Daemon not running");
}

#[test]
fn status_json() {
    let host = Host::new();

    let down = host.berth().args(&["-o", "json", "daemon", "status"]).passes().json();
    assert_eq!(down["status"], "not_running");

    host.berth().args(&["daemon", "start"]).passes();
    let up = host.berth().args(&["-o", "json", "daemon", "status"]).passes().json();
    assert_eq!(up["status"], "running");
    assert_eq!(up["targets_total"], 0);
    assert_eq!(up["watchdog_enabled"], false);
}

#[test]
fn daemon_writes_pid_and_log() {
    let host = Host::new();
    host.berth().args(&["daemon", "start"]).passes();

    assert!(host.daemon_pid().is_some(), "no pid file");
    assert!(host.daemon_log().contains("berthd: starting"));

    host.berth()
        .args(&["daemon", "logs", "-n", "20"])
        .passes()
        .stdout_has("berthd: starting");
}

#[test]
fn commands_start_the_daemon_on_demand() {
    let host = Host::new();

    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");
    assert_eq!(id, "u1|bot.sh");
    assert!(host.daemon_pid().is_some());
}

#[test]
fn restart_replaces_daemon_process() {
    let host = Host::new();
    host.berth().args(&["daemon", "start"]).passes();
    let before = host.daemon_pid();

    host.berth()
        .args(&["daemon", "restart"])
        .passes()
        .stdout_has("Daemon restarted");

    let after = host.daemon_pid();
    assert!(after.is_some());
    assert_ne!(before, after);
}
