// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Targets resume across daemon restarts

use crate::prelude::*;

fn target_state(host: &Host, id: &str) -> Option<String> {
    let out = host.operator().args(&["-o", "json", "target", "list"]).passes().json();
    out.as_array()?
        .iter()
        .find(|t| t["id"] == id)
        .map(|t| {
            if t["running"] == true {
                "running".to_string()
            } else if t["desired_running"] == true {
                "down".to_string()
            } else {
                "stopped".to_string()
            }
        })
}

#[test]
fn running_targets_resume_after_plain_stop() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");
    host.operator().args(&["target", "start", &id]).passes();

    host.berth().args(&["daemon", "stop"]).passes();
    host.berth().args(&["daemon", "start"]).passes();

    let resumed = wait_for(SPEC_WAIT_MAX_MS, || {
        target_state(&host, &id).as_deref() == Some("running")
    });
    assert!(resumed, "target did not resume\n{}", host.daemon_log());
}

#[test]
fn stop_targets_clears_desired_running() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");
    host.operator().args(&["target", "start", &id]).passes();

    host.berth().args(&["daemon", "stop", "--stop-targets"]).passes();
    host.berth().args(&["daemon", "start"]).passes();

    assert_eq!(target_state(&host, &id).as_deref(), Some("stopped"));
}

#[test]
fn stopped_targets_stay_stopped() {
    let host = Host::new();
    let (id, _) = host.upload_loop(OPERATOR, "bot.sh");

    host.berth().args(&["daemon", "restart"]).passes();

    assert_eq!(target_state(&host, &id).as_deref(), Some("stopped"));
}
