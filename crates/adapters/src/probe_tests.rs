// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn samples_own_process() {
    let probe = SysinfoProbe::new();
    let sample = probe.sample(std::process::id()).unwrap();
    assert!(sample.rss_bytes > 0);
    assert!(sample.cpu_percent >= 0.0);
}

#[test]
fn missing_pid_is_none() {
    // Above the default Linux pid_max
    assert_eq!(SysinfoProbe::new().sample(4_000_000), None);
}

#[test]
fn fake_probe_returns_set_samples() {
    let probe = FakeResourceProbe::new();
    probe.set(7, 90.0, 10);
    let sample = probe.sample(7).unwrap();
    assert_eq!(sample.cpu_percent, 90.0);
    assert_eq!(sample.rss_mb(), 10.0);
    assert_eq!(probe.sample(8), None);
}
