// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health watchdog.
//!
//! Every interval, checks each target that should be running. Dead targets
//! are restarted (with a "down" alert); live ones over the CPU or memory
//! threshold trigger a "high resource usage" alert. Alerts for a target are
//! rate limited by a cooldown that survives restarts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use berth_adapters::{NotifyAdapter, ProcessAdapter, ResourceProbe, ResourceSample};
use berth_core::{Clock, TargetId, UserId};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::Supervisor;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(20);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(180);
pub const DEFAULT_CPU_ALERT_PERCENT: f32 = 85.0;
pub const DEFAULT_RAM_ALERT_MB: u64 = 350;

#[derive(Debug, Clone, PartialEq)]
pub struct WatchdogConfig {
    pub interval: Duration,
    pub cooldown: Duration,
    pub cpu_alert_percent: f32,
    pub ram_alert_mb: u64,
    /// Receives every alert
    pub operator: UserId,
}

impl WatchdogConfig {
    pub fn new(operator: UserId) -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            cooldown: DEFAULT_COOLDOWN,
            cpu_alert_percent: DEFAULT_CPU_ALERT_PERCENT,
            ram_alert_mb: DEFAULT_RAM_ALERT_MB,
            operator,
        }
    }
}

/// What one tick did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The store could not be read; nothing was checked
    pub skipped: bool,
    pub watched: usize,
    pub restarted: Vec<TargetId>,
    pub failed: Vec<TargetId>,
    pub alerts_sent: usize,
}

pub struct Watchdog<P, N, R, C> {
    supervisor: Arc<Supervisor<P, C>>,
    notifier: N,
    probe: R,
    config: WatchdogConfig,
    last_alert: Mutex<HashMap<TargetId, Instant>>,
}

impl<P, N, R, C> Watchdog<P, N, R, C>
where
    P: ProcessAdapter,
    N: NotifyAdapter,
    R: ResourceProbe,
    C: Clock,
{
    pub fn new(supervisor: Arc<Supervisor<P, C>>, notifier: N, probe: R, config: WatchdogConfig) -> Self {
        Self {
            supervisor,
            notifier,
            probe,
            config,
            last_alert: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Run [`Watchdog::tick`] every interval until the task is aborted. The
    /// first check happens one interval after spawning.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            tracing::info!(interval_secs = self.config.interval.as_secs(), "watchdog started");
            loop {
                interval.tick().await;
                let report = self.tick().await;
                if !report.restarted.is_empty() || !report.failed.is_empty() {
                    tracing::info!(
                        watched = report.watched,
                        restarted = report.restarted.len(),
                        failed = report.failed.len(),
                        alerts = report.alerts_sent,
                        "watchdog tick"
                    );
                }
            }
        })
    }

    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        let records = match self.supervisor.store().load() {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "watchdog cannot read ownership store, skipping tick");
                report.skipped = true;
                return report;
            }
        };

        self.last_alert.lock().retain(|id, _| records.contains_key(id));

        for (id, record) in records.iter().filter(|(_, r)| r.desired_running) {
            report.watched += 1;

            if !self.supervisor.is_running(id) {
                if self.can_alert(id) {
                    let message = format!(
                        "App: {id}\nOwner: {}\nAction: Restarting now...",
                        record.owner
                    );
                    report.alerts_sent += self.alert(record.owner, "App down", &message).await;
                    self.mark_alerted(id);
                }
                match self.supervisor.revive(id).await {
                    Ok(Some(outcome)) => {
                        tracing::info!(target_id = %id, pid = outcome.pid, "watchdog restarted target");
                        report.restarted.push(id.clone());
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(target_id = %id, error = %e, "watchdog restart failed");
                        report.failed.push(id.clone());
                    }
                }
                continue;
            }

            let Some(sample) = self.supervisor.pid(id).and_then(|pid| self.probe.sample(pid)) else {
                continue;
            };
            if self.over_threshold(&sample) && self.can_alert(id) {
                let message = format!(
                    "App: {id}\nCPU: {:.2}% (threshold {}%)\nRAM: {:.2} MB (threshold {} MB)",
                    sample.cpu_percent,
                    self.config.cpu_alert_percent,
                    sample.rss_mb(),
                    self.config.ram_alert_mb
                );
                report.alerts_sent += self.alert(record.owner, "High resource usage", &message).await;
                self.mark_alerted(id);
            }
        }
        report
    }

    fn over_threshold(&self, sample: &ResourceSample) -> bool {
        sample.cpu_percent >= self.config.cpu_alert_percent
            || sample.rss_mb() >= self.config.ram_alert_mb as f64
    }

    fn can_alert(&self, id: &TargetId) -> bool {
        let now = self.supervisor.clock().now();
        self.last_alert
            .lock()
            .get(id)
            .is_none_or(|last| now.saturating_duration_since(*last) >= self.config.cooldown)
    }

    fn mark_alerted(&self, id: &TargetId) {
        let now = self.supervisor.clock().now();
        self.last_alert.lock().insert(id.clone(), now);
    }

    /// Alert the operator, and the owner when different. Returns the number
    /// of deliveries that succeeded.
    async fn alert(&self, owner: UserId, title: &str, message: &str) -> usize {
        let mut recipients = vec![self.config.operator];
        if owner != self.config.operator {
            recipients.push(owner);
        }
        let mut delivered = 0;
        for recipient in recipients {
            match self.notifier.notify(recipient, title, message).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(%recipient, title, error = %e, "alert delivery failed"),
            }
        }
        delivered
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
