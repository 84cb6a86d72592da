// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon status and operator panel handlers.

use berth_adapters::ProcessAdapter;
use berth_core::{Clock, IdGen, UserId};
use berth_engine::{Host, HostError};
use tracing::{info, warn};

use super::ListenCtx;
use crate::protocol::Response;

/// Daemon status. A store that fails to load reports zero targets.
pub(super) fn handle_status<P, C, G>(ctx: &ListenCtx<P, C, G>) -> Response
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let supervisor = ctx.host.supervisor();
    let targets_total = match supervisor.store().load() {
        Ok(records) => records.len(),
        Err(e) => {
            warn!("status: {}", e);
            0
        }
    };
    Response::Status {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        targets_total,
        targets_running: supervisor.running_ids().len(),
        watchdog_enabled: ctx.watchdog_enabled,
        uploads_root: supervisor.uploads_root().to_path_buf(),
    }
}

pub(super) async fn handle_stop_all<P, C, G>(host: &Host<P, C, G>, caller: UserId) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let ids = host.stop_all(caller).await?;
    info!(count = ids.len(), "stopped all targets");
    Ok(Response::Stopped { ids })
}

pub(super) async fn handle_restart_all<P, C, G>(host: &Host<P, C, G>, caller: UserId) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let report = host.restart_all(caller).await?;
    for (id, reason) in &report.failed {
        warn!(target_id = %id, reason = %reason, "restart failed");
    }
    Ok(Response::AutoStarted { report })
}

pub(super) fn handle_store_reset<P, C, G>(host: &Host<P, C, G>, caller: UserId) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let backup = host.store_reset(caller)?;
    match &backup {
        Some(path) => warn!(backup = %path.display(), "ownership store reset"),
        None => info!("ownership store reset (nothing to back up)"),
    }
    Ok(Response::StoreReset { backup })
}
