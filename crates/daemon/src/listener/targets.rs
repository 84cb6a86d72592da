// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target handlers: status, logs, lifecycle, listing.

use berth_adapters::ProcessAdapter;
use berth_core::{Clock, IdGen, TargetId, UserId};
use berth_engine::{logs, Host, HostError};
use tracing::info;

use crate::protocol::Response;

/// Upper bound on requested log lines.
pub(super) const MAX_LOG_LINES: usize = 2000;

pub(super) fn handle_status<P, C, G>(host: &Host<P, C, G>, id: &TargetId, key: &str) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    host.status(id, key).map(|state| Response::TargetState { state })
}

pub(super) fn handle_logs<P, C, G>(
    host: &Host<P, C, G>,
    caller: UserId,
    id: &TargetId,
    lines: usize,
) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let content = host.logs(caller, id, lines.clamp(1, MAX_LOG_LINES))?;
    let log_path = logs::log_path(host.supervisor().uploads_root(), id);
    Ok(Response::Logs { log_path, content })
}

pub(super) async fn handle_start<P, C, G>(
    host: &Host<P, C, G>,
    caller: UserId,
    id: &TargetId,
) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let outcome = host.start(caller, id).await?;
    info!(target_id = %id, %caller, pid = outcome.pid, "started");
    Ok(Response::Started { outcome })
}

pub(super) async fn handle_restart<P, C, G>(
    host: &Host<P, C, G>,
    caller: UserId,
    id: &TargetId,
) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let outcome = host.restart(caller, id).await?;
    info!(target_id = %id, %caller, pid = outcome.pid, "restarted");
    Ok(Response::Started { outcome })
}

pub(super) fn handle_list<P, C, G>(host: &Host<P, C, G>, caller: UserId) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let mut targets = host.list_targets(caller)?;
    targets.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    Ok(Response::Targets { targets })
}
