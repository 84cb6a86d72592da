// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upload, clone and entry-selection handlers.

use berth_adapters::ProcessAdapter;
use berth_core::{Clock, IdGen, TargetId, UserId};
use berth_engine::{Host, HostError};
use tracing::info;

use crate::protocol::Response;

pub(super) async fn handle_upload<P, C, G>(
    host: &Host<P, C, G>,
    caller: UserId,
    file_name: &str,
    content: &[u8],
) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let outcome = host.upload(caller, file_name, content).await?;
    info!(target_id = %outcome.id, %caller, bytes = content.len(), "uploaded");
    Ok(Response::Uploaded { outcome })
}

pub(super) async fn handle_clone<P, C, G>(host: &Host<P, C, G>, caller: UserId, url: &str) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let outcome = host.clone_repo(caller, url).await?;
    info!(
        target_id = %outcome.id,
        %caller,
        runnable = outcome.runnable.len(),
        install_started = outcome.install_started,
        "cloned"
    );
    Ok(Response::Cloned { outcome })
}

pub(super) async fn handle_select_entry<P, C, G>(
    host: &Host<P, C, G>,
    caller: UserId,
    placeholder: &TargetId,
    file: &str,
    start: bool,
) -> Result<Response, HostError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let selection = host.select_entry(caller, placeholder, file, start).await?;
    info!(from = %placeholder, to = %selection.id, started = selection.started.is_some(), "entry selected");
    Ok(Response::EntrySelected { selection })
}
