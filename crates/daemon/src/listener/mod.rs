// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and
//! answering each request from the shared host.

mod panel;
mod provision;
mod targets;

use std::sync::Arc;
use std::time::Instant;

use berth_adapters::ProcessAdapter;
use berth_core::{Clock, IdGen};
use berth_engine::{Host, HostError};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Everything a request handler can reach.
pub struct ListenCtx<P, C, G> {
    pub host: Arc<Host<P, C, G>>,
    pub start_time: Instant,
    pub watchdog_enabled: bool,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener<P, C, G> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<P, C, G>>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl<P, C, G> Listener<P, C, G>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen + 'static,
{
    pub fn new(socket: UnixListener, ctx: ListenCtx<P, C, G>) -> Self {
        Self {
            socket,
            ctx: Arc::new(ctx),
        }
    }

    /// Run the listener loop until shutdown, spawning tasks for each connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed) => {
                                    debug!("Client disconnected")
                                }
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection<P, C, G>(
    stream: UnixStream,
    ctx: &ListenCtx<P, C, G>,
) -> Result<(), ConnectionError>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let (mut reader, mut writer) = stream.into_split();

    let request: Request = protocol::recv(&mut reader, DEFAULT_TIMEOUT).await?;

    // Polling requests at debug; mutations at info. Payloads never logged.
    if is_polling(&request) {
        debug!(request = request_name(&request), "received request");
    } else {
        info!(request = request_name(&request), "received request");
    }

    let response = handle_request(request, ctx).await;

    if let Response::Error { message } = &response {
        debug!(%message, "request failed");
    }

    protocol::send(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request<P, C, G>(request: Request, ctx: &ListenCtx<P, C, G>) -> Response
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen,
{
    let host = &ctx.host;
    let result = match request {
        Request::Ping => Ok(Response::Pong),

        Request::Hello { version: _ } => Ok(Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        }),

        Request::Status => Ok(panel::handle_status(ctx)),

        Request::Shutdown { stop_targets } => {
            if stop_targets {
                let stopped = host.supervisor().stop_all().await;
                info!(count = stopped.len(), "stopped all targets before shutdown");
            }
            ctx.shutdown.notify_one();
            Ok(Response::ShuttingDown)
        }

        Request::TargetStatus { id, key } => targets::handle_status(host, &id, &key),
        Request::Logs { caller, id, lines } => targets::handle_logs(host, caller, &id, lines),
        Request::ClearLogs { caller, id } => host.clear_logs(caller, &id).map(|()| Response::Ok),
        Request::Start { caller, id } => targets::handle_start(host, caller, &id).await,
        Request::Stop { caller, id } => host.stop(caller, &id).await.map(|()| Response::Ok),
        Request::Restart { caller, id } => targets::handle_restart(host, caller, &id).await,
        Request::Delete { caller, id } => host.delete(caller, &id).await.map(|()| Response::Ok),
        Request::ListTargets { caller } => targets::handle_list(host, caller),

        Request::EnvGet { caller, id } => host.env_get(caller, &id).map(|vars| Response::Env { vars }),
        Request::EnvSet {
            caller,
            id,
            key,
            value,
        } => host.env_set(caller, &id, &key, &value).await.map(|()| Response::Ok),
        Request::EnvUnset { caller, id, key } => host
            .env_unset(caller, &id, &key)
            .await
            .map(|existed| Response::EnvUnset { existed }),
        Request::EnvAppend { caller, id, text } => {
            host.env_append(caller, &id, &text).await.map(|()| Response::Ok)
        }

        Request::ListFiles { caller, id } => host.list_files(caller, &id).map(|files| Response::Files { files }),
        Request::ReadFile { caller, id, path } => host
            .read_file(caller, &id, &path)
            .map(|content| Response::FileContent { content }),
        Request::WriteFile {
            caller,
            id,
            path,
            content,
        } => host.write_file(caller, &id, &path, &content).map(|()| Response::Ok),

        Request::Upload {
            caller,
            file_name,
            content,
        } => provision::handle_upload(host, caller, &file_name, &content).await,
        Request::Clone { caller, url } => provision::handle_clone(host, caller, &url).await,
        Request::SelectEntry {
            caller,
            id,
            file,
            start,
        } => provision::handle_select_entry(host, caller, &id, &file, start).await,
        Request::InstallDeps { caller, id } => host
            .install_deps(caller, &id)
            .map(|started| Response::InstallStarted { started }),

        Request::Stats { caller } => host.stats(caller).map(|stats| Response::Stats { stats }),
        Request::ListRunning { caller } => host
            .list_running(caller)
            .map(|processes| Response::Running { processes }),
        Request::ListDown { caller } => host.list_down(caller).map(|ids| Response::Down { ids }),
        Request::StopAll { caller } => panel::handle_stop_all(host, caller).await,
        Request::RestartAll { caller } => panel::handle_restart_all(host, caller).await,
        Request::AccessList { caller } => host.access_list(caller).map(|access| Response::Access { access }),
        Request::AccessAdd { caller, user } => host
            .allow(caller, user)
            .map(|changed| Response::AccessChanged { changed }),
        Request::AccessRemove { caller, user } => host
            .deny(caller, user)
            .map(|changed| Response::AccessChanged { changed }),
        Request::StoreReset { caller } => panel::handle_store_reset(host, caller),
    };

    result.unwrap_or_else(error_response)
}

fn error_response(e: HostError) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

fn is_polling(request: &Request) -> bool {
    matches!(
        request,
        Request::Ping
            | Request::Hello { .. }
            | Request::Status
            | Request::TargetStatus { .. }
            | Request::Logs { .. }
            | Request::ListTargets { .. }
            | Request::Stats { .. }
            | Request::ListRunning { .. }
            | Request::ListDown { .. }
    )
}

/// Variant name for logs; request bodies can carry secrets and file contents.
fn request_name(request: &Request) -> &'static str {
    match request {
        Request::Ping => "Ping",
        Request::Hello { .. } => "Hello",
        Request::Status => "Status",
        Request::Shutdown { .. } => "Shutdown",
        Request::TargetStatus { .. } => "TargetStatus",
        Request::Logs { .. } => "Logs",
        Request::ClearLogs { .. } => "ClearLogs",
        Request::Start { .. } => "Start",
        Request::Stop { .. } => "Stop",
        Request::Restart { .. } => "Restart",
        Request::Delete { .. } => "Delete",
        Request::ListTargets { .. } => "ListTargets",
        Request::EnvGet { .. } => "EnvGet",
        Request::EnvSet { .. } => "EnvSet",
        Request::EnvUnset { .. } => "EnvUnset",
        Request::EnvAppend { .. } => "EnvAppend",
        Request::ListFiles { .. } => "ListFiles",
        Request::ReadFile { .. } => "ReadFile",
        Request::WriteFile { .. } => "WriteFile",
        Request::Upload { .. } => "Upload",
        Request::Clone { .. } => "Clone",
        Request::SelectEntry { .. } => "SelectEntry",
        Request::InstallDeps { .. } => "InstallDeps",
        Request::Stats { .. } => "Stats",
        Request::ListRunning { .. } => "ListRunning",
        Request::ListDown { .. } => "ListDown",
        Request::StopAll { .. } => "StopAll",
        Request::RestartAll { .. } => "RestartAll",
        Request::AccessList { .. } => "AccessList",
        Request::AccessAdd { .. } => "AccessAdd",
        Request::AccessRemove { .. } => "AccessRemove",
        Request::StoreReset { .. } => "StoreReset",
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
