// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framing for the berth socket.
//!
//! One frame is a 4-byte big-endian length followed by that many bytes of
//! JSON. Each connection carries exactly one request frame and one response
//! frame.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Largest accepted frame. Uploaded scripts and `put` payloads travel as
/// JSON byte arrays, up to four characters per payload byte.
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024 * 1024;

/// Read/write deadline for a frame on either side of the socket
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client and daemon must agree on this exactly; a mismatch makes the CLI
/// replace the running daemon.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serialize a frame body (no length prefix).
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    check_size(json.len())?;
    Ok(json)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn check_size(size: usize) -> Result<(), ProtocolError> {
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

/// Read one frame body. A stream that ends before the length prefix is
/// [`ProtocolError::ConnectionClosed`].
pub async fn read_message<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut prefix = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut prefix).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
            _ => ProtocolError::Io(e),
        });
    }
    let len = usize::try_from(u32::from_be_bytes(prefix)).unwrap_or(usize::MAX);
    check_size(len)?;

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

pub async fn write_message<W: AsyncWriteExt + Unpin>(writer: &mut W, body: &[u8]) -> Result<(), ProtocolError> {
    check_size(body.len())?;
    let len = u32::try_from(body.len()).map_err(|_| ProtocolError::MessageTooLarge {
        size: body.len(),
        max: MAX_MESSAGE_SIZE,
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode one typed frame within `deadline`.
pub async fn recv<T, R>(reader: &mut R, deadline: Duration) -> Result<T, ProtocolError>
where
    T: DeserializeOwned,
    R: AsyncReadExt + Unpin,
{
    let body = tokio::time::timeout(deadline, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&body)
}

/// Encode and write one typed frame within `deadline`.
pub async fn send<T, W>(writer: &mut W, msg: &T, deadline: Duration) -> Result<(), ProtocolError>
where
    T: Serialize,
    W: AsyncWriteExt + Unpin,
{
    let body = encode(msg)?;
    tokio::time::timeout(deadline, write_message(writer, &body))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}
