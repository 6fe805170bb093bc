// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The common contract every concrete adapter (`TcpTransport`,
//! `UdpTransport`, `SerialTransport`, and test fakes) implements.

use crate::error::TransportError;
use crate::stats::TransportStats;
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn establish_connection(&self) -> Result<(), TransportError>;

    async fn close_connection(&self);

    /// Non-destructive health probe; does not establish a connection.
    fn check_connection(&self) -> bool;

    async fn send(&self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Returns `Ok(0)` on timeout, never blocking past `timeout_ms`.
    async fn recv(&self, buffer: &mut [u8], timeout_ms: u64) -> Result<usize, TransportError>;

    async fn send_keep_alive(&self) -> Result<(), TransportError>;

    fn stats(&self) -> &TransportStats;
}
