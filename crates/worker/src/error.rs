// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-level error taxonomy (§7). Transport errors are folded into
//! `DriverError::Transport`; everything repository-shaped never
//! reaches here (repositories return `bool`/`Option`, never `Err`).

use pulseone_transport::TransportError;
use thiserror::Error;

/// Invalid endpoint, out-of-range setting, or unknown protocol tag.
/// Surfaced to the caller; the worker never starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("{field} out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    #[error("unknown protocol tag: {0}")]
    UnknownProtocol(String),

    #[error("device {0} not found or disabled")]
    DeviceUnavailable(String),
}

/// Errors a `ProtocolDriver` surfaces from a connect/poll/write attempt.
/// A well-formed transport that the device rejects or a malformed PDU
/// is `Protocol`; `Timeout` is the expected-response-never-arrived case
/// (§7 distinguishes these from `Transport`, which is the socket/serial
/// layer itself failing).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("timed out waiting for a response")]
    Timeout,
}

impl DriverError {
    /// A small stable code for the wire-level `last_error_code`, distinct
    /// per variant family so operators can group failures without
    /// parsing the message text.
    pub fn code(&self) -> u32 {
        match self {
            DriverError::Transport(_) => 1,
            DriverError::Protocol(_) => 2,
            DriverError::Timeout => 3,
        }
    }
}

/// A write attempt that the worker rejects before ever reaching a
/// driver: read-only point, or the worker isn't in an active state.
/// Returned synchronously to the command originator; never changes
/// worker state (§7, §8 scenario 5).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotWritableError {
    #[error("data point {0} is read-only")]
    ReadOnlyPoint(String),

    #[error("worker is not in an active state")]
    WorkerNotActive,

    #[error("data point {0} is not configured on this device")]
    UnknownPoint(String),

    /// The pre-checks passed but the driver itself rejected the write.
    #[error("write rejected by driver: {0}")]
    DriverRejected(String),
}
