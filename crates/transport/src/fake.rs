// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory `Transport` for worker tests — no real socket or
//! serial port. Lets tests script connect/recv outcomes and drive the
//! reconnection state machine deterministically.

use crate::error::TransportError;
use crate::stats::TransportStats;
use crate::transport::Transport;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Connect(Result<(), String>),
    Recv(Vec<u8>),
    RecvTimeout,
    RecvError(String),
}

/// A scriptable fake transport. `connect_outcomes` is consumed in
/// order on each `establish_connection` call; `recv_outcomes` is
/// consumed in order on each `recv` call. Once exhausted,
/// `establish_connection` succeeds and `recv` times out.
pub struct FakeTransport {
    connect_outcomes: Mutex<VecDeque<Result<(), String>>>,
    recv_outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    sent: Mutex<Vec<Vec<u8>>>,
    connected: AtomicBool,
    connect_attempts: AtomicU32,
    keep_alive_calls: AtomicU32,
    stats: TransportStats,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            connect_outcomes: Mutex::new(VecDeque::new()),
            recv_outcomes: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            connected: AtomicBool::new(false),
            connect_attempts: AtomicU32::new(0),
            keep_alive_calls: AtomicU32::new(0),
            stats: TransportStats::default(),
        }
    }

    pub fn script_connect(&self, outcome: Result<(), String>) {
        self.connect_outcomes.lock().push_back(outcome);
    }

    pub fn script_recv(&self, outcome: ScriptedOutcome) {
        self.recv_outcomes.lock().push_back(outcome);
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn keep_alive_calls(&self) -> u32 {
        self.keep_alive_calls.load(Ordering::SeqCst)
    }

    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    /// Force the transport into a disconnected state, as if the peer
    /// dropped the connection underneath the worker.
    pub fn simulate_drop(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn establish_connection(&self) -> Result<(), TransportError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        let outcome = self.connect_outcomes.lock().pop_front().unwrap_or(Ok(()));
        match outcome {
            Ok(()) => {
                self.connected.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(reason) => Err(TransportError::ConnectTimeout { endpoint: reason, timeout_ms: 0 }),
        }
    }

    async fn close_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn check_connection(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, bytes: &[u8]) -> Result<usize, TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        self.sent.lock().push(bytes.to_vec());
        self.stats.record_send(bytes.len());
        Ok(bytes.len())
    }

    async fn recv(&self, buffer: &mut [u8], _timeout_ms: u64) -> Result<usize, TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        match self.recv_outcomes.lock().pop_front() {
            Some(ScriptedOutcome::Recv(bytes)) => {
                let n = bytes.len().min(buffer.len());
                buffer[..n].copy_from_slice(&bytes[..n]);
                self.stats.record_recv(n);
                Ok(n)
            }
            Some(ScriptedOutcome::RecvTimeout) | None => {
                self.stats.record_timeout();
                Ok(0)
            }
            Some(ScriptedOutcome::RecvError(reason)) => {
                self.stats.record_recv_error();
                Err(TransportError::Io(std::io::Error::other(reason)))
            }
            Some(ScriptedOutcome::Connect(_)) => unreachable!("connect outcome scripted into recv queue"),
        }
    }

    async fn send_keep_alive(&self) -> Result<(), TransportError> {
        self.keep_alive_calls.fetch_add(1, Ordering::SeqCst);
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }

    fn stats(&self) -> &TransportStats {
        &self.stats
    }
}
