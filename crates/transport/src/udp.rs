// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UDP transport for bespoke field protocols: a dedicated receive task
//! pushes packets into an owner-drained, bounded queue so the polling
//! loop never blocks directly on the socket (§4.2, §5).

use crate::error::TransportError;
use crate::stats::TransportStats;
use crate::transport::Transport;
use async_trait::async_trait;
use parking_lot::Mutex;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Notify;

const QUEUE_CAPACITY: usize = 1000;
const RECV_LOOP_WAKE_MS: u64 = 100;

pub struct UdpTransport {
    remote: SocketAddr,
    local_bind: SocketAddr,
    broadcast: bool,
    multicast_group: Option<std::net::Ipv4Addr>,
    socket: Mutex<Option<Arc<UdpSocket>>>,
    running: Arc<AtomicBool>,
    queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
    queue_notify: Arc<Notify>,
    stats: Arc<TransportStats>,
    recv_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl UdpTransport {
    pub fn new(remote_endpoint: &str, local_bind: SocketAddr) -> Result<Self, TransportError> {
        let remote = remote_endpoint.parse::<SocketAddr>().map_err(|e| TransportError::InvalidEndpoint {
            endpoint: remote_endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            remote,
            local_bind,
            broadcast: false,
            multicast_group: None,
            socket: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            queue_notify: Arc::new(Notify::new()),
            stats: Arc::new(TransportStats::default()),
            recv_task: Mutex::new(None),
        })
    }

    /// Opt-in broadcast: sets `SO_BROADCAST` on the underlying socket.
    pub fn with_broadcast(mut self, enabled: bool) -> Self {
        self.broadcast = enabled;
        self
    }

    /// Opt-in multicast: joins `group` on the bound interface after connect.
    pub fn with_multicast_group(mut self, group: std::net::Ipv4Addr) -> Self {
        self.multicast_group = Some(group);
        self
    }

    /// Pop one queued packet, draining the receive loop's buffer. Returns
    /// `None` when nothing has arrived.
    pub fn try_recv_packet(&self) -> Option<Vec<u8>> {
        self.queue.lock().pop_front()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.lock().len()
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn establish_connection(&self) -> Result<(), TransportError> {
        let domain = if self.local_bind.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        if self.broadcast {
            socket.set_broadcast(true)?;
        }
        socket.bind(&SockAddr::from(self.local_bind))?;
        socket.set_nonblocking(true)?;
        let std_socket: std::net::UdpSocket = socket.into();
        let tokio_socket = UdpSocket::from_std(std_socket)?;

        if let Some(group) = self.multicast_group {
            let iface = match self.local_bind {
                SocketAddr::V4(v4) => *v4.ip(),
                _ => std::net::Ipv4Addr::UNSPECIFIED,
            };
            tokio_socket.join_multicast_v4(group, iface)?;
        }

        let socket = Arc::new(tokio_socket);
        *self.socket.lock() = Some(socket.clone());

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let queue = self.queue.clone();
        let notify = self.queue_notify.clone();
        let stats = self.stats.clone();
        let handle = tokio::spawn(async move {
            recv_loop(socket, running, queue, notify, stats).await;
        });
        *self.recv_task.lock() = Some(handle);

        tracing::info!(remote = %self.remote, local = %self.local_bind, "udp socket bound");
        Ok(())
    }

    async fn close_connection(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.recv_task.lock().take() {
            handle.abort();
        }
        self.socket.lock().take();
        self.queue.lock().clear();
        tracing::debug!(remote = %self.remote, "udp socket closed");
    }

    fn check_connection(&self) -> bool {
        self.socket.lock().is_some()
    }

    async fn send(&self, bytes: &[u8]) -> Result<usize, TransportError> {
        let socket = self.socket.lock().clone();
        let Some(socket) = socket else {
            return Err(TransportError::NotConnected);
        };
        match socket.send_to(bytes, self.remote).await {
            Ok(n) => {
                self.stats.record_send(n);
                Ok(n)
            }
            Err(e) => {
                self.stats.record_send_error();
                Err(TransportError::Io(e))
            }
        }
    }

    async fn recv(&self, buffer: &mut [u8], timeout_ms: u64) -> Result<usize, TransportError> {
        if self.socket.lock().is_none() {
            return Err(TransportError::NotConnected);
        }
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
        loop {
            if let Some(packet) = self.try_recv_packet() {
                let n = packet.len().min(buffer.len());
                buffer[..n].copy_from_slice(&packet[..n]);
                return Ok(n);
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                self.stats.record_timeout();
                return Ok(0);
            }
            let _ = tokio::time::timeout(remaining, self.queue_notify.notified()).await;
        }
    }

    async fn send_keep_alive(&self) -> Result<(), TransportError> {
        self.send(&[]).await.map(|_| ())
    }

    fn stats(&self) -> &TransportStats {
        &self.stats
    }
}

/// Readiness-driven receive loop with a 100ms wake interval so a stop
/// request (clearing `running`) is observed promptly even with no
/// inbound traffic. Overflow drops the oldest queued packet with a
/// warning rather than growing unbounded.
async fn recv_loop(
    socket: Arc<UdpSocket>,
    running: Arc<AtomicBool>,
    queue: Arc<Mutex<VecDeque<Vec<u8>>>>,
    notify: Arc<Notify>,
    stats: Arc<TransportStats>,
) {
    let mut buf = vec![0u8; 65535];
    while running.load(Ordering::SeqCst) {
        let wake = tokio::time::sleep(std::time::Duration::from_millis(RECV_LOOP_WAKE_MS));
        tokio::select! {
            result = socket.recv(&mut buf) => {
                match result {
                    Ok(n) => {
                        stats.record_recv(n);
                        let mut q = queue.lock();
                        if q.len() >= QUEUE_CAPACITY {
                            q.pop_front();
                            tracing::warn!("udp receive queue full, dropping oldest packet");
                        }
                        q.push_back(buf[..n].to_vec());
                        drop(q);
                        notify.notify_waiters();
                    }
                    Err(e) => {
                        stats.record_recv_error();
                        tracing::warn!(error = %e, "udp recv error");
                    }
                }
            }
            _ = wake => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_remote_endpoint() {
        let local: SocketAddr = "0.0.0.0:0".parse().unwrap();
        assert!(UdpTransport::new("not-an-address", local).is_err());
    }

    #[test]
    fn starts_with_empty_queue() {
        let local: SocketAddr = "0.0.0.0:0".parse().unwrap();
        let t = UdpTransport::new("127.0.0.1:9000", local).unwrap();
        assert_eq!(t.queue_depth(), 0);
        assert!(t.try_recv_packet().is_none());
    }
}
