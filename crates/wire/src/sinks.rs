// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The external collaborators named in §6: the pipeline consumer and
//! the two optional telemetry sinks. Each is modeled as a trait so
//! `pulseone-worker`/`pulseone-daemon` depend only on the seam, never a
//! concrete Redis/Influx/queue client.

use crate::message::DeviceDataMessage;
use crate::status::{ReconnectionEventJson, WorkerStatusJson};
use async_trait::async_trait;
use pulseone_core::DataPointId;

/// The downstream pipeline. Fire-and-forget: `accept` returns whether
/// the message was queued, never a richer response. A full queue
/// returns `false`; the caller counts it as a `QueueFullError` and
/// retries on the next batch rather than blocking (§7).
#[async_trait]
pub trait PipelineSink: Send + Sync {
    async fn accept(&self, message: DeviceDataMessage) -> bool;
}

/// Redis-style publisher for worker status and reconnection events.
/// Optional — its absence must not affect worker correctness (§6).
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Publishes to `device_status:<id>`.
    async fn publish_status(&self, status: &WorkerStatusJson);

    /// Publishes to `device_reconnection:<id>`.
    async fn publish_reconnection_event(&self, event: &ReconnectionEventJson);
}

/// Influx-style per-point time-series sink. Optional.
#[async_trait]
pub trait TimeseriesSink: Send + Sync {
    async fn write_point(&self, point_id: &DataPointId, timestamp_ms: u64, value: f64);
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A pipeline sink with a configurable capacity, for testing
    /// queue-full/backpressure behavior without a real queue.
    pub struct FakePipelineSink {
        capacity: usize,
        accepted: Mutex<Vec<DeviceDataMessage>>,
        rejected: AtomicUsize,
    }

    impl FakePipelineSink {
        pub fn new(capacity: usize) -> Self {
            Self { capacity, accepted: Mutex::new(Vec::new()), rejected: AtomicUsize::new(0) }
        }

        pub fn accepted(&self) -> Vec<DeviceDataMessage> {
            self.accepted.lock().clone()
        }

        pub fn rejected_count(&self) -> usize {
            self.rejected.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PipelineSink for FakePipelineSink {
        async fn accept(&self, message: DeviceDataMessage) -> bool {
            let mut accepted = self.accepted.lock();
            if accepted.len() >= self.capacity {
                drop(accepted);
                self.rejected.fetch_add(1, Ordering::SeqCst);
                return false;
            }
            accepted.push(message);
            true
        }
    }

    #[derive(Default)]
    pub struct FakeStatusPublisher {
        pub statuses: Mutex<Vec<WorkerStatusJson>>,
        pub events: Mutex<Vec<ReconnectionEventJson>>,
    }

    #[async_trait]
    impl StatusPublisher for FakeStatusPublisher {
        async fn publish_status(&self, status: &WorkerStatusJson) {
            self.statuses.lock().push(status.clone());
        }

        async fn publish_reconnection_event(&self, event: &ReconnectionEventJson) {
            self.events.lock().push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakePipelineSink;
    use super::*;
    use pulseone_core::{DeviceId, DeviceStatus};

    fn message(seq: u64) -> DeviceDataMessage {
        DeviceDataMessage {
            device_id: DeviceId::new("dev-1"),
            protocol_tag: "modbus_tcp".to_string(),
            batch_timestamp_ms: seq,
            priority: 0,
            tenant_id: None,
            site_id: None,
            processing: Default::default(),
            correlation_id: format!("dev-1:w-1:{seq}"),
            batch_sequence: seq,
            device_status: DeviceStatus::Online,
            previous_status: DeviceStatus::Online,
            status_changed: false,
            connection_stats: Default::default(),
            point_counts: Default::default(),
            values: vec![],
        }
    }

    #[tokio::test]
    async fn full_queue_rejects_and_counts() {
        let sink = FakePipelineSink::new(1);
        assert!(sink.accept(message(1)).await);
        assert!(!sink.accept(message(2)).await);
        assert_eq!(sink.rejected_count(), 1);
        assert_eq!(sink.accepted().len(), 1);
    }
}
