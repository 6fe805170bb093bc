// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The batch message a worker emits to the downstream pipeline (§4.3).

use pulseone_core::{DataPointId, DeviceId, DeviceStatus, QualityCode, SiteId, TenantId, Value};
use serde::{Deserialize, Serialize};

/// One decoded sample, ready to be folded into an outgoing batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedValue {
    pub point_id: DataPointId,
    pub value: Value,
    pub raw_value: Value,
    pub quality: QualityCode,
    pub timestamp_ms: u64,
}

/// Processing hints carried alongside a batch. The rule engine, alarm
/// evaluator, and virtual-point evaluator are all external collaborators
/// (non-goal: no rule engine in this crate) — these flags are their
/// dispatch instructions, not anything this crate acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProcessingFlags {
    pub trigger_alarms: bool,
    pub trigger_virtual_points: bool,
    pub high_priority: bool,
}

/// Rolling connection counters, carried on every batch so the pipeline
/// and operators can see communication health without a separate call.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub consecutive_failures: u32,
    pub total_failures: u64,
    pub total_attempts: u64,
    pub last_response_time_ms: u64,
    pub last_error_text: Option<String>,
    pub last_error_code: Option<u32>,
}

impl ConnectionStats {
    pub fn failure_ratio(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.total_failures as f64 / self.total_attempts as f64
        }
    }
}

/// Count of configured/successful/failed points in one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointCounts {
    pub total_configured: u32,
    pub successful: u32,
    pub failed: u32,
}

/// The message a `WorkerCore` pushes to the [`crate::PipelineSink`] once
/// per poll cycle. Carries enough context (correlation id, batch
/// sequence, derived status) that the pipeline never needs to call back
/// into the worker to make routing decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDataMessage {
    pub device_id: DeviceId,
    pub protocol_tag: String,
    pub batch_timestamp_ms: u64,
    /// 0 (lowest) – 9 (highest).
    pub priority: u8,
    pub tenant_id: Option<TenantId>,
    pub site_id: Option<SiteId>,
    pub processing: ProcessingFlags,
    /// `device_id + worker_id + epoch-ms`, unique per emitted batch.
    pub correlation_id: String,
    /// Monotonic per worker; strictly increasing across a worker's
    /// lifetime (§8 ordering property).
    pub batch_sequence: u64,
    pub device_status: DeviceStatus,
    pub previous_status: DeviceStatus,
    pub status_changed: bool,
    pub connection_stats: ConnectionStats,
    pub point_counts: PointCounts,
    /// Points that passed the deadband/logging gate this cycle, in
    /// data-point configuration order (§5 ordering guarantee).
    pub values: Vec<TimestampedValue>,
}

impl DeviceDataMessage {
    pub fn correlation_id(device_id: &DeviceId, worker_id: &str, epoch_ms: u64) -> String {
        format!("{device_id}:{worker_id}:{epoch_ms}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_joins_device_worker_and_epoch() {
        let id = DeviceDataMessage::correlation_id(&DeviceId::new("dev-1"), "w-1", 1_700_000_000_000);
        assert_eq!(id, "dev-1:w-1:1700000000000");
    }

    #[test]
    fn failure_ratio_is_zero_with_no_attempts() {
        assert_eq!(ConnectionStats::default().failure_ratio(), 0.0);
    }

    #[test]
    fn failure_ratio_divides_failures_by_attempts() {
        let stats = ConnectionStats { total_failures: 3, total_attempts: 10, ..Default::default() };
        assert_eq!(stats.failure_ratio(), 0.3);
    }

    #[test]
    fn round_trips_through_json() {
        let msg = DeviceDataMessage {
            device_id: DeviceId::new("dev-1"),
            protocol_tag: "modbus_tcp".to_string(),
            batch_timestamp_ms: 1_000,
            priority: 5,
            tenant_id: None,
            site_id: None,
            processing: ProcessingFlags::default(),
            correlation_id: "dev-1:w-1:1000".to_string(),
            batch_sequence: 1,
            device_status: DeviceStatus::Online,
            previous_status: DeviceStatus::Offline,
            status_changed: true,
            connection_stats: ConnectionStats::default(),
            point_counts: PointCounts { total_configured: 2, successful: 2, failed: 0 },
            values: vec![],
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: DeviceDataMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
