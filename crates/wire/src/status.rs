// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Round-trippable JSON shapes for worker status, reconnection policy,
//! and reconnection events (§6 "Persisted reconnection settings",
//! "Worker status JSON").

use pulseone_core::{DeviceId, WorkerId, WorkerState};
use serde::{Deserialize, Serialize};

/// Published to `device_status:<id>` on a telemetry sink, and returned
/// by any operator-facing status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatusJson {
    pub device_id: DeviceId,
    pub device_name: String,
    pub worker_id: WorkerId,
    pub protocol_type: String,
    pub endpoint: String,
    pub state: WorkerState,
    pub connected: bool,
    pub data_points_count: usize,
    pub write_supported: bool,
}

/// The reconnection policy, in the exact shape persisted/round-tripped
/// per §6. Field names match the wire contract verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconnectionSettingsJson {
    pub auto_reconnect_enabled: bool,
    pub retry_interval_ms: u64,
    pub max_retries_per_cycle: u32,
    pub wait_time_after_max_retries_ms: u64,
    pub keep_alive_enabled: bool,
    pub keep_alive_interval_seconds: u64,
    pub connection_timeout_seconds: u64,
}

/// Published to `device_reconnection:<id>` whenever the reconnection
/// loop changes phase (attempt, success, wait-cycle entry/exit,
/// force-reconnect).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectionEventJson {
    pub device_id: DeviceId,
    pub worker_id: WorkerId,
    pub event: ReconnectionEventKind,
    pub retry_count: u32,
    pub wait_cycles: u64,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectionEventKind {
    AttemptStarted,
    AttemptSucceeded,
    AttemptFailed,
    WaitCycleEntered,
    WaitCycleCompleted,
    MaxRetriesExceeded,
    ForceReconnectRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnection_settings_round_trip_through_json() {
        let settings = ReconnectionSettingsJson {
            auto_reconnect_enabled: true,
            retry_interval_ms: 5000,
            max_retries_per_cycle: 0,
            wait_time_after_max_retries_ms: 60_000,
            keep_alive_enabled: true,
            keep_alive_interval_seconds: 30,
            connection_timeout_seconds: 10,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: ReconnectionSettingsJson = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn worker_status_json_field_names_match_wire_contract() {
        let status = WorkerStatusJson {
            device_id: DeviceId::new("dev-1"),
            device_name: "pump-1".to_string(),
            worker_id: WorkerId::new("w-1"),
            protocol_type: "modbus_tcp".to_string(),
            endpoint: "127.0.0.1:502".to_string(),
            state: WorkerState::Running,
            connected: true,
            data_points_count: 2,
            write_supported: false,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["device_id"], "dev-1");
        assert_eq!(json["state"], "running");
    }
}
