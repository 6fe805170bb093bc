// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device-status derivation: the per-protocol threshold table and rule
//! order from §4.3, evaluated first-match-wins.

use pulseone_core::{DeviceStatus, ProtocolTag};
use pulseone_wire::ConnectionStats;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusThresholds {
    pub offline_failure_count: u32,
    pub timeout_ms: u64,
    pub partial_fail_ratio: f64,
    pub error_fail_ratio: f64,
    pub offline_timeout_ms: u64,
}

impl StatusThresholds {
    pub fn for_protocol(tag: ProtocolTag) -> Self {
        match tag {
            ProtocolTag::ModbusTcp | ProtocolTag::ModbusRtu => Self {
                offline_failure_count: 3,
                timeout_ms: 3_000,
                partial_fail_ratio: 0.2,
                error_fail_ratio: 0.5,
                offline_timeout_ms: 10_000,
            },
            ProtocolTag::Mqtt => Self {
                offline_failure_count: 10,
                timeout_ms: 10_000,
                partial_fail_ratio: 0.5,
                error_fail_ratio: 0.8,
                offline_timeout_ms: 60_000,
            },
            ProtocolTag::Bacnet => Self {
                offline_failure_count: 5,
                timeout_ms: 5_000,
                partial_fail_ratio: 0.3,
                error_fail_ratio: 0.7,
                offline_timeout_ms: 30_000,
            },
            ProtocolTag::UdpCustom => Self::default(),
        }
    }
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            offline_failure_count: 3,
            timeout_ms: 5_000,
            partial_fail_ratio: 0.3,
            error_fail_ratio: 0.7,
            offline_timeout_ms: 30_000,
        }
    }
}

/// Applies the first-match-wins rule order from §4.3. Manual-override
/// worker states are handled by the caller before this is reached —
/// this function only ever sees the automatic derivation inputs.
pub fn derive_status(
    thresholds: &StatusThresholds,
    stats: &ConnectionStats,
    elapsed_since_last_success_ms: u64,
) -> DeviceStatus {
    if stats.consecutive_failures >= thresholds.offline_failure_count
        || elapsed_since_last_success_ms > thresholds.offline_timeout_ms
    {
        return DeviceStatus::Offline;
    }
    if stats.total_attempts > 0 {
        let ratio = stats.failure_ratio();
        if ratio >= thresholds.error_fail_ratio {
            return DeviceStatus::Error;
        }
        if ratio >= thresholds.partial_fail_ratio {
            return DeviceStatus::Degraded;
        }
    }
    DeviceStatus::Online
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(consecutive_failures: u32, total_failures: u64, total_attempts: u64) -> ConnectionStats {
        ConnectionStats { consecutive_failures, total_failures, total_attempts, ..Default::default() }
    }

    #[test]
    fn offline_wins_on_consecutive_failures() {
        let t = StatusThresholds::for_protocol(ProtocolTag::ModbusTcp);
        assert_eq!(derive_status(&t, &stats(3, 3, 10), 0), DeviceStatus::Offline);
    }

    #[test]
    fn offline_wins_on_elapsed_timeout_even_with_no_failures() {
        let t = StatusThresholds::for_protocol(ProtocolTag::ModbusTcp);
        assert_eq!(derive_status(&t, &stats(0, 0, 10), 11_000), DeviceStatus::Offline);
    }

    #[test]
    fn error_when_failure_ratio_meets_threshold() {
        let t = StatusThresholds::for_protocol(ProtocolTag::ModbusTcp);
        assert_eq!(derive_status(&t, &stats(1, 5, 10), 0), DeviceStatus::Error);
    }

    #[test]
    fn degraded_between_partial_and_error_ratio() {
        let t = StatusThresholds::for_protocol(ProtocolTag::ModbusTcp);
        assert_eq!(derive_status(&t, &stats(1, 3, 10), 0), DeviceStatus::Degraded);
    }

    #[test]
    fn online_when_healthy() {
        let t = StatusThresholds::for_protocol(ProtocolTag::ModbusTcp);
        assert_eq!(derive_status(&t, &stats(0, 0, 10), 0), DeviceStatus::Online);
    }

    #[test]
    fn mqtt_has_looser_thresholds_than_modbus() {
        let mqtt = StatusThresholds::for_protocol(ProtocolTag::Mqtt);
        let modbus = StatusThresholds::for_protocol(ProtocolTag::ModbusTcp);
        assert!(mqtt.offline_failure_count > modbus.offline_failure_count);
        assert!(mqtt.offline_timeout_ms > modbus.offline_timeout_ms);
    }
}
