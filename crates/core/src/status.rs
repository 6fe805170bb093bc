// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle states and the derived device status.

use serde::{Deserialize, Serialize};

/// The worker's finite-state machine state.
///
/// `Unknown` is the zero state before a worker has been constructed.
/// `Stopped`/`Starting`/`Running`/`Paused` are the normal lifecycle.
/// `Reconnecting`/`WaitingRetry`/`MaxRetriesExceeded` are the
/// reconnection sub-machine. The rest are operator/diagnostic states
/// that override automatic status derivation while set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Unknown,
    Stopped,
    Starting,
    Running,
    Paused,
    Reconnecting,
    WaitingRetry,
    MaxRetriesExceeded,
    DeviceOffline,
    CommunicationError,
    Error,
    Maintenance,
    Simulation,
    Calibration,
    Commissioning,
    DiagnosticMode,
    ManualOverride,
    EmergencyStop,
    BypassMode,
    SensorFault,
    DataInvalid,
}

impl WorkerState {
    /// States in which the worker is expected to be producing samples.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            WorkerState::Running
                | WorkerState::Simulation
                | WorkerState::Calibration
                | WorkerState::Commissioning
                | WorkerState::Maintenance
                | WorkerState::DiagnosticMode
        )
    }

    /// States that represent a failure condition.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            WorkerState::Error
                | WorkerState::DeviceOffline
                | WorkerState::CommunicationError
                | WorkerState::DataInvalid
                | WorkerState::SensorFault
                | WorkerState::EmergencyStop
                | WorkerState::MaxRetriesExceeded
        )
    }

    /// Operator/diagnostic states that override automatic status derivation.
    pub fn is_manual_override(&self) -> bool {
        matches!(
            self,
            WorkerState::Maintenance
                | WorkerState::Simulation
                | WorkerState::Calibration
                | WorkerState::Commissioning
                | WorkerState::DiagnosticMode
                | WorkerState::ManualOverride
                | WorkerState::BypassMode
        )
    }
}

crate::simple_display! {
    WorkerState {
        Unknown => "UNKNOWN",
        Stopped => "STOPPED",
        Starting => "STARTING",
        Running => "RUNNING",
        Paused => "PAUSED",
        Reconnecting => "RECONNECTING",
        WaitingRetry => "WAITING_RETRY",
        MaxRetriesExceeded => "MAX_RETRIES_EXCEEDED",
        DeviceOffline => "DEVICE_OFFLINE",
        CommunicationError => "COMMUNICATION_ERROR",
        Error => "ERROR",
        Maintenance => "MAINTENANCE",
        Simulation => "SIMULATION",
        Calibration => "CALIBRATION",
        Commissioning => "COMMISSIONING",
        DiagnosticMode => "DIAGNOSTIC_MODE",
        ManualOverride => "MANUAL_OVERRIDE",
        EmergencyStop => "EMERGENCY_STOP",
        BypassMode => "BYPASS_MODE",
        SensorFault => "SENSOR_FAULT",
        DataInvalid => "DATA_INVALID",
    }
}

/// Device status derived from recent communication outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Online,
    Offline,
    Error,
    Degraded,
    Maintenance,
}

crate::simple_display! {
    DeviceStatus {
        Online => "ONLINE",
        Offline => "OFFLINE",
        Error => "ERROR",
        Degraded => "DEGRADED",
        Maintenance => "MAINTENANCE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states_match_spec_partition() {
        for s in [
            WorkerState::Running,
            WorkerState::Simulation,
            WorkerState::Calibration,
            WorkerState::Commissioning,
            WorkerState::Maintenance,
            WorkerState::DiagnosticMode,
        ] {
            assert!(s.is_active(), "{s:?} should be active");
        }
        assert!(!WorkerState::Stopped.is_active());
        assert!(!WorkerState::Error.is_active());
    }

    #[test]
    fn error_states_match_spec_partition() {
        for s in [
            WorkerState::Error,
            WorkerState::DeviceOffline,
            WorkerState::CommunicationError,
            WorkerState::DataInvalid,
            WorkerState::SensorFault,
            WorkerState::EmergencyStop,
            WorkerState::MaxRetriesExceeded,
        ] {
            assert!(s.is_error(), "{s:?} should be an error state");
        }
        assert!(!WorkerState::Running.is_error());
    }

    #[test]
    fn active_and_error_partitions_do_not_overlap() {
        let all = [
            WorkerState::Unknown,
            WorkerState::Stopped,
            WorkerState::Starting,
            WorkerState::Running,
            WorkerState::Paused,
            WorkerState::Reconnecting,
            WorkerState::WaitingRetry,
            WorkerState::MaxRetriesExceeded,
            WorkerState::DeviceOffline,
            WorkerState::CommunicationError,
            WorkerState::Error,
            WorkerState::Maintenance,
            WorkerState::Simulation,
            WorkerState::Calibration,
            WorkerState::Commissioning,
            WorkerState::DiagnosticMode,
            WorkerState::ManualOverride,
            WorkerState::EmergencyStop,
            WorkerState::BypassMode,
            WorkerState::SensorFault,
            WorkerState::DataInvalid,
        ];
        for s in all {
            assert!(!(s.is_active() && s.is_error()), "{s:?} is both active and error");
        }
    }
}
