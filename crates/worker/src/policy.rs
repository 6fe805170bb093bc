// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection policy: the tunables and bounds from §4.3, validated
//! once at worker construction rather than clamped silently.

use crate::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectionPolicy {
    pub auto_reconnect_enabled: bool,
    pub retry_interval_ms: u64,
    /// 0 means unlimited retries per cycle.
    pub max_retries_per_cycle: u32,
    pub wait_time_after_max_retries_ms: u64,
    pub keep_alive_enabled: bool,
    pub keep_alive_interval_seconds: u64,
    pub connection_timeout_seconds: u64,
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        Self {
            auto_reconnect_enabled: true,
            retry_interval_ms: 5000,
            max_retries_per_cycle: 0,
            wait_time_after_max_retries_ms: 60_000,
            keep_alive_enabled: true,
            keep_alive_interval_seconds: 30,
            connection_timeout_seconds: 10,
        }
    }
}

impl ReconnectionPolicy {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(1000..=300_000).contains(&self.retry_interval_ms) {
            return Err(ConfigurationError::OutOfRange {
                field: "retry_interval_ms",
                reason: "must be within [1000, 300000]".to_string(),
            });
        }
        if self.max_retries_per_cycle > 100 {
            return Err(ConfigurationError::OutOfRange {
                field: "max_retries_per_cycle",
                reason: "must be within [0, 100]".to_string(),
            });
        }
        if self.wait_time_after_max_retries_ms < 10_000 {
            return Err(ConfigurationError::OutOfRange {
                field: "wait_time_after_max_retries_ms",
                reason: "must be at least 10000".to_string(),
            });
        }
        Ok(())
    }
}

impl From<pulseone_wire::ReconnectionSettingsJson> for ReconnectionPolicy {
    fn from(json: pulseone_wire::ReconnectionSettingsJson) -> Self {
        Self {
            auto_reconnect_enabled: json.auto_reconnect_enabled,
            retry_interval_ms: json.retry_interval_ms,
            max_retries_per_cycle: json.max_retries_per_cycle,
            wait_time_after_max_retries_ms: json.wait_time_after_max_retries_ms,
            keep_alive_enabled: json.keep_alive_enabled,
            keep_alive_interval_seconds: json.keep_alive_interval_seconds,
            connection_timeout_seconds: json.connection_timeout_seconds,
        }
    }
}

impl From<ReconnectionPolicy> for pulseone_wire::ReconnectionSettingsJson {
    fn from(policy: ReconnectionPolicy) -> Self {
        Self {
            auto_reconnect_enabled: policy.auto_reconnect_enabled,
            retry_interval_ms: policy.retry_interval_ms,
            max_retries_per_cycle: policy.max_retries_per_cycle,
            wait_time_after_max_retries_ms: policy.wait_time_after_max_retries_ms,
            keep_alive_enabled: policy.keep_alive_enabled,
            keep_alive_interval_seconds: policy.keep_alive_interval_seconds,
            connection_timeout_seconds: policy.connection_timeout_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert!(ReconnectionPolicy::default().validate().is_ok());
    }

    #[test]
    fn retry_interval_below_floor_is_rejected() {
        let policy = ReconnectionPolicy { retry_interval_ms: 999, ..Default::default() };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn max_retries_above_bound_is_rejected() {
        let policy = ReconnectionPolicy { max_retries_per_cycle: 101, ..Default::default() };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn wait_time_below_floor_is_rejected() {
        let policy = ReconnectionPolicy { wait_time_after_max_retries_ms: 9999, ..Default::default() };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn round_trips_through_reconnection_settings_json() {
        let policy = ReconnectionPolicy::default();
        let json: pulseone_wire::ReconnectionSettingsJson = policy.into();
        let back: ReconnectionPolicy = json.into();
        assert_eq!(back, policy);
    }
}
