// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: cache sizing/TTL, reconnection defaults, and
//! telemetry sink toggles, loaded from a TOML document (§5 ambient
//! stack). Parsing the document is in scope; watching it for changes,
//! overlaying environment variables, or fetching secrets is the
//! external config loader's job, not this crate's.

use crate::error::DaemonError;
use pulseone_worker::ReconnectionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bounds for one repository's in-memory LRU cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_size: usize,
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_size: 10_000, ttl_ms: 60_000 }
    }
}

/// Which optional telemetry sinks the runtime should wire up. Absence
/// of either must not affect worker correctness (§6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    pub status_publisher_enabled: bool,
    pub timeseries_enabled: bool,
}

/// Same shape `ReconnectionPolicy` carries, kept as a distinct type at
/// the config boundary so a malformed document never partially
/// constructs a policy the worker crate considers valid. Converted via
/// `From` once the file has parsed cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectionConfig {
    pub auto_reconnect_enabled: bool,
    pub retry_interval_ms: u64,
    pub max_retries_per_cycle: u32,
    pub wait_time_after_max_retries_ms: u64,
    pub keep_alive_enabled: bool,
    pub keep_alive_interval_seconds: u64,
    pub connection_timeout_seconds: u64,
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        let p = ReconnectionPolicy::default();
        Self {
            auto_reconnect_enabled: p.auto_reconnect_enabled,
            retry_interval_ms: p.retry_interval_ms,
            max_retries_per_cycle: p.max_retries_per_cycle,
            wait_time_after_max_retries_ms: p.wait_time_after_max_retries_ms,
            keep_alive_enabled: p.keep_alive_enabled,
            keep_alive_interval_seconds: p.keep_alive_interval_seconds,
            connection_timeout_seconds: p.connection_timeout_seconds,
        }
    }
}

impl From<ReconnectionConfig> for ReconnectionPolicy {
    fn from(c: ReconnectionConfig) -> Self {
        Self {
            auto_reconnect_enabled: c.auto_reconnect_enabled,
            retry_interval_ms: c.retry_interval_ms,
            max_retries_per_cycle: c.max_retries_per_cycle,
            wait_time_after_max_retries_ms: c.wait_time_after_max_retries_ms,
            keep_alive_enabled: c.keep_alive_enabled,
            keep_alive_interval_seconds: c.keep_alive_interval_seconds,
            connection_timeout_seconds: c.connection_timeout_seconds,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub cache: CacheConfig,
    pub reconnection: ReconnectionConfig,
    pub sinks: SinkConfig,
    /// Upper bound on devices started by `create_all_active_workers` at
    /// boot; 0 means unlimited.
    pub max_devices_at_startup: usize,
}

impl DaemonConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, DaemonError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| DaemonError::ConfigRead { path: path.display().to_string(), source })?;
        Self::from_toml_str(&text)
            .map_err(|source| DaemonError::ConfigParse { path: path.display().to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_empty_document() {
        let cfg = DaemonConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, DaemonConfig::default());
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let cfg = DaemonConfig::from_toml_str(
            r#"
            max_devices_at_startup = 50

            [sinks]
            status_publisher_enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.max_devices_at_startup, 50);
        assert!(cfg.sinks.status_publisher_enabled);
        assert!(!cfg.sinks.timeseries_enabled);
        assert_eq!(cfg.cache, CacheConfig::default());
    }

    #[test]
    fn reconnection_config_converts_to_policy() {
        let cfg = ReconnectionConfig { max_retries_per_cycle: 7, ..Default::default() };
        let policy: ReconnectionPolicy = cfg.into();
        assert_eq!(policy.max_retries_per_cycle, 7);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = DaemonConfig::from_toml_str("not = [valid");
        assert!(err.is_err());
    }
}
