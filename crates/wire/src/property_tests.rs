// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the wire DTOs: arbitrary values round-trip
//! through JSON without loss, matching the teacher's
//! `oj-wire::property_tests` convention of fuzzing the wire contract
//! rather than only hand-picked examples.

use crate::message::{ConnectionStats, PointCounts, ProcessingFlags};
use crate::status::ReconnectionSettingsJson;
use proptest::prelude::*;

proptest! {
    #[test]
    fn reconnection_settings_round_trip(
        auto_reconnect_enabled in any::<bool>(),
        retry_interval_ms in 1000u64..=300_000,
        max_retries_per_cycle in 0u32..=100,
        wait_time_after_max_retries_ms in 10_000u64..=600_000,
        keep_alive_enabled in any::<bool>(),
        keep_alive_interval_seconds in 1u64..=600,
        connection_timeout_seconds in 1u64..=120,
    ) {
        let settings = ReconnectionSettingsJson {
            auto_reconnect_enabled,
            retry_interval_ms,
            max_retries_per_cycle,
            wait_time_after_max_retries_ms,
            keep_alive_enabled,
            keep_alive_interval_seconds,
            connection_timeout_seconds,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: ReconnectionSettingsJson = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn point_counts_successful_plus_failed_never_exceeds_configured_by_construction(
        total_configured in 0u32..1000,
        successful in 0u32..1000,
        failed in 0u32..1000,
    ) {
        // PointCounts carries whatever the caller asserts; this just
        // exercises that construction and JSON round-trip never panics
        // or silently truncates regardless of the combination.
        let counts = PointCounts { total_configured, successful, failed };
        let json = serde_json::to_string(&counts).unwrap();
        let back: PointCounts = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, counts);
    }

    #[test]
    fn processing_flags_and_connection_stats_round_trip(
        trigger_alarms in any::<bool>(),
        trigger_virtual_points in any::<bool>(),
        high_priority in any::<bool>(),
        total_failures in 0u64..10_000,
        total_attempts in 0u64..10_000,
    ) {
        let flags = ProcessingFlags { trigger_alarms, trigger_virtual_points, high_priority };
        let flags_json = serde_json::to_string(&flags).unwrap();
        prop_assert_eq!(serde_json::from_str::<ProcessingFlags>(&flags_json).unwrap(), flags);

        let stats = ConnectionStats { total_failures, total_attempts, ..Default::default() };
        let stats_json = serde_json::to_string(&stats).unwrap();
        prop_assert_eq!(serde_json::from_str::<ConnectionStats>(&stats_json).unwrap(), stats);
    }
}
