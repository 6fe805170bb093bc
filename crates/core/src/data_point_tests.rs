// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn scale_applies_factor_and_offset() {
    let point = DataPoint::builder().scaling_factor(0.1).scaling_offset(-10.0).build();
    assert_eq!(point.scale(500.0), 40.0);
}

#[test]
fn scale_passes_through_raw_when_factor_is_zero() {
    let point = DataPoint::builder().scaling_factor(0.0).scaling_offset(99.0).build();
    assert_eq!(point.scale(100.0), 100.0);
}

#[test]
fn deadband_suppresses_small_changes() {
    let point = DataPoint::builder().log_deadband(0.5).build();
    let prev = Value::Numeric(10.0);
    assert!(!point.passes_deadband(&prev, &Value::Numeric(10.2)));
    assert!(point.passes_deadband(&prev, &Value::Numeric(10.6)));
}

#[test]
fn deadband_boundary_is_inclusive() {
    let point = DataPoint::builder().log_deadband(0.5).build();
    assert!(point.passes_deadband(&Value::Numeric(10.0), &Value::Numeric(10.5)));
}

#[test]
fn string_values_always_pass_deadband() {
    let point = DataPoint::builder().log_deadband(100.0).build();
    assert!(point.passes_deadband(&Value::String("a".into()), &Value::String("a".into())));
}

#[test]
fn access_mode_accepts_writes_only_for_write_variants() {
    assert!(!AccessMode::Read.accepts_writes());
    assert!(AccessMode::Write.accepts_writes());
    assert!(AccessMode::ReadWrite.accepts_writes());
}

#[test]
fn not_connected_overlay_has_not_connected_quality() {
    let overlay = PointRuntime::not_connected();
    assert_eq!(overlay.quality, QualityCode::NotConnected);
}
