// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn ids_are_distinct_types_over_the_same_string() {
    let device = DeviceId::new("abc");
    let worker = WorkerId::new("abc");
    assert_eq!(device.as_str(), worker.as_str());
    // Different types entirely -- this is a compile-time guarantee, not
    // something we can assert at runtime, but both should round-trip.
    assert_eq!(device.to_string(), "abc");
    assert_eq!(worker.to_string(), "abc");
}

#[test]
fn borrow_str_allows_hash_map_lookup_by_str() {
    let mut map: HashMap<DeviceId, u32> = HashMap::new();
    map.insert(DeviceId::new("dev-1"), 42);
    assert_eq!(map.get("dev-1"), Some(&42));
}

#[test]
fn eq_against_str_and_str_ref() {
    let id = DataPointId::new("pt-1");
    assert_eq!(id, *"pt-1");
    assert_eq!(id, "pt-1");
}

#[test]
fn from_string_and_from_str() {
    assert_eq!(DeviceId::from("x".to_string()), DeviceId::new("x"));
    assert_eq!(DeviceId::from("x"), DeviceId::new("x"));
}

#[test]
fn short_truncates_and_passes_through() {
    assert_eq!(short("abcdefghijklmnop", 8), "abcdefgh");
    assert_eq!(short("abc", 8), "abc");
}
