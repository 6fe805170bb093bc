// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The contract a type must satisfy to be stored behind a [`crate::Repository`].

use std::collections::HashMap;
use std::hash::Hash;

/// A single store row, represented as column name → text value. The
/// store is modeled as a SQL-like black box (§6) so every column is
/// text; typed decoding happens in [`Entity::from_row`].
pub type Row = HashMap<String, String>;

/// A persistable entity kind. Implementors live in [`crate::entities`]
/// as thin adapters over the plain structs defined in `pulseone-core` —
/// the core crate's types stay storage-agnostic.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + std::fmt::Display + Send + Sync;

    fn id(&self) -> Self::Id;
    fn table_name() -> &'static str;
    fn to_row(&self) -> Row;
    fn from_row(row: &Row) -> Option<Self>
    where
        Self: Sized;
}

pub(crate) fn get(row: &Row, key: &str) -> Option<String> {
    row.get(key).cloned()
}

pub(crate) fn get_required(row: &Row, key: &str) -> Option<String> {
    row.get(key).filter(|v| !v.is_empty()).cloned()
}

pub(crate) fn parse_u64(row: &Row, key: &str) -> u64 {
    row.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

pub(crate) fn parse_f64(row: &Row, key: &str) -> f64 {
    row.get(key).and_then(|v| v.parse().ok()).unwrap_or(0.0)
}

pub(crate) fn parse_bool(row: &Row, key: &str) -> bool {
    row.get(key).map(|v| v == "true").unwrap_or(false)
}
