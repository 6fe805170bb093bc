// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auxiliary entities: alarm rules/occurrences, virtual points, script
//! libraries, sites, tenants, users.
//!
//! These share the uniform repository contract (`pulseone-storage`) but
//! are not on the worker hot path — no rule engine or alarm evaluation
//! logic lives in this crate (explicit non-goal).

use crate::ids::{
    AlarmOccurrenceId, AlarmRuleId, DataPointId, ScriptLibraryId, SiteId, TenantId, UserId,
    VirtualPointId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmRule {
    pub id: AlarmRuleId,
    pub data_point_id: DataPointId,
    pub name: String,
    pub condition: String,
    pub severity: String,
    pub enabled: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmOccurrence {
    pub id: AlarmOccurrenceId,
    pub rule_id: AlarmRuleId,
    pub triggered_at_ms: u64,
    pub cleared_at_ms: Option<u64>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualPoint {
    pub id: VirtualPointId,
    pub name: String,
    pub expression: String,
    pub enabled: bool,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLibrary {
    pub id: ScriptLibraryId,
    pub name: String,
    pub language: String,
    pub source: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub tenant_id: TenantId,
    pub name: String,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub username: String,
    pub created_at_ms: u64,
}
