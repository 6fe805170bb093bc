// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data point configuration, scaling, and the runtime overlay.

use crate::ids::{DataPointId, DeviceId};
use crate::quality::QualityCode;
use crate::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    /// True when a write command may target a point with this access mode.
    pub fn accepts_writes(&self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::ReadWrite)
    }
}

/// A configured, addressable value on a device: a register, a BACnet
/// object, an MQTT topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub id: DataPointId,
    pub device_id: DeviceId,
    pub name: String,
    pub address: i64,
    #[serde(default)]
    pub address_string: String,
    pub data_type: DataType,
    pub access_mode: AccessMode,
    pub enabled: bool,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub scaling_factor: f64,
    #[serde(default)]
    pub scaling_offset: f64,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub log_enabled: bool,
    #[serde(default)]
    pub log_interval_ms: u64,
    #[serde(default)]
    pub log_deadband: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl DataPoint {
    /// `engineering = raw * scaling_factor + scaling_offset` when
    /// `scaling_factor != 0`, else `engineering = raw`.
    pub fn scale(&self, raw: f64) -> f64 {
        if self.scaling_factor == 0.0 {
            raw
        } else {
            raw * self.scaling_factor + self.scaling_offset
        }
    }

    /// A sample passes the deadband filter if the engineering value moved
    /// at least `log_deadband`. String values always pass.
    pub fn passes_deadband(&self, prev: &Value, new: &Value) -> bool {
        if new.is_string() || prev.is_string() {
            return true;
        }
        match (prev.as_f64(), new.as_f64()) {
            (Some(p), Some(n)) => (n - p).abs() >= self.log_deadband,
            _ => true,
        }
    }
}

crate::builder! {
    pub struct DataPointBuilder => DataPoint {
        into {
            id: DataPointId = "pt-1",
            device_id: DeviceId = "dev-1",
            name: String = "point",
            address_string: String = "",
            unit: String = "",
        }
        set {
            address: i64 = 0,
            data_type: DataType = DataType::Float64,
            access_mode: AccessMode = AccessMode::Read,
            enabled: bool = true,
            scaling_factor: f64 = 1.0,
            scaling_offset: f64 = 0.0,
            log_enabled: bool = true,
            log_interval_ms: u64 = 0,
            log_deadband: f64 = 0.0,
            tags: Vec<String> = Vec::new(),
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            min_value: f64 = None,
            max_value: f64 = None,
        }
    }
}

/// In-memory runtime overlay for a data point, maintained exclusively by
/// the owning worker. Mirrored to a [`crate::current_value::CurrentValue`]
/// row by the repository layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRuntime {
    pub current_value: Value,
    pub raw_value: Value,
    pub quality: QualityCode,
    pub value_timestamp_ms: u64,
    pub quality_timestamp_ms: u64,
    pub last_read_time_ms: u64,
    pub last_write_time_ms: u64,
    pub last_log_time_ms: u64,
}

impl PointRuntime {
    /// The overlay for a point that has never produced a sample.
    pub fn not_connected() -> Self {
        Self {
            current_value: Value::Numeric(0.0),
            raw_value: Value::Numeric(0.0),
            quality: QualityCode::NotConnected,
            value_timestamp_ms: 0,
            quality_timestamp_ms: 0,
            last_read_time_ms: 0,
            last_write_time_ms: 0,
            last_log_time_ms: 0,
        }
    }
}

#[cfg(test)]
#[path = "data_point_tests.rs"]
mod tests;
