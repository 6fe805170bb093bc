// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device configuration record.

use crate::ids::{DeviceId, SiteId, TenantId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The wire protocol a device speaks. Drives driver selection in the
/// worker factory and the device-status threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolTag {
    ModbusTcp,
    ModbusRtu,
    Mqtt,
    Bacnet,
    UdpCustom,
}

crate::simple_display! {
    ProtocolTag {
        ModbusTcp => "modbus_tcp",
        ModbusRtu => "modbus_rtu",
        Mqtt => "mqtt",
        Bacnet => "bacnet",
        UdpCustom => "udp_custom",
    }
}

/// Polling/timeout/retry tunables for a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceTiming {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub retry_count: u32,
}

impl Default for DeviceTiming {
    fn default() -> Self {
        Self { poll_interval_ms: 1000, timeout_ms: 3000, retry_count: 3 }
    }
}

/// A configured field device. Created by external configuration, mutated
/// rarely, never destroyed by the core (see `pulseone-core` crate docs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub description: String,
    pub protocol_tag: ProtocolTag,
    /// Transport-specific coordinates, e.g. `host:port` or
    /// `/dev/ttyUSB0:9600:8:N:1`.
    pub endpoint: String,
    pub enabled: bool,
    pub timing: DeviceTiming,
    /// Protocol-specific tunables: `slave_id`, `client_id`, `qos`, `baud_rate`, ...
    #[serde(default)]
    pub properties: HashMap<String, String>,
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub site_id: Option<SiteId>,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub vendor: String,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Device {
    /// Get a typed property, falling back to `default` when absent.
    pub fn property_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.properties.get(key).map(String::as_str).unwrap_or(default)
    }

    pub fn property_u32(&self, key: &str) -> Option<u32> {
        self.properties.get(key)?.parse().ok()
    }
}

crate::builder! {
    pub struct DeviceBuilder => Device {
        into {
            id: DeviceId = "dev-1",
            name: String = "test-device",
            description: String = "",
            endpoint: String = "127.0.0.1:502",
            device_type: String = "",
            vendor: String = "",
        }
        set {
            protocol_tag: ProtocolTag = ProtocolTag::ModbusTcp,
            enabled: bool = true,
            timing: DeviceTiming = DeviceTiming::default(),
            properties: HashMap<String, String> = HashMap::new(),
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            tenant_id: TenantId = None,
            site_id: SiteId = None,
        }
    }
}
