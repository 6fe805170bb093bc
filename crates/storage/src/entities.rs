// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Entity` adapters for every `pulseone-core` record. The core types
//! stay storage-agnostic; the row (de)serialization lives here so the
//! repository contract can be demonstrably generic rather than
//! Device/DataPoint-specific (§3: "auxiliary entities ... share the
//! uniform repository contract").

use crate::entity::{get, get_required, parse_bool, parse_f64, parse_u64, Entity, Row};
use pulseone_core::{
    AccessMode, AlarmOccurrence, AlarmRule, CurrentValue, DataPoint, DataType, Device,
    DeviceTiming, ProtocolTag, QualityCode, ScriptLibrary, Site, Tenant, User, Value,
    VirtualPoint,
};
use pulseone_core::{
    AlarmOccurrenceId, AlarmRuleId, CurrentValueId, DataPointId, DeviceId, ScriptLibraryId,
    SiteId, TenantId, UserId, VirtualPointId,
};
use std::collections::HashMap;

fn protocol_tag_from_str(s: &str) -> ProtocolTag {
    match s {
        "modbus_rtu" => ProtocolTag::ModbusRtu,
        "mqtt" => ProtocolTag::Mqtt,
        "bacnet" => ProtocolTag::Bacnet,
        "udp_custom" => ProtocolTag::UdpCustom,
        _ => ProtocolTag::ModbusTcp,
    }
}

fn data_type_from_str(s: &str) -> DataType {
    match s {
        "bool" => DataType::Bool,
        "int16" => DataType::Int16,
        "uint16" => DataType::Uint16,
        "int32" => DataType::Int32,
        "uint32" => DataType::Uint32,
        "float32" => DataType::Float32,
        "string" => DataType::String,
        _ => DataType::Float64,
    }
}

fn access_mode_from_str(s: &str) -> AccessMode {
    match s {
        "write" => AccessMode::Write,
        "read_write" => AccessMode::ReadWrite,
        _ => AccessMode::Read,
    }
}

fn quality_from_str(s: &str) -> QualityCode {
    match s {
        "GOOD" => QualityCode::Good,
        "UNCERTAIN" => QualityCode::Uncertain,
        "NOT_CONNECTED" => QualityCode::NotConnected,
        "BAD" => QualityCode::Bad,
        _ => QualityCode::Unknown,
    }
}

fn value_to_text(v: &Value) -> String {
    match v {
        Value::Numeric(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
    }
}

fn value_from_text(kind: &str, text: &str) -> Value {
    match kind {
        "bool" => Value::Bool(text == "true"),
        "string" => Value::String(text.to_string()),
        _ => Value::Numeric(text.parse().unwrap_or(0.0)),
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Numeric(_) => "numeric",
        Value::Bool(_) => "bool",
        Value::String(_) => "string",
    }
}

impl Entity for Device {
    type Id = DeviceId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "devices"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("name".into(), self.name.clone());
        row.insert("description".into(), self.description.clone());
        row.insert("protocol_tag".into(), self.protocol_tag.to_string());
        row.insert("endpoint".into(), self.endpoint.clone());
        row.insert("enabled".into(), self.enabled.to_string());
        row.insert("poll_interval_ms".into(), self.timing.poll_interval_ms.to_string());
        row.insert("timeout_ms".into(), self.timing.timeout_ms.to_string());
        row.insert("retry_count".into(), self.timing.retry_count.to_string());
        row.insert(
            "properties".into(),
            serde_json::to_string(&self.properties).unwrap_or_default(),
        );
        row.insert(
            "tenant_id".into(),
            self.tenant_id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
        );
        row.insert(
            "site_id".into(),
            self.site_id.as_ref().map(|s| s.to_string()).unwrap_or_default(),
        );
        row.insert("device_type".into(), self.device_type.clone());
        row.insert("vendor".into(), self.vendor.clone());
        row.insert("created_at_ms".into(), self.created_at_ms.to_string());
        row.insert("updated_at_ms".into(), self.updated_at_ms.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(Device {
            id: DeviceId::new(get_required(row, "id")?),
            name: get(row, "name").unwrap_or_default(),
            description: get(row, "description").unwrap_or_default(),
            protocol_tag: protocol_tag_from_str(&get(row, "protocol_tag").unwrap_or_default()),
            endpoint: get(row, "endpoint").unwrap_or_default(),
            enabled: parse_bool(row, "enabled"),
            timing: DeviceTiming {
                poll_interval_ms: parse_u64(row, "poll_interval_ms"),
                timeout_ms: parse_u64(row, "timeout_ms"),
                retry_count: parse_u64(row, "retry_count") as u32,
            },
            properties: get(row, "properties")
                .and_then(|v| serde_json::from_str::<HashMap<String, String>>(&v).ok())
                .unwrap_or_default(),
            tenant_id: get_required(row, "tenant_id").map(TenantId::new),
            site_id: get_required(row, "site_id").map(SiteId::new),
            device_type: get(row, "device_type").unwrap_or_default(),
            vendor: get(row, "vendor").unwrap_or_default(),
            created_at_ms: parse_u64(row, "created_at_ms"),
            updated_at_ms: parse_u64(row, "updated_at_ms"),
        })
    }
}

impl Entity for DataPoint {
    type Id = DataPointId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "data_points"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("device_id".into(), self.device_id.to_string());
        row.insert("name".into(), self.name.clone());
        row.insert("address".into(), self.address.to_string());
        row.insert("address_string".into(), self.address_string.clone());
        row.insert(
            "data_type".into(),
            serde_json::to_value(self.data_type)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
        );
        row.insert(
            "access_mode".into(),
            serde_json::to_value(self.access_mode)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
        );
        row.insert("enabled".into(), self.enabled.to_string());
        row.insert("unit".into(), self.unit.clone());
        row.insert("scaling_factor".into(), self.scaling_factor.to_string());
        row.insert("scaling_offset".into(), self.scaling_offset.to_string());
        row.insert(
            "min_value".into(),
            self.min_value.map(|v| v.to_string()).unwrap_or_default(),
        );
        row.insert(
            "max_value".into(),
            self.max_value.map(|v| v.to_string()).unwrap_or_default(),
        );
        row.insert("log_enabled".into(), self.log_enabled.to_string());
        row.insert("log_interval_ms".into(), self.log_interval_ms.to_string());
        row.insert("log_deadband".into(), self.log_deadband.to_string());
        row.insert("tags".into(), self.tags.join(","));
        row.insert("created_at_ms".into(), self.created_at_ms.to_string());
        row.insert("updated_at_ms".into(), self.updated_at_ms.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(DataPoint {
            id: DataPointId::new(get_required(row, "id")?),
            device_id: DeviceId::new(get_required(row, "device_id")?),
            name: get(row, "name").unwrap_or_default(),
            address: row.get("address").and_then(|v| v.parse().ok()).unwrap_or(0),
            address_string: get(row, "address_string").unwrap_or_default(),
            data_type: data_type_from_str(&get(row, "data_type").unwrap_or_default()),
            access_mode: access_mode_from_str(&get(row, "access_mode").unwrap_or_default()),
            enabled: parse_bool(row, "enabled"),
            unit: get(row, "unit").unwrap_or_default(),
            scaling_factor: parse_f64(row, "scaling_factor"),
            scaling_offset: parse_f64(row, "scaling_offset"),
            min_value: get_required(row, "min_value").and_then(|v| v.parse().ok()),
            max_value: get_required(row, "max_value").and_then(|v| v.parse().ok()),
            log_enabled: parse_bool(row, "log_enabled"),
            log_interval_ms: parse_u64(row, "log_interval_ms"),
            log_deadband: parse_f64(row, "log_deadband"),
            tags: get(row, "tags")
                .map(|v| v.split(',').filter(|s| !s.is_empty()).map(str::to_string).collect())
                .unwrap_or_default(),
            created_at_ms: parse_u64(row, "created_at_ms"),
            updated_at_ms: parse_u64(row, "updated_at_ms"),
        })
    }
}

impl Entity for CurrentValue {
    type Id = DataPointId;

    fn id(&self) -> Self::Id {
        self.data_point_id.clone()
    }

    fn table_name() -> &'static str {
        "current_values"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.data_point_id.to_string());
        row.insert("current_value_id".into(), self.id.to_string());
        row.insert("value_kind".into(), value_kind(&self.value).to_string());
        row.insert("value".into(), value_to_text(&self.value));
        row.insert("raw_value".into(), value_to_text(&self.raw_value));
        row.insert("quality".into(), self.quality.to_string());
        row.insert("value_timestamp_ms".into(), self.value_timestamp_ms.to_string());
        row.insert("quality_timestamp_ms".into(), self.quality_timestamp_ms.to_string());
        row.insert("read_count".into(), self.read_count.to_string());
        row.insert("write_count".into(), self.write_count.to_string());
        row.insert("error_count".into(), self.error_count.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        let kind = get(row, "value_kind").unwrap_or_default();
        Some(CurrentValue {
            id: CurrentValueId::new(get_required(row, "current_value_id")?),
            data_point_id: DataPointId::new(get_required(row, "id")?),
            value: value_from_text(&kind, &get(row, "value").unwrap_or_default()),
            raw_value: value_from_text(&kind, &get(row, "raw_value").unwrap_or_default()),
            quality: quality_from_str(&get(row, "quality").unwrap_or_default()),
            value_timestamp_ms: parse_u64(row, "value_timestamp_ms"),
            quality_timestamp_ms: parse_u64(row, "quality_timestamp_ms"),
            read_count: parse_u64(row, "read_count"),
            write_count: parse_u64(row, "write_count"),
            error_count: parse_u64(row, "error_count"),
        })
    }
}

impl Entity for AlarmRule {
    type Id = AlarmRuleId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "alarm_rules"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("data_point_id".into(), self.data_point_id.to_string());
        row.insert("name".into(), self.name.clone());
        row.insert("condition".into(), self.condition.clone());
        row.insert("severity".into(), self.severity.clone());
        row.insert("enabled".into(), self.enabled.to_string());
        row.insert("created_at_ms".into(), self.created_at_ms.to_string());
        row.insert("updated_at_ms".into(), self.updated_at_ms.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(AlarmRule {
            id: AlarmRuleId::new(get_required(row, "id")?),
            data_point_id: DataPointId::new(get_required(row, "data_point_id")?),
            name: get(row, "name").unwrap_or_default(),
            condition: get(row, "condition").unwrap_or_default(),
            severity: get(row, "severity").unwrap_or_default(),
            enabled: parse_bool(row, "enabled"),
            created_at_ms: parse_u64(row, "created_at_ms"),
            updated_at_ms: parse_u64(row, "updated_at_ms"),
        })
    }
}

impl Entity for AlarmOccurrence {
    type Id = AlarmOccurrenceId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "alarm_occurrences"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("rule_id".into(), self.rule_id.to_string());
        row.insert("triggered_at_ms".into(), self.triggered_at_ms.to_string());
        row.insert(
            "cleared_at_ms".into(),
            self.cleared_at_ms.map(|v| v.to_string()).unwrap_or_default(),
        );
        row.insert("message".into(), self.message.clone());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(AlarmOccurrence {
            id: AlarmOccurrenceId::new(get_required(row, "id")?),
            rule_id: AlarmRuleId::new(get_required(row, "rule_id")?),
            triggered_at_ms: parse_u64(row, "triggered_at_ms"),
            cleared_at_ms: get_required(row, "cleared_at_ms").and_then(|v| v.parse().ok()),
            message: get(row, "message").unwrap_or_default(),
        })
    }
}

impl Entity for VirtualPoint {
    type Id = VirtualPointId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "virtual_points"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("name".into(), self.name.clone());
        row.insert("expression".into(), self.expression.clone());
        row.insert("enabled".into(), self.enabled.to_string());
        row.insert("created_at_ms".into(), self.created_at_ms.to_string());
        row.insert("updated_at_ms".into(), self.updated_at_ms.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(VirtualPoint {
            id: VirtualPointId::new(get_required(row, "id")?),
            name: get(row, "name").unwrap_or_default(),
            expression: get(row, "expression").unwrap_or_default(),
            enabled: parse_bool(row, "enabled"),
            created_at_ms: parse_u64(row, "created_at_ms"),
            updated_at_ms: parse_u64(row, "updated_at_ms"),
        })
    }
}

impl Entity for ScriptLibrary {
    type Id = ScriptLibraryId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "script_libraries"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("name".into(), self.name.clone());
        row.insert("language".into(), self.language.clone());
        row.insert("source".into(), self.source.clone());
        row.insert("created_at_ms".into(), self.created_at_ms.to_string());
        row.insert("updated_at_ms".into(), self.updated_at_ms.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(ScriptLibrary {
            id: ScriptLibraryId::new(get_required(row, "id")?),
            name: get(row, "name").unwrap_or_default(),
            language: get(row, "language").unwrap_or_default(),
            source: get(row, "source").unwrap_or_default(),
            created_at_ms: parse_u64(row, "created_at_ms"),
            updated_at_ms: parse_u64(row, "updated_at_ms"),
        })
    }
}

impl Entity for Site {
    type Id = SiteId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "sites"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("tenant_id".into(), self.tenant_id.to_string());
        row.insert("name".into(), self.name.clone());
        row.insert("created_at_ms".into(), self.created_at_ms.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(Site {
            id: SiteId::new(get_required(row, "id")?),
            tenant_id: TenantId::new(get_required(row, "tenant_id")?),
            name: get(row, "name").unwrap_or_default(),
            created_at_ms: parse_u64(row, "created_at_ms"),
        })
    }
}

impl Entity for Tenant {
    type Id = TenantId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "tenants"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("name".into(), self.name.clone());
        row.insert("created_at_ms".into(), self.created_at_ms.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(Tenant {
            id: TenantId::new(get_required(row, "id")?),
            name: get(row, "name").unwrap_or_default(),
            created_at_ms: parse_u64(row, "created_at_ms"),
        })
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn table_name() -> &'static str {
        "users"
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.to_string());
        row.insert("tenant_id".into(), self.tenant_id.to_string());
        row.insert("username".into(), self.username.clone());
        row.insert("created_at_ms".into(), self.created_at_ms.to_string());
        row
    }

    fn from_row(row: &Row) -> Option<Self> {
        Some(User {
            id: UserId::new(get_required(row, "id")?),
            tenant_id: TenantId::new(get_required(row, "tenant_id")?),
            username: get(row, "username").unwrap_or_default(),
            created_at_ms: parse_u64(row, "created_at_ms"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseone_core::DeviceId;

    #[test]
    fn device_round_trips_through_row() {
        let device = Device::builder()
            .id(DeviceId::new("d-1"))
            .name("pump")
            .build();
        let row = device.to_row();
        let back = Device::from_row(&row).unwrap();
        assert_eq!(back, device);
    }

    #[test]
    fn data_point_round_trips_through_row() {
        let point = DataPoint::builder()
            .id(DataPointId::new("p-1"))
            .scaling_factor(2.0)
            .build();
        let row = point.to_row();
        let back = DataPoint::from_row(&row).unwrap();
        assert_eq!(back, point);
    }

    #[test]
    fn current_value_round_trips_string_variant() {
        let cv = CurrentValue::builder()
            .value(Value::String("open".to_string()))
            .raw_value(Value::String("open".to_string()))
            .build();
        let row = cv.to_row();
        let back = CurrentValue::from_row(&row).unwrap();
        assert_eq!(back.value, Value::String("open".to_string()));
    }
}
