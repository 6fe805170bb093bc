// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted mirror of a data point's runtime overlay.

use crate::data_point::PointRuntime;
use crate::ids::{CurrentValueId, DataPointId};
use crate::quality::QualityCode;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Persisted mirror of [`PointRuntime`], keyed 1:1 by `data_point_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentValue {
    pub id: CurrentValueId,
    pub data_point_id: DataPointId,
    pub value: Value,
    pub raw_value: Value,
    pub quality: QualityCode,
    pub value_timestamp_ms: u64,
    pub quality_timestamp_ms: u64,
    #[serde(default)]
    pub read_count: u64,
    #[serde(default)]
    pub write_count: u64,
    #[serde(default)]
    pub error_count: u64,
}

impl CurrentValue {
    /// Project this persisted row into an in-memory runtime overlay.
    pub fn into_runtime(self) -> PointRuntime {
        PointRuntime {
            current_value: self.value,
            raw_value: self.raw_value,
            quality: self.quality,
            value_timestamp_ms: self.value_timestamp_ms,
            quality_timestamp_ms: self.quality_timestamp_ms,
            last_read_time_ms: self.value_timestamp_ms,
            last_write_time_ms: 0,
            last_log_time_ms: 0,
        }
    }
}

crate::builder! {
    pub struct CurrentValueBuilder => CurrentValue {
        into {
            id: CurrentValueId = "cv-1",
            data_point_id: DataPointId = "pt-1",
        }
        set {
            value: Value = Value::Numeric(0.0),
            raw_value: Value = Value::Numeric(0.0),
            quality: QualityCode = QualityCode::Good,
            value_timestamp_ms: u64 = 0,
            quality_timestamp_ms: u64 = 0,
            read_count: u64 = 0,
            write_count: u64 = 0,
            error_count: u64 = 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_runtime_carries_value_and_quality() {
        let cv = CurrentValue::builder()
            .value(Value::Numeric(42.0))
            .quality(QualityCode::Good)
            .build();
        let rt = cv.into_runtime();
        assert_eq!(rt.current_value, Value::Numeric(42.0));
        assert_eq!(rt.quality, QualityCode::Good);
    }
}
