// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pulseone-core: entity model, ids, clock, and quality/status vocabulary
//! shared by every other PulseOne crate.

pub mod macros;

pub mod aux;
pub mod clock;
pub mod current_value;
pub mod data_point;
pub mod device;
pub mod ids;
pub mod quality;
pub mod status;
pub mod value;

pub use aux::{AlarmOccurrence, AlarmRule, ScriptLibrary, Site, Tenant, User, VirtualPoint};
pub use clock::{Clock, FakeClock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use current_value::CurrentValueBuilder;
pub use current_value::CurrentValue;
#[cfg(any(test, feature = "test-support"))]
pub use data_point::DataPointBuilder;
pub use data_point::{AccessMode, DataPoint, DataType, PointRuntime};
#[cfg(any(test, feature = "test-support"))]
pub use device::DeviceBuilder;
pub use device::{Device, DeviceTiming, ProtocolTag};
pub use ids::{
    short, AlarmOccurrenceId, AlarmRuleId, CurrentValueId, DataPointId, DeviceId, ScriptLibraryId,
    SiteId, TenantId, UserId, VirtualPointId, WorkerId,
};
pub use quality::QualityCode;
pub use status::{DeviceStatus, WorkerState};
pub use value::Value;
