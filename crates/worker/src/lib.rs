// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pulseone-worker: the device worker state machine, protocol drivers,
//! and the factory that wires a `Device` row into a running worker.

pub mod core;
pub mod driver;
pub mod error;
pub mod factory;
pub mod policy;
pub mod status_thresholds;

pub use core::{WorkerCore, WorkerHandle};
pub use driver::{
    BacnetDriver, GenericPollingDriver, ModbusDriver, MqttDriver, ProtocolCodec, ProtocolDriver,
    RawSample, TextCodec, UdpCustomDriver,
};
pub use error::{ConfigurationError, DriverError, NotWritableError};
pub use factory::{FactoryStats, WorkerFactory};
pub use policy::ReconnectionPolicy;
pub use status_thresholds::{derive_status, StatusThresholds};
