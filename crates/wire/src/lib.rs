// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pulseone-wire: the pipeline bridge DTOs and the external-collaborator
//! seams named in §6 — the downstream pipeline sink and the two optional
//! telemetry publishers. No codec, no transport; just the shapes and
//! the trait boundary.

pub mod message;
pub mod sinks;
pub mod status;

pub use message::{ConnectionStats, DeviceDataMessage, PointCounts, ProcessingFlags, TimestampedValue};
pub use sinks::{PipelineSink, StatusPublisher, TimeseriesSink};
pub use status::{ReconnectionEventJson, ReconnectionEventKind, ReconnectionSettingsJson, WorkerStatusJson};

#[cfg(any(test, feature = "test-support"))]
pub use sinks::fake::{FakePipelineSink, FakeStatusPublisher};

#[cfg(test)]
mod property_tests;
