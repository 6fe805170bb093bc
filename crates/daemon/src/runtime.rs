// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process wiring (§4.6): repositories, the worker factory, and the
//! optional telemetry sinks, constructed once and shared via `Arc`. No
//! global mutable state (§6) — everything a running daemon needs lives
//! on this struct.

use crate::config::DaemonConfig;
use crate::error::DaemonError;
use pulseone_core::{Clock, CurrentValue, DataPoint, Device, DeviceId, ProtocolTag};
use pulseone_storage::{Repository, SqlStore};
use pulseone_wire::{PipelineSink, StatusPublisher};
use pulseone_worker::{FactoryStats, WorkerFactory, WorkerHandle};
use std::sync::Arc;

/// The running daemon: repositories, the worker factory, and whatever
/// workers have been started so far. Generic over the store so tests
/// run against `FakeSqlStore` and a real deployment supplies its own
/// adapter behind the same [`SqlStore`] seam (§1 — real SQL execution
/// is out of scope).
pub struct Runtime<S: SqlStore> {
    devices: Arc<Repository<Device, S>>,
    factory: Arc<WorkerFactory<S>>,
}

impl<S: SqlStore + 'static> Runtime<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        config: &DaemonConfig,
        pipeline: Arc<dyn PipelineSink>,
        status_publisher: Option<Arc<dyn StatusPublisher>>,
    ) -> Self {
        let devices = Arc::new(Repository::with_cache_limits(
            store.clone(),
            Arc::clone(&clock),
            config.cache.max_size,
            config.cache.ttl_ms,
        ));
        let data_points = Arc::new(Repository::with_cache_limits(
            store.clone(),
            Arc::clone(&clock),
            config.cache.max_size,
            config.cache.ttl_ms,
        ));
        let current_values = Arc::new(Repository::with_cache_limits(
            store,
            Arc::clone(&clock),
            config.cache.max_size,
            config.cache.ttl_ms,
        ));

        let factory = Arc::new(WorkerFactory::new(
            Arc::clone(&devices),
            data_points,
            current_values,
            clock,
            pipeline,
            status_publisher,
            config.reconnection.into(),
        ));

        Self { devices, factory }
    }

    pub fn factory(&self) -> &Arc<WorkerFactory<S>> {
        &self.factory
    }

    pub fn devices(&self) -> &Arc<Repository<Device, S>> {
        &self.devices
    }

    /// Starts a worker for every enabled device on record, up to
    /// `config.max_devices_at_startup` (0 means unlimited). Failures are
    /// logged by the factory and reflected in `stats()`; one bad device
    /// never blocks the rest from starting.
    pub fn start_all(&self, max_devices_at_startup: usize) -> Vec<Arc<dyn WorkerHandle>> {
        let limit = if max_devices_at_startup == 0 { usize::MAX } else { max_devices_at_startup };
        let handles = self.factory.create_all_active_workers(limit);
        tracing::info!(started = handles.len(), "worker startup pass complete");
        handles
    }

    pub fn start_device(&self, device_id: &DeviceId) -> Result<Arc<dyn WorkerHandle>, DaemonError> {
        self.factory.create_by_device_id(device_id).map_err(DaemonError::from)
    }

    pub fn worker(&self, device_id: &DeviceId) -> Option<Arc<dyn WorkerHandle>> {
        self.factory.worker(device_id)
    }

    pub fn registered_protocols(&self) -> Vec<ProtocolTag> {
        self.factory.registered_protocols()
    }

    pub fn stats(&self) -> FactoryStats {
        self.factory.stats()
    }

    /// Stops every currently-running worker. Used by graceful shutdown.
    pub async fn stop_all(&self) {
        for handle in self.factory.all_workers() {
            handle.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use pulseone_core::FakeClock;
    use pulseone_storage::FakeSqlStore;
    use pulseone_wire::fake::FakePipelineSink;

    fn runtime() -> Runtime<FakeSqlStore> {
        let store = Arc::new(FakeSqlStore::new());
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
        Runtime::new(store, clock, &DaemonConfig::default(), Arc::new(FakePipelineSink::new(100)), None)
    }

    #[test]
    fn registers_every_protocol_tag_up_front() {
        let rt = runtime();
        assert_eq!(rt.registered_protocols().len(), 5);
    }

    #[test]
    fn start_all_on_empty_store_starts_nothing() {
        let rt = runtime();
        assert!(rt.start_all(0).is_empty());
        assert_eq!(rt.stats().workers_created, 0);
    }

    #[test]
    fn start_device_surfaces_configuration_error_for_missing_device() {
        let rt = runtime();
        let err = rt.start_device(&DeviceId::new("missing")).unwrap_err();
        assert!(matches!(err, DaemonError::Configuration(_)));
    }

    #[test]
    fn start_all_respects_the_configured_limit() {
        let rt = runtime();
        for i in 0..3 {
            let device = Device::builder()
                .id(DeviceId::new(format!("d-{i}")))
                .protocol_tag(ProtocolTag::ModbusTcp)
                .endpoint("127.0.0.1:502")
                .build();
            rt.devices.save(&device);
        }
        let started = rt.start_all(2);
        assert_eq!(started.len(), 2);
    }
}
