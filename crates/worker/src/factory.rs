// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker factory (§4.5): fetches a device and its points, joins
//! the runtime overlay, applies protocol defaults, and constructs the
//! right driver behind a [`WorkerHandle`].

use crate::core::{WorkerCore, WorkerHandle};
use crate::driver::{BacnetDriver, ModbusDriver, MqttDriver, TextCodec, UdpCustomDriver};
use crate::error::ConfigurationError;
use crate::policy::ReconnectionPolicy;
use parking_lot::Mutex;
use pulseone_core::{Clock, CurrentValue, DataPoint, Device, DeviceId, PointRuntime, ProtocolTag, WorkerId};
use pulseone_storage::{Repository, SqlStore};
use pulseone_transport::{SerialTransport, TcpTransport, Transport, UdpTransport};
use pulseone_wire::{PipelineSink, StatusPublisher};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const BACNET_MIN_POLL_INTERVAL_MS: u64 = 5_000;

/// Bookkeeping the factory exposes for operator diagnostics (§4.5).
#[derive(Debug, Default, Clone, Copy)]
pub struct FactoryStats {
    pub workers_created: u64,
    pub creation_failures: u64,
}

pub struct WorkerFactory<S: SqlStore> {
    devices: Arc<Repository<Device, S>>,
    data_points: Arc<Repository<DataPoint, S>>,
    current_values: Arc<Repository<CurrentValue, S>>,
    clock: Arc<dyn Clock>,
    pipeline: Arc<dyn PipelineSink>,
    status_publisher: Option<Arc<dyn StatusPublisher>>,
    default_policy: ReconnectionPolicy,

    registry: HashMap<ProtocolTag, ()>,
    workers_created: AtomicU64,
    creation_failures: AtomicU64,
    factory_start_time_ms: u64,
    workers: Mutex<HashMap<DeviceId, Arc<dyn WorkerHandle>>>,
}

impl<S: SqlStore> WorkerFactory<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        devices: Arc<Repository<Device, S>>,
        data_points: Arc<Repository<DataPoint, S>>,
        current_values: Arc<Repository<CurrentValue, S>>,
        clock: Arc<dyn Clock>,
        pipeline: Arc<dyn PipelineSink>,
        status_publisher: Option<Arc<dyn StatusPublisher>>,
        default_policy: ReconnectionPolicy,
    ) -> Self {
        let registry = [
            ProtocolTag::ModbusTcp,
            ProtocolTag::ModbusRtu,
            ProtocolTag::Mqtt,
            ProtocolTag::Bacnet,
            ProtocolTag::UdpCustom,
        ]
        .into_iter()
        .map(|tag| (tag, ()))
        .collect();
        let factory_start_time_ms = clock.epoch_ms();
        Self {
            devices,
            data_points,
            current_values,
            clock,
            pipeline,
            status_publisher,
            default_policy,
            registry,
            workers_created: AtomicU64::new(0),
            creation_failures: AtomicU64::new(0),
            factory_start_time_ms,
            workers: Mutex::new(HashMap::new()),
        }
    }

    pub fn registered_protocols(&self) -> Vec<ProtocolTag> {
        self.registry.keys().copied().collect()
    }

    pub fn factory_start_time_ms(&self) -> u64 {
        self.factory_start_time_ms
    }

    pub fn stats(&self) -> FactoryStats {
        FactoryStats {
            workers_created: self.workers_created.load(Ordering::SeqCst),
            creation_failures: self.creation_failures.load(Ordering::SeqCst),
        }
    }

    pub fn worker(&self, device_id: &DeviceId) -> Option<Arc<dyn WorkerHandle>> {
        self.workers.lock().get(device_id).cloned()
    }

    pub fn all_workers(&self) -> Vec<Arc<dyn WorkerHandle>> {
        self.workers.lock().values().cloned().collect()
    }

    /// Builds the `(DataPoint, PointRuntime)` pairs a `WorkerCore`
    /// expects. A data point with no matching `CurrentValue` row starts
    /// at [`PointRuntime::not_connected`] — this join, not the
    /// repository layer, resolves the data-point/current-value cycle
    /// (§9 design note).
    fn load_points(&self, device_id: &DeviceId) -> Vec<(DataPoint, PointRuntime)> {
        let conds = vec![pulseone_storage::QueryCondition::eq("device_id", device_id.as_str())];
        self.data_points
            .find_by_conditions(&conds, None, None)
            .into_iter()
            .filter(|p| p.enabled)
            .map(|point| {
                let runtime = self
                    .current_values
                    .find_by_id(&point.id)
                    .map(CurrentValue::into_runtime)
                    .unwrap_or_else(PointRuntime::not_connected);
                (point, runtime)
            })
            .collect()
    }

    fn build_transport(&self, device: &Device) -> Result<Arc<dyn Transport>, ConfigurationError> {
        let to_config_err = |e: pulseone_transport::TransportError| ConfigurationError::OutOfRange {
            field: "endpoint",
            reason: e.to_string(),
        };
        match device.protocol_tag {
            ProtocolTag::ModbusTcp | ProtocolTag::Mqtt | ProtocolTag::Bacnet => {
                let transport = TcpTransport::new(&device.endpoint, device.timing.timeout_ms).map_err(to_config_err)?;
                Ok(Arc::new(transport))
            }
            ProtocolTag::ModbusRtu => {
                let transport = SerialTransport::new(&device.endpoint).map_err(to_config_err)?;
                Ok(Arc::new(transport))
            }
            ProtocolTag::UdpCustom => {
                let local = SocketAddr::from(([0, 0, 0, 0], 0));
                let transport = UdpTransport::new(&device.endpoint, local).map_err(to_config_err)?;
                Ok(Arc::new(transport))
            }
        }
    }

    /// Applies the protocol-specific defaults from §4.5: Modbus TCP
    /// `slave_id` defaults to 1, MQTT `qos` defaults to 1, BACnet has a
    /// 5s polling floor regardless of configured `poll_interval_ms`.
    fn effective_poll_interval_ms(&self, device: &Device) -> u64 {
        match device.protocol_tag {
            ProtocolTag::Bacnet => device.timing.poll_interval_ms.max(BACNET_MIN_POLL_INTERVAL_MS),
            _ => device.timing.poll_interval_ms,
        }
    }

    fn build_handle(
        &self,
        device: &Device,
        points: Vec<(DataPoint, PointRuntime)>,
    ) -> Result<Arc<dyn WorkerHandle>, ConfigurationError> {
        self.default_policy.validate()?;
        let transport = self.build_transport(device)?;
        let worker_id = WorkerId::new(format!("{}-worker", device.id));
        let codec = Arc::new(TextCodec);
        let timeout_ms = device.timing.timeout_ms;

        let handle: Arc<dyn WorkerHandle> = match device.protocol_tag {
            ProtocolTag::ModbusTcp | ProtocolTag::ModbusRtu => {
                let _slave_id = device.property_u32("slave_id").unwrap_or(1);
                let driver = Arc::new(ModbusDriver::new(transport, codec, timeout_ms));
                Arc::new(WorkerCore::new(
                    worker_id,
                    device.clone(),
                    points,
                    driver,
                    Arc::clone(&self.clock),
                    self.default_policy,
                    Arc::clone(&self.pipeline),
                    self.status_publisher.clone(),
                ))
            }
            ProtocolTag::Mqtt => {
                let _qos = device.property_u32("qos").unwrap_or(1);
                let driver = Arc::new(MqttDriver::new(transport, codec, timeout_ms));
                Arc::new(WorkerCore::new(
                    worker_id,
                    device.clone(),
                    points,
                    driver,
                    Arc::clone(&self.clock),
                    self.default_policy,
                    Arc::clone(&self.pipeline),
                    self.status_publisher.clone(),
                ))
            }
            ProtocolTag::Bacnet => {
                let driver = Arc::new(BacnetDriver::new(transport, codec, timeout_ms));
                Arc::new(WorkerCore::new(
                    worker_id,
                    device.clone(),
                    points,
                    driver,
                    Arc::clone(&self.clock),
                    self.default_policy,
                    Arc::clone(&self.pipeline),
                    self.status_publisher.clone(),
                ))
            }
            ProtocolTag::UdpCustom => {
                let driver = Arc::new(UdpCustomDriver::new(transport, codec, timeout_ms));
                Arc::new(WorkerCore::new(
                    worker_id,
                    device.clone(),
                    points,
                    driver,
                    Arc::clone(&self.clock),
                    self.default_policy,
                    Arc::clone(&self.pipeline),
                    self.status_publisher.clone(),
                ))
            }
        };
        Ok(handle)
    }

    /// Fetches the device (refusing if missing or disabled), its
    /// enabled points, constructs the matching driver, and registers
    /// and starts the worker.
    pub fn create_by_device_id(&self, device_id: &DeviceId) -> Result<Arc<dyn WorkerHandle>, ConfigurationError> {
        let device = self
            .devices
            .find_by_id(device_id)
            .filter(|d| d.enabled)
            .ok_or_else(|| ConfigurationError::DeviceUnavailable(device_id.to_string()))?;

        let points = self.load_points(device_id);
        let poll_interval_ms = self.effective_poll_interval_ms(&device);

        match self.build_handle(&device, points) {
            Ok(handle) => {
                Arc::clone(&handle).start(poll_interval_ms);
                self.workers.lock().insert(device.id.clone(), Arc::clone(&handle));
                self.workers_created.fetch_add(1, Ordering::SeqCst);
                Ok(handle)
            }
            Err(e) => {
                self.creation_failures.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(device_id = %device_id, error = %e, "worker creation failed");
                Err(e)
            }
        }
    }

    pub fn create_all_active_workers(&self, limit: usize) -> Vec<Arc<dyn WorkerHandle>> {
        let conds = vec![pulseone_storage::QueryCondition::eq("enabled", "true")];
        self.devices
            .find_by_conditions(&conds, None, None)
            .into_iter()
            .take(limit)
            .filter_map(|d| self.create_by_device_id(&d.id).ok())
            .collect()
    }

    pub fn create_workers_by_protocol(&self, tag: ProtocolTag, limit: usize) -> Vec<Arc<dyn WorkerHandle>> {
        let conds = vec![
            pulseone_storage::QueryCondition::eq("enabled", "true"),
            pulseone_storage::QueryCondition::eq("protocol_tag", &tag.to_string()),
        ];
        self.devices
            .find_by_conditions(&conds, None, None)
            .into_iter()
            .take(limit)
            .filter_map(|d| self.create_by_device_id(&d.id).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseone_core::{AccessMode, DataPointId, DataType, FakeClock};
    use pulseone_storage::FakeSqlStore;
    use pulseone_wire::fake::FakePipelineSink;

    fn factory() -> WorkerFactory<FakeSqlStore> {
        factory_with_policy(ReconnectionPolicy::default())
    }

    fn factory_with_policy(policy: ReconnectionPolicy) -> WorkerFactory<FakeSqlStore> {
        let store = Arc::new(FakeSqlStore::new());
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new());
        let devices = Arc::new(Repository::new(store.clone(), Arc::clone(&clock)));
        let data_points = Arc::new(Repository::new(store.clone(), Arc::clone(&clock)));
        let current_values = Arc::new(Repository::new(store, Arc::clone(&clock)));
        WorkerFactory::new(
            devices,
            data_points,
            current_values,
            clock,
            Arc::new(FakePipelineSink::new(100)),
            None,
            policy,
        )
    }

    #[test]
    fn create_by_device_id_rejects_unknown_device() {
        let f = factory();
        let err = f.create_by_device_id(&DeviceId::new("missing")).unwrap_err();
        assert!(matches!(err, ConfigurationError::DeviceUnavailable(_)));
    }

    #[test]
    fn create_by_device_id_rejects_disabled_device() {
        let f = factory();
        let device = Device::builder().id(DeviceId::new("d-1")).enabled(false).build();
        f.devices.save(&device);
        let err = f.create_by_device_id(&device.id).unwrap_err();
        assert!(matches!(err, ConfigurationError::DeviceUnavailable(_)));
    }

    #[test]
    fn create_by_device_id_rejects_an_out_of_range_reconnection_policy() {
        let f = factory_with_policy(ReconnectionPolicy { retry_interval_ms: 1, ..Default::default() });
        let device = Device::builder()
            .id(DeviceId::new("d-bad-policy"))
            .protocol_tag(ProtocolTag::ModbusTcp)
            .endpoint("127.0.0.1:502")
            .build();
        f.devices.save(&device);
        let err = f.create_by_device_id(&device.id).unwrap_err();
        assert!(matches!(err, ConfigurationError::OutOfRange { field: "retry_interval_ms", .. }));
        assert_eq!(f.stats().creation_failures, 1);
    }

    #[test]
    fn bacnet_poll_interval_is_floored_at_five_seconds() {
        let f = factory();
        let mut device = Device::builder()
            .id(DeviceId::new("d-bac"))
            .protocol_tag(ProtocolTag::Bacnet)
            .endpoint("127.0.0.1:47808")
            .build();
        device.timing.poll_interval_ms = 500;
        assert_eq!(f.effective_poll_interval_ms(&device), BACNET_MIN_POLL_INTERVAL_MS);
    }

    #[tokio::test]
    async fn successfully_creates_and_registers_a_modbus_worker() {
        let f = factory();
        let device = Device::builder()
            .id(DeviceId::new("d-modbus"))
            .protocol_tag(ProtocolTag::ModbusTcp)
            .endpoint("127.0.0.1:502")
            .build();
        f.devices.save(&device);
        let point = DataPoint::builder()
            .id(DataPointId::new("pt-1"))
            .device_id(device.id.clone())
            .data_type(DataType::Float64)
            .access_mode(AccessMode::Read)
            .build();
        f.data_points.save(&point);

        let handle = f.create_by_device_id(&device.id).unwrap();
        assert_eq!(handle.device_id(), &device.id);
        assert_eq!(f.stats().workers_created, 1);
        assert!(f.worker(&device.id).is_some());
    }

    #[test]
    fn registered_protocols_lists_all_five_tags() {
        let f = factory();
        assert_eq!(f.registered_protocols().len(), 5);
    }
}
