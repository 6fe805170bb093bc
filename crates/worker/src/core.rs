// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The device worker state machine (§4.3): a polling loop, a sibling
//! reconnection loop, and `force_reconnect`, driving any `ProtocolDriver`.

use crate::driver::ProtocolDriver;
use crate::error::NotWritableError;
use crate::policy::ReconnectionPolicy;
use crate::status_thresholds::{derive_status, StatusThresholds};
use parking_lot::Mutex as SyncMutex;
use pulseone_core::{
    Clock, DataPoint, DataPointId, Device, DeviceId, DeviceStatus, PointRuntime, Value, WorkerId,
    WorkerState,
};
use pulseone_wire::{
    ConnectionStats, DeviceDataMessage, PipelineSink, PointCounts, ProcessingFlags,
    ReconnectionEventJson, ReconnectionEventKind, StatusPublisher, TimestampedValue,
    WorkerStatusJson,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

const STOP_GRACE_MS: u64 = 5_000;

struct PointSlot {
    point: DataPoint,
    runtime: SyncMutex<PointRuntime>,
}

/// Everything the reconnection loop and `force_reconnect` arbitrate
/// over, guarded by one lock so the two paths never race each other
/// (§4.3, §8 force-reconnect idempotence property).
struct ReconnectState {
    retry_count: u32,
    wait_cycles: u64,
    in_wait_cycle: bool,
    wait_started_ms: u64,
}

/// Drives one device end to end: connect, poll, decode, emit, reconnect.
/// Generic over the protocol driver so the same state machine backs
/// every `ProtocolTag` (§9 composition-over-inheritance design note).
pub struct WorkerCore<D: ProtocolDriver> {
    worker_id: WorkerId,
    device: Device,
    points: Vec<Arc<PointSlot>>,
    driver: Arc<D>,
    clock: Arc<dyn Clock>,
    policy: ReconnectionPolicy,
    thresholds: StatusThresholds,
    pipeline: Arc<dyn PipelineSink>,
    status_publisher: Option<Arc<dyn StatusPublisher>>,

    state: SyncMutex<WorkerState>,
    connected: AtomicBool,
    running: Arc<AtomicBool>,
    batch_sequence: AtomicU64,
    device_status: SyncMutex<DeviceStatus>,
    connection_stats: SyncMutex<ConnectionStats>,
    last_success_epoch_ms: AtomicU64,
    last_keep_alive_ms: AtomicU64,
    reconnect: AsyncMutex<ReconnectState>,

    poll_task: SyncMutex<Option<JoinHandle<()>>>,
    reconnect_task: SyncMutex<Option<JoinHandle<()>>>,
}

impl<D: ProtocolDriver + 'static> WorkerCore<D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_id: WorkerId,
        device: Device,
        points: Vec<(DataPoint, PointRuntime)>,
        driver: Arc<D>,
        clock: Arc<dyn Clock>,
        policy: ReconnectionPolicy,
        pipeline: Arc<dyn PipelineSink>,
        status_publisher: Option<Arc<dyn StatusPublisher>>,
    ) -> Self {
        let thresholds = StatusThresholds::for_protocol(device.protocol_tag);
        let points = points
            .into_iter()
            .map(|(point, runtime)| Arc::new(PointSlot { point, runtime: SyncMutex::new(runtime) }))
            .collect();
        Self {
            worker_id,
            device,
            points,
            driver,
            clock,
            policy,
            thresholds,
            pipeline,
            status_publisher,
            state: SyncMutex::new(WorkerState::Stopped),
            connected: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(false)),
            batch_sequence: AtomicU64::new(0),
            device_status: SyncMutex::new(DeviceStatus::Offline),
            connection_stats: SyncMutex::new(ConnectionStats::default()),
            last_success_epoch_ms: AtomicU64::new(0),
            last_keep_alive_ms: AtomicU64::new(0),
            reconnect: AsyncMutex::new(ReconnectState {
                retry_count: 0,
                wait_cycles: 0,
                in_wait_cycle: false,
                wait_started_ms: 0,
            }),
            poll_task: SyncMutex::new(None),
            reconnect_task: SyncMutex::new(None),
        }
    }

    pub fn worker_id(&self) -> &WorkerId {
        &self.worker_id
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device.id
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn device_status(&self) -> DeviceStatus {
        *self.device_status.lock()
    }

    fn set_state(&self, next: WorkerState) {
        *self.state.lock() = next;
    }

    fn point_by_id(&self, id: &DataPointId) -> Option<&Arc<PointSlot>> {
        self.points.iter().find(|slot| &slot.point.id == id)
    }

    /// Attempts to connect once. Updates connection stats and worker
    /// state; does not touch the reconnection counters (callers in the
    /// reconnection loop own that bookkeeping).
    pub async fn try_connect(&self) -> bool {
        match self.driver.establish_protocol_connection().await {
            Ok(()) => {
                self.connected.store(true, Ordering::SeqCst);
                self.last_success_epoch_ms.store(self.clock.epoch_ms(), Ordering::SeqCst);
                let mut stats = self.connection_stats.lock();
                stats.consecutive_failures = 0;
                stats.total_attempts += 1;
                true
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                let mut stats = self.connection_stats.lock();
                stats.consecutive_failures += 1;
                stats.total_failures += 1;
                stats.total_attempts += 1;
                stats.last_error_text = Some(e.to_string());
                stats.last_error_code = Some(e.code());
                false
            }
        }
    }

    /// One poll cycle: read every enabled point, fold into a batch, emit
    /// to the pipeline. Transport-level failure aborts the cycle without
    /// touching any point's runtime overlay (§9 resolution: never update
    /// on transport failure, mark BAD on decode failure, update on
    /// successful decode regardless of deadband).
    pub async fn poll_once(&self) -> bool {
        let enabled: Vec<DataPoint> = self.points.iter().map(|s| s.point.clone()).filter(|p| p.enabled).collect();
        let epoch_ms = self.clock.epoch_ms();

        let samples = match self.driver.poll(&enabled, epoch_ms).await {
            Ok(samples) => samples,
            Err(e) => {
                tracing::warn!(device_id = %self.device.id, error = %e, "poll cycle failed");
                let mut stats = self.connection_stats.lock();
                stats.consecutive_failures += 1;
                stats.total_failures += 1;
                stats.total_attempts += 1;
                stats.last_error_text = Some(e.to_string());
                stats.last_error_code = Some(e.code());
                return false;
            }
        };

        self.last_success_epoch_ms.store(epoch_ms, Ordering::SeqCst);
        {
            let mut stats = self.connection_stats.lock();
            stats.consecutive_failures = 0;
            stats.total_attempts += 1;
            stats.last_response_time_ms = self.clock.epoch_ms().saturating_sub(epoch_ms);
        }

        let mut successful = 0u32;
        let mut failed = 0u32;
        let mut logged = Vec::with_capacity(samples.len());

        for sample in samples {
            let Some(slot) = self.point_by_id(&sample.point_id) else { continue };
            if sample.quality.is_good() {
                successful += 1;
            } else {
                failed += 1;
            }

            let should_log = {
                let mut runtime = slot.runtime.lock();
                let passes = slot.point.passes_deadband(&runtime.current_value, &sample.value);
                let interval_elapsed = epoch_ms.saturating_sub(runtime.last_log_time_ms) >= slot.point.log_interval_ms;
                let worth_logging = slot.point.log_enabled && interval_elapsed && passes;

                runtime.current_value = sample.value.clone();
                runtime.raw_value = sample.raw_value.clone();
                runtime.quality = sample.quality;
                runtime.value_timestamp_ms = sample.timestamp_ms;
                runtime.quality_timestamp_ms = sample.timestamp_ms;
                runtime.last_read_time_ms = epoch_ms;
                if worth_logging {
                    runtime.last_log_time_ms = epoch_ms;
                }
                worth_logging
            };

            if should_log {
                logged.push(sample);
            }
        }

        self.emit_batch(epoch_ms, PointCounts { total_configured: enabled.len() as u32, successful, failed }, logged)
            .await;
        true
    }

    async fn emit_batch(&self, epoch_ms: u64, point_counts: PointCounts, values: Vec<TimestampedValue>) {
        let previous_status = *self.device_status.lock();
        let elapsed = epoch_ms.saturating_sub(self.last_success_epoch_ms.load(Ordering::SeqCst));
        let connection_stats = *self.connection_stats.lock();

        let current_state = self.state();
        let next_status = if current_state.is_manual_override() {
            previous_status
        } else {
            derive_status(&self.thresholds, &connection_stats, elapsed)
        };
        *self.device_status.lock() = next_status;

        let sequence = self.batch_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let message = DeviceDataMessage {
            device_id: self.device.id.clone(),
            protocol_tag: self.device.protocol_tag.to_string(),
            batch_timestamp_ms: epoch_ms,
            priority: 0,
            tenant_id: self.device.tenant_id.clone(),
            site_id: self.device.site_id.clone(),
            processing: ProcessingFlags::default(),
            correlation_id: DeviceDataMessage::correlation_id(&self.device.id, self.worker_id.as_str(), epoch_ms),
            batch_sequence: sequence,
            device_status: next_status,
            previous_status,
            status_changed: next_status != previous_status,
            connection_stats,
            point_counts,
            values,
        };

        if !self.pipeline.accept(message).await {
            tracing::warn!(device_id = %self.device.id, "pipeline queue full, batch dropped");
        }

        if let Some(publisher) = &self.status_publisher {
            publisher.publish_status(&self.status_json()).await;
        }
    }

    pub fn status_json(&self) -> WorkerStatusJson {
        WorkerStatusJson {
            device_id: self.device.id.clone(),
            device_name: self.device.name.clone(),
            worker_id: self.worker_id.clone(),
            protocol_type: self.device.protocol_tag.to_string(),
            endpoint: self.device.endpoint.clone(),
            state: self.state(),
            connected: self.is_connected(),
            data_points_count: self.points.len(),
            write_supported: self.points.iter().any(|s| s.point.access_mode.accepts_writes()),
        }
    }

    /// One reconnection-loop tick (§4.3 steps 1-3): if connected, runs the
    /// keep-alive cadence. If disconnected and not already waiting out a
    /// cycle, attempts a connect; on repeated failure up to
    /// `max_retries_per_cycle`, enters a wait cycle of
    /// `wait_time_after_max_retries_ms` before resuming attempts. A
    /// `max_retries_per_cycle` of 0 means unlimited attempts, no wait
    /// cycle is ever entered.
    pub async fn reconnection_tick(&self) {
        if self.is_connected() {
            self.keep_alive_tick().await;
            return;
        }
        if !self.policy.auto_reconnect_enabled {
            return;
        }
        let mut guard = self.reconnect.lock().await;
        if guard.in_wait_cycle {
            let elapsed = self.clock.epoch_ms().saturating_sub(guard.wait_started_ms);
            if elapsed < self.policy.wait_time_after_max_retries_ms {
                return;
            }
            guard.retry_count = 0;
            guard.wait_cycles += 1;
            guard.in_wait_cycle = false;
            self.publish_reconnection_event(ReconnectionEventKind::WaitCycleCompleted, &guard).await;
            return;
        }

        self.set_state(WorkerState::Reconnecting);
        self.publish_reconnection_event(ReconnectionEventKind::AttemptStarted, &guard).await;
        let ok = self.try_connect().await;
        if ok {
            guard.retry_count = 0;
            self.set_state(WorkerState::Running);
            self.publish_reconnection_event(ReconnectionEventKind::AttemptSucceeded, &guard).await;
            return;
        }

        guard.retry_count += 1;
        self.publish_reconnection_event(ReconnectionEventKind::AttemptFailed, &guard).await;

        if self.policy.max_retries_per_cycle > 0 && guard.retry_count >= self.policy.max_retries_per_cycle {
            self.set_state(WorkerState::WaitingRetry);
            guard.in_wait_cycle = true;
            guard.wait_started_ms = self.clock.epoch_ms();
            self.publish_reconnection_event(ReconnectionEventKind::MaxRetriesExceeded, &guard).await;
        } else {
            self.set_state(WorkerState::MaxRetriesExceeded);
        }
    }

    /// §4.3 step 2: while connected, probe the link every
    /// `keep_alive_interval_seconds` via `send_protocol_keep_alive` then
    /// `check_protocol_connection`. A failure of either is a connection
    /// error — the reconnection loop's next tick picks up the retry.
    async fn keep_alive_tick(&self) {
        if !self.policy.keep_alive_enabled {
            return;
        }
        let now = self.clock.epoch_ms();
        let last = self.last_keep_alive_ms.load(Ordering::SeqCst);
        let interval_ms = self.policy.keep_alive_interval_seconds.saturating_mul(1000);
        if now.saturating_sub(last) < interval_ms {
            return;
        }
        self.last_keep_alive_ms.store(now, Ordering::SeqCst);

        let failure = match self.driver.send_protocol_keep_alive().await {
            Ok(()) if self.driver.check_protocol_connection() => None,
            Ok(()) => Some(("keep-alive probe reported the connection down".to_string(), None)),
            Err(e) => Some((e.to_string(), Some(e.code()))),
        };
        let Some((reason, code)) = failure else { return };

        tracing::warn!(device_id = %self.device.id, error = %reason, "keep-alive failed");
        self.connected.store(false, Ordering::SeqCst);
        self.set_state(WorkerState::CommunicationError);
        let mut stats = self.connection_stats.lock();
        stats.consecutive_failures += 1;
        stats.total_failures += 1;
        stats.total_attempts += 1;
        stats.last_error_text = Some(reason);
        stats.last_error_code = code;
    }

    async fn publish_reconnection_event(&self, kind: ReconnectionEventKind, guard: &ReconnectState) {
        let Some(publisher) = &self.status_publisher else { return };
        publisher
            .publish_reconnection_event(&ReconnectionEventJson {
                device_id: self.device.id.clone(),
                worker_id: self.worker_id.clone(),
                event: kind,
                retry_count: guard.retry_count,
                wait_cycles: guard.wait_cycles,
                timestamp_ms: self.clock.epoch_ms(),
            })
            .await;
    }

    /// Operator-triggered reconnect: closes and reestablishes the
    /// connection regardless of reconnection-loop phase. Idempotent
    /// under concurrent calls and concurrent reconnection-loop ticks —
    /// both paths serialize on the same lock (§8 force-reconnect
    /// idempotence property).
    pub async fn force_reconnect(&self) -> bool {
        let mut guard = self.reconnect.lock().await;
        self.publish_reconnection_event(ReconnectionEventKind::ForceReconnectRequested, &guard).await;
        self.driver.close_protocol_connection().await;
        self.connected.store(false, Ordering::SeqCst);
        guard.in_wait_cycle = false;
        guard.retry_count = 0;
        drop(guard);
        self.try_connect().await
    }

    /// Synchronous write-path check: read-only point, unknown point, or
    /// an inactive worker all reject without ever reaching the driver or
    /// changing worker state (§4.4, §8 scenario 5).
    pub async fn write_command(&self, point_id: &DataPointId, value: Value) -> Result<(), NotWritableError> {
        if !self.state().is_active() {
            return Err(NotWritableError::WorkerNotActive);
        }
        let slot = self.point_by_id(point_id).ok_or_else(|| NotWritableError::UnknownPoint(point_id.to_string()))?;
        if !slot.point.access_mode.accepts_writes() {
            return Err(NotWritableError::ReadOnlyPoint(point_id.to_string()));
        }

        let epoch_ms = self.clock.epoch_ms();
        self.driver
            .write(&slot.point, &value)
            .await
            .map_err(|e| NotWritableError::DriverRejected(e.to_string()))?;
        slot.runtime.lock().last_write_time_ms = epoch_ms;
        Ok(())
    }

    /// Spawns the polling and reconnection loops. Returns immediately;
    /// loops run until [`Self::stop`] is called.
    pub fn start(self: &Arc<Self>, poll_interval_ms: u64) {
        self.running.store(true, Ordering::SeqCst);
        self.set_state(WorkerState::Starting);

        let poll_self = Arc::clone(self);
        let poll_running = Arc::clone(&self.running);
        *self.poll_task.lock() = Some(tokio::spawn(async move {
            poll_self.set_state(WorkerState::Running);
            while poll_running.load(Ordering::SeqCst) {
                if poll_self.is_connected() {
                    poll_self.poll_once().await;
                }
                tokio::time::sleep(std::time::Duration::from_millis(poll_interval_ms)).await;
            }
        }));

        let reconnect_self = Arc::clone(self);
        let reconnect_running = Arc::clone(&self.running);
        let tick_ms = self.policy.retry_interval_ms;
        *self.reconnect_task.lock() = Some(tokio::spawn(async move {
            while reconnect_running.load(Ordering::SeqCst) {
                reconnect_self.reconnection_tick().await;
                tokio::time::sleep(std::time::Duration::from_millis(tick_ms)).await;
            }
        }));
    }

    /// Signals both loops to exit and closes the transport. If the
    /// polling task hasn't observed the stop flag within
    /// `STOP_GRACE_MS`, the transport is force-closed from here so a
    /// wedged `recv` can't keep the worker alive indefinitely (§6).
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.set_state(WorkerState::Stopped);

        let poll_task = self.poll_task.lock().take();
        if let Some(task) = poll_task {
            if tokio::time::timeout(std::time::Duration::from_millis(STOP_GRACE_MS), task).await.is_err() {
                tracing::warn!(device_id = %self.device.id, "poll task did not stop in time, forcing transport close");
            }
        }
        let reconnect_task = self.reconnect_task.lock().take();
        if let Some(task) = reconnect_task {
            let _ = tokio::time::timeout(std::time::Duration::from_millis(STOP_GRACE_MS), task).await;
        }
        self.driver.close_protocol_connection().await;
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn point_runtimes(&self) -> HashMap<DataPointId, PointRuntime> {
        self.points.iter().map(|s| (s.point.id.clone(), s.runtime.lock().clone())).collect()
    }
}

/// Object-safe facade over `WorkerCore<D>` so the factory can hold every
/// protocol's workers in one registry without naming `D` (§4.5).
#[async_trait::async_trait]
pub trait WorkerHandle: Send + Sync {
    fn worker_id(&self) -> &WorkerId;
    fn device_id(&self) -> &DeviceId;
    fn state(&self) -> WorkerState;
    fn device_status(&self) -> DeviceStatus;
    fn status_json(&self) -> WorkerStatusJson;
    fn start(self: Arc<Self>, poll_interval_ms: u64);
    async fn stop(&self);
    async fn force_reconnect(&self) -> bool;
    async fn write_command(&self, point_id: &DataPointId, value: Value) -> Result<(), NotWritableError>;
}

#[async_trait::async_trait]
impl<D: ProtocolDriver + 'static> WorkerHandle for WorkerCore<D> {
    fn worker_id(&self) -> &WorkerId {
        WorkerCore::worker_id(self)
    }

    fn device_id(&self) -> &DeviceId {
        WorkerCore::device_id(self)
    }

    fn state(&self) -> WorkerState {
        WorkerCore::state(self)
    }

    fn device_status(&self) -> DeviceStatus {
        WorkerCore::device_status(self)
    }

    fn status_json(&self) -> WorkerStatusJson {
        WorkerCore::status_json(self)
    }

    fn start(self: Arc<Self>, poll_interval_ms: u64) {
        WorkerCore::start(&self, poll_interval_ms)
    }

    async fn stop(&self) {
        WorkerCore::stop(self).await
    }

    async fn force_reconnect(&self) -> bool {
        WorkerCore::force_reconnect(self).await
    }

    async fn write_command(&self, point_id: &DataPointId, value: Value) -> Result<(), NotWritableError> {
        WorkerCore::write_command(self, point_id, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ModbusDriver, TextCodec};
    use pulseone_core::{AccessMode, DataType, FakeClock};
    use pulseone_transport::{FakeTransport, ScriptedOutcome};
    use pulseone_wire::fake::{FakePipelineSink, FakeStatusPublisher};

    fn test_point(id: &str, access_mode: AccessMode) -> (DataPoint, PointRuntime) {
        let point = DataPoint::builder()
            .id(DataPointId::new(id))
            .device_id(DeviceId::new("dev-1"))
            .address(0)
            .data_type(DataType::Float64)
            .access_mode(access_mode)
            .log_deadband(0.0)
            .build();
        (point, PointRuntime::not_connected())
    }

    fn worker(
        points: Vec<(DataPoint, PointRuntime)>,
        transport: Arc<FakeTransport>,
        pipeline: Arc<FakePipelineSink>,
        publisher: Option<Arc<FakeStatusPublisher>>,
    ) -> Arc<WorkerCore<ModbusDriver>> {
        worker_with_policy(points, transport, pipeline, publisher, ReconnectionPolicy::default())
    }

    fn worker_with_policy(
        points: Vec<(DataPoint, PointRuntime)>,
        transport: Arc<FakeTransport>,
        pipeline: Arc<FakePipelineSink>,
        publisher: Option<Arc<FakeStatusPublisher>>,
        policy: ReconnectionPolicy,
    ) -> Arc<WorkerCore<ModbusDriver>> {
        worker_with_policy_and_clock(points, transport, pipeline, publisher, policy, Arc::new(FakeClock::new()))
    }

    fn worker_with_policy_and_clock(
        points: Vec<(DataPoint, PointRuntime)>,
        transport: Arc<FakeTransport>,
        pipeline: Arc<FakePipelineSink>,
        publisher: Option<Arc<FakeStatusPublisher>>,
        policy: ReconnectionPolicy,
        clock: Arc<FakeClock>,
    ) -> Arc<WorkerCore<ModbusDriver>> {
        let driver = Arc::new(ModbusDriver::new(transport, Arc::new(TextCodec), 1000));
        let device = Device::builder().id(DeviceId::new("dev-1")).build();
        Arc::new(WorkerCore::new(
            WorkerId::new("w-1"),
            device,
            points,
            driver,
            clock,
            policy,
            pipeline,
            publisher.map(|p| p as Arc<dyn StatusPublisher>),
        ))
    }

    #[tokio::test]
    async fn happy_path_poll_emits_a_batch_with_good_quality() {
        let transport = Arc::new(FakeTransport::new());
        transport.script_recv(ScriptedOutcome::Recv(b"42".to_vec()));
        let pipeline = Arc::new(FakePipelineSink::new(10));
        let w = worker(vec![test_point("pt-1", AccessMode::Read)], transport.clone(), pipeline.clone(), None);

        assert!(w.try_connect().await);
        assert!(w.poll_once().await);

        let batch = pipeline.accepted();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].point_counts.successful, 1);
        assert_eq!(batch[0].values[0].value, Value::Numeric(42.0));
    }

    #[tokio::test]
    async fn reconnect_after_drop_restores_connection() {
        let transport = Arc::new(FakeTransport::new());
        let pipeline = Arc::new(FakePipelineSink::new(10));
        let w = worker(vec![], transport.clone(), pipeline, None);

        assert!(w.try_connect().await);
        transport.simulate_drop();
        assert!(!w.is_connected());

        w.reconnection_tick().await;
        assert!(w.is_connected());
        assert_eq!(w.state(), WorkerState::Running);
    }

    #[tokio::test]
    async fn max_retries_exceeded_enters_wait_cycle_then_resumes() {
        let transport = Arc::new(FakeTransport::new());
        transport.script_connect(Err("refused".into()));
        transport.script_connect(Err("refused".into()));
        let pipeline = Arc::new(FakePipelineSink::new(10));
        let policy = ReconnectionPolicy {
            max_retries_per_cycle: 2,
            wait_time_after_max_retries_ms: 10_000,
            ..Default::default()
        };
        let clock = Arc::new(FakeClock::new());
        let w = worker_with_policy_and_clock(vec![], transport.clone(), pipeline, None, policy, clock.clone());

        w.reconnection_tick().await;
        w.reconnection_tick().await;
        assert_eq!(w.state(), WorkerState::WaitingRetry);
        assert!(w.reconnect.lock().await.in_wait_cycle);

        // still within the wait window: stays in the wait cycle
        clock.advance(std::time::Duration::from_millis(5_000));
        w.reconnection_tick().await;
        assert!(w.reconnect.lock().await.in_wait_cycle);

        // wait window elapsed: wait cycle completes, retry count resets
        clock.advance(std::time::Duration::from_millis(5_000));
        w.reconnection_tick().await;
        assert!(!w.reconnect.lock().await.in_wait_cycle);
        assert_eq!(w.reconnect.lock().await.retry_count, 0);
        assert_eq!(w.reconnect.lock().await.wait_cycles, 1);
    }

    #[tokio::test]
    async fn deadband_suppresses_logging_but_still_updates_runtime() {
        let transport = Arc::new(FakeTransport::new());
        transport.script_recv(ScriptedOutcome::Recv(b"10".to_vec()));
        transport.script_recv(ScriptedOutcome::Recv(b"10.01".to_vec()));
        let pipeline = Arc::new(FakePipelineSink::new(10));
        let mut point = test_point("pt-1", AccessMode::Read);
        point.0.log_deadband = 1.0;
        let w = worker(vec![point], transport.clone(), pipeline.clone(), None);

        w.try_connect().await;
        w.poll_once().await;
        w.poll_once().await;

        let batches = pipeline.accepted();
        assert_eq!(batches[0].values.len(), 1);
        assert!(batches[1].values.is_empty(), "second sample within deadband should not be logged");
        let runtime = w.point_runtimes().remove(&DataPointId::new("pt-1")).unwrap();
        assert_eq!(runtime.current_value, Value::Numeric(10.01));
    }

    #[tokio::test]
    async fn write_to_read_only_point_is_rejected_without_state_change() {
        let transport = Arc::new(FakeTransport::new());
        let pipeline = Arc::new(FakePipelineSink::new(10));
        let w = worker(vec![test_point("pt-1", AccessMode::Read)], transport, pipeline, None);
        *w.state.lock() = WorkerState::Running;

        let result = w.write_command(&DataPointId::new("pt-1"), Value::Numeric(1.0)).await;
        assert_eq!(result, Err(NotWritableError::ReadOnlyPoint("pt-1".to_string())));
        assert_eq!(w.state(), WorkerState::Running);
    }

    #[tokio::test]
    async fn write_while_not_active_is_rejected() {
        let transport = Arc::new(FakeTransport::new());
        let pipeline = Arc::new(FakePipelineSink::new(10));
        let w = worker(vec![test_point("pt-1", AccessMode::ReadWrite)], transport, pipeline, None);

        let result = w.write_command(&DataPointId::new("pt-1"), Value::Numeric(1.0)).await;
        assert_eq!(result, Err(NotWritableError::WorkerNotActive));
    }
}
