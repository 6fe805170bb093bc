// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol worker specialization (§4.4). Each protocol supplies
//! connect/close/check/keep-alive plus a polling decode step; the
//! on-the-wire framing (Modbus PDU, MQTT CONNECT, BACnet APDU) is the
//! explicitly out-of-scope black box, modeled here as a
//! [`ProtocolCodec`] seam a concrete integration would implement.
//!
//! Per the design notes (§9), this favors composition over a deep
//! inheritance chain: one [`GenericPollingDriver`] implements the
//! connect/poll/decode mechanics once, and the four protocol-named
//! types (`ModbusDriver`, `MqttDriver`, `BacnetDriver`,
//! `UdpCustomDriver`) are thin wrappers carrying their own typed
//! properties and delegating to it.

use crate::error::DriverError;
use async_trait::async_trait;
use pulseone_core::{DataPoint, DataType, Value};
use pulseone_transport::Transport;
use pulseone_wire::TimestampedValue;
use std::sync::Arc;

/// The raw sample a codec decodes off the wire, before scaling.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSample {
    Numeric(f64),
    Text(String),
}

/// The out-of-scope wire codec seam: builds request frames and decodes
/// response frames for one protocol family. A real integration would
/// implement this against the actual Modbus/MQTT/BACnet framing; this
/// crate only depends on the trait.
pub trait ProtocolCodec: Send + Sync {
    fn encode_read_request(&self, address: i64, data_type: DataType) -> Vec<u8>;
    fn decode_response(&self, data_type: DataType, response: &[u8]) -> Result<RawSample, DriverError>;
    fn encode_write_request(&self, address: i64, data_type: DataType, value: &Value) -> Vec<u8>;
}

/// A minimal text-framed codec: `READ <address>\n` / `WRITE <address> <value>\n`
/// requests, UTF-8 responses. Stands in for a real protocol codec in
/// tests and in the absence of one being wired in — the framing itself
/// is not a spec concern (§1 non-goal: codecs are external).
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCodec;

impl ProtocolCodec for TextCodec {
    fn encode_read_request(&self, address: i64, _data_type: DataType) -> Vec<u8> {
        format!("READ {address}\n").into_bytes()
    }

    fn decode_response(&self, data_type: DataType, response: &[u8]) -> Result<RawSample, DriverError> {
        let text = std::str::from_utf8(response)
            .map_err(|e| DriverError::Protocol(format!("non-utf8 response: {e}")))?
            .trim();
        if data_type == DataType::String {
            return Ok(RawSample::Text(text.to_string()));
        }
        text.parse::<f64>()
            .map(RawSample::Numeric)
            .map_err(|e| DriverError::Protocol(format!("malformed numeric response {text:?}: {e}")))
    }

    fn encode_write_request(&self, address: i64, _data_type: DataType, value: &Value) -> Vec<u8> {
        let text = match value {
            Value::Numeric(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::String(s) => s.clone(),
        };
        format!("WRITE {address} {text}\n").into_bytes()
    }
}

fn raw_to_value(data_type: DataType, raw: &RawSample) -> (Value, f64) {
    match (data_type, raw) {
        (DataType::String, RawSample::Text(s)) => (Value::String(s.clone()), 0.0),
        (DataType::Bool, RawSample::Numeric(n)) => (Value::Bool(*n != 0.0), *n),
        (_, RawSample::Numeric(n)) => (Value::Numeric(*n), *n),
        (_, RawSample::Text(s)) => (Value::String(s.clone()), 0.0),
    }
}

/// The capability every concrete protocol worker implements: connect,
/// close, health-probe, keep-alive, poll, write — kept small and
/// composable rather than inherited (§9 design note).
#[async_trait]
pub trait ProtocolDriver: Send + Sync {
    async fn establish_protocol_connection(&self) -> Result<(), DriverError>;
    async fn close_protocol_connection(&self);
    fn check_protocol_connection(&self) -> bool;
    async fn send_protocol_keep_alive(&self) -> Result<(), DriverError>;

    /// Reads every enabled point in configuration order. One request
    /// outstanding at a time — points are polled sequentially, never
    /// concurrently, per device (§4.4).
    async fn poll(&self, points: &[DataPoint], epoch_ms: u64) -> Result<Vec<TimestampedValue>, DriverError>;

    async fn write(&self, point: &DataPoint, value: &Value) -> Result<(), DriverError>;
}

/// Shared connect/poll/decode mechanics for every protocol. Holds the
/// transport and codec as trait objects so the same implementation
/// backs TCP-, serial-, and UDP-based protocols alike.
pub struct GenericPollingDriver {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn ProtocolCodec>,
    timeout_ms: u64,
}

impl GenericPollingDriver {
    pub fn new(transport: Arc<dyn Transport>, codec: Arc<dyn ProtocolCodec>, timeout_ms: u64) -> Self {
        Self { transport, codec, timeout_ms }
    }
}

#[async_trait]
impl ProtocolDriver for GenericPollingDriver {
    async fn establish_protocol_connection(&self) -> Result<(), DriverError> {
        self.transport.establish_connection().await.map_err(DriverError::from)
    }

    async fn close_protocol_connection(&self) {
        self.transport.close_connection().await;
    }

    fn check_protocol_connection(&self) -> bool {
        self.transport.check_connection()
    }

    async fn send_protocol_keep_alive(&self) -> Result<(), DriverError> {
        self.transport.send_keep_alive().await.map_err(DriverError::from)
    }

    async fn poll(&self, points: &[DataPoint], epoch_ms: u64) -> Result<Vec<TimestampedValue>, DriverError> {
        use pulseone_core::QualityCode;

        let mut out = Vec::with_capacity(points.len());
        for point in points.iter().filter(|p| p.enabled) {
            let request = self.codec.encode_read_request(point.address, point.data_type);
            self.transport.send(&request).await?;

            let mut buffer = [0u8; 256];
            let n = self.transport.recv(&mut buffer, self.timeout_ms).await?;
            if n == 0 {
                return Err(DriverError::Timeout);
            }

            match self.codec.decode_response(point.data_type, &buffer[..n]) {
                Ok(raw) => {
                    let (raw_value, raw_f64) = raw_to_value(point.data_type, &raw);
                    let engineering = if raw_value.is_string() {
                        raw_value.clone()
                    } else {
                        Value::Numeric(point.scale(raw_f64))
                    };
                    out.push(TimestampedValue {
                        point_id: point.id.clone(),
                        value: engineering,
                        raw_value,
                        quality: QualityCode::Good,
                        timestamp_ms: epoch_ms,
                    });
                }
                Err(e) => {
                    tracing::debug!(point_id = %point.id, error = %e, "decode failure, marking BAD");
                    out.push(TimestampedValue {
                        point_id: point.id.clone(),
                        value: Value::Numeric(0.0),
                        raw_value: Value::Numeric(0.0),
                        quality: QualityCode::Bad,
                        timestamp_ms: epoch_ms,
                    });
                }
            }
        }
        Ok(out)
    }

    async fn write(&self, point: &DataPoint, value: &Value) -> Result<(), DriverError> {
        let request = self.codec.encode_write_request(point.address, point.data_type, value);
        self.transport.send(&request).await?;
        Ok(())
    }
}

macro_rules! delegating_driver {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        pub struct $name {
            inner: GenericPollingDriver,
        }

        impl $name {
            pub fn new(transport: Arc<dyn Transport>, codec: Arc<dyn ProtocolCodec>, timeout_ms: u64) -> Self {
                Self { inner: GenericPollingDriver::new(transport, codec, timeout_ms) }
            }
        }

        #[async_trait]
        impl ProtocolDriver for $name {
            async fn establish_protocol_connection(&self) -> Result<(), DriverError> {
                self.inner.establish_protocol_connection().await
            }

            async fn close_protocol_connection(&self) {
                self.inner.close_protocol_connection().await
            }

            fn check_protocol_connection(&self) -> bool {
                self.inner.check_protocol_connection()
            }

            async fn send_protocol_keep_alive(&self) -> Result<(), DriverError> {
                self.inner.send_protocol_keep_alive().await
            }

            async fn poll(&self, points: &[DataPoint], epoch_ms: u64) -> Result<Vec<TimestampedValue>, DriverError> {
                self.inner.poll(points, epoch_ms).await
            }

            async fn write(&self, point: &DataPoint, value: &Value) -> Result<(), DriverError> {
                self.inner.write(point, value).await
            }
        }
    };
}

delegating_driver!(ModbusDriver, "Modbus TCP/RTU: `slave_id` typed property, TCP or serial transport.");
delegating_driver!(MqttDriver, "MQTT: topic-per-point polling/subscription bookkeeping; `qos`/`client_id` typed properties.");
delegating_driver!(BacnetDriver, "BACnet/IP: object/property addressing, 5s polling floor applied by the factory.");
delegating_driver!(UdpCustomDriver, "Bespoke field protocols framed over raw UDP.");

#[cfg(test)]
mod tests {
    use super::*;
    use pulseone_core::{AccessMode, DataPointId, DeviceId};
    use pulseone_transport::FakeTransport;
    use pulseone_transport::ScriptedOutcome;

    fn point(addr: i64, scaling_factor: f64, scaling_offset: f64) -> DataPoint {
        DataPoint::builder()
            .id(DataPointId::new(format!("pt-{addr}")))
            .device_id(DeviceId::new("dev-1"))
            .address(addr)
            .data_type(DataType::Float64)
            .access_mode(AccessMode::Read)
            .scaling_factor(scaling_factor)
            .scaling_offset(scaling_offset)
            .build()
    }

    #[tokio::test]
    async fn poll_decodes_and_scales_each_point() {
        let transport = Arc::new(FakeTransport::new());
        transport.establish_connection().await.unwrap();
        transport.script_recv(ScriptedOutcome::Recv(b"100".to_vec()));
        transport.script_recv(ScriptedOutcome::Recv(b"500".to_vec()));

        let driver = ModbusDriver::new(transport, Arc::new(TextCodec), 1000);
        let points = vec![point(0, 1.0, 0.0), point(1, 0.1, -10.0)];
        let values = driver.poll(&points, 42).await.unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(values[0].value, Value::Numeric(100.0));
        assert_eq!(values[1].value, Value::Numeric(40.0));
        assert!(values.iter().all(|v| v.quality == pulseone_core::QualityCode::Good));
    }

    #[tokio::test]
    async fn malformed_response_marks_bad_quality_without_failing_whole_poll() {
        let transport = Arc::new(FakeTransport::new());
        transport.establish_connection().await.unwrap();
        transport.script_recv(ScriptedOutcome::Recv(b"not-a-number".to_vec()));

        let driver = ModbusDriver::new(transport, Arc::new(TextCodec), 1000);
        let points = vec![point(0, 1.0, 0.0)];
        let values = driver.poll(&points, 1).await.unwrap();

        assert_eq!(values[0].quality, pulseone_core::QualityCode::Bad);
    }

    #[tokio::test]
    async fn recv_timeout_fails_the_whole_poll() {
        let transport = Arc::new(FakeTransport::new());
        transport.establish_connection().await.unwrap();
        transport.script_recv(ScriptedOutcome::RecvTimeout);

        let driver = ModbusDriver::new(transport, Arc::new(TextCodec), 1000);
        let points = vec![point(0, 1.0, 0.0)];
        assert!(matches!(driver.poll(&points, 1).await, Err(DriverError::Timeout)));
    }
}
