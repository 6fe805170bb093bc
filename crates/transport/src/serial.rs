// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serial transport: endpoint `dev:baud:bits:parity:stop`, e.g.
//! `/dev/ttyUSB0:9600:8:N:1`. The short form `dev` (no colons) silently
//! defaults to `9600:8:N:1` — a behavior preserved from the source's
//! `ParseEndpoint`, not re-derived (§9 open question).

use crate::error::TransportError;
use crate::stats::TransportStats;
use crate::transport::Transport;
use async_trait::async_trait;
use nix::sys::termios::{self, SetArg, Termios};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

const ALLOWED_BAUD: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialEndpoint {
    pub device: String,
    pub baud: u32,
    pub data_bits: u8,
    pub parity: char,
    pub stop_bits: u8,
}

impl SerialEndpoint {
    /// Parses `dev` or `dev:baud:bits:parity:stop`. The short form
    /// defaults to `9600:8:N:1`, matching the source's behavior.
    pub fn parse(endpoint: &str) -> Result<Self, TransportError> {
        let parts: Vec<&str> = endpoint.split(':').collect();
        let invalid = |reason: &str| TransportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let (device, baud, data_bits, parity, stop_bits) = match parts.as_slice() {
            [device] => (device.to_string(), 9600, 8, 'N', 1),
            [device, baud, bits, parity, stop] => {
                let baud: u32 = baud.parse().map_err(|_| invalid("baud is not a number"))?;
                let bits: u8 = bits.parse().map_err(|_| invalid("data bits is not a number"))?;
                let stop: u8 = stop.parse().map_err(|_| invalid("stop bits is not a number"))?;
                let parity = parity.chars().next().ok_or_else(|| invalid("empty parity"))?;
                (device.to_string(), baud, bits, parity, stop)
            }
            _ => return Err(invalid("expected dev or dev:baud:bits:parity:stop")),
        };

        if !ALLOWED_BAUD.contains(&baud) {
            return Err(invalid("baud rate not in the allowed set"));
        }
        if !matches!(data_bits, 7 | 8) {
            return Err(invalid("data bits must be 7 or 8"));
        }
        if !matches!(stop_bits, 1 | 2) {
            return Err(invalid("stop bits must be 1 or 2"));
        }
        if !matches!(parity, 'N' | 'E' | 'O') {
            return Err(invalid("parity must be N, E, or O"));
        }

        Ok(Self { device, baud, data_bits, parity, stop_bits })
    }
}

fn baud_rate(baud: u32) -> Result<termios::BaudRate, TransportError> {
    use termios::BaudRate::*;
    Ok(match baud {
        1200 => B1200,
        2400 => B2400,
        4800 => B4800,
        9600 => B9600,
        19200 => B19200,
        38400 => B38400,
        57600 => B57600,
        115200 => B115200,
        230400 => B230400,
        460800 => B460800,
        921600 => B921600,
        _ => {
            return Err(TransportError::InvalidEndpoint {
                endpoint: baud.to_string(),
                reason: "unsupported baud rate".to_string(),
            })
        }
    })
}

struct OpenPort {
    file: File,
    original: Termios,
}

/// RS-232/RS-485 serial adapter, shared by Modbus RTU and bespoke
/// field protocols. Captures the port's original `termios` settings on
/// open and restores them on close; configures raw mode with `VMIN=0`
/// so reads are bounded by the caller-supplied timeout rather than the
/// kernel's own inter-byte timer.
pub struct SerialTransport {
    endpoint: SerialEndpoint,
    port: Mutex<Option<OpenPort>>,
    stats: TransportStats,
}

impl SerialTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        Ok(Self {
            endpoint: SerialEndpoint::parse(endpoint)?,
            port: Mutex::new(None),
            stats: TransportStats::default(),
        })
    }

    fn configure(&self, file: &File) -> Result<Termios, TransportError> {
        let fd = file.as_raw_fd();
        let original = termios::tcgetattr(fd).map_err(|e| TransportError::Io(e.into()))?;
        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);

        raw.control_flags.remove(termios::ControlFlags::PARENB | termios::ControlFlags::PARODD);
        match self.endpoint.parity {
            'E' => raw.control_flags.insert(termios::ControlFlags::PARENB),
            'O' => raw.control_flags.insert(termios::ControlFlags::PARENB | termios::ControlFlags::PARODD),
            _ => {}
        }

        raw.control_flags.remove(termios::ControlFlags::CSIZE);
        raw.control_flags.insert(if self.endpoint.data_bits == 7 {
            termios::ControlFlags::CS7
        } else {
            termios::ControlFlags::CS8
        });

        if self.endpoint.stop_bits == 2 {
            raw.control_flags.insert(termios::ControlFlags::CSTOPB);
        } else {
            raw.control_flags.remove(termios::ControlFlags::CSTOPB);
        }

        let rate = baud_rate(self.endpoint.baud)?;
        termios::cfsetispeed(&mut raw, rate).map_err(|e| TransportError::Io(e.into()))?;
        termios::cfsetospeed(&mut raw, rate).map_err(|e| TransportError::Io(e.into()))?;

        raw.control_chars[termios::SpecialCharacterIndices::VMIN as usize] = 0;
        raw.control_chars[termios::SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(fd, SetArg::TCSANOW, &raw).map_err(|e| TransportError::Io(e.into()))?;
        Ok(original)
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn establish_connection(&self) -> Result<(), TransportError> {
        let device = self.endpoint.device.clone();
        let file = tokio::task::spawn_blocking(move || {
            OpenOptions::new()
                .read(true)
                .write(true)
                .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
                .open(&device)
        })
        .await
        .map_err(|e| TransportError::Io(std::io::Error::other(e)))??;

        let original = self.configure(&file)?;
        *self.port.lock() = Some(OpenPort { file, original });
        tracing::info!(device = %self.endpoint.device, baud = self.endpoint.baud, "serial port opened");
        Ok(())
    }

    async fn close_connection(&self) {
        if let Some(open) = self.port.lock().take() {
            let fd = open.file.as_raw_fd();
            let _ = termios::tcsetattr(fd, SetArg::TCSANOW, &open.original);
        }
        tracing::debug!(device = %self.endpoint.device, "serial port closed");
    }

    fn check_connection(&self) -> bool {
        self.port.lock().is_some()
    }

    async fn send(&self, bytes: &[u8]) -> Result<usize, TransportError> {
        use std::io::Write;
        let mut guard = self.port.lock();
        let Some(open) = guard.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        match open.file.write_all(bytes) {
            Ok(()) => {
                self.stats.record_send(bytes.len());
                Ok(bytes.len())
            }
            Err(e) => {
                self.stats.record_send_error();
                Err(TransportError::Io(e))
            }
        }
    }

    async fn recv(&self, buffer: &mut [u8], timeout_ms: u64) -> Result<usize, TransportError> {
        let mut dup = {
            let guard = self.port.lock();
            let Some(open) = guard.as_ref() else {
                return Err(TransportError::NotConnected);
            };
            open.file.try_clone().map_err(TransportError::Io)?
        };

        let want = buffer.len();
        // VMIN=0/VTIME=0 makes every `read` return immediately, with 0
        // meaning "nothing available right now" rather than EOF — poll it
        // in a tight loop bounded by `timeout_ms` rather than blocking the
        // OS thread on the kernel's own inter-byte timer (§4.2).
        let outcome = tokio::task::spawn_blocking(move || -> Result<(usize, Vec<u8>), std::io::Error> {
            use std::io::Read;
            let mut scratch = vec![0u8; want];
            let deadline = std::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
            loop {
                match dup.read(&mut scratch) {
                    Ok(0) => {
                        if std::time::Instant::now() >= deadline {
                            return Ok((0, scratch));
                        }
                        std::thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Ok(n) => return Ok((n, scratch)),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
        })
        .await
        .map_err(|e| TransportError::Io(std::io::Error::other(e)))?;

        match outcome {
            Ok((0, _)) => {
                self.stats.record_timeout();
                Ok(0)
            }
            Ok((n, scratch)) => {
                buffer[..n].copy_from_slice(&scratch[..n]);
                self.stats.record_recv(n);
                Ok(n)
            }
            Err(e) => {
                self.stats.record_recv_error();
                Err(TransportError::Io(e))
            }
        }
    }

    async fn send_keep_alive(&self) -> Result<(), TransportError> {
        self.send(&[]).await.map(|_| ())
    }

    fn stats(&self) -> &TransportStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_defaults_to_9600_8n1() {
        let ep = SerialEndpoint::parse("/dev/ttyUSB0").unwrap();
        assert_eq!(ep.baud, 9600);
        assert_eq!(ep.data_bits, 8);
        assert_eq!(ep.parity, 'N');
        assert_eq!(ep.stop_bits, 1);
    }

    #[test]
    fn long_form_parses_all_fields() {
        let ep = SerialEndpoint::parse("/dev/ttyUSB0:19200:7:E:2").unwrap();
        assert_eq!(ep.baud, 19200);
        assert_eq!(ep.data_bits, 7);
        assert_eq!(ep.parity, 'E');
        assert_eq!(ep.stop_bits, 2);
    }

    #[test]
    fn rejects_baud_outside_allowed_set() {
        assert!(SerialEndpoint::parse("/dev/ttyUSB0:9601:8:N:1").is_err());
    }

    #[test]
    fn rejects_invalid_data_bits() {
        assert!(SerialEndpoint::parse("/dev/ttyUSB0:9600:9:N:1").is_err());
    }

    #[test]
    fn rejects_invalid_parity() {
        assert!(SerialEndpoint::parse("/dev/ttyUSB0:9600:8:X:1").is_err());
    }

    #[test]
    fn rejects_invalid_stop_bits() {
        assert!(SerialEndpoint::parse("/dev/ttyUSB0:9600:8:N:3").is_err());
    }
}
