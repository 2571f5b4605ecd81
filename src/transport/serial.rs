//! Serial port transport backed by the `serialport` crate

use serialport::{DataBits, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

use super::Transport;
use crate::types::{DEFAULT_READ_TIMEOUT, DeviceFamily};
use crate::{LinkError, Result};

/// Line settings for opening a port. Always 8N1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl SerialSettings {
    /// Family baud rate with the default read timeout.
    pub fn for_family(family: DeviceFamily) -> Self {
        Self { baud_rate: family.baud_rate(), read_timeout: DEFAULT_READ_TIMEOUT }
    }
}

/// An open serial port.
pub struct SerialTransport {
    name: String,
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open `name` with the given line settings.
    pub fn open(name: &str, settings: &SerialSettings) -> Result<Self> {
        let port = serialport::new(name, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| LinkError::transport(name, e.into()))?;

        info!(port = name, baud = settings.baud_rate, "Serial port opened");
        Ok(Self { name: name.to_string(), port })
    }

    /// Names of every serial port the OS reports.
    pub fn available_ports() -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

impl Transport for SerialTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(LinkError::transport(&self.name, e)),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes).map_err(|e| LinkError::transport(&self.name, e))?;
        self.port.flush().map_err(|e| LinkError::transport(&self.name, e))
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>> {
        let port = self.port.try_clone().map_err(|e| LinkError::transport(&self.name, e.into()))?;
        debug!(port = %self.name, "Cloned serial handle");
        Ok(Box::new(SerialTransport { name: self.name.clone(), port }))
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport").field("name", &self.name).finish_non_exhaustive()
    }
}
