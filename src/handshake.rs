//! Port scan and role detection
//!
//! A device announces its role through the frame header it streams. Scanning
//! reads a bounded number of bytes from each port looking for the wanted
//! family's header. A device streaming the other family's header is told to swap
//! roles, and the scan runs exactly once more after a settle delay.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::protocol::{Command, HeaderWindow};
use crate::transport::{SerialSettings, SerialTransport, Transport};
use crate::types::{DEFAULT_READ_TIMEOUT, DeviceFamily};
use crate::{LinkError, Result};

/// Default bytes examined per port.
pub const DEFAULT_SCAN_BYTE_BUDGET: usize = 200;

/// Default wait between a role swap and the rescan.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Source of candidate ports.
pub trait PortScanner {
    /// Names of the ports to try, in scan order.
    fn port_names(&self) -> Result<Vec<String>>;

    /// Open one port for probing.
    fn open(&self, name: &str, settings: &SerialSettings) -> Result<Box<dyn Transport>>;
}

/// Ports reported by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortScanner for SystemPorts {
    fn port_names(&self) -> Result<Vec<String>> {
        SerialTransport::available_ports()
    }

    fn open(&self, name: &str, settings: &SerialSettings) -> Result<Box<dyn Transport>> {
        Ok(Box::new(SerialTransport::open(name, settings)?))
    }
}

/// Result of probing a single port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The wanted family's header was seen
    Desired,
    /// The other family's header was seen and a role swap was sent
    Swapped,
    /// Neither header within the byte budget
    NotFound,
}

/// Look for `family`'s header within `byte_budget` bytes.
///
/// On the other family's header, the swap command is written back framed as
/// that other family. A read returning no bytes ends the probe.
pub fn probe<T: Transport + ?Sized>(
    transport: &mut T,
    family: DeviceFamily,
    byte_budget: usize,
) -> Result<ProbeOutcome> {
    let wanted = family.header();
    let other = family.other();
    let mut window = HeaderWindow::new();
    let mut byte = [0u8; 1];

    for _ in 0..byte_budget {
        if transport.read(&mut byte)? == 0 {
            return Ok(ProbeOutcome::NotFound);
        }
        window.push(byte[0]);

        if window.matches(&wanted) {
            return Ok(ProbeOutcome::Desired);
        }
        if window.matches(&other.header()) {
            let frame = Command::SwapRole.encode(other)?;
            transport.write_all(&frame)?;
            info!(port = transport.name(), from = %other, to = %family, "Role swap requested");
            return Ok(ProbeOutcome::Swapped);
        }
    }

    Ok(ProbeOutcome::NotFound)
}

/// Handshake parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    pub byte_budget: usize,
    pub read_timeout: Duration,
    pub settle_delay: Duration,
}

impl Default for Handshake {
    fn default() -> Self {
        Self {
            byte_budget: DEFAULT_SCAN_BYTE_BUDGET,
            read_timeout: DEFAULT_READ_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl Handshake {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            byte_budget: config.scan_byte_budget,
            read_timeout: config.read_timeout(),
            settle_delay: config.settle_delay(),
        }
    }

    /// Find the port streaming `family`.
    ///
    /// Stops at the first port that answers. A swap triggers one rescan after the
    /// settle delay; only a `Desired` answer on that rescan succeeds.
    pub fn detect_port<S: PortScanner + ?Sized>(
        &self,
        scanner: &S,
        family: DeviceFamily,
        baud_rate: u32,
    ) -> Result<String> {
        let settings = SerialSettings { baud_rate, read_timeout: self.read_timeout };

        match self.scan(scanner, family, &settings)? {
            Some((port, ProbeOutcome::Desired)) => {
                info!(port = %port, %family, "Device found");
                Ok(port)
            }
            Some((port, ProbeOutcome::Swapped)) => {
                debug!(port = %port, delay = ?self.settle_delay, "Waiting for device to switch role");
                std::thread::sleep(self.settle_delay);

                match self.scan(scanner, family, &settings)? {
                    Some((port, ProbeOutcome::Desired)) => {
                        info!(port = %port, %family, "Device found after role swap");
                        Ok(port)
                    }
                    _ => Err(LinkError::DeviceNotFound { family, attempts: 2 }),
                }
            }
            _ => Err(LinkError::DeviceNotFound { family, attempts: 1 }),
        }
    }

    fn scan<S: PortScanner + ?Sized>(
        &self,
        scanner: &S,
        family: DeviceFamily,
        settings: &SerialSettings,
    ) -> Result<Option<(String, ProbeOutcome)>> {
        for name in scanner.port_names()? {
            let mut transport = match scanner.open(&name, settings) {
                Ok(transport) => transport,
                Err(e) => {
                    debug!(port = %name, error = %e, "Skipping port");
                    continue;
                }
            };

            match probe(&mut transport, family, self.byte_budget) {
                Ok(ProbeOutcome::NotFound) => debug!(port = %name, %family, "No header found"),
                Ok(outcome) => return Ok(Some((name, outcome))),
                Err(e) => warn!(port = %name, error = %e, "Probe failed"),
            }
        }
        Ok(None)
    }
}
