//! Outbound command frames

use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, warn};

use super::checksum::xor_checksum;
use crate::transport::Transport;
use crate::types::{BedBox, DeviceFamily, FOOTER_LEN, HEADER_LEN};
use crate::{LinkError, Result};

/// Build `header ++ type ++ len ++ payload ++ checksum ++ footer`.
///
/// Outbound frames always carry a one-byte length, whatever the family's
/// inbound encoding.
pub fn encode_frame(family: DeviceFamily, packet_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let length = u8::try_from(payload.len()).map_err(|_| LinkError::Encode {
        reason: format!("payload of {} bytes exceeds 255", payload.len()),
    })?;

    let mut frame = Vec::with_capacity(HEADER_LEN + 3 + payload.len() + FOOTER_LEN);
    frame.extend_from_slice(&family.header());
    frame.push(packet_type);
    frame.push(length);
    frame.extend_from_slice(payload);
    frame.push(xor_checksum(packet_type, &[length], payload));
    frame.extend_from_slice(&family.footer());
    Ok(frame)
}

/// Commands a session can send to its device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Restart background calibration
    Recalibrate,
    /// ToF only: stream the background distance image (`true`) or stop it
    ViewBackground(bool),
    /// Thermal only: start tracking the configured bed region
    EnableBedTracking,
    /// Thermal only: set the bed region
    SetBedBox(BedBox),
    /// Ask a device answering under the wrong header to switch role
    SwapRole,
    /// Arbitrary type and payload
    Raw { packet_type: u8, payload: Vec<u8> },
}

impl Command {
    pub fn packet_type(&self) -> u8 {
        match self {
            Command::Recalibrate => 0xA1,
            Command::ViewBackground(_) | Command::SetBedBox(_) => 0xA2,
            Command::EnableBedTracking => 0xA3,
            Command::SwapRole => 0xA8,
            Command::Raw { packet_type, .. } => *packet_type,
        }
    }

    pub fn payload(&self) -> Vec<u8> {
        match self {
            Command::Recalibrate | Command::EnableBedTracking | Command::SwapRole => vec![0x01],
            Command::ViewBackground(true) => vec![0x01],
            Command::ViewBackground(false) => vec![0x02],
            Command::SetBedBox(bed) => bed.to_bytes().to_vec(),
            Command::Raw { payload, .. } => payload.clone(),
        }
    }

    /// Frame this command for `family`.
    pub fn encode(&self, family: DeviceFamily) -> Result<Vec<u8>> {
        encode_frame(family, self.packet_type(), &self.payload())
    }
}

/// Write side of a session.
///
/// Sending is fire-and-forget: failures are logged and swallowed. Once closed,
/// the transport handle is released and every later send is dropped.
pub struct CommandSink {
    family: DeviceFamily,
    transport: Mutex<Option<Box<dyn Transport>>>,
}

impl CommandSink {
    pub fn new(family: DeviceFamily, transport: Box<dyn Transport>) -> Self {
        Self { family, transport: Mutex::new(Some(transport)) }
    }

    /// Sink that drops every command.
    pub fn closed(family: DeviceFamily) -> Self {
        Self { family, transport: Mutex::new(None) }
    }

    /// Encode and write `command`. Returns whether the bytes were written.
    pub fn send(&self, command: &Command) -> bool {
        let frame = match command.encode(self.family) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(family = %self.family, error = %e, "Dropping command");
                return false;
            }
        };

        let mut guard = self.transport.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(transport) = guard.as_mut() else {
            warn!(family = %self.family, ?command, "Command sink closed, dropping command");
            return false;
        };

        match transport.write_all(&frame) {
            Ok(()) => {
                debug!(
                    port = transport.name(),
                    packet_type = command.packet_type(),
                    bytes = frame.len(),
                    "Command sent"
                );
                true
            }
            Err(e) => {
                error!(port = transport.name(), error = %e, "Command write failed");
                false
            }
        }
    }

    /// Release the transport handle.
    pub fn close(&self) {
        let released = self.transport.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(transport) = released {
            debug!(port = transport.name(), "Command sink closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}

impl std::fmt::Debug for CommandSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSink")
            .field("family", &self.family)
            .field("closed", &self.is_closed())
            .finish()
    }
}
