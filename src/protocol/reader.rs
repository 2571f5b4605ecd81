//! Frame reader: resynchronising state machine over a byte transport
//!
//! The reader walks `SeekingHeader → type → length → payload → checksum → footer`
//! and either emits a [`RawFrame`] or resynchronises. Resynchronising discards
//! everything consumed since the header and resumes seeking with the next byte;
//! the discarded span is never rescanned.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::checksum::xor_checksum;
use super::sync::HeaderWindow;
use crate::stats::LinkStats;
use crate::transport::{Transport, read_up_to};
use crate::types::{DeviceFamily, FOOTER_LEN, LengthWidth, RawFrame};
use crate::{LinkError, Result};

/// Why a frame in progress was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFault {
    /// Type byte not in the family's catalogue
    UnsupportedType(u8),
    /// A read timed out before the named field was complete
    Truncated(&'static str),
    /// Two-byte length outside `0 < len < max`
    LengthOutOfRange(u16),
    /// Footer bytes differ from the family footer
    FooterMismatch,
    /// Received checksum differs from the recomputed one
    ChecksumMismatch { expected: u8, found: u8 },
}

impl FrameFault {
    /// Error value for logging and diagnostics.
    pub fn to_error(self) -> LinkError {
        match self {
            FrameFault::UnsupportedType(packet_type) => LinkError::UnknownType { packet_type },
            FrameFault::Truncated(field) => LinkError::framing(format!("short read in {field}")),
            FrameFault::LengthOutOfRange(len) => {
                LinkError::framing(format!("declared length {len} out of range"))
            }
            FrameFault::FooterMismatch => LinkError::framing("footer mismatch"),
            FrameFault::ChecksumMismatch { expected, found } => LinkError::framing(format!(
                "checksum mismatch: expected {expected:#04x}, found {found:#04x}"
            )),
        }
    }
}

/// Pulls validated frames for one device family out of a transport.
pub struct FrameReader<T> {
    transport: T,
    family: DeviceFamily,
    window: HeaderWindow,
    stats: Arc<LinkStats>,
}

impl<T: Transport> FrameReader<T> {
    /// Create a reader with its own statistics.
    pub fn new(transport: T, family: DeviceFamily) -> Self {
        Self::with_stats(transport, family, Arc::new(LinkStats::new()))
    }

    /// Create a reader that reports into shared statistics.
    pub fn with_stats(transport: T, family: DeviceFamily, stats: Arc<LinkStats>) -> Self {
        Self { transport, family, window: HeaderWindow::new(), stats }
    }

    /// Read the next valid frame.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - a frame passed every check
    /// - `Ok(None)` - a read returned no bytes while seeking a header
    /// - `Err(e)` - the transport failed
    ///
    /// Framing faults never surface here; they are logged, counted and followed by
    /// resynchronisation within the same call.
    pub fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            if !self.seek_header()? {
                return Ok(None);
            }

            match self.read_body()? {
                Ok(frame) => {
                    self.stats.frame();
                    trace!(
                        family = %self.family,
                        packet_type = frame.packet_type,
                        len = frame.len(),
                        "Frame received"
                    );
                    return Ok(Some(frame));
                }
                Err(fault) => self.resync(fault),
            }
        }
    }

    /// Device family this reader expects.
    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn seek_header(&mut self) -> Result<bool> {
        let header = self.family.header();
        let mut byte = [0u8; 1];
        loop {
            if self.transport.read(&mut byte)? == 0 {
                return Ok(false);
            }
            self.window.push(byte[0]);
            if self.window.matches(&header) {
                self.window.clear();
                return Ok(true);
            }
        }
    }

    fn read_body(&mut self) -> Result<std::result::Result<RawFrame, FrameFault>> {
        let mut type_buf = [0u8; 1];
        if read_up_to(&mut self.transport, &mut type_buf)? == 0 {
            return Ok(Err(FrameFault::Truncated("type")));
        }
        let packet_type = type_buf[0];
        if !self.family.supports(packet_type) {
            return Ok(Err(FrameFault::UnsupportedType(packet_type)));
        }

        let width = self.family.length_width();
        let mut len_buf = [0u8; 2];
        let len_bytes = width.byte_count();
        if read_up_to(&mut self.transport, &mut len_buf[..len_bytes])? < len_bytes {
            return Ok(Err(FrameFault::Truncated("length")));
        }
        let length = match width {
            LengthWidth::OneByte => len_buf[0] as usize,
            LengthWidth::TwoBytesBigEndian { exclusive_max } => {
                let declared = u16::from_be_bytes(len_buf);
                if declared == 0 || declared >= exclusive_max {
                    return Ok(Err(FrameFault::LengthOutOfRange(declared)));
                }
                declared as usize
            }
        };

        let mut payload = vec![0u8; length];
        if read_up_to(&mut self.transport, &mut payload)? < length {
            return Ok(Err(FrameFault::Truncated("payload")));
        }

        let mut checksum = [0u8; 1];
        if read_up_to(&mut self.transport, &mut checksum)? == 0 {
            return Ok(Err(FrameFault::Truncated("checksum")));
        }

        let mut footer = [0u8; FOOTER_LEN];
        if read_up_to(&mut self.transport, &mut footer)? < FOOTER_LEN {
            return Ok(Err(FrameFault::Truncated("footer")));
        }
        if footer != self.family.footer() {
            return Ok(Err(FrameFault::FooterMismatch));
        }

        if self.family.verifies_checksum() {
            let expected = xor_checksum(packet_type, &len_buf[..len_bytes], &payload);
            if checksum[0] != expected {
                return Ok(Err(FrameFault::ChecksumMismatch { expected, found: checksum[0] }));
            }
        }

        Ok(Ok(RawFrame::new(packet_type, payload)))
    }

    fn resync(&mut self, fault: FrameFault) {
        self.window.clear();
        self.stats.resync();

        match fault {
            FrameFault::ChecksumMismatch { .. } => {
                self.stats.checksum_failure();
                warn!(family = %self.family, error = %fault.to_error(), "Dropping frame");
            }
            FrameFault::FooterMismatch | FrameFault::LengthOutOfRange(_) => {
                warn!(family = %self.family, error = %fault.to_error(), "Dropping frame");
            }
            FrameFault::UnsupportedType(_) | FrameFault::Truncated(_) => {
                debug!(family = %self.family, error = %fault.to_error(), "Resynchronising");
            }
        }
    }
}
