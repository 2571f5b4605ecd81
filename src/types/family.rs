//! Device family registry: framing constants, baud rates and packet catalogues

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Header length shared by both families.
pub const HEADER_LEN: usize = 4;

/// Footer length shared by both families.
pub const FOOTER_LEN: usize = 4;

/// Default serial read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// How a family encodes the payload length on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthWidth {
    /// One byte, payloads up to 255 bytes
    OneByte,
    /// Two bytes big-endian, bounded by an exclusive maximum
    TwoBytesBigEndian { exclusive_max: u16 },
}

impl LengthWidth {
    /// Number of length bytes on the wire.
    pub fn byte_count(self) -> usize {
        match self {
            LengthWidth::OneByte => 1,
            LengthWidth::TwoBytesBigEndian { .. } => 2,
        }
    }
}

/// The two sensor families that share the serial protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    /// 8x8 time-of-flight distance sensor
    Tof,
    /// 24x32 thermal-array sensor
    Thermal,
}

impl DeviceFamily {
    /// Frame header identifying this family.
    pub const fn header(self) -> [u8; HEADER_LEN] {
        match self {
            DeviceFamily::Tof => *b"FUT0",
            DeviceFamily::Thermal => *b"FUT1",
        }
    }

    /// Frame footer paired with [`header`](Self::header).
    pub const fn footer(self) -> [u8; FOOTER_LEN] {
        match self {
            DeviceFamily::Tof => *b"END0",
            DeviceFamily::Thermal => *b"END1",
        }
    }

    /// The other registered family.
    pub const fn other(self) -> Self {
        match self {
            DeviceFamily::Tof => DeviceFamily::Thermal,
            DeviceFamily::Thermal => DeviceFamily::Tof,
        }
    }

    /// Serial baud rate the device streams at.
    pub const fn baud_rate(self) -> u32 {
        match self {
            DeviceFamily::Tof => 115_200,
            DeviceFamily::Thermal => 921_600,
        }
    }

    /// Inbound length encoding.
    pub const fn length_width(self) -> LengthWidth {
        match self {
            DeviceFamily::Tof => LengthWidth::OneByte,
            DeviceFamily::Thermal => LengthWidth::TwoBytesBigEndian { exclusive_max: 4000 },
        }
    }

    /// Whether inbound checksums are verified.
    ///
    /// Thermal firmware does not reliably populate the checksum byte, so it is
    /// read and discarded.
    pub const fn verifies_checksum(self) -> bool {
        matches!(self, DeviceFamily::Tof)
    }

    /// Inbound packet types the frame reader accepts.
    pub const fn supported_types(self) -> &'static [u8] {
        match self {
            DeviceFamily::Tof => &[0xA3, 0xA4, 0xA5, 0xA6, 0xAF],
            DeviceFamily::Thermal => &[0xA2, 0xA4, 0xA5, 0xA6, 0xA7],
        }
    }

    /// Whether `packet_type` belongs to this family's inbound catalogue.
    pub fn supports(self, packet_type: u8) -> bool {
        self.supported_types().contains(&packet_type)
    }

    /// Default telemetry buffer bound.
    pub const fn buffer_capacity(self) -> usize {
        match self {
            DeviceFamily::Tof => 1000,
            DeviceFamily::Thermal => 20,
        }
    }

    /// Native sensor grid as `(rows, cols)`.
    pub const fn grid_dims(self) -> (usize, usize) {
        match self {
            DeviceFamily::Tof => (8, 8),
            DeviceFamily::Thermal => (24, 32),
        }
    }

    /// Identify a family from a received header.
    pub fn from_header(header: &[u8]) -> Option<Self> {
        [DeviceFamily::Tof, DeviceFamily::Thermal].into_iter().find(|f| f.header() == header)
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::Tof => f.write_str("ToF"),
            DeviceFamily::Thermal => f.write_str("thermal"),
        }
    }
}

impl std::str::FromStr for DeviceFamily {
    type Err = crate::LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tof" => Ok(DeviceFamily::Tof),
            "thermal" => Ok(DeviceFamily::Thermal),
            other => Err(crate::LinkError::config(format!("unknown device family '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_and_footers_pair_up() {
        for family in [DeviceFamily::Tof, DeviceFamily::Thermal] {
            assert_eq!(DeviceFamily::from_header(&family.header()), Some(family));
            assert_ne!(family.header(), family.other().header());
            assert_eq!(family.other().other(), family);
        }
        assert_eq!(&DeviceFamily::Tof.footer(), b"END0");
        assert_eq!(&DeviceFamily::Thermal.footer(), b"END1");
    }

    #[test]
    fn family_constants() {
        assert_eq!(DeviceFamily::Tof.baud_rate(), 115_200);
        assert_eq!(DeviceFamily::Thermal.baud_rate(), 921_600);
        assert_eq!(DeviceFamily::Tof.buffer_capacity(), 1000);
        assert_eq!(DeviceFamily::Thermal.buffer_capacity(), 20);
        assert!(DeviceFamily::Tof.verifies_checksum());
        assert!(!DeviceFamily::Thermal.verifies_checksum());
        assert!(DeviceFamily::Tof.supports(0xAF));
        assert!(!DeviceFamily::Thermal.supports(0xAF));
    }

    #[test]
    fn family_parses_case_insensitively() {
        assert_eq!("ToF".parse::<DeviceFamily>().unwrap(), DeviceFamily::Tof);
        assert_eq!("THERMAL".parse::<DeviceFamily>().unwrap(), DeviceFamily::Thermal);
        assert!("lidar".parse::<DeviceFamily>().is_err());
    }
}
