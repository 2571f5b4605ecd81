//! Frame and payload builders for tests and benchmarks
//!
//! Inbound thermal frames use a two-byte length, which the command encoder never
//! produces, so they are built here by hand.

#![cfg(any(test, feature = "benchmark"))]

use crate::protocol::{encode_frame, xor_checksum};
use crate::types::DeviceFamily;

/// 128-byte ToF distance payload, cell `i` (row-major) set to `value(i)`.
pub fn distance_payload(value: impl Fn(usize) -> u16) -> Vec<u8> {
    (0..64).flat_map(|i| value(i).to_be_bytes()).collect()
}

/// 3072-byte thermal image payload, cell `i` (row-major) set to `value(i)`.
pub fn thermal_payload(value: impl Fn(usize) -> f32) -> Vec<u8> {
    (0..24 * 32).flat_map(|i| value(i).to_le_bytes()).collect()
}

/// One bundle section: `type | len | data | type`.
pub fn bundle_section(section_type: u8, data: &[u8]) -> Vec<u8> {
    let mut section = Vec::with_capacity(data.len() + 3);
    section.push(section_type);
    section.push(data.len() as u8);
    section.extend_from_slice(data);
    section.push(section_type);
    section
}

/// Complete inbound ToF frame.
pub fn tof_frame(packet_type: u8, payload: &[u8]) -> Vec<u8> {
    encode_frame(DeviceFamily::Tof, packet_type, payload).expect("test payload fits one-byte length")
}

/// Complete inbound thermal frame with a two-byte big-endian length.
pub fn thermal_frame(packet_type: u8, payload: &[u8]) -> Vec<u8> {
    let length = (payload.len() as u16).to_be_bytes();
    let mut frame = Vec::with_capacity(payload.len() + 12);
    frame.extend_from_slice(&DeviceFamily::Thermal.header());
    frame.push(packet_type);
    frame.extend_from_slice(&length);
    frame.extend_from_slice(payload);
    frame.push(xor_checksum(packet_type, &length, payload));
    frame.extend_from_slice(&DeviceFamily::Thermal.footer());
    frame
}
