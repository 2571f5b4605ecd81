//! Raw frame type emitted by the frame reader

/// A validated inbound frame: the type byte and its payload.
///
/// Frames only live between the reader and the decoders; nothing retains them
/// after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Packet type byte
    pub packet_type: u8,

    /// Payload bytes, excluding length prefix and checksum
    pub payload: Vec<u8>,
}

impl RawFrame {
    /// Create a new raw frame
    pub fn new(packet_type: u8, payload: Vec<u8>) -> Self {
        Self { packet_type, payload }
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
