//! Sliding header window used for resynchronisation and device detection

use crate::types::HEADER_LEN;

/// Fixed-size sliding window over the most recent bytes.
///
/// Every pushed byte is appended; the oldest byte drops once the window is full.
#[derive(Debug, Clone, Default)]
pub struct HeaderWindow {
    bytes: [u8; HEADER_LEN],
    filled: usize,
}

impl HeaderWindow {
    /// Empty window
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one byte, dropping the oldest once full.
    pub fn push(&mut self, byte: u8) {
        if self.filled < HEADER_LEN {
            self.bytes[self.filled] = byte;
            self.filled += 1;
        } else {
            self.bytes.rotate_left(1);
            self.bytes[HEADER_LEN - 1] = byte;
        }
    }

    /// Whether the window currently equals `header`.
    pub fn matches(&self, header: &[u8; HEADER_LEN]) -> bool {
        self.filled == HEADER_LEN && &self.bytes == header
    }

    /// Current window contents, oldest first.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.filled]
    }

    /// Forget every byte seen so far.
    pub fn clear(&mut self) {
        self.filled = 0;
    }
}
