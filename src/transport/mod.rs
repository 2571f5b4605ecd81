//! Byte transports the frame reader pulls from.
//!
//! A transport is a half-duplex byte channel with a bounded read timeout. A read
//! that times out returns `Ok(0)`; only genuine I/O failures are errors.

mod memory;
mod serial;

pub use memory::MemoryTransport;
pub use serial::{SerialSettings, SerialTransport};

use crate::Result;

/// Blocking byte channel to a device
pub trait Transport: Send {
    /// Port name for logging
    fn name(&self) -> &str;

    /// Read up to `buf.len()` bytes, blocking at most the read timeout.
    ///
    /// Returns `Ok(0)` when nothing arrived within the timeout.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write every byte.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Open a second handle to the same channel.
    ///
    /// The session hands one handle to the reader thread and keeps the other
    /// for commands.
    fn try_clone(&self) -> Result<Box<dyn Transport>>;

    /// Whether the source has permanently run out of bytes.
    ///
    /// Live ports never run out; recorded captures do.
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>> {
        (**self).try_clone()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Read until `buf` is full or a read times out; returns the number of bytes read.
pub fn read_up_to<T: Transport + ?Sized>(transport: &mut T, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = transport.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
