//! In-memory transport for capture replay and loopback testing

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;

use super::Transport;
use crate::{LinkError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    input: VecDeque<u8>,
    written: Vec<u8>,
    input_closed: bool,
    output_closed: bool,
    pending_failure: Option<ErrorKind>,
}

/// Byte channel backed by shared memory.
///
/// Clones share the same input queue and write log, mirroring how two handles to
/// one serial port behave. An empty read sleeps for the idle delay and returns
/// `Ok(0)`, standing in for a serial read timeout.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    name: String,
    state: Arc<Mutex<MemoryState>>,
    chunk_size: usize,
    idle_delay: Duration,
}

impl MemoryTransport {
    /// Open-ended channel; feed it with [`push`](Self::push).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MemoryState::default())),
            chunk_size: usize::MAX,
            idle_delay: Duration::from_millis(5),
        }
    }

    /// Channel that yields `bytes` and is then exhausted.
    pub fn from_bytes(name: impl Into<String>, bytes: impl AsRef<[u8]>) -> Self {
        let transport = Self::new(name);
        transport.push(bytes);
        transport.close_input();
        transport
    }

    /// Load a raw capture recorded with `nonvision record`.
    pub fn open_capture<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| LinkError::transport(path.display().to_string(), e))?;
        info!(path = %path.display(), bytes = bytes.len(), "Loaded capture");
        Ok(Self::from_bytes(path.display().to_string(), bytes))
    }

    /// Limit each read to at most `chunk_size` bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Time an empty read blocks before returning `Ok(0)`.
    pub fn with_idle_delay(mut self, idle_delay: Duration) -> Self {
        self.idle_delay = idle_delay;
        self
    }

    /// Append bytes to the input queue.
    pub fn push(&self, bytes: impl AsRef<[u8]>) {
        self.lock().input.extend(bytes.as_ref());
    }

    /// Mark the input as complete; the transport is exhausted once drained.
    pub fn close_input(&self) {
        self.lock().input_closed = true;
    }

    /// Make every subsequent write fail.
    pub fn close_output(&self) {
        self.lock().output_closed = true;
    }

    /// Fail the next read with an I/O error of `kind`.
    pub fn fail_next_read(&self, kind: ErrorKind) {
        self.lock().pending_failure = Some(kind);
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Bytes still waiting to be read.
    pub fn pending_input(&self) -> usize {
        self.lock().input.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let count = {
            let mut state = self.lock();
            if let Some(kind) = state.pending_failure.take() {
                return Err(LinkError::transport(&self.name, kind.into()));
            }
            let count = buf.len().min(self.chunk_size).min(state.input.len());
            for (slot, byte) in buf.iter_mut().zip(state.input.drain(..count)) {
                *slot = byte;
            }
            count
        };

        if count == 0 && !self.is_exhausted() && !self.idle_delay.is_zero() {
            std::thread::sleep(self.idle_delay);
        }
        Ok(count)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.output_closed {
            return Err(LinkError::transport(&self.name, ErrorKind::BrokenPipe.into()));
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(self.clone()))
    }

    fn is_exhausted(&self) -> bool {
        let state = self.lock();
        state.input_closed && state.input.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::read_up_to;

    #[test]
    fn reads_in_chunks_and_exhausts() {
        let mut transport = MemoryTransport::from_bytes("mem", [1, 2, 3, 4, 5]).with_chunk_size(2);
        let mut buf = [0u8; 4];

        assert_eq!(transport.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[1, 2]);
        assert!(!transport.is_exhausted());

        assert_eq!(read_up_to(&mut transport, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[3, 4, 5]);
        assert!(transport.is_exhausted());
        assert_eq!(transport.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn clones_share_state() {
        let transport = MemoryTransport::new("mem").with_idle_delay(Duration::ZERO);
        let mut writer = transport.try_clone().unwrap();
        writer.write_all(&[0xAA, 0xBB]).unwrap();
        assert_eq!(transport.written(), vec![0xAA, 0xBB]);

        transport.close_output();
        assert!(writer.write_all(&[0x01]).is_err());
    }

    #[test]
    fn injected_failure_surfaces_once() {
        let mut transport = MemoryTransport::new("mem").with_idle_delay(Duration::ZERO);
        transport.fail_next_read(ErrorKind::BrokenPipe);
        let mut buf = [0u8; 1];
        assert!(matches!(transport.read(&mut buf), Err(LinkError::Transport { .. })));
        assert_eq!(transport.read(&mut buf).unwrap(), 0);
    }
}
