//! Provider trait for telemetry sources

use crate::Result;
use crate::types::{DeviceFamily, TelemetryRecord};

/// Trait for telemetry sources
///
/// A provider turns whatever it reads from into decoded records. It runs on the
/// reader thread and may block for at most one transport read timeout per call,
/// so the driver can observe cancellation between calls.
pub trait Provider: Send + 'static {
    /// Get the records decoded from the next frame
    ///
    /// Returns:
    /// - `Ok(Some(records))` - Records from one frame, possibly empty when the
    ///   read timed out or the frame decoded to nothing
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - Transport failure
    fn next_records(&mut self) -> Result<Option<Vec<TelemetryRecord>>>;

    /// Device family this provider decodes
    fn family(&self) -> DeviceFamily;
}
