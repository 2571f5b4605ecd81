//! Serial telemetry for ToF and thermal occupancy sensors.
//!
//! Nonvision reads the framed byte stream an embedded sensor sends over a serial
//! link, resynchronises on noise, decodes each frame into typed records and hands
//! them from a dedicated reader thread to a periodic consumer.
//!
//! # Features
//!
//! - **Two device families**: 8x8 time-of-flight (`FUT0`/`END0`, 115200 baud) and
//!   24x32 thermal (`FUT1`/`END1`, 921600 baud)
//! - **Role detection**: port scan with automatic role swap
//! - **Non-blocking hand-off**: bounded buffer with oldest-first eviction
//! - **Display geometry**: rotation and mirroring for grids, points and boxes
//! - **Capture replay**: recorded byte streams go through the same pipeline
//!
//! ## Example (live device)
//!
//! ```rust,no_run
//! use nonvision::{Nonvision, SessionConfig, DeviceFamily};
//! use futures::StreamExt;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> nonvision::Result<()> {
//!     let session = Nonvision::connect(SessionConfig::for_family(DeviceFamily::Tof)).await?;
//!     let mut snapshots = session.snapshots(Duration::from_millis(100));
//!
//!     while let Some(snapshot) = snapshots.next().await {
//!         println!("{}", session.view(&snapshot).message());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
pub mod decode;
mod error;
pub mod orientation;
pub mod protocol;
pub mod stats;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod transport;
pub mod types;

// Reader thread and consumer side
pub mod buffer;
pub mod driver;
pub mod handshake;
pub mod provider;
pub mod providers;
pub mod session;
pub mod snapshot;
pub mod stream;
pub mod view;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use buffer::{Batch, TelemetryBuffer};
pub use config::SessionConfig;
pub use orientation::{Orientation, Rotation};
pub use protocol::Command;
pub use session::{Session, SessionContext};
pub use snapshot::Snapshot;
pub use stats::{LinkStats, LinkStatsSnapshot};
pub use view::DisplayView;

use std::path::Path;
use tracing::info;

use handshake::{Handshake, SystemPorts};
use transport::{MemoryTransport, SerialSettings, SerialTransport};

/// Unified entry point for sensor sessions.
///
/// # Examples
///
/// ## Fixed port
/// ```rust,no_run
/// use nonvision::{Nonvision, SessionConfig, DeviceFamily};
///
/// let session = Nonvision::open_port("/dev/ttyUSB0", SessionConfig::for_family(DeviceFamily::Thermal))?;
/// # Ok::<(), nonvision::LinkError>(())
/// ```
///
/// ## Capture replay
/// ```rust,no_run
/// use nonvision::{Nonvision, SessionConfig};
///
/// let session = Nonvision::replay("capture.bin", SessionConfig::default())?;
/// # Ok::<(), nonvision::LinkError>(())
/// ```
pub struct Nonvision;

impl Nonvision {
    /// Connect to a live device.
    ///
    /// Uses `config.port` when set; otherwise scans every serial port for the
    /// configured family, swapping a device's role if it answers as the other
    /// family. The scan runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - No port answers with the family header (`DeviceNotFound`)
    /// - The port cannot be opened
    pub async fn connect(config: SessionConfig) -> Result<Session> {
        config.validate()?;

        let port = match &config.port {
            Some(port) => port.clone(),
            None => {
                let handshake = Handshake::from_config(&config);
                let (family, baud_rate) = (config.family, config.baud_rate());
                info!(%family, baud_rate, "Scanning serial ports");
                tokio::task::spawn_blocking(move || handshake.detect_port(&SystemPorts, family, baud_rate))
                    .await
                    .map_err(|e| LinkError::transport("<handshake>", std::io::Error::other(e)))??
            }
        };

        Self::open_port(&port, config)
    }

    /// Open a known serial port without scanning.
    pub fn open_port(port: &str, config: SessionConfig) -> Result<Session> {
        let settings = SerialSettings { baud_rate: config.baud_rate(), read_timeout: config.read_timeout() };
        let transport = SerialTransport::open(port, &settings)?;
        Session::start(Box::new(transport), &config)
    }

    /// Replay a raw capture through the full pipeline.
    ///
    /// The session's reader finishes once the capture is exhausted.
    pub fn replay<P: AsRef<Path>>(path: P, config: SessionConfig) -> Result<Session> {
        let transport = MemoryTransport::open_capture(path)?;
        Session::start(Box::new(transport), &config)
    }
}
