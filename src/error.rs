//! Error types for the serial telemetry link.
//!
//! Errors fall into two groups. Recoverable faults (framing, decode, unknown type) are
//! handled inside the frame reader and the decoders: they are logged, counted in
//! [`LinkStats`](crate::LinkStats) and never reach the consumer. Transport faults are the
//! only errors that cross the core boundary.
//!
//! ## Error Categories
//!
//! - **Transport Errors**: Port open/read/write failures
//! - **Framing Errors**: Checksum, footer or length mismatches
//! - **Decode Errors**: Malformed payloads for a recognised packet type
//! - **Handshake Errors**: No device answered with the expected header
//! - **Configuration Errors**: Invalid or unreadable session configuration
//! - **Stall Errors**: The link stopped delivering data and the session was closed
//!
//! ## Recovery
//!
//! ```rust
//! use nonvision::LinkError;
//!
//! let error = LinkError::framing("footer mismatch");
//! assert!(error.is_recoverable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::types::DeviceFamily;

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for link operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("Transport failure on {port}")]
    Transport {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Framing error: {reason}")]
    Framing { reason: String },

    #[error("Malformed payload for packet type {packet_type:#04x}: {reason}")]
    Decode { packet_type: u8, reason: String },

    #[error("Unsupported packet type {packet_type:#04x}")]
    UnknownType { packet_type: u8 },

    #[error("Cannot encode frame: {reason}")]
    Encode { reason: String },

    #[error("No {family} device found after {attempts} scan(s)")]
    DeviceNotFound { family: DeviceFamily, attempts: u32 },

    #[error("Configuration error: {reason}")]
    Config {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("No data received for {idle:?}")]
    Stalled { idle: Duration },
}

impl LinkError {
    /// Returns whether the link can keep running after this error.
    ///
    /// Recoverable errors trigger resynchronisation or drop a single record.
    pub fn is_recoverable(&self) -> bool {
        match self {
            LinkError::Framing { .. } => true,
            LinkError::Decode { .. } => true,
            LinkError::UnknownType { .. } => true,
            LinkError::Timeout { .. } => true,
            LinkError::Transport { .. } => false,
            LinkError::Encode { .. } => false,
            LinkError::DeviceNotFound { .. } => false,
            LinkError::Config { .. } => false,
            LinkError::Stalled { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LinkError::Transport { .. } => vec![
                "Check the USB cable and that the device is powered",
                "Verify no other program holds the serial port open",
                "Reconnect and restart the session",
            ],
            LinkError::Framing { .. } | LinkError::UnknownType { .. } => vec![
                "Verify the baud rate matches the device family",
                "Check for electrical noise on the serial line",
            ],
            LinkError::Decode { .. } => vec![
                "Check that device firmware matches the expected packet catalogue",
                "Capture the raw stream with `nonvision record` for inspection",
            ],
            LinkError::Encode { .. } => vec!["Keep command payloads at or below 255 bytes"],
            LinkError::DeviceNotFound { .. } => vec![
                "Ensure the device is connected and enumerated by the OS",
                "Select the other device family if the sensors are swapped",
                "Pass an explicit port in the session configuration",
            ],
            LinkError::Config { .. } => vec![
                "Check the YAML syntax of the configuration file",
                "Rotation must be one of 0, 90, 180 or 270",
            ],
            LinkError::Timeout { .. } => vec![
                "Increase the join timeout",
                "Lower the transport read timeout",
            ],
            LinkError::Stalled { .. } => vec![
                "Check that the device is still connected and streaming",
                "Raise idle_timeout_ms if the device pauses between frames",
            ],
        }
    }

    /// Helper constructor for transport errors with port context.
    pub fn transport(port: impl Into<String>, source: std::io::Error) -> Self {
        LinkError::Transport { port: port.into(), source }
    }

    /// Helper constructor for framing errors.
    pub fn framing(reason: impl Into<String>) -> Self {
        LinkError::Framing { reason: reason.into() }
    }

    /// Helper constructor for decode errors.
    pub fn decode(packet_type: u8, reason: impl Into<String>) -> Self {
        LinkError::Decode { packet_type, reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        LinkError::Config { reason: reason.into(), source: None }
    }

    /// Helper constructor for configuration errors with source.
    pub fn config_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        LinkError::Config { reason: reason.into(), source: Some(source) }
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Transport { port: "<unknown>".to_string(), source: err }
    }
}

impl From<serialport::Error> for LinkError {
    fn from(err: serialport::Error) -> Self {
        let port = "<serial>".to_string();
        LinkError::Transport { port, source: err.into() }
    }
}
