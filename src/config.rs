//! Session configuration
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```yaml
//! family: thermal
//! port: /dev/ttyUSB0        # omit to scan for the device
//! read_timeout_ms: 500
//! buffer_capacity: 20       # defaults per family
//! idle_timeout_ms: 5000     # close the session after this long without data
//! orientation:
//!   rotation: 90
//!   mirror: true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::orientation::Orientation;
use crate::types::{DEFAULT_READ_TIMEOUT, DeviceFamily};
use crate::{LinkError, Result};

/// Configuration for one telemetry session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Sensor family to talk to
    pub family: DeviceFamily,
    /// Serial port name; `None` runs the handshake scan
    pub port: Option<String>,
    /// Override the family baud rate
    pub baud_rate: Option<u32>,
    /// Serial read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Bytes examined per port during the handshake scan
    pub scan_byte_budget: usize,
    /// Wait after a role swap before rescanning, in milliseconds
    pub settle_delay_ms: u64,
    /// Override the family buffer capacity
    pub buffer_capacity: Option<usize>,
    /// Initial display orientation
    pub orientation: Orientation,
    /// How long shutdown waits for the reader thread, in milliseconds
    pub join_timeout_ms: u64,
    /// The reader stops after this long without a decoded record, in milliseconds
    pub idle_timeout_ms: u64,
    /// Start with bed tracking enabled (thermal)
    pub bed_tracking: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            family: DeviceFamily::Tof,
            port: None,
            baud_rate: None,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            scan_byte_budget: 200,
            settle_delay_ms: 3000,
            buffer_capacity: None,
            orientation: Orientation::default(),
            join_timeout_ms: 1000,
            idle_timeout_ms: 5000,
            bed_tracking: false,
        }
    }
}

impl SessionConfig {
    /// Defaults for `family`.
    pub fn for_family(family: DeviceFamily) -> Self {
        Self { family, ..Self::default() }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| LinkError::config_with_source("Session YAML deserialization failed", Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            LinkError::config_with_source(format!("Cannot read {}", path.display()), Box::new(e))
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        debug!(path = %path.display(), family = %config.family, "Loaded session config");
        Ok(config)
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| LinkError::config_with_source("Session YAML serialization failed", Box::new(e)))
    }

    /// Reject values the link cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == Some(0) {
            return Err(LinkError::config("baud_rate must be positive"));
        }
        if self.read_timeout_ms == 0 {
            return Err(LinkError::config("read_timeout_ms must be positive"));
        }
        if self.scan_byte_budget == 0 {
            return Err(LinkError::config("scan_byte_budget must be positive"));
        }
        if self.idle_timeout_ms == 0 {
            return Err(LinkError::config("idle_timeout_ms must be positive"));
        }
        if self.buffer_capacity == Some(0) {
            return Err(LinkError::config("buffer_capacity must be positive"));
        }
        Ok(())
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate.unwrap_or(self.family.baud_rate())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity.unwrap_or(self.family.buffer_capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Rotation;

    #[test]
    fn empty_document_uses_defaults() {
        let config = SessionConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.baud_rate(), 115_200);
        assert_eq!(config.buffer_capacity(), 1000);
        assert_eq!(config.read_timeout(), Duration::from_millis(500));
        assert_eq!(config.settle_delay(), Duration::from_secs(3));
        assert_eq!(config.idle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn thermal_config_with_orientation() {
        let yaml = "family: thermal\nport: /dev/ttyACM0\norientation:\n  rotation: 270\n  mirror: true\n";
        let config = SessionConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.family, DeviceFamily::Thermal);
        assert_eq!(config.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.orientation, Orientation::new(Rotation::Deg270, true));
        assert_eq!(config.baud_rate(), 921_600);
        assert_eq!(config.buffer_capacity(), 20);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            SessionConfig::from_yaml_str("orientation:\n  rotation: 45\n"),
            Err(LinkError::Config { .. })
        ));
        assert!(SessionConfig::from_yaml_str("read_timeout_ms: 0").is_err());
        assert!(SessionConfig::from_yaml_str("buffer_capacity: 0").is_err());
        assert!(SessionConfig::from_yaml_str("idle_timeout_ms: 0").is_err());
        assert!(SessionConfig::from_yaml_str("colour: blue").is_err());
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = SessionConfig::for_family(DeviceFamily::Thermal);
        config.orientation = Orientation::new(Rotation::Deg90, false);
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("rotation: 90"));
        assert_eq!(SessionConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
