//! Device provider: frame reader plus payload decoders over any transport

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::Result;
use crate::decode::decode_frame;
use crate::protocol::FrameReader;
use crate::provider::Provider;
use crate::stats::LinkStats;
use crate::transport::Transport;
use crate::types::{DeviceFamily, TelemetryRecord};

/// Provider that reads frames from a transport and decodes them.
///
/// Works the same over a live serial port and a replayed capture; the capture
/// ends the stream once it is exhausted.
pub struct DeviceProvider {
    reader: FrameReader<Box<dyn Transport>>,
    stats: Arc<LinkStats>,
}

impl DeviceProvider {
    /// Create a new provider reporting into `stats`
    pub fn new(transport: Box<dyn Transport>, family: DeviceFamily, stats: Arc<LinkStats>) -> Self {
        info!(port = transport.name(), %family, "Device provider created");
        let reader = FrameReader::with_stats(transport, family, Arc::clone(&stats));
        Self { reader, stats }
    }
}

impl Provider for DeviceProvider {
    fn next_records(&mut self) -> Result<Option<Vec<TelemetryRecord>>> {
        let Some(frame) = self.reader.read_frame()? else {
            if self.reader.transport().is_exhausted() {
                debug!(port = self.reader.transport().name(), "Transport exhausted");
                return Ok(None);
            }
            return Ok(Some(Vec::new()));
        };

        match decode_frame(self.reader.family(), &frame) {
            Ok(records) => Ok(Some(records)),
            Err(e) => {
                self.stats.decode_failure();
                warn!(
                    family = %self.reader.family(),
                    packet_type = frame.packet_type,
                    len = frame.len(),
                    error = %e,
                    "Dropping undecodable frame"
                );
                Ok(Some(Vec::new()))
            }
        }
    }

    fn family(&self) -> DeviceFamily {
        self.reader.family()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{thermal_frame, thermal_payload, tof_frame};
    use crate::transport::MemoryTransport;
    use crate::types::{InOutCount, RecordKind};

    fn provider(bytes: Vec<u8>, family: DeviceFamily) -> DeviceProvider {
        let transport = MemoryTransport::from_bytes("capture", bytes);
        DeviceProvider::new(Box::new(transport), family, Arc::new(LinkStats::new()))
    }

    #[test]
    fn decodes_until_exhausted() {
        let mut bytes = tof_frame(0xA4, &[0, 5, 0, 3]);
        bytes.extend(tof_frame(0xA6, &[1]));
        let mut provider = provider(bytes, DeviceFamily::Tof);

        assert_eq!(
            provider.next_records().unwrap(),
            Some(vec![TelemetryRecord::InOut(InOutCount { entered: 5, exited: 3 })])
        );
        assert_eq!(provider.next_records().unwrap(), Some(vec![TelemetryRecord::Calibrating(true)]));
        assert_eq!(provider.next_records().unwrap(), None);
    }

    #[test]
    fn bad_thermal_image_is_counted_and_skipped() {
        let mut bytes = thermal_frame(0xA2, &[0u8; 100]);
        bytes.extend(thermal_frame(0xA2, &thermal_payload(|_| 21.5)));
        let mut provider = provider(bytes, DeviceFamily::Thermal);

        assert_eq!(provider.next_records().unwrap(), Some(vec![]));
        let records = provider.next_records().unwrap().unwrap();
        assert_eq!(records[0].kind(), RecordKind::ThermalRaw);
        assert_eq!(provider.stats.snapshot().decode_failures, 1);
    }

    #[test]
    fn idle_live_transport_yields_empty_batches() {
        let transport = MemoryTransport::new("idle").with_idle_delay(std::time::Duration::ZERO);
        let mut provider =
            DeviceProvider::new(Box::new(transport), DeviceFamily::Tof, Arc::new(LinkStats::new()));
        assert_eq!(provider.next_records().unwrap(), Some(vec![]));
    }
}
