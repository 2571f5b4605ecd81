//! ToF bundle demultiplexer (`0xAF`)
//!
//! A bundle payload is a run of self-delimited sections:
//!
//! ```text
//! type(1) | len(1) | data(len) | end(1) == type
//! ```

use tracing::debug;

use super::tof::decode_single;
use crate::types::TelemetryRecord;

/// Decode every well-formed section in order.
///
/// Decoding stops at the first section that would run past the buffer or whose
/// end marker disagrees with its type; sections already decoded are kept.
/// Unknown section types are skipped.
pub fn decode_bundle(data: &[u8]) -> Vec<TelemetryRecord> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset + 3 <= data.len() {
        let section_type = data[offset];
        let section_len = data[offset + 1] as usize;
        let data_start = offset + 2;
        let data_end = data_start + section_len;

        if data_end >= data.len() {
            debug!(section_type, offset, "Bundle section overruns payload");
            break;
        }
        if data[data_end] != section_type {
            debug!(section_type, end = data[data_end], "Bundle end marker mismatch");
            break;
        }

        match decode_single(section_type, &data[data_start..data_end]) {
            Some(record) => records.push(record),
            None => debug!(section_type, len = section_len, "Skipping bundle section"),
        }
        offset = data_end + 1;
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{bundle_section, distance_payload};
    use crate::types::{InOutCount, RecordKind};

    #[test]
    fn sections_decode_in_order() {
        let mut payload = bundle_section(0xA3, &distance_payload(|_| 1000));
        payload.extend(bundle_section(0xA4, &[0, 2, 0, 1]));

        let records = decode_bundle(&payload);
        let kinds: Vec<_> = records.iter().map(TelemetryRecord::kind).collect();
        assert_eq!(kinds, vec![RecordKind::Distances, RecordKind::InOut]);
        assert_eq!(records[1], TelemetryRecord::InOut(InOutCount { entered: 2, exited: 1 }));
    }

    #[test]
    fn bad_end_marker_keeps_earlier_sections() {
        let mut payload = bundle_section(0xA3, &distance_payload(|_| 1000));
        let mut second = bundle_section(0xA4, &[0, 2, 0, 1]);
        let last = second.len() - 1;
        second[last] = 0x00;
        payload.extend(second);

        let records = decode_bundle(&payload);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind(), RecordKind::Distances);
    }

    #[test]
    fn unknown_sections_are_skipped() {
        let mut payload = bundle_section(0x42, &[9, 9]);
        payload.extend(bundle_section(0xA6, &[1]));

        assert_eq!(decode_bundle(&payload), vec![TelemetryRecord::Calibrating(true)]);
    }

    #[test]
    fn truncated_section_stops_decoding() {
        let mut payload = bundle_section(0xA6, &[0]);
        payload.extend([0xA4, 4, 0, 1]);

        assert_eq!(decode_bundle(&payload), vec![TelemetryRecord::Calibrating(false)]);
        assert!(decode_bundle(&[0xA6, 0]).is_empty());
    }

    #[test]
    fn short_distance_section_yields_nothing() {
        let payload = bundle_section(0xA3, &[0; 10]);
        assert!(decode_bundle(&payload).is_empty());
    }
}
