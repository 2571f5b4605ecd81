//! Payload decoders.
//!
//! Every decoder is a pure, total function over the payload bytes. Malformed
//! payloads produce no record rather than a partial one; the only decode
//! failure reported as an error is a thermal image of the wrong size.
//!
//! | Family  | Type   | Record                 |
//! |---------|--------|------------------------|
//! | ToF     | `0xA3` | `Distances` if 128 B   |
//! | ToF     | `0xA4` | `InOut`                |
//! | ToF     | `0xA5` | `PersonInfo`           |
//! | ToF     | `0xA6` | `Calibrating`          |
//! | ToF     | `0xAF` | bundle of the above    |
//! | Thermal | `0xA2` | `ThermalRaw`           |
//! | Thermal | `0xA4` | `PeopleCount`          |
//! | Thermal | `0xA5` | `BedBox` if ≥ 4 B      |
//! | Thermal | `0xA6` | `Calibrating(true)`    |
//! | Thermal | `0xA7` | `ActiveTracks`         |

mod bundle;
mod thermal;
mod tof;

pub use bundle::decode_bundle;
pub use thermal::{decode_active_tracks, decode_bed_box, decode_people_count, decode_thermal_raw};
pub use tof::{decode_calibrating, decode_distances, decode_in_out, decode_person_info};

use crate::types::{DeviceFamily, RawFrame, TelemetryRecord};
use crate::{LinkError, Result};

/// Decode one frame into zero or more records, in wire order.
pub fn decode_frame(family: DeviceFamily, frame: &RawFrame) -> Result<Vec<TelemetryRecord>> {
    let data = frame.payload.as_slice();
    let records = match (family, frame.packet_type) {
        (DeviceFamily::Tof, 0xAF) => decode_bundle(data),
        (DeviceFamily::Tof, t @ 0xA3..=0xA6) => tof::decode_single(t, data).into_iter().collect(),
        (DeviceFamily::Thermal, 0xA2) => vec![TelemetryRecord::ThermalRaw(decode_thermal_raw(data)?)],
        (DeviceFamily::Thermal, 0xA4) => vec![TelemetryRecord::PeopleCount(decode_people_count(data))],
        (DeviceFamily::Thermal, 0xA5) => {
            decode_bed_box(data).map(TelemetryRecord::BedBox).into_iter().collect()
        }
        (DeviceFamily::Thermal, 0xA6) => vec![TelemetryRecord::Calibrating(true)],
        (DeviceFamily::Thermal, 0xA7) => {
            decode_active_tracks(data).map(TelemetryRecord::ActiveTracks).into_iter().collect()
        }
        (_, packet_type) => return Err(LinkError::UnknownType { packet_type }),
    };
    Ok(records)
}
