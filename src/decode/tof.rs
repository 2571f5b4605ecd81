//! ToF payload decoders

use crate::types::{DistanceGrid, Grid, InOutCount, PersonInfo, PersonState, TelemetryRecord};

const DISTANCE_BYTES: usize = 128;
const PERSON_RECORD_LEN: usize = 5;

/// `0xA3`: 64 big-endian millimetre readings, row-major.
///
/// Any length other than 128 bytes yields nothing.
pub fn decode_distances(data: &[u8]) -> Option<DistanceGrid> {
    if data.len() != DISTANCE_BYTES {
        return None;
    }
    let cells = data.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
    Grid::from_cells(8, 8, cells)
}

/// `0xA4`: cumulative entered/exited counters. Short payloads read as zero.
pub fn decode_in_out(data: &[u8]) -> InOutCount {
    match data {
        [e_hi, e_lo, x_hi, x_lo, ..] => InOutCount {
            entered: u16::from_be_bytes([*e_hi, *e_lo]),
            exited: u16::from_be_bytes([*x_hi, *x_lo]),
        },
        _ => InOutCount::default(),
    }
}

/// `0xA5`: count byte followed by `{state, x, y, sec_hi, sec_lo}` records.
///
/// A payload too short for the declared count yields an empty list.
pub fn decode_person_info(data: &[u8]) -> Vec<PersonInfo> {
    let Some((&count, records)) = data.split_first() else {
        return Vec::new();
    };
    let count = count as usize;
    if records.len() < count * PERSON_RECORD_LEN {
        return Vec::new();
    }

    records
        .chunks_exact(PERSON_RECORD_LEN)
        .take(count)
        .enumerate()
        .map(|(i, r)| PersonInfo {
            id: (i + 1) as u8,
            state: PersonState::from_code(r[0]),
            x: r[1],
            y: r[2],
            seconds: u16::from_be_bytes([r[3], r[4]]),
        })
        .collect()
}

/// `0xA6`: first byte `0x01` means calibrating.
pub fn decode_calibrating(data: &[u8]) -> bool {
    data.first() == Some(&0x01)
}

/// Decode one single-record ToF type (`0xA3..=0xA6`), shared with bundle sections.
pub(crate) fn decode_single(packet_type: u8, data: &[u8]) -> Option<TelemetryRecord> {
    match packet_type {
        0xA3 => decode_distances(data).map(TelemetryRecord::Distances),
        0xA4 => Some(TelemetryRecord::InOut(decode_in_out(data))),
        0xA5 => Some(TelemetryRecord::PersonInfo(decode_person_info(data))),
        0xA6 => Some(TelemetryRecord::Calibrating(decode_calibrating(data))),
        _ => None,
    }
}
