//! Thermal payload decoders

use crate::types::{BedBox, Grid, PeopleCount, ThermalGrid, TrackBox, TrackState};
use crate::{LinkError, Result};

const THERMAL_ROWS: usize = 24;
const THERMAL_COLS: usize = 32;
const THERMAL_BYTES: usize = THERMAL_ROWS * THERMAL_COLS * 4;
const TRACK_RECORD_LEN: usize = 5;

/// `0xA2`: 768 little-endian `f32` temperatures, row-major.
pub fn decode_thermal_raw(data: &[u8]) -> Result<ThermalGrid> {
    if data.len() != THERMAL_BYTES {
        return Err(LinkError::decode(
            0xA2,
            format!("expected {THERMAL_BYTES} bytes, got {}", data.len()),
        ));
    }
    let cells = data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Grid::from_cells(THERMAL_ROWS, THERMAL_COLS, cells)
        .ok_or_else(|| LinkError::decode(0xA2, "grid dimension mismatch"))
}

/// `0xA4`: raw people-count bytes.
pub fn decode_people_count(data: &[u8]) -> PeopleCount {
    PeopleCount(data.to_vec())
}

/// `0xA5`: bed region as `(x1, x2, y1, y2)`.
pub fn decode_bed_box(data: &[u8]) -> Option<BedBox> {
    match data {
        [x1, x2, y1, y2, ..] => Some(BedBox { x1: *x1, x2: *x2, y1: *y1, y2: *y2 }),
        _ => None,
    }
}

/// `0xA7`: count byte followed by `(x1, y1, x2, y2, state)` records.
///
/// The payload must be exactly `1 + 5 * count` bytes.
pub fn decode_active_tracks(data: &[u8]) -> Option<Vec<TrackBox>> {
    let (&count, records) = data.split_first()?;
    if records.len() != count as usize * TRACK_RECORD_LEN {
        return None;
    }
    Some(
        records
            .chunks_exact(TRACK_RECORD_LEN)
            .map(|r| TrackBox { x1: r[0], y1: r[1], x2: r[2], y2: r[3], state: TrackState::from_code(r[4]) })
            .collect(),
    )
}
