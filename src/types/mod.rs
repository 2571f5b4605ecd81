//! Core types for decoded telemetry.
//!
//! ## Architecture
//!
//! - [`DeviceFamily`] is the registry of per-family framing constants
//! - [`RawFrame`] is a validated `(type, payload)` pair straight off the wire
//! - [`TelemetryRecord`] is the tagged union every decoder produces
//! - [`Grid`] holds the row-major distance and thermal images
//! - [`PersonState`] / [`TrackState`] map device state codes to labels
//!
//! ## Usage Example
//!
//! ```rust
//! use nonvision::types::{DeviceFamily, RecordKind, TelemetryRecord, InOutCount};
//!
//! let record = TelemetryRecord::InOut(InOutCount { entered: 4, exited: 1 });
//! assert_eq!(record.kind(), RecordKind::InOut);
//! assert_eq!(&DeviceFamily::Tof.header(), b"FUT0");
//! ```

mod family;
mod frame;
mod grid;
mod record;
mod state;

// Re-export all public types
pub use family::{DEFAULT_READ_TIMEOUT, DeviceFamily, FOOTER_LEN, HEADER_LEN, LengthWidth};
pub use frame::RawFrame;
pub use grid::Grid;
pub use record::{
    BedBox, DistanceGrid, InOutCount, PeopleCount, PersonInfo, RecordKind, TelemetryRecord,
    ThermalGrid, TrackBox,
};
pub use state::{PersonState, TrackState};

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    prop_compose! {
        fn arb_grid()(rows in 1..32usize, cols in 1..32usize)
            (cells in prop::collection::vec(any::<u16>(), rows * cols), rows in Just(rows), cols in Just(cols))
            -> Grid<u16> {
            Grid::from_cells(rows, cols, cells).unwrap()
        }
    }

    proptest! {
        #[test]
        fn prop_grid_rows_cover_all_cells(grid in arb_grid()) {
            let flattened: Vec<u16> = grid.iter_rows().flatten().copied().collect();
            prop_assert_eq!(flattened.as_slice(), grid.cells());
            prop_assert_eq!(grid.iter_rows().count(), grid.rows());
        }

        #[test]
        fn prop_record_kind_is_stable(entered in any::<u16>(), exited in any::<u16>()) {
            let record = TelemetryRecord::InOut(InOutCount { entered, exited });
            prop_assert_eq!(record.clone().kind(), RecordKind::InOut);
            prop_assert_eq!(record, TelemetryRecord::InOut(InOutCount { entered, exited }));
        }
    }
}
