//! Decoded telemetry records

use serde::{Deserialize, Serialize};

use super::{Grid, PersonState, TrackState};

/// 8x8 ToF distance image in millimetres.
pub type DistanceGrid = Grid<u16>;

/// 24x32 thermal image in degrees Celsius.
pub type ThermalGrid = Grid<f32>;

/// Cumulative people counters since device boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InOutCount {
    pub entered: u16,
    pub exited: u16,
}

/// One person tracked by the ToF sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInfo {
    /// 1-based position in the report
    pub id: u8,
    pub state: PersonState,
    pub x: u8,
    pub y: u8,
    /// Time spent in the current state
    pub seconds: u16,
}

impl PersonInfo {
    /// Duration formatted as `"{h}h {m}m {s}s"`, or `"{m}m {s}s"` under an hour.
    pub fn duration_label(&self) -> String {
        let (hours, rem) = (self.seconds / 3600, self.seconds % 3600);
        let (minutes, seconds) = (rem / 60, rem % 60);
        if hours > 0 {
            format!("{hours}h {minutes}m {seconds}s")
        } else {
            format!("{minutes}m {seconds}s")
        }
    }
}

/// Raw people-count report from the thermal sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeopleCount(pub Vec<u8>);

impl PeopleCount {
    /// Total people in view, taken from the first byte.
    pub fn total(&self) -> Option<u8> {
        self.0.first().copied()
    }
}

/// Bed region in device-native grid units.
///
/// The device reports the x-pair before the y-pair, unlike every other box in
/// the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedBox {
    pub x1: u8,
    pub x2: u8,
    pub y1: u8,
    pub y2: u8,
}

impl BedBox {
    /// Wire order `[x1, x2, y1, y2]`.
    pub fn to_bytes(self) -> [u8; 4] {
        [self.x1, self.x2, self.y1, self.y2]
    }
}

/// Active track box from the thermal sensor, device-native coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackBox {
    pub x1: u8,
    pub y1: u8,
    pub x2: u8,
    pub y2: u8,
    pub state: TrackState,
}

/// A decoded telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryRecord {
    Distances(DistanceGrid),
    InOut(InOutCount),
    PersonInfo(Vec<PersonInfo>),
    Calibrating(bool),
    ThermalRaw(ThermalGrid),
    PeopleCount(PeopleCount),
    BedBox(BedBox),
    ActiveTracks(Vec<TrackBox>),
}

impl TelemetryRecord {
    /// Tag of this record.
    pub fn kind(&self) -> RecordKind {
        match self {
            TelemetryRecord::Distances(_) => RecordKind::Distances,
            TelemetryRecord::InOut(_) => RecordKind::InOut,
            TelemetryRecord::PersonInfo(_) => RecordKind::PersonInfo,
            TelemetryRecord::Calibrating(_) => RecordKind::Calibrating,
            TelemetryRecord::ThermalRaw(_) => RecordKind::ThermalRaw,
            TelemetryRecord::PeopleCount(_) => RecordKind::PeopleCount,
            TelemetryRecord::BedBox(_) => RecordKind::BedBox,
            TelemetryRecord::ActiveTracks(_) => RecordKind::ActiveTracks,
        }
    }
}

/// Record tag, one per [`TelemetryRecord`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Distances,
    InOut,
    PersonInfo,
    Calibrating,
    ThermalRaw,
    PeopleCount,
    BedBox,
    ActiveTracks,
}
