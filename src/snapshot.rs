//! Consumer-side state folded from drained batches

use serde::Serialize;
use std::collections::BTreeSet;

use crate::buffer::Batch;
use crate::types::{
    BedBox, DistanceGrid, InOutCount, PeopleCount, PersonInfo, RecordKind, TelemetryRecord,
    ThermalGrid, TrackBox,
};

/// Drain cycles the "calibration done" notice stays up after calibration ends.
pub const CALIBRATION_DONE_CYCLES: u8 = 5;

/// Background calibration progress as seen by the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CalibrationStatus {
    #[default]
    Idle,
    /// Calibration running; `dots` cycles 0..=3 once per drain for a progress hint
    InProgress { dots: u8 },
    /// Calibration finished; the notice is shown for `remaining` more cycles
    Done { remaining: u8 },
}

/// Latest value of every record kind, plus what the last batch carried.
///
/// Folding applies "last write wins" per kind and leaves kinds absent from the
/// batch untouched. An empty batch changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub distances: Option<DistanceGrid>,
    pub in_out: Option<InOutCount>,
    pub persons: Option<Vec<PersonInfo>>,
    pub calibrating: Option<bool>,
    pub thermal: Option<ThermalGrid>,
    pub people_count: Option<PeopleCount>,
    pub bed_box: Option<BedBox>,
    pub tracks: Option<Vec<TrackBox>>,
    updated: BTreeSet<RecordKind>,
    status_kind: Option<RecordKind>,
    cycles: u64,
    calibration: CalibrationStatus,
    done_remaining: u8,
    dots: u8,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one drained batch into the snapshot.
    pub fn fold(&mut self, batch: &Batch) {
        if batch.is_empty() {
            return;
        }

        self.updated.clear();
        self.status_kind = None;
        for record in batch {
            self.updated.insert(record.kind());
            if matches!(record.kind(), RecordKind::Calibrating | RecordKind::PeopleCount) {
                self.status_kind = Some(record.kind());
            }
            match record {
                TelemetryRecord::Distances(grid) => self.distances = Some(grid.clone()),
                TelemetryRecord::InOut(count) => self.in_out = Some(*count),
                TelemetryRecord::PersonInfo(people) => self.persons = Some(people.clone()),
                TelemetryRecord::Calibrating(flag) => self.calibrating = Some(*flag),
                TelemetryRecord::ThermalRaw(grid) => self.thermal = Some(grid.clone()),
                TelemetryRecord::PeopleCount(count) => self.people_count = Some(count.clone()),
                TelemetryRecord::BedBox(bed) => self.bed_box = Some(*bed),
                TelemetryRecord::ActiveTracks(tracks) => self.tracks = Some(tracks.clone()),
            }
        }

        self.cycles += 1;
        self.advance_calibration(batch);
    }

    // A non-empty batch without a calibrating record means calibration is not running.
    fn advance_calibration(&mut self, batch: &Batch) {
        let calibrating =
            matches!(batch.latest(RecordKind::Calibrating), Some(TelemetryRecord::Calibrating(true)));

        self.calibration = if calibrating {
            self.dots = (self.dots + 1) % 4;
            self.done_remaining = CALIBRATION_DONE_CYCLES;
            CalibrationStatus::InProgress { dots: self.dots }
        } else if self.done_remaining > 0 {
            let remaining = self.done_remaining;
            self.done_remaining -= 1;
            CalibrationStatus::Done { remaining }
        } else {
            CalibrationStatus::Idle
        };
    }

    /// Whether the last folded batch carried a record of `kind`.
    pub fn updated(&self, kind: RecordKind) -> bool {
        self.updated.contains(&kind)
    }

    /// Kinds carried by the last folded batch.
    pub fn updated_in_last_fold(&self) -> impl Iterator<Item = RecordKind> + '_ {
        self.updated.iter().copied()
    }

    /// Whichever of `Calibrating` and `PeopleCount` came last in the last batch.
    pub fn status_kind(&self) -> Option<RecordKind> {
        self.status_kind
    }

    /// Number of non-empty batches folded so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn calibration(&self) -> CalibrationStatus {
        self.calibration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Grid;

    fn batch(records: Vec<TelemetryRecord>) -> Batch {
        Batch::new(records)
    }

    #[test]
    fn last_write_wins_and_absent_kinds_persist() {
        let mut snapshot = Snapshot::new();
        snapshot.fold(&batch(vec![
            TelemetryRecord::InOut(InOutCount { entered: 1, exited: 0 }),
            TelemetryRecord::Distances(Grid::filled(8, 8, 900)),
            TelemetryRecord::InOut(InOutCount { entered: 2, exited: 1 }),
        ]));
        assert_eq!(snapshot.in_out, Some(InOutCount { entered: 2, exited: 1 }));

        snapshot.fold(&batch(vec![TelemetryRecord::PersonInfo(vec![])]));
        assert!(snapshot.distances.is_some());
        assert!(snapshot.updated(RecordKind::PersonInfo));
        assert!(!snapshot.updated(RecordKind::Distances));
        assert_eq!(snapshot.cycles(), 2);
    }

    #[test]
    fn status_kind_follows_batch_order() {
        let mut snapshot = Snapshot::new();
        snapshot.fold(&batch(vec![
            TelemetryRecord::Calibrating(true),
            TelemetryRecord::PeopleCount(PeopleCount(vec![2])),
        ]));
        assert_eq!(snapshot.status_kind(), Some(RecordKind::PeopleCount));

        snapshot.fold(&batch(vec![TelemetryRecord::Distances(Grid::filled(8, 8, 1))]));
        assert_eq!(snapshot.status_kind(), None);
    }

    #[test]
    fn empty_batch_is_ignored() {
        let mut snapshot = Snapshot::new();
        snapshot.fold(&batch(vec![TelemetryRecord::Calibrating(false)]));
        let before = snapshot.clone();

        snapshot.fold(&Batch::default());
        assert_eq!(snapshot, before);
    }

    #[test]
    fn calibration_done_notice_lasts_five_cycles() {
        let mut snapshot = Snapshot::new();
        snapshot.fold(&batch(vec![TelemetryRecord::Calibrating(true)]));
        assert_eq!(snapshot.calibration(), CalibrationStatus::InProgress { dots: 1 });

        let mut shown = Vec::new();
        for _ in 0..7 {
            snapshot.fold(&batch(vec![TelemetryRecord::InOut(InOutCount::default())]));
            shown.push(snapshot.calibration());
        }

        let done: Vec<_> = (1..=5).rev().map(|remaining| CalibrationStatus::Done { remaining }).collect();
        assert_eq!(&shown[..5], done.as_slice());
        assert_eq!(shown[5], CalibrationStatus::Idle);
        assert_eq!(shown[6], CalibrationStatus::Idle);
    }

    #[test]
    fn progress_dots_wrap() {
        let mut snapshot = Snapshot::new();
        let mut dots = Vec::new();
        for _ in 0..5 {
            snapshot.fold(&batch(vec![TelemetryRecord::Calibrating(true)]));
            if let CalibrationStatus::InProgress { dots: d } = snapshot.calibration() {
                dots.push(d);
            }
        }
        assert_eq!(dots, vec![1, 2, 3, 0, 1]);
    }
}
