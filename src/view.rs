//! Display-ready views of a snapshot
//!
//! A view applies the session orientation to every grid, point and box, and the
//! per-family presentation rules:
//!
//! - ToF: the distance image is shown only while the last batch carried one
//!   (background view on); people and counters come from the last batch only
//! - Thermal: track states are remapped for bed tracking, degenerate boxes are
//!   hidden and at most [`MAX_DISPLAYED_TRACKS`] tracks are shown

use serde::Serialize;

use crate::orientation::{DisplayRect, Orientation};
use crate::snapshot::{CalibrationStatus, Snapshot};
use crate::types::{
    DeviceFamily, DistanceGrid, InOutCount, PersonInfo, PersonState, RecordKind, ThermalGrid,
    TrackState,
};

/// Upper bound on track boxes in one view.
pub const MAX_DISPLAYED_TRACKS: usize = 20;

/// A tracked person in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayPerson {
    pub id: u8,
    pub state: PersonState,
    pub x: i32,
    pub y: i32,
    pub seconds: u16,
}

impl DisplayPerson {
    /// `P{id}, {state}, Loc:({x}, {y}), Dur: {duration}` status line.
    pub fn status_line(&self) -> String {
        let info = PersonInfo { id: self.id, state: self.state, x: 0, y: 0, seconds: self.seconds };
        format!(
            "P{}, {}, Loc:({}, {}), Dur: {}",
            self.id,
            self.state.label(),
            self.x,
            self.y,
            info.duration_label()
        )
    }
}

/// A track box in display coordinates with its displayed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayTrack {
    pub rect: DisplayRect,
    pub state: TrackState,
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayView {
    pub family: DeviceFamily,
    pub orientation: Orientation,
    /// ToF background distance image, oriented
    pub distances: Option<DistanceGrid>,
    /// Thermal image, oriented
    pub thermal: Option<ThermalGrid>,
    pub in_out: Option<InOutCount>,
    pub persons: Vec<DisplayPerson>,
    pub people_total: Option<u8>,
    pub bed: Option<DisplayRect>,
    pub tracks: Vec<DisplayTrack>,
    pub calibration: CalibrationStatus,
}

impl DisplayView {
    /// Build a view of `snapshot` for `family`.
    pub fn build(
        family: DeviceFamily,
        snapshot: &Snapshot,
        orientation: Orientation,
        bed_tracking: bool,
    ) -> Self {
        let (rows, cols) = family.grid_dims();
        let mut view = Self {
            family,
            orientation,
            distances: None,
            thermal: None,
            in_out: None,
            persons: Vec::new(),
            people_total: None,
            bed: None,
            tracks: Vec::new(),
            calibration: snapshot.calibration(),
        };

        match family {
            DeviceFamily::Tof => {
                if snapshot.updated(RecordKind::Distances) {
                    view.distances = snapshot.distances.as_ref().map(|g| orientation.transform_grid(g));
                }
                if snapshot.updated(RecordKind::InOut) {
                    view.in_out = snapshot.in_out;
                }
                if snapshot.updated(RecordKind::PersonInfo) {
                    let people = snapshot.persons.as_deref().unwrap_or_default();
                    view.persons = people
                        .iter()
                        .map(|p| {
                            let (x, y) = orientation.map_point(p.x.into(), p.y.into(), rows, cols);
                            DisplayPerson { id: p.id, state: p.state, x, y, seconds: p.seconds }
                        })
                        .collect();
                }
            }
            DeviceFamily::Thermal => {
                if snapshot.status_kind() == Some(RecordKind::PeopleCount) {
                    view.calibration = CalibrationStatus::Idle;
                }
                view.thermal = snapshot.thermal.as_ref().map(|g| orientation.transform_grid(g));
                view.people_total = snapshot.people_count.as_ref().and_then(|c| c.total());
                view.bed = snapshot.bed_box.map(|b| {
                    orientation.map_box((b.x1.into(), b.y1.into()), (b.x2.into(), b.y2.into()), rows, cols)
                });
                view.tracks = snapshot
                    .tracks
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .take(MAX_DISPLAYED_TRACKS)
                    .map(|t| DisplayTrack {
                        rect: orientation.map_box((t.x1.into(), t.y1.into()), (t.x2.into(), t.y2.into()), rows, cols),
                        state: t.state.displayed(bed_tracking),
                    })
                    .filter(|t| t.rect.x_hi > t.rect.x_lo && t.rect.y_hi > t.rect.y_lo)
                    .collect();
            }
        }

        view
    }

    /// Whether the ToF background distance image is being streamed.
    pub fn background_view(&self) -> bool {
        self.distances.is_some()
    }

    /// Status text for the message area.
    ///
    /// Calibration progress takes precedence over people information.
    pub fn message(&self) -> String {
        match self.calibration {
            CalibrationStatus::InProgress { dots } => {
                let dots = dots as usize;
                format!("Background initializing{}{}", ".".repeat(dots), " ".repeat(3 - dots))
            }
            CalibrationStatus::Done { .. } if self.family == DeviceFamily::Tof => {
                "Background Calibration Done!".to_string()
            }
            _ => match self.family {
                DeviceFamily::Tof => {
                    let mut lines = Vec::new();
                    if let Some(count) = self.in_out {
                        lines.push(format!(
                            "{} People In: {}  Out: {}",
                            self.persons.len(),
                            count.entered,
                            count.exited
                        ));
                    }
                    lines.extend(self.persons.iter().take(2).map(DisplayPerson::status_line));
                    lines.join("\n")
                }
                DeviceFamily::Thermal => {
                    self.people_total.map(|n| format!("Total people: {n}")).unwrap_or_default()
                }
            },
        }
    }
}
