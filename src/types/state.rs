//! Person and track state classifications reported by the devices

use serde::{Deserialize, Serialize};

/// Posture of a person tracked by the ToF sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonState {
    None,
    LyingFloor,
    Sitting,
    Standing,
    FallingDown,
    Unknown(u8),
}

impl PersonState {
    /// Decode the wire code
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => PersonState::None,
            1 => PersonState::LyingFloor,
            2 => PersonState::Sitting,
            3 => PersonState::Standing,
            4 => PersonState::FallingDown,
            other => PersonState::Unknown(other),
        }
    }

    /// Wire code
    pub fn code(self) -> u8 {
        match self {
            PersonState::None => 0,
            PersonState::LyingFloor => 1,
            PersonState::Sitting => 2,
            PersonState::Standing => 3,
            PersonState::FallingDown => 4,
            PersonState::Unknown(code) => code,
        }
    }

    /// Human-readable label
    pub fn label(self) -> String {
        match self {
            PersonState::None => "None".to_string(),
            PersonState::LyingFloor => "Lying floor".to_string(),
            PersonState::Sitting => "Sitting".to_string(),
            PersonState::Standing => "Standing".to_string(),
            PersonState::FallingDown => "Falling Down!".to_string(),
            PersonState::Unknown(code) => format!("State:{code}"),
        }
    }

    /// Whether this state should raise an alert
    pub fn is_alarm(self) -> bool {
        matches!(self, PersonState::FallingDown)
    }
}

/// Classification of an active track box from the thermal sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackState {
    None,
    LyingBed,
    SittingBed,
    OnePerson,
    LyingFloor,
    MultiPerson,
    Noise,
    Unknown(u8),
}

impl TrackState {
    /// Decode the wire code
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => TrackState::None,
            1 => TrackState::LyingBed,
            2 => TrackState::SittingBed,
            3 => TrackState::OnePerson,
            4 => TrackState::LyingFloor,
            5 => TrackState::MultiPerson,
            6 => TrackState::Noise,
            other => TrackState::Unknown(other),
        }
    }

    /// Wire code
    pub fn code(self) -> u8 {
        match self {
            TrackState::None => 0,
            TrackState::LyingBed => 1,
            TrackState::SittingBed => 2,
            TrackState::OnePerson => 3,
            TrackState::LyingFloor => 4,
            TrackState::MultiPerson => 5,
            TrackState::Noise => 6,
            TrackState::Unknown(code) => code,
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            TrackState::None => "none",
            TrackState::LyingBed => "lying bed",
            TrackState::SittingBed => "sitting bed",
            TrackState::OnePerson => "1 person",
            TrackState::LyingFloor => "lying floor",
            TrackState::MultiPerson => "multi-person",
            TrackState::Noise => "noise",
            TrackState::Unknown(_) => "unknown",
        }
    }

    /// State to display given whether bed tracking is enabled.
    ///
    /// Bed-relative states only mean something once a bed box is tracked, so they
    /// collapse to [`TrackState::OnePerson`] otherwise. Lying on the floor always
    /// displays as a single person.
    pub fn displayed(self, bed_tracking: bool) -> Self {
        if bed_tracking && self != TrackState::LyingFloor {
            return self;
        }
        match self {
            TrackState::LyingBed | TrackState::SittingBed | TrackState::LyingFloor => {
                TrackState::OnePerson
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=255u8 {
            assert_eq!(PersonState::from_code(code).code(), code);
            assert_eq!(TrackState::from_code(code).code(), code);
        }
    }

    #[test]
    fn person_labels() {
        assert_eq!(PersonState::from_code(4).label(), "Falling Down!");
        assert_eq!(PersonState::from_code(9).label(), "State:9");
        assert!(PersonState::FallingDown.is_alarm());
        assert!(!PersonState::Standing.is_alarm());
    }

    #[test]
    fn track_display_remap() {
        assert_eq!(TrackState::LyingBed.displayed(true), TrackState::LyingBed);
        assert_eq!(TrackState::LyingFloor.displayed(true), TrackState::OnePerson);
        assert_eq!(TrackState::SittingBed.displayed(false), TrackState::OnePerson);
        assert_eq!(TrackState::MultiPerson.displayed(false), TrackState::MultiPerson);
        assert_eq!(TrackState::Noise.displayed(true), TrackState::Noise);
    }
}
