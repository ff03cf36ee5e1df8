// Drill targets.

use serde::{Deserialize, Serialize};

use notedrill_theory::{Pitch, Position};

/// A prompt: a pitch to identify or locate, optionally pinned to one exact
/// fretboard position (hard mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrillTarget {
    pub pitch: Pitch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_position: Option<Position>,
}

impl DrillTarget {
    pub fn new(pitch: Pitch) -> Self {
        DrillTarget {
            pitch,
            required_position: None,
        }
    }

    pub fn pinned(pitch: Pitch, position: Position) -> Self {
        DrillTarget {
            pitch,
            required_position: Some(position),
        }
    }

    /// Canonical (sharp-preferred) spelling of the target pitch.
    pub fn canonical(&self) -> Pitch {
        self.pitch.canonicalize()
    }

    /// Targets compare for rotation by sound, not by spelling or pin.
    pub fn same_pitch(&self, other: &DrillTarget) -> bool {
        self.pitch.sounds_same(&other.pitch)
    }
}

impl From<Pitch> for DrillTarget {
    fn from(pitch: Pitch) -> Self {
        DrillTarget::new(pitch)
    }
}
