// Treble staff placement.
//
// Vertical placement on a staff is diatonic: each letter step (line or
// space) moves one staff step, and accidentals never move a note. `F4` and
// `F#4` sit on the same step and differ only by the accidental glyph drawn
// beside them. `Db4` is written on the D step, not the C# step.
//
// Step 0 is the bottom line of the treble staff (E4); the top line (F5) is
// step 8. Notes outside that range need ledger lines, which this module
// computes as a list of even step offsets for the renderer.
//
// The letter index convention is C=0..B=6 (see `Letter::index`), so octave
// boundaries fall between B and C as in scientific pitch notation.

use crate::pitch::{Accidental, Pitch, PitchClass, generate_range};

/// Pitch sitting on step 0 of the treble staff.
pub const TREBLE_REFERENCE: Pitch = Pitch::new(PitchClass::E, 4);

/// Step of the bottom staff line.
pub const BOTTOM_LINE_STEP: i32 = 0;

/// Step of the top staff line (five lines, two steps apart).
pub const TOP_LINE_STEP: i32 = 8;

/// Lowest and highest pitches drilled on the treble staff.
pub const TREBLE_MIN: Pitch = Pitch::new(PitchClass::C, 4);
pub const TREBLE_MAX: Pitch = Pitch::new(PitchClass::B, 5);

fn diatonic_index(pitch: &Pitch) -> i32 {
    i32::from(pitch.octave) * 7 + pitch.class.letter().index()
}

/// Letter-only step count from the treble reference (E4 = 0, positive is up).
pub fn diatonic_step(pitch: &Pitch) -> i32 {
    diatonic_index(pitch) - diatonic_index(&TREBLE_REFERENCE)
}

/// Ledger-line steps needed to draw a note at `step`.
///
/// Below the staff (`step <= -1`) lines are emitted at -2, -4, ... down to
/// and including `step - 1`; above it (`step >= 9`) at 10, 12, ... up to and
/// including `step + 1`. Lower lines come first, each group ordered outward
/// from the staff.
pub fn ledger_line_steps(step: i32) -> Vec<i32> {
    let mut lines = Vec::new();
    if step <= BOTTOM_LINE_STEP - 1 {
        let mut s = BOTTOM_LINE_STEP - 2;
        while s >= step - 1 {
            lines.push(s);
            s -= 2;
        }
    }
    if step >= TOP_LINE_STEP + 1 {
        let mut s = TOP_LINE_STEP + 2;
        while s <= step + 1 {
            lines.push(s);
            s += 2;
        }
    }
    lines
}

/// The accidental glyph to draw beside a note, if any.
pub fn accidental_glyph(pitch: &Pitch) -> Option<Accidental> {
    match pitch.class.accidental() {
        Accidental::Natural => None,
        other => Some(other),
    }
}

/// Everything a renderer needs to draw one note on the treble staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffPlacement {
    pub step: i32,
    pub ledger_lines: Vec<i32>,
    pub accidental: Option<Accidental>,
}

impl StaffPlacement {
    pub fn for_pitch(pitch: &Pitch) -> Self {
        let step = diatonic_step(pitch);
        StaffPlacement {
            step,
            ledger_lines: ledger_line_steps(step),
            accidental: accidental_glyph(pitch),
        }
    }
}

/// Every canonical pitch from C4 to B5.
pub fn treble_scope() -> Vec<Pitch> {
    generate_range(&TREBLE_MIN, &TREBLE_MAX)
}

/// Natural (C major) pitches from C4 to B5, the staff trainer's pool.
pub fn treble_naturals() -> Vec<Pitch> {
    treble_scope()
        .into_iter()
        .filter(|p| p.class.accidental() == Accidental::Natural)
        .collect()
}

/// Distinct octaves present in the treble scope, ascending.
pub fn treble_octaves() -> Vec<i16> {
    let mut octaves: Vec<i16> = treble_scope().iter().map(|p| p.octave).collect();
    octaves.dedup();
    octaves
}
