// Note Drill music theory core.
//
// The pitch model and the two position mappers that the drill engine and
// every trainer build on. Everything here is pure: values are constructed on
// demand, never mutated, and every mapping is recomputed rather than cached.
//
// Architecture:
// - pitch.rs: Letters, accidentals, the 17 recognised spellings, and `Pitch`
//   with absolute-semitone arithmetic, canonical (sharp-preferred) spelling,
//   flat spelling for display, text round-tripping, and range generation
// - staff.rs: Diatonic staff-step placement relative to the treble reference
//   (E4 = step 0), ledger-line computation, accidental glyphs, treble scope
// - fretboard.rs: `Tuning` (ordered open strings, any string count) and
//   `Position`, mapping both ways between positions and pitches
// - error.rs: `TheoryError`

pub mod error;
pub mod fretboard;
pub mod pitch;
pub mod staff;

pub use error::TheoryError;
pub use fretboard::{Position, Tuning};
pub use pitch::{Accidental, Letter, Pitch, PitchClass};
