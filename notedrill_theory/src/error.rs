// Error type for the theory crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    /// Text did not match `[A-G](#|b)?<octave>`.
    #[error("invalid pitch text: {text:?}")]
    InvalidPitchText { text: String },

    #[error("string {string} is out of range for a {string_count}-string tuning")]
    StringOutOfRange { string: u8, string_count: usize },

    /// The absolute semitone lies outside the representable octaves.
    #[error("absolute semitone {absolute} is out of range")]
    SemitoneOutOfRange { absolute: i32 },

    #[error("tuning has no strings")]
    EmptyTuning,

    /// Strings are numbered with a `u8`.
    #[error("tuning has {string_count} strings; at most 255 are supported")]
    TooManyStrings { string_count: usize },
}
