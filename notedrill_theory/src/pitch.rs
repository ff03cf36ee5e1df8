// Pitch model in scientific pitch notation.
//
// A `Pitch` is a spelling (`PitchClass`, one of 17 letter+accidental
// combinations) plus an octave. Spellings collapse onto 12 semitone classes,
// and every pitch has an absolute semitone number `(octave + 1) * 12 +
// semitone`, which is MIDI numbering (C4 = 60). Two pitches sound the same
// iff their absolute semitones match, regardless of spelling.
//
// Canonical spelling prefers sharps (or naturals): `Db4` canonicalizes to
// `C#4`. Flats are accepted on input and offered back only through
// `flat_spelling` for display.
//
// Octaves are `i16`, so `absolute_semitone` is total over every `Pitch`.
// Going the other way (`from_absolute_semitone`, `transpose`) is checked.
//
// Derived `PartialEq`/`Eq`/`Hash` on `Pitch` are spelling-aware (value
// identity). Use `pitches_equal` / `Pitch::sounds_same` for enharmonic
// equality and `absolute_semitone` as the ordering key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TheoryError;

/// Natural note letter. Declared in staff order, so `index()` runs C=0..B=6
/// (C is the lowest letter within an octave).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// Diatonic index within the octave, C=0 through B=6.
    pub fn index(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    fn from_char(c: char) -> Option<Letter> {
        match c {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
}

/// One of the 17 recognised spellings of the 12 semitone classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PitchClass {
    C,
    CSharp,
    DFlat,
    D,
    DSharp,
    EFlat,
    E,
    F,
    FSharp,
    GFlat,
    G,
    GSharp,
    AFlat,
    A,
    ASharp,
    BFlat,
    B,
}

/// Sharp-preferred spelling for each semitone class.
const CANONICAL_SHARPS: [PitchClass; 12] = [
    PitchClass::C,
    PitchClass::CSharp,
    PitchClass::D,
    PitchClass::DSharp,
    PitchClass::E,
    PitchClass::F,
    PitchClass::FSharp,
    PitchClass::G,
    PitchClass::GSharp,
    PitchClass::A,
    PitchClass::ASharp,
    PitchClass::B,
];

/// Flat-preferred spelling for each semitone class.
const FLAT_SPELLINGS: [PitchClass; 12] = [
    PitchClass::C,
    PitchClass::DFlat,
    PitchClass::D,
    PitchClass::EFlat,
    PitchClass::E,
    PitchClass::F,
    PitchClass::GFlat,
    PitchClass::G,
    PitchClass::AFlat,
    PitchClass::A,
    PitchClass::BFlat,
    PitchClass::B,
];

impl PitchClass {
    /// All 17 spellings, in answer-option order.
    pub const ALL: [PitchClass; 17] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::DFlat,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::EFlat,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::GFlat,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::AFlat,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::BFlat,
        PitchClass::B,
    ];

    /// The seven natural classes (C major).
    pub const NATURALS: [PitchClass; 7] = [
        PitchClass::C,
        PitchClass::D,
        PitchClass::E,
        PitchClass::F,
        PitchClass::G,
        PitchClass::A,
        PitchClass::B,
    ];

    /// Semitone class 0-11 (C = 0).
    pub fn semitone(self) -> u8 {
        match self {
            PitchClass::C => 0,
            PitchClass::CSharp | PitchClass::DFlat => 1,
            PitchClass::D => 2,
            PitchClass::DSharp | PitchClass::EFlat => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::FSharp | PitchClass::GFlat => 6,
            PitchClass::G => 7,
            PitchClass::GSharp | PitchClass::AFlat => 8,
            PitchClass::A => 9,
            PitchClass::ASharp | PitchClass::BFlat => 10,
            PitchClass::B => 11,
        }
    }

    /// The written letter. `Db` is a D, `C#` is a C.
    pub fn letter(self) -> Letter {
        match self {
            PitchClass::C | PitchClass::CSharp => Letter::C,
            PitchClass::DFlat | PitchClass::D | PitchClass::DSharp => Letter::D,
            PitchClass::EFlat | PitchClass::E => Letter::E,
            PitchClass::F | PitchClass::FSharp => Letter::F,
            PitchClass::GFlat | PitchClass::G | PitchClass::GSharp => Letter::G,
            PitchClass::AFlat | PitchClass::A | PitchClass::ASharp => Letter::A,
            PitchClass::BFlat | PitchClass::B => Letter::B,
        }
    }

    pub fn accidental(self) -> Accidental {
        match self {
            PitchClass::CSharp
            | PitchClass::DSharp
            | PitchClass::FSharp
            | PitchClass::GSharp
            | PitchClass::ASharp => Accidental::Sharp,
            PitchClass::DFlat
            | PitchClass::EFlat
            | PitchClass::GFlat
            | PitchClass::AFlat
            | PitchClass::BFlat => Accidental::Flat,
            _ => Accidental::Natural,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::DFlat => "Db",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::EFlat => "Eb",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::GFlat => "Gb",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::AFlat => "Ab",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::BFlat => "Bb",
            PitchClass::B => "B",
        }
    }

    /// Look up a spelling by its exact name (`"F#"`, `"Bb"`).
    pub fn from_name(name: &str) -> Option<PitchClass> {
        PitchClass::ALL.into_iter().find(|pc| pc.name() == name)
    }

    /// Sharp-preferred spelling of a semitone class. Any integer is reduced
    /// modulo 12.
    pub fn canonical_for(semitone: i32) -> PitchClass {
        CANONICAL_SHARPS[semitone.rem_euclid(12) as usize]
    }

    /// Flat-preferred spelling of a semitone class.
    pub fn flat_for(semitone: i32) -> PitchClass {
        FLAT_SPELLINGS[semitone.rem_euclid(12) as usize]
    }

    /// This class respelled with the sharp-preferred table.
    pub fn canonical(self) -> PitchClass {
        PitchClass::canonical_for(i32::from(self.semitone()))
    }

    /// Same semitone class, regardless of spelling.
    pub fn is_enharmonic(self, other: PitchClass) -> bool {
        self.semitone() == other.semitone()
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PitchClass::from_name(s.trim()).ok_or_else(|| TheoryError::InvalidPitchText {
            text: s.to_string(),
        })
    }
}

impl TryFrom<String> for PitchClass {
    type Error = TheoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(value: PitchClass) -> Self {
        value.name().to_string()
    }
}

/// A spelled pitch with an octave in scientific pitch notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch {
    pub class: PitchClass,
    pub octave: i16,
}

impl Pitch {
    pub const fn new(class: PitchClass, octave: i16) -> Self {
        Pitch { class, octave }
    }

    /// `(octave + 1) * 12 + semitone`; C4 = 60.
    pub fn absolute_semitone(&self) -> i32 {
        (i32::from(self.octave) + 1) * 12 + i32::from(self.class.semitone())
    }

    /// The canonical pitch at an absolute semitone.
    pub fn from_absolute_semitone(absolute: i32) -> Result<Pitch, TheoryError> {
        let octave = i16::try_from(absolute.div_euclid(12) - 1)
            .map_err(|_| TheoryError::SemitoneOutOfRange { absolute })?;
        Ok(Pitch {
            class: PitchClass::canonical_for(absolute),
            octave,
        })
    }

    /// Sharp-preferred spelling of the same sound. Idempotent.
    ///
    /// None of the 17 spellings crosses an octave boundary (there is no Cb
    /// or B#), so the octave never changes.
    pub fn canonicalize(&self) -> Pitch {
        Pitch {
            class: self.class.canonical(),
            octave: self.octave,
        }
    }

    /// Flat-preferred spelling of the same sound. Display only.
    pub fn flat_spelling(&self) -> Pitch {
        Pitch {
            class: PitchClass::flat_for(i32::from(self.class.semitone())),
            octave: self.octave,
        }
    }

    /// Enharmonic equality: same absolute semitone, any spelling.
    pub fn sounds_same(&self, other: &Pitch) -> bool {
        self.absolute_semitone() == other.absolute_semitone()
    }

    /// Same semitone class in any octave.
    pub fn same_class(&self, class: PitchClass) -> bool {
        self.class.is_enharmonic(class)
    }

    /// Shift by a number of semitones; the result is canonical.
    pub fn transpose(&self, semitones: i32) -> Result<Pitch, TheoryError> {
        Pitch::from_absolute_semitone(self.absolute_semitone().saturating_add(semitones))
    }
}

/// Enharmonic equality between two pitches.
pub fn pitches_equal(a: &Pitch, b: &Pitch) -> bool {
    a.sounds_same(b)
}

/// Every canonical pitch from `start` to `end` inclusive, ascending by
/// absolute semitone. Empty when `start` is above `end`.
pub fn generate_range(start: &Pitch, end: &Pitch) -> Vec<Pitch> {
    // Every semitone between two valid pitches is itself representable.
    (start.absolute_semitone()..=end.absolute_semitone())
        .filter_map(|absolute| Pitch::from_absolute_semitone(absolute).ok())
        .collect()
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = TheoryError;

    /// Parse `[A-G](#|b)?<integer octave>`, e.g. `F#4`, `Bb3`, `C-1`.
    /// Surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TheoryError::InvalidPitchText {
            text: s.to_string(),
        };
        let text = s.trim();
        let mut chars = text.chars();
        let letter = chars.next().and_then(Letter::from_char).ok_or_else(invalid)?;
        let rest = &text[1..];
        let (accidental, octave_text) = match rest.chars().next() {
            Some('#') => ("#", &rest[1..]),
            Some('b') => ("b", &rest[1..]),
            _ => ("", rest),
        };

        let digits = octave_text.strip_prefix('-').unwrap_or(octave_text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let octave: i16 = octave_text.parse().map_err(|_| invalid())?;

        let name = format!("{letter:?}{accidental}");
        let class = PitchClass::from_name(&name).ok_or_else(invalid)?;
        Ok(Pitch { class, octave })
    }
}

impl TryFrom<String> for Pitch {
    type Error = TheoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pitch> for String {
    fn from(value: Pitch) -> Self {
        value.to_string()
    }
}
