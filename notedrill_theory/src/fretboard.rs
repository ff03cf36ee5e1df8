// Fretted-instrument position mapping.
//
// A `Tuning` is an ordered list of open-string pitches. Strings are numbered
// from 1, and string 1 is the first entry (for the stock tunings, the
// highest-sounding string, matching how guitarists number strings). The
// mapper is tuning-agnostic: any string count works, and the stock guitar
// and ukulele tunings below are plain data.
//
// Tunings loaded from data go through the same validation as `Tuning::new`:
// at least one string and at most 255, so every string number fits a `u8`.
//
// Position → pitch is pure arithmetic on absolute semitones. Pitch → positions
// scans every (string, fret) within `0..=max_fret` and always returns results
// ordered by string, then fret; "first matching position" callers depend on
// that order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TheoryError;
use crate::pitch::{Pitch, PitchClass};

/// Highest fret drilled by default.
pub const DEFAULT_MAX_FRET: u8 = 12;

fn default_max_fret() -> u8 {
    DEFAULT_MAX_FRET
}

/// A (string, fret) location. `string` is 1-based; fret 0 is the open string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub string: u8,
    pub fret: u8,
}

impl Position {
    pub const fn new(string: u8, fret: u8) -> Self {
        Position { string, fret }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}/F{}", self.string, self.fret)
    }
}

/// Open-string pitches of an instrument plus the drilled fret range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TuningData")]
pub struct Tuning {
    pub name: String,
    /// Open pitch of string 1, string 2, ...
    pub open_strings: Vec<Pitch>,
    /// Display names per string; falls back to the open pitch class.
    pub labels: Vec<String>,
    pub max_fret: u8,
}

/// Unvalidated serde form of `Tuning`.
#[derive(Deserialize)]
struct TuningData {
    name: String,
    open_strings: Vec<Pitch>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default = "default_max_fret")]
    max_fret: u8,
}

impl TryFrom<TuningData> for Tuning {
    type Error = TheoryError;

    fn try_from(data: TuningData) -> Result<Self, Self::Error> {
        let mut tuning = Tuning::new(data.name, data.open_strings)?;
        tuning.labels = data.labels;
        tuning.max_fret = data.max_fret;
        Ok(tuning)
    }
}

impl Tuning {
    /// Fails on an empty string list or more strings than a `u8` can number.
    pub fn new(name: impl Into<String>, open_strings: Vec<Pitch>) -> Result<Self, TheoryError> {
        if open_strings.is_empty() {
            return Err(TheoryError::EmptyTuning);
        }
        if open_strings.len() > usize::from(u8::MAX) {
            return Err(TheoryError::TooManyStrings {
                string_count: open_strings.len(),
            });
        }
        Ok(Tuning {
            name: name.into(),
            open_strings,
            labels: Vec::new(),
            max_fret: DEFAULT_MAX_FRET,
        })
    }

    /// Standard six-string guitar, E4 B3 G3 D3 A2 E2.
    pub fn standard_guitar() -> Self {
        Tuning {
            name: "guitar".into(),
            open_strings: vec![
                Pitch::new(PitchClass::E, 4),
                Pitch::new(PitchClass::B, 3),
                Pitch::new(PitchClass::G, 3),
                Pitch::new(PitchClass::D, 3),
                Pitch::new(PitchClass::A, 2),
                Pitch::new(PitchClass::E, 2),
            ],
            labels: ["high E", "B", "G", "D", "A", "low E"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_fret: DEFAULT_MAX_FRET,
        }
    }

    /// Standard re-entrant ukulele, A4 E4 C4 G4.
    pub fn standard_ukulele() -> Self {
        Tuning {
            name: "ukulele".into(),
            open_strings: vec![
                Pitch::new(PitchClass::A, 4),
                Pitch::new(PitchClass::E, 4),
                Pitch::new(PitchClass::C, 4),
                Pitch::new(PitchClass::G, 4),
            ],
            labels: ["A", "E", "C", "G"].into_iter().map(String::from).collect(),
            max_fret: DEFAULT_MAX_FRET,
        }
    }

    pub fn string_count(&self) -> usize {
        self.open_strings.len()
    }

    /// String numbers in order, 1 through `string_count`. Strings past 255
    /// (only reachable by editing `open_strings` directly) are never numbered.
    pub fn strings(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=u8::MAX).take(self.open_strings.len())
    }

    pub fn open_string(&self, string: u8) -> Result<Pitch, TheoryError> {
        (string as usize)
            .checked_sub(1)
            .and_then(|i| self.open_strings.get(i))
            .copied()
            .ok_or(TheoryError::StringOutOfRange {
                string,
                string_count: self.string_count(),
            })
    }

    pub fn label(&self, string: u8) -> Result<String, TheoryError> {
        let open = self.open_string(string)?;
        Ok(self
            .labels
            .get(string as usize - 1)
            .cloned()
            .unwrap_or_else(|| open.class.canonical().to_string()))
    }

    /// Canonical pitch sounding at `position`. Frets beyond `max_fret` are
    /// still mapped; only the string must exist.
    pub fn pitch_at(&self, position: Position) -> Result<Pitch, TheoryError> {
        let open = self.open_string(position.string)?;
        open.transpose(i32::from(position.fret))
    }

    /// Every position in range, ordered by string then fret.
    pub fn all_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.strings()
            .flat_map(move |s| (0..=self.max_fret).map(move |f| Position::new(s, f)))
    }

    /// Positions sounding exactly `pitch` (octave-specific).
    pub fn positions_for_pitch(&self, pitch: &Pitch) -> Vec<Position> {
        let target = pitch.absolute_semitone();
        self.positions_matching(|absolute| absolute == target)
    }

    /// Positions sounding `class` in any octave.
    pub fn positions_for_pitch_class(&self, class: PitchClass) -> Vec<Position> {
        let target = i32::from(class.semitone());
        self.positions_matching(|absolute| absolute.rem_euclid(12) == target)
    }

    fn positions_matching(&self, matches: impl Fn(i32) -> bool) -> Vec<Position> {
        let mut positions = Vec::new();
        for (open, string) in self.open_strings.iter().zip(self.strings()) {
            let base = open.absolute_semitone();
            for fret in 0..=self.max_fret {
                if matches(base + i32::from(fret)) {
                    positions.push(Position::new(string, fret));
                }
            }
        }
        positions
    }

    /// Every distinct pitch playable within the fret range, ascending.
    pub fn scope_pitches(&self) -> Vec<Pitch> {
        let mut absolutes: Vec<i32> = self
            .open_strings
            .iter()
            .flat_map(|open| {
                let base = open.absolute_semitone();
                (0..=self.max_fret).map(move |f| base + i32::from(f))
            })
            .collect();
        absolutes.sort_unstable();
        absolutes.dedup();
        absolutes
            .into_iter()
            .filter_map(|absolute| Pitch::from_absolute_semitone(absolute).ok())
            .collect()
    }

    fn last_string(&self) -> u8 {
        self.strings().last().unwrap_or(1)
    }

    /// Starting cursor for keyboard navigation: the last (lowest) string, open.
    pub fn default_position(&self) -> Position {
        Position::new(self.last_string(), 0)
    }

    /// Move `from` by the given deltas, clamped to the strings and fret range.
    pub fn navigate(&self, from: Position, string_delta: i32, fret_delta: i32) -> Position {
        let max_string = i32::from(self.last_string());
        let string = (i32::from(from.string) + string_delta).clamp(1, max_string);
        let fret = (i32::from(from.fret) + fret_delta).clamp(0, i32::from(self.max_fret));
        Position::new(string as u8, fret as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(text: &str) -> Pitch {
        text.parse().unwrap()
    }

    #[test]
    fn pitch_at_guitar_positions() {
        let guitar = Tuning::standard_guitar();
        assert_eq!(guitar.pitch_at(Position::new(5, 3)).unwrap(), p("C3"));
        assert_eq!(guitar.pitch_at(Position::new(1, 0)).unwrap(), p("E4"));
        assert_eq!(guitar.pitch_at(Position::new(6, 12)).unwrap(), p("E3"));
        assert_eq!(guitar.pitch_at(Position::new(3, 1)).unwrap(), p("G#3"));
    }

    #[test]
    fn pitch_at_rejects_missing_strings() {
        let ukulele = Tuning::standard_ukulele();
        assert_eq!(
            ukulele.pitch_at(Position::new(5, 0)),
            Err(TheoryError::StringOutOfRange {
                string: 5,
                string_count: 4
            })
        );
        assert!(ukulele.pitch_at(Position::new(0, 0)).is_err());
    }

    #[test]
    fn positions_for_e4_on_guitar() {
        let positions = Tuning::standard_guitar().positions_for_pitch(&p("E4"));
        assert!(positions.contains(&Position::new(1, 0)));
        assert!(positions.contains(&Position::new(2, 5)));
        assert_eq!(
            positions,
            vec![
                Position::new(1, 0),
                Position::new(2, 5),
                Position::new(3, 9),
            ]
        );
    }

    #[test]
    fn positions_for_pitch_accept_flat_spelling() {
        let guitar = Tuning::standard_guitar();
        assert_eq!(
            guitar.positions_for_pitch(&p("Gb2")),
            guitar.positions_for_pitch(&p("F#2"))
        );
    }

    #[test]
    fn positions_for_f_sharp_class_are_sorted() {
        let positions = Tuning::standard_guitar().positions_for_pitch_class(PitchClass::FSharp);
        for expected in [Position::new(1, 2), Position::new(2, 7), Position::new(6, 2)] {
            assert!(positions.contains(&expected), "missing {expected}");
        }
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert_eq!(positions.first(), Some(&Position::new(1, 2)));
        // F# appears at fret 2 and 14 on E strings; 14 is out of range.
        assert!(!positions.contains(&Position::new(1, 14)));
    }

    #[test]
    fn every_class_position_sounds_that_class() {
        let guitar = Tuning::standard_guitar();
        for class in PitchClass::ALL {
            for pos in guitar.positions_for_pitch_class(class) {
                assert!(guitar.pitch_at(pos).unwrap().same_class(class));
            }
        }
    }

    #[test]
    fn mapper_accepts_arbitrary_tunings() {
        let bass = Tuning::new("bass", vec![p("G2"), p("D2"), p("A1"), p("E1")]).unwrap();
        assert_eq!(bass.string_count(), 4);
        assert_eq!(bass.pitch_at(Position::new(4, 5)).unwrap(), p("A1"));
        assert_eq!(bass.label(1).unwrap(), "G");
        assert_eq!(Tuning::new("none", vec![]), Err(TheoryError::EmptyTuning));
    }

    #[test]
    fn ukulele_scope_and_labels() {
        let ukulele = Tuning::standard_ukulele();
        let scope = ukulele.scope_pitches();
        assert_eq!(scope.first(), Some(&p("C4")));
        assert_eq!(scope.last(), Some(&p("A5")));
        assert_eq!(ukulele.label(4).unwrap(), "G");
        assert_eq!(Tuning::standard_guitar().label(6).unwrap(), "low E");
    }

    #[test]
    fn guitar_scope_is_distinct_and_ascending() {
        let scope = Tuning::standard_guitar().scope_pitches();
        assert_eq!(scope.first(), Some(&p("E2")));
        assert_eq!(scope.last(), Some(&p("E5")));
        assert_eq!(scope.len(), 37);
        assert!(scope.windows(2).all(|w| w[0].absolute_semitone() < w[1].absolute_semitone()));
    }

    #[test]
    fn navigation_clamps_to_the_board() {
        let guitar = Tuning::standard_guitar();
        let start = guitar.default_position();
        assert_eq!(start, Position::new(6, 0));
        assert_eq!(guitar.navigate(start, 1, -1), Position::new(6, 0));
        assert_eq!(guitar.navigate(start, -2, 3), Position::new(4, 3));
        assert_eq!(guitar.navigate(Position::new(1, 11), -5, 7), Position::new(1, 12));
    }

    #[test]
    fn tuning_loads_from_json() {
        let tuning: Tuning =
            serde_json::from_str(r#"{"name":"mandolin","open_strings":["E5","A4","D4","G3"]}"#)
                .unwrap();
        assert_eq!(tuning.max_fret, DEFAULT_MAX_FRET);
        assert!(tuning.labels.is_empty());
        assert_eq!(tuning.pitch_at(Position::new(4, 2)).unwrap(), p("A3"));
    }

    #[test]
    fn tuning_json_is_validated() {
        let empty = serde_json::from_str::<Tuning>(r#"{"name":"x","open_strings":[]}"#);
        assert!(empty.unwrap_err().to_string().contains("no strings"));

        let many: Vec<String> = (0..256).map(|_| "E2".to_string()).collect();
        let json = serde_json::json!({ "name": "harp", "open_strings": many }).to_string();
        assert!(serde_json::from_str::<Tuning>(&json).is_err());
        assert_eq!(
            Tuning::new("harp", vec![p("E2"); 256]),
            Err(TheoryError::TooManyStrings { string_count: 256 })
        );

        let widest = Tuning::new("harp", vec![p("E2"); 255]).unwrap();
        assert_eq!(widest.strings().last(), Some(255));
        assert_eq!(widest.default_position(), Position::new(255, 0));
        assert!(widest.positions_for_pitch_class(PitchClass::E).iter().all(|pos| pos.string >= 1));
    }

    #[test]
    fn tuning_serializes_and_reloads() {
        let guitar = Tuning::standard_guitar();
        let json = serde_json::to_string(&guitar).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back, guitar);
    }
}
