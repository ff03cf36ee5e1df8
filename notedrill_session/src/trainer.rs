// Per-trainer pools and helpers.
//
// The session engine is trainer-agnostic; this module holds what the three
// stock trainers (treble staff, guitar, ukulele) layer on top of it:
//
// - Candidate pools. The staff trainer drills natural notes C4–B5. Fretboard
//   trainers have an easy pool (one target per pitch class, first seen in
//   ascending scope order) and a hard pool (per string, the first fret
//   producing each pitch class, pinned to that position).
// - Multiple-choice answers for the staff trainer, drawn once per target so
//   redrawing a prompt never reshuffles them.
// - Used-position tracking for easy fretboard drills: once a position has
//   been answered correctly for a pitch class, it is disabled for that class
//   so the player has to find another one. Only the most recent few are kept.
// - Selection checks that the renderer runs before accepting a fretboard
//   click or cursor move: hard mode locks the player to the required
//   string, easy mode keeps them off used positions.

use std::collections::HashMap;

use notedrill_prng::DrillRng;
use notedrill_theory::staff::treble_naturals;
use notedrill_theory::{PitchClass, Position, Tuning};

use crate::progress::TrainerId;
use crate::target::DrillTarget;

/// Positions remembered per pitch class in easy fretboard mode.
pub const USED_POSITION_CAPACITY: usize = 4;

/// Number of options offered by the staff trainer.
pub const CHOICE_COUNT: usize = 4;

impl TrainerId {
    /// Tuning for fretboard trainers; `None` for the staff trainer.
    pub fn tuning(self) -> Option<Tuning> {
        match self {
            TrainerId::Treble => None,
            TrainerId::Guitar => Some(Tuning::standard_guitar()),
            TrainerId::Ukulele => Some(Tuning::standard_ukulele()),
        }
    }
}

/// Natural notes C4–B5.
pub fn staff_pool() -> Vec<DrillTarget> {
    treble_naturals().into_iter().map(DrillTarget::new).collect()
}

/// One unpinned target per pitch class, in ascending scope order.
pub fn easy_pool(tuning: &Tuning) -> Vec<DrillTarget> {
    let mut seen = [false; 12];
    tuning
        .scope_pitches()
        .into_iter()
        .filter(|p| !std::mem::replace(&mut seen[p.class.semitone() as usize], true))
        .map(DrillTarget::new)
        .collect()
}

/// Per string, the lowest fret of each pitch class, pinned to that position.
pub fn hard_pool(tuning: &Tuning) -> Vec<DrillTarget> {
    let mut pool = Vec::new();
    for string in tuning.strings() {
        let mut seen = [false; 12];
        for fret in 0..=tuning.max_fret {
            let position = Position::new(string, fret);
            let Ok(pitch) = tuning.pitch_at(position) else {
                continue;
            };
            let slot = &mut seen[pitch.class.semitone() as usize];
            if !*slot {
                *slot = true;
                pool.push(DrillTarget::pinned(pitch, position));
            }
        }
    }
    pool
}

/// Staff-trainer answer options: the correct class plus natural
/// distractors, in shuffled order.
pub fn answer_choices(rng: &mut DrillRng, correct: PitchClass) -> Vec<PitchClass> {
    let correct = correct.canonical();
    let others: Vec<PitchClass> = PitchClass::NATURALS
        .into_iter()
        .filter(|&c| c != correct)
        .collect();
    let mut choices = vec![correct];
    choices.extend(rng.shuffle(&others).into_iter().take(CHOICE_COUNT - 1));
    rng.shuffle(&choices)
}

/// Staff-trainer options for the current target. New options are drawn only
/// when the target changes.
#[derive(Debug, Clone, Default)]
pub struct ChoiceCache {
    target: Option<DrillTarget>,
    choices: Vec<PitchClass>,
}

impl ChoiceCache {
    pub fn choices_for(&mut self, rng: &mut DrillRng, target: &DrillTarget) -> &[PitchClass] {
        if self.target.as_ref() != Some(target) {
            self.choices = answer_choices(rng, target.pitch.class);
            self.target = Some(*target);
        }
        &self.choices
    }
}

/// Correctly-answered positions per pitch class, oldest first.
#[derive(Debug, Clone, Default)]
pub struct UsedPositions {
    by_class: HashMap<PitchClass, Vec<Position>>,
}

impl UsedPositions {
    /// Positions currently disabled for `class` (any spelling).
    pub fn disabled(&self, class: PitchClass) -> &[Position] {
        self.by_class
            .get(&class.canonical())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_used(&self, class: PitchClass, position: Position) -> bool {
        self.disabled(class).contains(&position)
    }

    /// Remember a correct answer. Duplicates are ignored; beyond
    /// `USED_POSITION_CAPACITY` the oldest entry is dropped.
    pub fn record(&mut self, class: PitchClass, position: Position) {
        let used = self.by_class.entry(class.canonical()).or_default();
        if used.contains(&position) {
            return;
        }
        used.push(position);
        if used.len() > USED_POSITION_CAPACITY {
            used.remove(0);
        }
    }

    pub fn clear(&mut self) {
        self.by_class.clear();
    }
}

/// Whether a fretboard click may become the selected answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCheck {
    Allowed,
    /// Hard mode: the target is pinned to another string.
    WrongString { required: Position, label: String },
    /// Easy mode: this position was already used for this pitch class.
    AlreadyUsed,
}

/// Gate a selection before it is submitted.
pub fn check_selection(
    tuning: &Tuning,
    target: &DrillTarget,
    position: Position,
    hard: bool,
    used: &UsedPositions,
) -> SelectionCheck {
    if hard {
        if let Some(required) = target.required_position {
            if position.string != required.string {
                let label = tuning
                    .label(required.string)
                    .unwrap_or_else(|_| required.string.to_string());
                return SelectionCheck::WrongString { required, label };
            }
        }
        return SelectionCheck::Allowed;
    }
    if used.is_used(target.pitch.class, position) {
        return SelectionCheck::AlreadyUsed;
    }
    SelectionCheck::Allowed
}

/// Move the cursor like `Tuning::navigate`, but stay put when the new
/// position would fail `check_selection`. The failing check is returned so
/// the caller can explain why.
pub fn navigate_guarded(
    tuning: &Tuning,
    from: Position,
    string_delta: i32,
    fret_delta: i32,
    target: &DrillTarget,
    hard: bool,
    used: &UsedPositions,
) -> Result<Position, SelectionCheck> {
    let candidate = tuning.navigate(from, string_delta, fret_delta);
    match check_selection(tuning, target, candidate, hard, used) {
        SelectionCheck::Allowed => Ok(candidate),
        blocked => Err(blocked),
    }
}

/// Where the cursor starts for a target: on the required string in hard
/// mode, otherwise the tuning's default.
pub fn start_position(tuning: &Tuning, target: &DrillTarget) -> Position {
    match target.required_position {
        Some(required) => Position::new(required.string, 0),
        None => tuning.default_position(),
    }
}
