// Answer evaluation.
//
// The session never decides correctness itself. Each trainer supplies an
// `Evaluator` that judges an answer against the current target and may
// attach trainer-specific detail (for example, every valid position, so the
// renderer can reveal them after a miss). The session only reads
// `Evaluation::correct`.
//
// Stock evaluators:
// - `NoteNameEvaluator`: staff identification; the answer is a pitch class
//   and matches in any spelling.
// - `FretboardEvaluator`: fretboard location; any position sounding the
//   target's pitch class is correct, unless the target is pinned to a
//   required position (hard mode), in which case only that position is.
// - `FnEvaluator`: wraps a closure for ad-hoc predicates.

use std::marker::PhantomData;

use notedrill_theory::{PitchClass, Position, Tuning};

use crate::target::DrillTarget;

/// Outcome of judging one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation<D> {
    pub correct: bool,
    pub detail: D,
}

/// Trainer-supplied correctness predicate.
pub trait Evaluator {
    type Answer;
    type Detail;

    fn evaluate(&self, target: &DrillTarget, answer: &Self::Answer) -> Evaluation<Self::Detail>;
}

/// Pitch-class naming (staff trainer). Enharmonic answers are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteNameEvaluator;

impl Evaluator for NoteNameEvaluator {
    type Answer = PitchClass;
    type Detail = ();

    fn evaluate(&self, target: &DrillTarget, answer: &PitchClass) -> Evaluation<()> {
        Evaluation {
            correct: target.pitch.same_class(*answer),
            detail: (),
        }
    }
}

/// Fretboard location on a given tuning. Detail lists every position that
/// would have been accepted, ordered by string then fret.
#[derive(Debug, Clone)]
pub struct FretboardEvaluator {
    pub tuning: Tuning,
}

impl FretboardEvaluator {
    pub fn new(tuning: Tuning) -> Self {
        FretboardEvaluator { tuning }
    }

    /// Positions accepted for `target`.
    pub fn valid_positions(&self, target: &DrillTarget) -> Vec<Position> {
        match target.required_position {
            Some(position) => vec![position],
            None => self.tuning.positions_for_pitch_class(target.pitch.class),
        }
    }
}

impl Evaluator for FretboardEvaluator {
    type Answer = Position;
    type Detail = Vec<Position>;

    fn evaluate(&self, target: &DrillTarget, answer: &Position) -> Evaluation<Vec<Position>> {
        let positions = self.valid_positions(target);
        Evaluation {
            correct: positions.contains(answer),
            detail: positions,
        }
    }
}

/// Adapter turning a closure into an `Evaluator`.
pub struct FnEvaluator<F, A, D> {
    f: F,
    _marker: PhantomData<fn(&A) -> D>,
}

impl<F, A, D> FnEvaluator<F, A, D>
where
    F: Fn(&DrillTarget, &A) -> Evaluation<D>,
{
    pub fn new(f: F) -> Self {
        FnEvaluator {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, A, D> Evaluator for FnEvaluator<F, A, D>
where
    F: Fn(&DrillTarget, &A) -> Evaluation<D>,
{
    type Answer = A;
    type Detail = D;

    fn evaluate(&self, target: &DrillTarget, answer: &A) -> Evaluation<D> {
        (self.f)(target, answer)
    }
}
