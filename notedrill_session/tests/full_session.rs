// End-to-end drills through the public API: pool builders, evaluators,
// the session engine, and progress stores working together.

use notedrill_session::evaluate::{FretboardEvaluator, NoteNameEvaluator};
use notedrill_session::progress::{JsonProgressStore, ProgressStore, TrainerId};
use notedrill_session::trainer::{
    SelectionCheck, UsedPositions, check_selection, easy_pool, hard_pool, staff_pool,
};
use notedrill_session::{DrillConfig, DrillMode, DrillSession, DrillTarget, Score};
use notedrill_theory::pitch::generate_range;
use notedrill_theory::{Pitch, PitchClass, Position, Tuning};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn twelve_classes() -> Vec<DrillTarget> {
    let start: Pitch = "C4".parse().unwrap();
    let end: Pitch = "B4".parse().unwrap();
    generate_range(&start, &end).into_iter().map(DrillTarget::new).collect()
}

fn wrong_class(class: PitchClass) -> PitchClass {
    PitchClass::canonical_for(i32::from(class.semitone()) + 1)
}

#[test]
fn seeded_note_drill_scores_and_never_repeats() {
    let config = DrillConfig::default().with_seed(2024);
    let mut s = DrillSession::new(twelve_classes(), NoteNameEvaluator, &config).unwrap();

    let mut previous = *s.current_target();
    let mut expected = Score::default();
    let mut streak = 0;
    for round in 0..100 {
        let class = s.current_target().pitch.class;
        let result = if round % 3 == 2 {
            s.submit_answer(&wrong_class(class))
        } else {
            s.submit_answer(&class)
        };
        expected.attempts += 1;
        if result.correct {
            expected.correct += 1;
            streak += 1;
        } else {
            streak = 0;
        }
        assert_eq!(result.correct, round % 3 != 2);
        assert_eq!(result.streak, streak);
        assert_eq!(s.score(), expected);

        let next = *s.next_target().unwrap();
        assert!(!next.same_pitch(&previous), "{} repeated", next.pitch);
        previous = next;
    }
    assert_eq!(s.score(), Score { correct: 67, attempts: 100 });
}

#[test]
fn timed_round_runs_out_after_sixty_ticks() {
    let config = DrillConfig::default().with_seed(2024);
    let mut s = DrillSession::new(twelve_classes(), NoteNameEvaluator, &config).unwrap();
    let class = s.current_target().pitch.class;
    s.submit_answer(&class);
    assert_eq!(s.streak(), 1);

    s.start_timed();
    assert_eq!(s.score(), Score::default());
    assert_eq!(s.streak(), 0);
    let mut ticks = 0;
    while s.tick() {
        ticks += 1;
    }
    assert_eq!(ticks, 59);
    assert_eq!(s.time_remaining(), 0);
    assert!(!s.is_timer_active());
    assert_eq!(s.mode(), DrillMode::Timed);

    s.reset_timed();
    assert_eq!(s.mode(), DrillMode::Practice);
    assert_eq!(s.time_remaining(), 60);
}

#[test]
fn staff_drill_over_treble_naturals() {
    let config = DrillConfig::default().with_seed(31);
    let mut s = DrillSession::new(staff_pool(), NoteNameEvaluator, &config).unwrap();
    for _ in 0..30 {
        let target = *s.current_target();
        assert_eq!(target.pitch.class.canonical(), target.pitch.class);
        assert!(s.submit_answer(&target.pitch.class).correct);
        s.next_target().unwrap();
    }
    assert_eq!(s.streak(), 30);
}

#[test]
fn easy_guitar_drill_with_used_positions() {
    let guitar = Tuning::standard_guitar();
    let config = DrillConfig::default().with_seed(8);
    let mut s = DrillSession::new(
        easy_pool(&guitar),
        FretboardEvaluator::new(guitar.clone()),
        &config,
    )
    .unwrap();
    let mut used = UsedPositions::default();

    for _ in 0..24 {
        let target = *s.current_target();
        let candidates = s.evaluator().valid_positions(&target);
        let pick = candidates
            .iter()
            .copied()
            .find(|&p| {
                check_selection(&guitar, &target, p, false, &used) == SelectionCheck::Allowed
            })
            .unwrap();
        let result = s.submit_answer(&pick);
        assert!(result.correct);
        assert_eq!(result.detail, candidates);
        used.record(target.pitch.class, pick);
        assert_eq!(
            check_selection(&guitar, &target, pick, false, &used),
            SelectionCheck::AlreadyUsed
        );
        s.next_target().unwrap();
    }
    assert_eq!(s.score(), Score { correct: 24, attempts: 24 });
}

#[test]
fn hard_ukulele_drill_requires_the_pinned_position() {
    let ukulele = Tuning::standard_ukulele();
    let config = DrillConfig::default().with_seed(99);
    let mut s = DrillSession::new(
        hard_pool(&ukulele),
        FretboardEvaluator::new(ukulele.clone()),
        &config,
    )
    .unwrap();

    let target = *s.current_target();
    let required = target.required_position.unwrap();
    let elsewhere = ukulele
        .positions_for_pitch_class(target.pitch.class)
        .into_iter()
        .find(|&p| p != required)
        .unwrap();
    assert!(!s.submit_answer(&elsewhere).correct);
    assert_eq!(s.streak(), 0);
    assert!(s.submit_answer(&required).correct);
    assert_eq!(s.score(), Score { correct: 1, attempts: 2 });

    let next = *s.next_target().unwrap();
    let off_string = Position::new(required.string % 4 + 1, 0);
    if next.required_position.unwrap().string != off_string.string {
        assert!(matches!(
            check_selection(&ukulele, &next, off_string, true, &UsedPositions::default()),
            SelectionCheck::WrongString { .. }
        ));
    }
}

#[test]
fn switching_to_hard_pool_keeps_the_score() {
    let guitar = Tuning::standard_guitar();
    let config = DrillConfig::default().with_seed(4);
    let mut s = DrillSession::new(
        easy_pool(&guitar),
        FretboardEvaluator::new(guitar.clone()),
        &config,
    )
    .unwrap();
    let target = *s.current_target();
    let answer = s.evaluator().valid_positions(&target)[0];
    s.submit_answer(&answer);

    let next = *s.replace_pool(hard_pool(&guitar)).unwrap();
    assert!(next.required_position.is_some());
    assert_eq!(s.score(), Score { correct: 1, attempts: 1 });
}

#[test]
fn config_file_and_progress_file_drive_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("drill.json");
    std::fs::write(&config_path, r#"{"seed": 12, "timer_duration": 5}"#).unwrap();
    let config = DrillConfig::load(&config_path).unwrap();

    let progress_path = dir.path().join("progress.json");
    let mut store = JsonProgressStore::open(&progress_path).unwrap();
    let mut s = DrillSession::new(twelve_classes(), NoteNameEvaluator, &config).unwrap();
    s.set_mode(DrillMode::Timed);
    assert_eq!(s.time_remaining(), 5);
    for _ in 0..3 {
        let class = s.current_target().pitch.class;
        s.submit_and_record(&class, &mut store, TrainerId::Treble);
        s.next_target().unwrap();
    }
    let class = s.current_target().pitch.class;
    s.submit_and_record(&wrong_class(class), &mut store, TrainerId::Treble);

    let reopened = JsonProgressStore::open(&progress_path).unwrap();
    let progress = reopened.fetch(TrainerId::Treble).unwrap();
    assert_eq!(progress.total_attempts, 4);
    assert_eq!(progress.total_correct, 3);
    assert_eq!(progress.best_streak, 3);
}

proptest! {
    #[test]
    fn any_seed_avoids_immediate_repeats(seed in any::<u32>()) {
        let config = DrillConfig::default().with_seed(seed);
        let mut s = DrillSession::new(twelve_classes(), NoteNameEvaluator, &config).unwrap();
        let mut previous = *s.current_target();
        for _ in 0..40 {
            let next = *s.next_target().unwrap();
            prop_assert!(!next.same_pitch(&previous));
            previous = next;
        }
    }
}
