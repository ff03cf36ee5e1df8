// Drill session state and transitions.
//
// `DrillSession` is the explicit session record for one trainer instance.
// Callers drive it through transition methods and read its fields back
// after each one; nothing inside is reactive or cached.
//
// Key responsibilities:
// - Target rotation: `next_target` draws from the pool with the random
//   source, excluding the current target and a bounded queue of recent
//   targets. When exclusion would empty the pool it is relaxed, so a drill
//   can always produce a next target.
// - Scoring: `submit_answer` delegates correctness to the trainer's
//   `Evaluator`, then counts the attempt and updates the streak.
// - Mode state machine: practice (initial, untimed) and timed. Entering timed
//   mode resets score and streak and arms the countdown. The countdown
//   expiring deactivates it but leaves the mode at timed with zero time
//   remaining until `reset_timed`.
// - Countdown bookkeeping: `tick` advances one time unit. Every arm or
//   disarm bumps `timer_generation`, so a real-time driver started for an
//   earlier arming (see `countdown.rs`) notices and exits instead of ticking
//   a countdown it no longer owns.
//
// All mutation happens through `&mut self`; no internal locking.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info, warn};

use notedrill_prng::DrillRng;
use notedrill_theory::Pitch;

use crate::config::DrillConfig;
use crate::error::DrillError;
use crate::evaluate::Evaluator;
use crate::progress::{Outcome, ProgressStore, TrainerId};
use crate::target::DrillTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillMode {
    Practice,
    Timed,
}

/// Running tally. `correct <= attempts` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: u32,
    pub attempts: u32,
}

/// What `submit_answer` hands back: the evaluator's verdict and detail,
/// the canonical target pitch, and the streak after this answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult<D> {
    pub correct: bool,
    pub canonical: Pitch,
    pub streak: u32,
    pub detail: D,
}

impl<D> SubmissionResult<D> {
    /// The one-way notification forwarded to the statistics store.
    pub fn outcome(&self) -> Outcome {
        Outcome {
            correct: self.correct,
            streak: self.streak,
        }
    }
}

/// Read-only view for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub mode: DrillMode,
    pub time_remaining: u32,
    pub is_timer_active: bool,
    pub score: Score,
    pub streak: u32,
    pub current_target: DrillTarget,
}

pub struct DrillSession<E: Evaluator> {
    pool: Vec<DrillTarget>,
    evaluator: E,
    rng: DrillRng,

    // Mode and countdown
    mode: DrillMode,
    timer_duration: u32,
    time_remaining: u32,
    timer_active: bool,
    timer_generation: u64,

    // Scoring
    score: Score,
    streak: u32,

    // Rotation
    current: DrillTarget,
    history: VecDeque<DrillTarget>,
    history_capacity: usize,
}

impl<E: Evaluator> DrillSession<E> {
    /// Create a session in practice mode and draw the first target.
    pub fn new(pool: Vec<DrillTarget>, evaluator: E, config: &DrillConfig) -> Result<Self, DrillError> {
        if pool.is_empty() {
            return Err(DrillError::EmptyPool);
        }
        let mut rng = match config.seed {
            Some(seed) => DrillRng::new(seed),
            None => DrillRng::from_clock(),
        };
        let current = *rng.pick(&pool)?;
        let mut history = VecDeque::with_capacity(config.history_capacity + 1);
        history.push_front(current);
        history.truncate(config.history_capacity);

        debug!(seed = ?config.seed, pool = pool.len(), first = %current.pitch, "drill session created");

        Ok(Self {
            pool,
            evaluator,
            rng,
            mode: DrillMode::Practice,
            timer_duration: config.timer_duration,
            time_remaining: config.timer_duration,
            timer_active: false,
            timer_generation: 0,
            score: Score::default(),
            streak: 0,
            current,
            history,
            history_capacity: config.history_capacity,
        })
    }

    pub fn mode(&self) -> DrillMode {
        self.mode
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn timer_duration(&self) -> u32 {
        self.timer_duration
    }

    pub fn is_timer_active(&self) -> bool {
        self.timer_active
    }

    /// Changes every time the countdown is armed or disarmed.
    pub fn timer_generation(&self) -> u64 {
        self.timer_generation
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn current_target(&self) -> &DrillTarget {
        &self.current
    }

    /// Recent targets, most recent first.
    pub fn history(&self) -> impl Iterator<Item = &DrillTarget> {
        self.history.iter()
    }

    pub fn pool(&self) -> &[DrillTarget] {
        &self.pool
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            time_remaining: self.time_remaining,
            is_timer_active: self.timer_active,
            score: self.score,
            streak: self.streak,
            current_target: self.current,
        }
    }

    /// Advance to a new target, avoiding the current one and recent history
    /// when the pool allows it.
    pub fn next_target(&mut self) -> Result<&DrillTarget, DrillError> {
        let mut excluded: Vec<DrillTarget> = Vec::with_capacity(self.history.len() + 1);
        excluded.push(self.current);
        excluded.extend(self.history.iter().copied());

        let next = *self
            .rng
            .pick_excluding(&self.pool, &excluded, DrillTarget::same_pitch)?;

        self.history.push_front(next);
        self.history.truncate(self.history_capacity);
        self.current = next;
        debug!(target = %next.pitch, history = self.history.len(), "next target");
        Ok(&self.current)
    }

    /// Swap in a new candidate pool (for example when toggling hard mode)
    /// and move to a target from it. Score, streak, and history are kept.
    pub fn replace_pool(&mut self, pool: Vec<DrillTarget>) -> Result<&DrillTarget, DrillError> {
        if pool.is_empty() {
            return Err(DrillError::EmptyPool);
        }
        self.pool = pool;
        self.next_target()
    }

    /// Judge `answer` against the current target and update the tally.
    pub fn submit_answer(&mut self, answer: &E::Answer) -> SubmissionResult<E::Detail> {
        let evaluation = self.evaluator.evaluate(&self.current, answer);
        self.score.attempts += 1;
        if evaluation.correct {
            self.score.correct += 1;
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        debug!(
            target = %self.current.pitch,
            correct = evaluation.correct,
            streak = self.streak,
            "answer submitted"
        );
        SubmissionResult {
            correct: evaluation.correct,
            canonical: self.current.canonical(),
            streak: self.streak,
            detail: evaluation.detail,
        }
    }

    /// `submit_answer`, then forward `{correct, streak}` to a statistics
    /// store. Store failures are logged and never affect the session.
    pub fn submit_and_record(
        &mut self,
        answer: &E::Answer,
        store: &mut dyn ProgressStore,
        trainer: TrainerId,
    ) -> SubmissionResult<E::Detail> {
        let result = self.submit_answer(answer);
        if let Err(e) = store.record(trainer, result.outcome()) {
            warn!(?trainer, error = %e, "failed to record drill result");
        }
        result
    }

    /// Switch modes. Practice stops the countdown and restores the full
    /// duration but keeps the score; timed behaves like `start_timed`.
    pub fn set_mode(&mut self, mode: DrillMode) {
        match mode {
            DrillMode::Practice => {
                self.mode = DrillMode::Practice;
                self.stop_timer();
                info!("practice mode");
            }
            DrillMode::Timed => self.start_timed(),
        }
    }

    /// Enter (or restart) timed mode: zero the score and streak and arm a
    /// full countdown. Restarting never resumes a previous countdown.
    pub fn start_timed(&mut self) {
        self.reset_score();
        self.mode = DrillMode::Timed;
        self.time_remaining = self.timer_duration;
        self.timer_active = true;
        self.timer_generation += 1;
        info!(duration = self.timer_duration, "timed mode started");
    }

    /// Leave timed mode: stop the countdown, restore the full duration, and
    /// clear the score.
    pub fn reset_timed(&mut self) {
        self.stop_timer();
        self.reset_score();
        self.mode = DrillMode::Practice;
        info!("timed mode reset");
    }

    /// Advance the countdown by one time unit. Returns whether it is still
    /// running afterwards. Outside an active timed countdown this is a no-op.
    pub fn tick(&mut self) -> bool {
        if self.mode != DrillMode::Timed || !self.timer_active {
            return false;
        }
        if self.time_remaining <= 1 {
            self.time_remaining = 0;
            self.timer_active = false;
            self.timer_generation += 1;
            info!(score = ?self.score, "time is up");
            return false;
        }
        self.time_remaining -= 1;
        true
    }

    fn stop_timer(&mut self) {
        if self.timer_active {
            debug!(remaining = self.time_remaining, "countdown stopped");
        }
        self.timer_active = false;
        self.timer_generation += 1;
        self.time_remaining = self.timer_duration;
    }

    fn reset_score(&mut self) {
        self.score = Score::default();
        self.streak = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{Evaluation, FnEvaluator, NoteNameEvaluator};
    use crate::progress::MemoryProgressStore;
    use notedrill_theory::PitchClass;
    use notedrill_theory::pitch::generate_range;
    use pretty_assertions::assert_eq;

    fn chromatic_pool() -> Vec<DrillTarget> {
        let start: Pitch = "C4".parse().unwrap();
        let end: Pitch = "B4".parse().unwrap();
        generate_range(&start, &end).into_iter().map(DrillTarget::new).collect()
    }

    fn session(seed: u32) -> DrillSession<NoteNameEvaluator> {
        DrillSession::new(chromatic_pool(), NoteNameEvaluator, &DrillConfig::default().with_seed(seed))
            .unwrap()
    }

    #[test]
    fn empty_pool_is_rejected() {
        let result = DrillSession::new(Vec::new(), NoteNameEvaluator, &DrillConfig::default());
        assert!(matches!(result, Err(DrillError::EmptyPool)));
    }

    #[test]
    fn starts_in_practice_with_full_timer() {
        let s = session(1);
        assert_eq!(s.mode(), DrillMode::Practice);
        assert_eq!(s.time_remaining(), 60);
        assert!(!s.is_timer_active());
        assert_eq!(s.score(), Score::default());
        assert_eq!(s.history().count(), 1);
    }

    #[test]
    fn next_target_avoids_recent_history() {
        let mut s = session(2024);
        for _ in 0..200 {
            let recent: Vec<DrillTarget> = s.history().copied().collect();
            let next = *s.next_target().unwrap();
            assert!(
                !recent.iter().any(|r| r.same_pitch(&next)),
                "{} repeated within the last {} targets",
                next.pitch,
                recent.len()
            );
            assert!(s.history().count() <= 4);
        }
    }

    #[test]
    fn history_evicts_oldest_first() {
        let config = DrillConfig {
            seed: Some(21),
            history_capacity: 2,
            ..DrillConfig::default()
        };
        let mut s = DrillSession::new(chromatic_pool(), NoteNameEvaluator, &config).unwrap();
        let mut drawn = vec![*s.current_target()];
        for _ in 0..6 {
            drawn.push(*s.next_target().unwrap());
            let expected: Vec<DrillTarget> = drawn.iter().rev().take(2).copied().collect();
            let history: Vec<DrillTarget> = s.history().copied().collect();
            assert_eq!(history, expected);
        }
    }

    #[test]
    fn tiny_pool_still_rotates() {
        let pool = vec![DrillTarget::new("C4".parse().unwrap())];
        let mut s = DrillSession::new(pool, NoteNameEvaluator, &DrillConfig::default().with_seed(5)).unwrap();
        for _ in 0..5 {
            assert_eq!(s.next_target().unwrap().pitch.to_string(), "C4");
        }
    }

    #[test]
    fn two_item_pool_alternates() {
        let pool: Vec<DrillTarget> = ["C4", "D4"]
            .into_iter()
            .map(|t| DrillTarget::new(t.parse().unwrap()))
            .collect();
        let mut s = DrillSession::new(pool, NoteNameEvaluator, &DrillConfig::default().with_seed(9)).unwrap();
        // History covers both, so exclusion falls back to the whole pool;
        // progress is still guaranteed.
        for _ in 0..20 {
            assert!(s.next_target().is_ok());
        }
    }

    #[test]
    fn same_seed_same_rotation() {
        let mut a = session(77);
        let mut b = session(77);
        assert_eq!(a.current_target(), b.current_target());
        for _ in 0..50 {
            assert_eq!(a.next_target().unwrap(), b.next_target().unwrap());
        }
    }

    #[test]
    fn scoring_and_streaks() {
        let mut s = session(3);
        let class = s.current_target().pitch.class;
        let hit = s.submit_answer(&class);
        assert!(hit.correct);
        assert_eq!(hit.streak, 1);
        assert_eq!(s.score(), Score { correct: 1, attempts: 1 });

        let hit = s.submit_answer(&class);
        assert_eq!(hit.streak, 2);

        let wrong = PitchClass::canonical_for(i32::from(class.semitone()) + 1);
        let miss = s.submit_answer(&wrong);
        assert!(!miss.correct);
        assert_eq!(miss.streak, 0);
        assert_eq!(s.streak(), 0);
        assert_eq!(s.score(), Score { correct: 2, attempts: 3 });
    }

    #[test]
    fn submission_reports_canonical_target() {
        let pool = vec![DrillTarget::new("Eb4".parse().unwrap())];
        let mut s = DrillSession::new(pool, NoteNameEvaluator, &DrillConfig::default().with_seed(1)).unwrap();
        let result = s.submit_answer(&PitchClass::EFlat);
        assert!(result.correct);
        assert_eq!(result.canonical.to_string(), "D#4");
    }

    #[test]
    fn evaluator_detail_is_passed_through() {
        let eval = FnEvaluator::new(|t: &DrillTarget, answer: &i32| Evaluation {
            correct: false,
            detail: t.pitch.absolute_semitone() - *answer,
        });
        let pool = vec![DrillTarget::new("C4".parse().unwrap())];
        let mut s = DrillSession::new(pool, eval, &DrillConfig::default().with_seed(1)).unwrap();
        assert_eq!(s.submit_answer(&58).detail, 2);
    }

    #[test]
    fn timed_mode_counts_down_to_zero() {
        let mut s = session(4);
        let class = s.current_target().pitch.class;
        s.submit_answer(&class);

        s.start_timed();
        assert_eq!(s.mode(), DrillMode::Timed);
        assert_eq!(s.score(), Score::default());
        assert_eq!(s.streak(), 0);
        assert!(s.is_timer_active());

        for i in 0..60 {
            let running = s.tick();
            assert_eq!(running, i < 59);
        }
        assert_eq!(s.time_remaining(), 0);
        assert!(!s.is_timer_active());
        assert_eq!(s.mode(), DrillMode::Timed);

        // Further ticks do nothing.
        assert!(!s.tick());
        assert_eq!(s.time_remaining(), 0);
    }

    #[test]
    fn restart_rearms_and_resets() {
        let mut s = session(5);
        s.start_timed();
        for _ in 0..10 {
            s.tick();
        }
        let class = s.current_target().pitch.class;
        s.submit_answer(&class);
        let generation = s.timer_generation();

        s.start_timed();
        assert_eq!(s.time_remaining(), 60);
        assert_eq!(s.score(), Score::default());
        assert_ne!(s.timer_generation(), generation);
    }

    #[test]
    fn reset_timed_returns_to_practice() {
        let mut s = session(6);
        s.start_timed();
        s.tick();
        let class = s.current_target().pitch.class;
        s.submit_answer(&class);

        s.reset_timed();
        assert_eq!(s.mode(), DrillMode::Practice);
        assert_eq!(s.time_remaining(), 60);
        assert!(!s.is_timer_active());
        assert_eq!(s.score(), Score::default());
        assert!(!s.tick());
    }

    #[test]
    fn set_mode_practice_keeps_score() {
        let mut s = session(7);
        s.set_mode(DrillMode::Timed);
        assert!(s.is_timer_active());
        let class = s.current_target().pitch.class;
        s.submit_answer(&class);
        s.tick();

        s.set_mode(DrillMode::Practice);
        assert_eq!(s.mode(), DrillMode::Practice);
        assert!(!s.is_timer_active());
        assert_eq!(s.time_remaining(), 60);
        assert_eq!(s.score(), Score { correct: 1, attempts: 1 });
    }

    #[test]
    fn ticks_are_ignored_in_practice() {
        let mut s = session(8);
        assert!(!s.tick());
        assert_eq!(s.time_remaining(), 60);
    }

    #[test]
    fn custom_timer_and_history() {
        let config = DrillConfig {
            seed: Some(10),
            timer_duration: 3,
            history_capacity: 1,
            ..DrillConfig::default()
        };
        let mut s = DrillSession::new(chromatic_pool(), NoteNameEvaluator, &config).unwrap();
        s.start_timed();
        assert!(s.tick());
        assert!(s.tick());
        assert!(!s.tick());
        s.next_target().unwrap();
        assert_eq!(s.history().count(), 1);
    }

    #[test]
    fn replace_pool_moves_into_new_pool() {
        let mut s = session(11);
        let new_pool = vec![DrillTarget::new("A5".parse().unwrap())];
        let next = *s.replace_pool(new_pool).unwrap();
        assert_eq!(next.pitch.to_string(), "A5");
        assert!(matches!(s.replace_pool(Vec::new()), Err(DrillError::EmptyPool)));
    }

    #[test]
    fn submit_and_record_feeds_the_store() {
        let mut s = session(12);
        let mut store = MemoryProgressStore::default();
        let class = s.current_target().pitch.class;
        s.submit_and_record(&class, &mut store, TrainerId::Treble);
        s.submit_and_record(&class, &mut store, TrainerId::Treble);
        let progress = store.fetch(TrainerId::Treble).unwrap();
        assert_eq!(progress.total_attempts, 2);
        assert_eq!(progress.total_correct, 2);
        assert_eq!(progress.best_streak, 2);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut s = session(13);
        s.start_timed();
        s.tick();
        let snap = s.snapshot();
        assert_eq!(snap.mode, DrillMode::Timed);
        assert_eq!(snap.time_remaining, 59);
        assert!(snap.is_timer_active);
        assert_eq!(&snap.current_target, s.current_target());
    }
}
