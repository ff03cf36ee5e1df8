// Note Drill session engine.
//
// Turns the theory crate's pitch and position mappers into a drill: a pool
// of targets, a deterministic rotation through it that avoids recent
// repeats, answer evaluation through a pluggable predicate, score and streak
// tracking, and a practice/timed mode state machine with a countdown.
//
// Module overview:
// - `config.rs`:    `DrillConfig`, loaded from JSON, with seed, timer,
//                   history, tick interval, and fret range settings.
// - `target.rs`:    `DrillTarget` (a pitch, optionally pinned to a position).
// - `evaluate.rs`:  The `Evaluator` seam plus the stock note-name and
//                   fretboard evaluators and a closure adapter.
// - `session.rs`:   `DrillSession`, the explicit session record and its
//                   transitions (`next_target`, `submit_answer`, `set_mode`,
//                   `start_timed`, `reset_timed`, `tick`).
// - `countdown.rs`: Real-time driver that ticks a shared session on a
//                   background thread and is cancelled on drop.
// - `trainer.rs`:   Pool builders and per-trainer helpers (answer choices,
//                   used-position tracking, hard-mode string lock).
// - `progress.rs`:  The statistics store interface and its in-memory and
//                   JSON-file implementations.
//
// Sessions are single-owner and never shared between trainers. The only
// cross-thread access is the countdown driver, which serializes through the
// session's mutex.

pub mod config;
pub mod countdown;
pub mod error;
pub mod evaluate;
pub mod progress;
pub mod session;
pub mod target;
pub mod trainer;

pub use config::DrillConfig;
pub use error::DrillError;
pub use session::{DrillMode, DrillSession, Score, SubmissionResult};
pub use target::DrillTarget;
