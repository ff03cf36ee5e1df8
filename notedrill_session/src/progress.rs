// Cumulative drill statistics.
//
// The session engine only ever pushes `{correct, streak}` outcomes into a
// `ProgressStore`; it never reads the store back. Stores keep lifetime
// totals per trainer (attempts, correct answers, best streak) for display.
//
// Two implementations:
// - `MemoryProgressStore`: process-local, for tests and throwaway sessions.
// - `JsonProgressStore`: a single JSON file holding every trainer's totals,
//   rewritten in full on each record.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;

/// Which trainer a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainerId {
    Treble,
    Guitar,
    Ukulele,
}

/// One submission, as reported to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub correct: bool,
    /// Streak after this submission.
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerProgress {
    pub total_attempts: u64,
    pub total_correct: u64,
    pub best_streak: u32,
}

impl TrainerProgress {
    pub fn apply(&mut self, outcome: Outcome) {
        self.total_attempts += 1;
        if outcome.correct {
            self.total_correct += 1;
        }
        self.best_streak = self.best_streak.max(outcome.streak);
    }

    /// Fraction correct in [0, 1]; zero before any attempt.
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_attempts as f64
        }
    }
}

/// Opaque statistics store.
pub trait ProgressStore {
    fn fetch(&self, trainer: TrainerId) -> Result<TrainerProgress, StoreError>;

    /// Fold one outcome into the trainer's totals and return the new totals.
    fn record(&mut self, trainer: TrainerId, outcome: Outcome) -> Result<TrainerProgress, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    entries: BTreeMap<TrainerId, TrainerProgress>,
}

impl ProgressStore for MemoryProgressStore {
    fn fetch(&self, trainer: TrainerId) -> Result<TrainerProgress, StoreError> {
        Ok(self.entries.get(&trainer).copied().unwrap_or_default())
    }

    fn record(&mut self, trainer: TrainerId, outcome: Outcome) -> Result<TrainerProgress, StoreError> {
        let entry = self.entries.entry(trainer).or_default();
        entry.apply(outcome);
        Ok(*entry)
    }
}

/// File-backed store. A missing file reads as empty totals.
#[derive(Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
    entries: BTreeMap<TrainerId, TrainerProgress>,
}

impl JsonProgressStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        debug!(path = %path.display(), trainers = entries.len(), "progress store opened");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::create(&self.path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.entries)?;
        std::io::Write::flush(&mut writer).map_err(io_err)?;
        Ok(())
    }
}

impl ProgressStore for JsonProgressStore {
    fn fetch(&self, trainer: TrainerId) -> Result<TrainerProgress, StoreError> {
        Ok(self.entries.get(&trainer).copied().unwrap_or_default())
    }

    fn record(&mut self, trainer: TrainerId, outcome: Outcome) -> Result<TrainerProgress, StoreError> {
        let entry = self.entries.entry(trainer).or_default();
        entry.apply(outcome);
        let updated = *entry;
        self.save()?;
        Ok(updated)
    }
}
