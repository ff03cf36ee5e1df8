// Error types for the session crate.

use std::path::PathBuf;

use notedrill_prng::RngError;
use notedrill_theory::TheoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrillError {
    /// A drill needs at least one candidate target.
    #[error("candidate pool is empty")]
    EmptyPool,

    #[error(transparent)]
    Rng(#[from] RngError),

    #[error(transparent)]
    Theory(#[from] TheoryError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed progress data: {0}")]
    Json(#[from] serde_json::Error),
}
