//! Error types for the set log

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A proposed set or exercise that must not reach the store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("weight must not be negative (got {0})")]
    NegativeWeight(f64),

    #[error("weight must be a finite number")]
    NonFiniteWeight,

    #[error("a set needs weight or reps, both are zero")]
    EmptySet,

    #[error("a timed set needs a tempo in seconds")]
    MissingTempo,

    #[error("exercise {exercise_id} already has a set at {timestamp}")]
    DuplicateTimestamp {
        exercise_id: i64,
        timestamp: DateTime<Utc>,
    },

    #[error("exercise name must not be empty")]
    EmptyExerciseName,
}

/// Failure reported by a record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("store write failed: {0}")]
    Store(#[from] StoreError),

    #[error("exercise not found: {0}")]
    ExerciseNotFound(i64),

    #[error("set not found: {0}")]
    SetNotFound(i64),

    #[error("exercise already exists: {0}")]
    DuplicateExercise(String),
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        EngineError::Store(StoreError::Database(e))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
pub type StoreResult<T> = Result<T, StoreError>;
