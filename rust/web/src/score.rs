use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("score store unavailable: {0}")]
    Unavailable(String),
}

/// Narrow seam to the external score persistence collaborator.
///
/// Scores are keyed by player address, compared case-insensitively. Both
/// calls may cross a process boundary and fail; callers decide what a
/// failure means for in-flight game state.
pub trait ScoreStore: Send + Sync {
    fn get_score(&self, address: &str) -> Result<Option<i64>, ScoreError>;
    fn put_score(&self, address: &str, score: i64) -> Result<(), ScoreError>;
}

/// In-process score store used by default and in tests.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    scores: RwLock<HashMap<String, i64>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get_score(&self, address: &str) -> Result<Option<i64>, ScoreError> {
        let scores = self
            .scores
            .read()
            .map_err(|_| ScoreError::Unavailable("score map poisoned".into()))?;
        Ok(scores.get(&address.to_lowercase()).copied())
    }

    fn put_score(&self, address: &str, score: i64) -> Result<(), ScoreError> {
        let mut scores = self
            .scores
            .write()
            .map_err(|_| ScoreError::Unavailable("score map poisoned".into()))?;
        scores.insert(address.to_lowercase(), score);
        Ok(())
    }
}
