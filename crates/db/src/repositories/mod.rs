use async_trait::async_trait;
use thiserror::Error;

use pointsrus_core::domain::score::{validate_item_name, ScoreRecord};
use pointsrus_core::errors::{ApplicationError, DomainError};

pub mod memory;
pub mod score;

pub use memory::InMemoryScoreRepository;
pub use score::SqlScoreRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid item: {0}")]
    InvalidItem(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::InvalidItem(item) => Self::Domain(DomainError::InvalidItem(item)),
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

/// Persistent mapping from item name to score.
///
/// Implementations own atomicity: concurrent `apply_delta` calls for the same
/// word must never lose an update.
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    /// Adds `delta` to the stored count, creating the record with `count = delta`
    /// when the word is unseen. Returns the record after the update.
    async fn apply_delta(&self, word: &str, delta: i64) -> Result<ScoreRecord, RepositoryError>;

    /// Up to `limit` records ordered by ascending count, ties broken by word.
    async fn top_n(&self, limit: u32) -> Result<Vec<ScoreRecord>, RepositoryError>;
}

fn ensure_item(word: &str) -> Result<(), RepositoryError> {
    validate_item_name(word)
        .map_err(|DomainError::InvalidItem(reason)| RepositoryError::InvalidItem(reason))
}
