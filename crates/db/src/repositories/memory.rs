use std::collections::HashMap;

use tokio::sync::RwLock;

use pointsrus_core::domain::score::ScoreRecord;

use super::{ensure_item, RepositoryError, ScoreRepository};

/// Process-local score store. The write lock is the atomicity boundary.
#[derive(Default)]
pub struct InMemoryScoreRepository {
    scores: RwLock<HashMap<String, i64>>,
}

impl InMemoryScoreRepository {
    pub fn with_scores<I, W>(scores: I) -> Self
    where
        I: IntoIterator<Item = (W, i64)>,
        W: Into<String>,
    {
        Self {
            scores: RwLock::new(
                scores.into_iter().map(|(word, count)| (word.into(), count)).collect(),
            ),
        }
    }

    pub async fn count(&self, word: &str) -> Option<i64> {
        self.scores.read().await.get(word).copied()
    }
}

#[async_trait::async_trait]
impl ScoreRepository for InMemoryScoreRepository {
    async fn apply_delta(&self, word: &str, delta: i64) -> Result<ScoreRecord, RepositoryError> {
        ensure_item(word)?;

        let mut scores = self.scores.write().await;
        let count = scores.entry(word.to_owned()).or_insert(0);
        *count += delta;
        Ok(ScoreRecord { word: word.to_owned(), count: *count })
    }

    async fn top_n(&self, limit: u32) -> Result<Vec<ScoreRecord>, RepositoryError> {
        let scores = self.scores.read().await;
        let mut records = scores
            .iter()
            .map(|(word, count)| ScoreRecord { word: word.clone(), count: *count })
            .collect::<Vec<_>>();
        records.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.word.cmp(&b.word)));
        records.truncate(limit as usize);
        Ok(records)
    }
}
