use sqlx::Row;

use pointsrus_core::domain::score::ScoreRecord;

use super::{ensure_item, RepositoryError, ScoreRepository};
use crate::DbPool;

pub struct SqlScoreRepository {
    pool: DbPool,
}

impl SqlScoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ScoreRecord, RepositoryError> {
    let word: String = row.try_get("word").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let count: i64 = row.try_get("count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    ScoreRecord::new(word, count).map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl ScoreRepository for SqlScoreRepository {
    async fn apply_delta(&self, word: &str, delta: i64) -> Result<ScoreRecord, RepositoryError> {
        ensure_item(word)?;

        // One upsert statement: SQLite serializes writers, so increments never interleave.
        let row = sqlx::query(
            "INSERT INTO score (word, count) VALUES (?, ?)
             ON CONFLICT(word) DO UPDATE SET
                 count = score.count + excluded.count,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             RETURNING word, count",
        )
        .bind(word)
        .bind(delta)
        .fetch_one(&self.pool)
        .await?;

        row_to_record(&row)
    }

    async fn top_n(&self, limit: u32) -> Result<Vec<ScoreRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT word, count FROM score
             ORDER BY count ASC, word ASC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::SqlScoreRepository;
    use crate::repositories::{RepositoryError, ScoreRepository};
    use crate::{connect_with_settings, migrations};

    async fn memory_repo() -> (SqlScoreRepository, crate::DbPool) {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool");
        migrations::run_pending(&pool).await.expect("migrations");
        (SqlScoreRepository::new(pool.clone()), pool)
    }

    #[tokio::test]
    async fn first_delta_creates_record_and_second_updates_it() {
        let (repo, pool) = memory_repo().await;

        let created = repo.apply_delta("bar", 1).await.expect("create");
        assert_eq!((created.word.as_str(), created.count), ("bar", 1));

        let updated = repo.apply_delta("bar", -1).await.expect("update");
        assert_eq!(updated.count, 0);

        let (rows,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM score").fetch_one(&pool).await.expect("count");
        assert_eq!(rows, 1, "one record per word");
        pool.close().await;
    }

    #[tokio::test]
    async fn unseen_word_decrement_starts_negative() {
        let (repo, pool) = memory_repo().await;

        let record = repo.apply_delta("gremlin", -1).await.expect("create negative");

        assert_eq!(record.count, -1);
        pool.close().await;
    }

    #[tokio::test]
    async fn words_are_case_sensitive_keys() {
        let (repo, pool) = memory_repo().await;

        repo.apply_delta("Widget", 1).await.expect("upper");
        let lower = repo.apply_delta("widget", 1).await.expect("lower");

        assert_eq!(lower.count, 1);
        assert_eq!(repo.top_n(10).await.expect("top").len(), 2);
        pool.close().await;
    }

    #[tokio::test]
    async fn empty_word_is_rejected_before_touching_the_store() {
        let (repo, pool) = memory_repo().await;

        let error = repo.apply_delta("", 1).await.expect_err("empty word");

        assert!(matches!(error, RepositoryError::InvalidItem(_)));
        pool.close().await;
    }

    #[tokio::test]
    async fn top_n_orders_ascending_and_respects_limit() {
        let (repo, pool) = memory_repo().await;
        for (word, count) in [("a", 5), ("b", 2), ("c", -3), ("d", 2), ("e", 9)] {
            repo.apply_delta(word, count).await.expect("seed");
        }

        let top = repo.top_n(4).await.expect("top");
        let listed = top.iter().map(|r| (r.word.as_str(), r.count)).collect::<Vec<_>>();

        assert_eq!(listed, vec![("c", -3), ("b", 2), ("d", 2), ("a", 5)]);
        pool.close().await;
    }

    #[tokio::test]
    async fn top_n_never_exceeds_limit() {
        let (repo, pool) = memory_repo().await;
        for index in 0..15 {
            repo.apply_delta(&format!("item{index}"), index).await.expect("seed");
        }

        let top = repo.top_n(10).await.expect("top");

        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|pair| pair[0].count <= pair[1].count));
        pool.close().await;
    }

    #[tokio::test]
    async fn closed_pool_surfaces_database_error() {
        let (repo, pool) = memory_repo().await;
        pool.close().await;

        let error = repo.apply_delta("widget", 1).await.expect_err("closed pool");

        assert!(matches!(error, RepositoryError::Database(_)));
    }

    #[tokio::test]
    async fn concurrent_adjustments_do_not_lose_updates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().join("scores.db").display());
        let pool = connect_with_settings(&url, 4, 30).await.expect("pool");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = Arc::new(SqlScoreRepository::new(pool.clone()));

        let increments = 30_i64;
        let decrements = 12_i64;
        let deltas = (0..increments)
            .map(|_| 1)
            .zip((0..decrements).map(|_| -1).chain(std::iter::repeat(0)))
            .flat_map(|(plus, minus)| [plus, minus])
            .filter(|delta| *delta != 0)
            .collect::<Vec<i64>>();
        assert_eq!(deltas.len() as i64, increments + decrements);

        let tasks = deltas
            .into_iter()
            .map(|delta| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.apply_delta("race", delta).await })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.expect("join").expect("apply");
        }

        let top = repo.top_n(1).await.expect("top");
        assert_eq!(top[0].count, increments - decrements);
        pool.close().await;
    }
}
