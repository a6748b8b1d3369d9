use std::sync::Arc;

use pointsrus_core::config::{AppConfig, ConfigError, LoadOptions};
use pointsrus_db::{connect_with_settings, migrations, DbPool, SqlScoreRepository};
use pointsrus_slack::{
    events::default_dispatcher,
    reply::ReplyError,
    signature::RequestVerifier,
    web_api::WebApiReplySender,
};
use thiserror::Error;
use tracing::info;

use crate::ingress::IngressState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub ingress: IngressState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("slack reply client could not be built: {0}")]
    ReplyClient(#[source] ReplyError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let replies =
        WebApiReplySender::new(config.slack.api_base_url.clone(), config.slack.bot_token.clone())
            .map_err(BootstrapError::ReplyClient)?;
    let scores = SqlScoreRepository::new(db_pool.clone());
    let dispatcher = default_dispatcher(Arc::new(scores), Arc::new(replies));
    let ingress = IngressState::new(
        RequestVerifier::new(config.slack.signing_secret.clone()),
        Arc::new(dispatcher),
    );

    Ok(Application { config, db_pool, ingress })
}

#[cfg(test)]
mod tests {
    use pointsrus_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                slack_bot_token: Some("xoxb-test".to_string()),
                slack_signing_secret: Some("test-signing-secret".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_app_level_token() {
        let mut options = valid_overrides("sqlite::memory:");
        options.overrides.slack_bot_token = Some("xapp-oops".to_string());

        let result = bootstrap(options).await;

        let message = result.err().expect("error").to_string();
        assert!(message.contains("slack.bot_token"));
        assert!(message.contains("app-level token"));
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_signing_secret() {
        let mut options = valid_overrides("sqlite::memory:");
        options.overrides.slack_signing_secret = Some("  ".to_string());

        let message = bootstrap(options).await.err().expect("error").to_string();

        assert!(message.contains("slack.signing_secret"));
    }

    #[tokio::test]
    async fn bootstrap_migrates_the_score_store() {
        let app = bootstrap(valid_overrides("sqlite::memory:"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'score'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("score table should exist after bootstrap");
        assert_eq!(table_count, 1);

        app.ingress.drain().await;
        app.db_pool.close().await;
    }
}
