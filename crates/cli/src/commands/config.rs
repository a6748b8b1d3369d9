use std::fs;
use std::path::{Path, PathBuf};

use pointsrus_core::config::read_env;
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: [(&str, String, &[&str]); 11] = [
        ("database.url", config.database.url.clone(), &["POINTSRUS_DATABASE_URL", "DB_URI"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["POINTSRUS_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["POINTSRUS_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "slack.bot_token",
            redact_token(config.slack.bot_token.expose_secret()),
            &["POINTSRUS_SLACK_BOT_TOKEN", "OAUTH_TOKEN"],
        ),
        (
            "slack.signing_secret",
            redact_secret(config.slack.signing_secret.expose_secret()),
            &["POINTSRUS_SLACK_SIGNING_SECRET", "SLACK_SIGNING_SECRET"],
        ),
        (
            "slack.api_base_url",
            config.slack.api_base_url.clone(),
            &["POINTSRUS_SLACK_API_BASE_URL"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["POINTSRUS_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["POINTSRUS_SERVER_PORT", "PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["POINTSRUS_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["POINTSRUS_LOGGING_LEVEL", "POINTSRUS_LOG_LEVEL"],
        ),
        (
            "logging.format",
            config.logging.format.as_str().to_string(),
            &["POINTSRUS_LOGGING_FORMAT", "POINTSRUS_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in fields {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {key_path} = {value} (source: {source})"));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    ["pointsrus.toml", "config/pointsrus.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| read_env(key).is_some()) {
        return format!("env ({env_key})");
    }

    if config_file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = config_file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

fn redact_secret(secret: &str) -> String {
    let shown = if secret.trim().is_empty() { "<empty>" } else { "<redacted>" };
    shown.to_string()
}
