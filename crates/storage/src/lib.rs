use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

use shared::domain::{Message, Position, SessionKey};

/// Durable log cap. Writes keep only the newest entries beyond this bound;
/// this is the only garbage-collection rule in the widget.
pub const HISTORY_LIMIT: usize = 500;

pub const DEFAULT_NAMESPACE: &str = "chatdock";

/// Failure reasons surfaced to the controllers. They decide whether to log
/// and continue; the store itself never swallows an error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-session key-value persistence for the conversation log and launcher
/// position. Two keys per session: `<ns>:chat:<session>` and
/// `<ns>:pos:<session>`.
#[derive(Clone)]
pub struct ChatStore {
    pool: Pool<Sqlite>,
    namespace: String,
}

impl ChatStore {
    pub async fn new(database_url: &str, namespace: impl Into<String>) -> Result<Self> {
        let database_url = normalize_database_url(database_url);
        ensure_parent_dir_exists(&database_url)?;

        let connect_options =
            SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
        // Separate connections to an in-memory database each see their own
        // empty schema, so keep the pool at a single connection there.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to ensure kv table exists")?;

        Ok(Self {
            pool,
            namespace: namespace.into(),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    fn chat_key(&self, session: &SessionKey) -> String {
        format!("{}:chat:{}", self.namespace, session.as_str())
    }

    fn pos_key(&self, session: &SessionKey) -> String {
        format!("{}:pos:{}", self.namespace, session.as_str())
    }

    async fn read_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    async fn write_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Loads the persisted log. An absent or malformed value reads as an
    /// empty log; corrupt data is indistinguishable from absence by design.
    pub async fn read_history(&self, session: &SessionKey) -> Result<Vec<Message>, StorageError> {
        let Some(raw) = self.read_value(&self.chat_key(session)).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(messages) => Ok(messages),
            Err(err) => {
                tracing::warn!("discarding corrupt history for session {session}: {err}");
                Ok(Vec::new())
            }
        }
    }

    /// Persists the log, keeping only the newest [`HISTORY_LIMIT`] entries.
    pub async fn write_history(
        &self,
        session: &SessionKey,
        log: &[Message],
    ) -> Result<(), StorageError> {
        let tail_start = log.len().saturating_sub(HISTORY_LIMIT);
        let raw = serde_json::to_string(&log[tail_start..])?;
        self.write_value(&self.chat_key(session), &raw).await
    }

    pub async fn clear_history(&self, session: &SessionKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(self.chat_key(session))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn read_position(
        &self,
        session: &SessionKey,
    ) -> Result<Option<Position>, StorageError> {
        let Some(raw) = self.read_value(&self.pos_key(session)).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(position) => Ok(Some(position)),
            Err(err) => {
                tracing::warn!("discarding corrupt position for session {session}: {err}");
                Ok(None)
            }
        }
    }

    pub async fn write_position(
        &self,
        session: &SessionKey,
        position: Position,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&position)?;
        self.write_value(&self.pos_key(session), &raw).await
    }
}

fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();

    if raw.is_empty() {
        return "sqlite::memory:".to_string();
    }

    if raw.starts_with("sqlite::memory:") || raw.starts_with("sqlite://") || raw.contains("://") {
        return raw.to_string();
    }

    if let Some(path) = raw.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
