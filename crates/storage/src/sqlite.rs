use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use shared::domain::{Identifier, StateKey};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

use crate::StateProvider;

/// SQLite-backed provider. Each state key is one row holding a JSON array.
#[derive(Clone)]
pub struct SqliteStateProvider {
    pool: Pool<Sqlite>,
}

impl SqliteStateProvider {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // every connection to an in-memory url opens its own database
        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open selection database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to migrate selection database")?;
        Ok(Self { pool })
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

    /// When the selection under `key` was last written, if it exists.
    pub async fn last_updated(&self, key: &StateKey) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT updated_at FROM selection_state WHERE state_key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let updated_at: NaiveDateTime = row.try_get("updated_at")?;
            Ok(updated_at.and_utc())
        })
        .transpose()
    }
}

#[async_trait]
impl StateProvider for SqliteStateProvider {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<Identifier>>> {
        let row = sqlx::query("SELECT identifiers FROM selection_state WHERE state_key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load selection state '{key}'"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("identifiers")?;
        let identifiers = serde_json::from_str(&raw)
            .with_context(|| format!("stored selection state '{key}' is not a JSON array"))?;
        Ok(Some(identifiers))
    }

    async fn set(&self, key: &StateKey, value: &[Identifier]) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO selection_state (state_key, identifiers, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(state_key) DO UPDATE SET identifiers = excluded.identifiers, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key.as_str())
        .bind(encoded)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save selection state '{key}'"))?;
        Ok(())
    }

    async fn clear(&self, key: &StateKey) -> Result<()> {
        sqlx::query("DELETE FROM selection_state WHERE state_key = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to clear selection state '{key}'"))?;
        Ok(())
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
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

pub(crate) fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
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
