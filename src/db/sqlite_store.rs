// src/db/sqlite_store.rs

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::{common::error::AppError, db::storage::KeyValueStore};

// Storage durável: uma tabela chave/valor no SQLite.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Conecta (criando o arquivo se preciso) e garante a tabela `kv_store`.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Banco em memória só existe por conexão: uma conexão só.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        tracing::info!("✅ Storage SQLite pronto em {}", database_url);
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upserts_values_in_memory_database() {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();

        store.set("@bodegas", "[1]").await.unwrap();
        store.set("@bodegas", "[1,2]").await.unwrap();
        assert_eq!(store.get("@bodegas").await.unwrap().as_deref(), Some("[1,2]"));

        store.remove("@bodegas").await.unwrap();
        assert_eq!(store.get("@bodegas").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("cubicaje.db").display());

        {
            let store = SqliteStore::connect(&url).await.unwrap();
            store.set("@session", "{\"userId\":\"x\"}").await.unwrap();
            store.pool.close().await;
        }

        let reopened = SqliteStore::connect(&url).await.unwrap();
        assert_eq!(
            reopened.get("@session").await.unwrap().as_deref(),
            Some("{\"userId\":\"x\"}")
        );
    }
}
