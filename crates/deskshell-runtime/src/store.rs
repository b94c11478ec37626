//! SQLite-backed stores for the resource pool.
//!
//! Wraps SQLite access via sqlx. Each resource id maps to one database file,
//! which the pool has already provisioned from the template before
//! [`SqliteConnector::connect`] runs.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use deskshell_core::ResourceConfig;

use crate::error::PoolError;
use crate::pool::Connector;

/// Opens a [`SqlitePool`] per provisioned store.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    max_connections: u32,
}

impl SqliteConnector {
    /// Create a connector opening pools of at most `max_connections`.
    pub fn new(max_connections: u32) -> Self {
        Self {
            max_connections: max_connections.max(1),
        }
    }
}

impl Default for SqliteConnector {
    fn default() -> Self {
        // SQLite performs best with a single writer
        Self::new(1)
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    type Handle = SqlitePool;

    async fn connect(&self, config: &ResourceConfig) -> Result<SqlitePool, PoolError> {
        let options = SqliteConnectOptions::new()
            .filename(&config.storage_path)
            // The pool provisions the file; a missing store is an error here.
            .create_if_missing(false)
            // Keep each store a single self-contained file.
            .journal_mode(SqliteJournalMode::Delete)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| PoolError::Connect(e.to_string()))?;

        info!(
            resource = %config.id,
            path = %config.storage_path.display(),
            "Connected to store"
        );
        Ok(pool)
    }

    async fn disconnect(&self, handle: &SqlitePool) {
        handle.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ResourcePool;
    use deskshell_core::{ResourceId, ResourceLayout};
    use std::path::Path;

    async fn create_template(path: &Path) {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE continents (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO continents (name) VALUES ('Europe'), ('Asia')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    #[tokio::test]
    async fn test_switch_opens_copy_of_template_database() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("save_0.db");
        create_template(&template).await;

        let layout = ResourceLayout::new(dir.path().join("databases"), template.clone());
        let pool = ResourcePool::new(SqliteConnector::default(), layout);

        let first = pool.acquire(ResourceId::new(1)).await.unwrap();
        sqlx::query("INSERT INTO continents (name) VALUES ('Africa')")
            .execute(&*first)
            .await
            .unwrap();

        let second = pool.acquire(ResourceId::new(2)).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM continents")
            .fetch_one(&*second)
            .await
            .unwrap();
        assert_eq!(count, 2);

        assert_eq!(pool.release_current().await, Some(ResourceId::new(2)));
        assert!(second.is_closed());
    }

    #[tokio::test]
    async fn test_connect_missing_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResourceConfig {
            id: ResourceId::new(9),
            template_id: ResourceId::TEMPLATE,
            storage_path: dir.path().join("save_9.db"),
        };

        let result = SqliteConnector::default().connect(&config).await;
        assert!(matches!(result, Err(PoolError::Connect(_))));
    }
}
