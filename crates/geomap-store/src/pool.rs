//! SQLite connection pool
//!
//! Both binaries open the same database file, often at the same time (a
//! CLI command while `geomapd` runs), so connections use WAL mode and a
//! busy timeout. `synchronous = FULL` makes a committed containment write
//! survive a crash immediately after the call returns.

use std::{path::Path, time::Duration};

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{debug, info};

use crate::StoreError;

const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Schema scripts, applied in order on every open; each one is idempotent
const MIGRATIONS: &[(&str, &str)] = &[(
    "20260101_initial",
    include_str!("migrations/20260101_initial.sql"),
)];

/// Pool of connections to the GeoMap database
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if needed) the database file and brings its schema up
    /// to date
    ///
    /// # Errors
    ///
    /// `StoreError::ConnectionFailed` if the directory or file cannot be
    /// opened, `StoreError::MigrationFailed` if a schema script fails.
    pub async fn new(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::ConnectionFailed(format!(
                    "cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(file_options(db_path))
            .await
            .map_err(|e| {
                StoreError::ConnectionFailed(format!("cannot open {}: {}", db_path.display(), e))
            })?;

        migrate(&pool).await?;
        info!(path = %db_path.display(), "GeoMap database ready");
        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests
    ///
    /// Limited to one connection: every SQLite in-memory connection is a
    /// separate database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::ConnectionFailed(format!("in-memory database: {}", e)))?;

        migrate(&pool).await?;
        debug!("In-memory GeoMap database ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for in-flight queries, then closes every connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn file_options(db_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .busy_timeout(BUSY_TIMEOUT)
}

async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    for &(name, script) in MIGRATIONS {
        sqlx::raw_sql(script)
            .execute(pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(format!("{}: {}", name, e)))?;
        debug!(migration = %name, "Schema script applied");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_has_kv_store() {
        let db = DatabasePool::in_memory().await.unwrap();
        assert!(table_names(db.pool()).await.contains(&"kv_store".to_string()));
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("geomap.db");

        let db = DatabasePool::new(&path).await.unwrap();
        db.close().await;
        assert!(path.exists());

        // Scripts run again on reopen and must not fail on existing tables
        let db = DatabasePool::new(&path).await.unwrap();
        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await;
    }
}
