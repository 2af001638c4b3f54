//! GeoMap Store - Local state persistence
//!
//! SQLite-backed storage for:
//! - The geofence record (active region, containment, last notified reason)
//! - The geofence-protected checklist
//!
//! ## Architecture
//!
//! This crate implements the `IGeofenceRepository` port from `geomap-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteGeofenceRepository`] - `IGeofenceRepository` implementation
//! - [`StoreError`] - Error types for store operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use geomap_store::{DatabasePool, SqliteGeofenceRepository};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/geomap/geomap.db")).await?;
//! let repo = SqliteGeofenceRepository::new(pool.pool().clone());
//! // Use repo as IGeofenceRepository...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod repository;

pub use pool::DatabasePool;
pub use repository::{SqliteGeofenceRepository, CHECKLIST_KEY, GEOFENCE_STATE_KEY};

/// Errors that can occur during store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A record was written by a newer version of GeoMap
    #[error("Record '{key}' has schema version {found}; this build supports up to {supported}")]
    UnsupportedSchema {
        key: String,
        found: u32,
        supported: u32,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::QueryFailed(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::SerializationError(e.to_string())
    }
}
