//! SQLite implementation of IGeofenceRepository
//!
//! Each record lives in its own row of `kv_store` under a namespaced key and
//! is written whole with `INSERT OR REPLACE`, so a write either lands
//! completely or not at all.
//!
//! ## Type Mapping
//!
//! | Domain Type     | Key                     | Strategy                     |
//! |-----------------|-------------------------|------------------------------|
//! | GeofenceState   | `geomap.geofence.state` | serde_json, whole record     |
//! | Checklist       | `geomap.checklist.items`| serde_json, whole list       |
//! | DateTime<Utc>   | `updated_at` column     | ISO 8601 via `to_rfc3339()`  |

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};

use geomap_core::{
    domain::{Checklist, GeofenceState},
    ports::IGeofenceRepository,
};

use crate::StoreError;

/// Key of the geofence record (region, containment, last notified reason)
pub const GEOFENCE_STATE_KEY: &str = "geomap.geofence.state";

/// Key of the checklist record
pub const CHECKLIST_KEY: &str = "geomap.checklist.items";

/// SQLite-based implementation of the geofence repository port
pub struct SqliteGeofenceRepository {
    pool: SqlitePool,
}

impl SqliteGeofenceRepository {
    /// Creates a new repository instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Serializes `value` and stores it under `key`
    async fn put_record<T: Serialize>(
        &self,
        key: &str,
        schema_version: u32,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        let updated_at = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT OR REPLACE INTO kv_store (key, schema_version, value, updated_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(key)
        .bind(i64::from(schema_version))
        .bind(&json)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        tracing::trace!(key, schema_version, "Saved record");
        Ok(())
    }

    /// Loads the record under `key`, refusing rows newer than `supported`
    async fn get_record<T: DeserializeOwned>(
        &self,
        key: &str,
        supported: u32,
    ) -> Result<Option<T>, StoreError> {
        let row = sqlx::query("SELECT schema_version, value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let version: i64 = row.get("schema_version");
        let found = u32::try_from(version).map_err(|_| {
            StoreError::SerializationError(format!("Invalid schema version {version} for '{key}'"))
        })?;
        if found > supported {
            return Err(StoreError::UnsupportedSchema {
                key: key.to_string(),
                found,
                supported,
            });
        }

        let json: String = row.get("value");
        let value = serde_json::from_str(&json).map_err(|e| {
            StoreError::SerializationError(format!("Invalid record '{key}': {e}"))
        })?;
        Ok(Some(value))
    }
}

#[async_trait::async_trait]
impl IGeofenceRepository for SqliteGeofenceRepository {
    async fn load_state(&self) -> anyhow::Result<Option<GeofenceState>> {
        Ok(self
            .get_record(GEOFENCE_STATE_KEY, GeofenceState::SCHEMA_VERSION)
            .await?)
    }

    async fn save_state(&self, state: &GeofenceState) -> anyhow::Result<()> {
        self.put_record(GEOFENCE_STATE_KEY, state.schema_version, state)
            .await?;
        Ok(())
    }

    async fn load_checklist(&self) -> anyhow::Result<Option<Checklist>> {
        Ok(self
            .get_record(CHECKLIST_KEY, Checklist::SCHEMA_VERSION)
            .await?)
    }

    async fn save_checklist(&self, checklist: &Checklist) -> anyhow::Result<()> {
        self.put_record(CHECKLIST_KEY, checklist.schema_version, checklist)
            .await?;
        Ok(())
    }
}
