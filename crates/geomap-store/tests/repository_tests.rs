//! Integration tests for SqliteGeofenceRepository
//!
//! Most tests use a fresh in-memory database; the restart tests use a
//! temporary database file so a second pool sees what the first one wrote.

use std::sync::Arc;

use geomap_core::{
    domain::{
        Checklist, ChecklistItem, ContainmentState, Coordinate, GeofenceState, NotificationReason,
        Region,
    },
    ports::IGeofenceRepository,
    usecases::RegionStore,
};
use geomap_store::{
    DatabasePool, SqliteGeofenceRepository, StoreError, CHECKLIST_KEY, GEOFENCE_STATE_KEY,
};

// ============================================================================
// Test helpers
// ============================================================================

/// Create a fresh in-memory repository for each test
async fn setup() -> (DatabasePool, SqliteGeofenceRepository) {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    let repo = SqliteGeofenceRepository::new(pool.pool().clone());
    (pool, repo)
}

fn test_region() -> Region {
    Region::new(Coordinate::new(51.917220, 4.484050).unwrap(), 150.0).unwrap()
}

/// Writes a raw row, bypassing the repository
async fn insert_raw(pool: &DatabasePool, key: &str, version: i64, value: &str) {
    sqlx::query(
        "INSERT OR REPLACE INTO kv_store (key, schema_version, value, updated_at) \
         VALUES (?, ?, ?, '2026-01-01T00:00:00+00:00')",
    )
    .bind(key)
    .bind(version)
    .bind(value)
    .execute(pool.pool())
    .await
    .unwrap();
}

// ============================================================================
// Geofence state
// ============================================================================

#[tokio::test]
async fn test_load_state_empty() {
    let (_pool, repo) = setup().await;
    assert!(repo.load_state().await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_and_load_state() {
    let (_pool, repo) = setup().await;
    let region = test_region();
    let state = GeofenceState {
        region: Some(region.clone()),
        containment: ContainmentState::Inside,
        last_notified: Some(NotificationReason::EnteredRegion),
        ..GeofenceState::default()
    };

    repo.save_state(&state).await.unwrap();
    let loaded = repo.load_state().await.unwrap().unwrap();

    assert_eq!(loaded.containment, ContainmentState::Inside);
    assert_eq!(loaded.last_notified, Some(NotificationReason::EnteredRegion));
    assert_eq!(loaded.active_region_id(), Some(region.id()));
    assert_eq!(loaded.region.map(|r| r.radius()), Some(150.0));
}

#[tokio::test]
async fn test_save_state_replaces_previous() {
    let (pool, repo) = setup().await;
    let mut state = GeofenceState::default();
    repo.save_state(&state).await.unwrap();

    state.containment = ContainmentState::Outside;
    repo.save_state(&state).await.unwrap();

    let loaded = repo.load_state().await.unwrap().unwrap();
    assert_eq!(loaded.containment, ContainmentState::Outside);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_store")
        .fetch_one(pool.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_newer_schema_is_rejected() {
    let (pool, repo) = setup().await;
    let json = serde_json::to_string(&GeofenceState::default()).unwrap();
    insert_raw(&pool, GEOFENCE_STATE_KEY, 99, &json).await;

    let err = repo.load_state().await.unwrap_err();
    let store_err = err.downcast_ref::<StoreError>().unwrap();
    assert!(matches!(
        store_err,
        StoreError::UnsupportedSchema { found: 99, supported: 1, .. }
    ));
}

#[tokio::test]
async fn test_corrupt_record_is_an_error() {
    let (pool, repo) = setup().await;
    insert_raw(&pool, GEOFENCE_STATE_KEY, 1, "{not json").await;

    assert!(repo.load_state().await.is_err());
}

// ============================================================================
// Checklist
// ============================================================================

#[tokio::test]
async fn test_checklist_round_trip_keeps_order() {
    let (_pool, repo) = setup().await;
    assert!(repo.load_checklist().await.unwrap().is_none());

    let mut checklist = Checklist::with_defaults();
    checklist.push(ChecklistItem::new("Find the fourth picture"));
    checklist.move_items(&[3], 0);
    repo.save_checklist(&checklist).await.unwrap();

    let loaded = repo.load_checklist().await.unwrap().unwrap();
    assert_eq!(loaded, checklist);
    assert_eq!(loaded.items()[0].title(), "Find the fourth picture");
}

#[tokio::test]
async fn test_records_use_separate_keys() {
    let (pool, repo) = setup().await;
    repo.save_state(&GeofenceState::default()).await.unwrap();
    repo.save_checklist(&Checklist::new()).await.unwrap();

    let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
        .fetch_all(pool.pool())
        .await
        .unwrap();
    assert_eq!(keys, vec![CHECKLIST_KEY, GEOFENCE_STATE_KEY]);

    sqlx::query("DELETE FROM kv_store WHERE key = ?")
        .bind(GEOFENCE_STATE_KEY)
        .execute(pool.pool())
        .await
        .unwrap();
    assert!(repo.load_state().await.unwrap().is_none());
    assert!(repo.load_checklist().await.unwrap().is_some());
}

// ============================================================================
// Restart
// ============================================================================

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("geomap.db");
    let region = test_region();

    {
        let pool = DatabasePool::new(&db_path).await.unwrap();
        let repo = Arc::new(SqliteGeofenceRepository::new(pool.pool().clone()));
        let mut store = RegionStore::open(repo).await.unwrap();
        store.replace_region(region.clone()).await.unwrap();
        store
            .record_transition(
                ContainmentState::Inside,
                Some(NotificationReason::EnteredRegion),
            )
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = DatabasePool::new(&db_path).await.unwrap();
    let repo = Arc::new(SqliteGeofenceRepository::new(pool.pool().clone()));
    let store = RegionStore::open(repo).await.unwrap();

    assert_eq!(store.containment(), ContainmentState::Inside);
    assert_eq!(
        store.last_notified(),
        Some(NotificationReason::EnteredRegion)
    );
    assert_eq!(store.region().map(Region::id), Some(region.id()));
}
