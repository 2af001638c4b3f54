//! Region store
//!
//! Holds the single monitored region, the cached containment state and the
//! last dispatched notification reason. Reads are served from the cached
//! copy; every mutation goes through [`IGeofenceRepository::save_state`]
//! first and only replaces the cached copy once the write has succeeded,
//! so the cache never runs ahead of what is on disk.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    domain::{ContainmentState, GeofenceState, NotificationReason, Region},
    ports::IGeofenceRepository,
};

/// Cached, write-through view of the persisted geofence record
pub struct RegionStore {
    repository: Arc<dyn IGeofenceRepository>,
    state: GeofenceState,
}

impl RegionStore {
    /// Loads the persisted record, or starts from the default state if none
    /// has been saved yet
    ///
    /// # Errors
    ///
    /// Returns an error if the repository read fails or the record was
    /// written by a newer schema version.
    pub async fn open(repository: Arc<dyn IGeofenceRepository>) -> Result<Self> {
        let state = repository
            .load_state()
            .await
            .context("Failed to load geofence state")?
            .unwrap_or_default();
        state.check_schema()?;

        debug!(
            containment = %state.containment,
            has_region = state.region.is_some(),
            "Opened region store"
        );

        Ok(Self { repository, state })
    }

    /// The active region, if one has been set
    pub fn region(&self) -> Option<&Region> {
        self.state.region.as_ref()
    }

    /// Last persisted containment state; never a live location check
    pub fn containment(&self) -> ContainmentState {
        self.state.containment
    }

    /// Reason of the last notification actually dispatched
    pub fn last_notified(&self) -> Option<NotificationReason> {
        self.state.last_notified
    }

    /// The whole cached record
    pub fn state(&self) -> &GeofenceState {
        &self.state
    }

    /// Persists a new containment state
    pub async fn set_containment(&mut self, containment: ContainmentState) -> Result<()> {
        let mut next = self.state.clone();
        next.containment = containment;
        self.commit(next).await
    }

    /// Replaces the active region and returns the previous one
    pub async fn replace_region(&mut self, region: Region) -> Result<Option<Region>> {
        let mut next = self.state.clone();
        let previous = next.region.replace(region);
        self.commit(next).await?;
        Ok(previous)
    }

    /// Persists the outcome of an accepted region callback in one write
    ///
    /// `dispatched` is the reason of the notification sent for this
    /// callback, or `None` if none was sent (in which case the last
    /// notified reason is kept).
    pub async fn record_transition(
        &mut self,
        containment: ContainmentState,
        dispatched: Option<NotificationReason>,
    ) -> Result<()> {
        let mut next = self.state.clone();
        next.containment = containment;
        if dispatched.is_some() {
            next.last_notified = dispatched;
        }
        self.commit(next).await
    }

    /// Forgets containment and the last notified reason, keeping the region
    pub async fn reset(&mut self) -> Result<()> {
        let mut next = self.state.clone();
        next.containment = ContainmentState::Unknown;
        next.last_notified = None;
        self.commit(next).await
    }

    async fn commit(&mut self, mut next: GeofenceState) -> Result<()> {
        next.schema_version = GeofenceState::SCHEMA_VERSION;
        next.touch();
        self.repository
            .save_state(&next)
            .await
            .context("Failed to persist geofence state")?;
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Checklist, Coordinate};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Repository that keeps the last saved state and can be told to fail
    #[derive(Default)]
    struct MemoryRepo {
        state: Mutex<Option<GeofenceState>>,
        fail_writes: Mutex<bool>,
    }

    #[async_trait]
    impl IGeofenceRepository for MemoryRepo {
        async fn load_state(&self) -> anyhow::Result<Option<GeofenceState>> {
            Ok(self.state.lock().unwrap().clone())
        }
        async fn save_state(&self, state: &GeofenceState) -> anyhow::Result<()> {
            if *self.fail_writes.lock().unwrap() {
                anyhow::bail!("disk full");
            }
            *self.state.lock().unwrap() = Some(state.clone());
            Ok(())
        }
        async fn load_checklist(&self) -> anyhow::Result<Option<Checklist>> {
            Ok(None)
        }
        async fn save_checklist(&self, _c: &Checklist) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn region() -> Region {
        Region::new(Coordinate::new(51.9, 4.48).unwrap(), 100.0).unwrap()
    }

    #[tokio::test]
    async fn test_open_empty_repository_uses_defaults() {
        let store = RegionStore::open(Arc::new(MemoryRepo::default()))
            .await
            .unwrap();
        assert_eq!(store.containment(), ContainmentState::Unknown);
        assert!(store.region().is_none());
    }

    #[tokio::test]
    async fn test_set_containment_is_written_through() {
        let repo = Arc::new(MemoryRepo::default());
        let mut store = RegionStore::open(repo.clone()).await.unwrap();

        store.set_containment(ContainmentState::Inside).await.unwrap();

        let saved = repo.state.lock().unwrap().clone().unwrap();
        assert_eq!(saved.containment, ContainmentState::Inside);
        assert_eq!(store.containment(), ContainmentState::Inside);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_untouched() {
        let repo = Arc::new(MemoryRepo::default());
        let mut store = RegionStore::open(repo.clone()).await.unwrap();
        *repo.fail_writes.lock().unwrap() = true;

        assert!(store.set_containment(ContainmentState::Outside).await.is_err());
        assert_eq!(store.containment(), ContainmentState::Unknown);
    }

    #[tokio::test]
    async fn test_replace_region_returns_previous() {
        let mut store = RegionStore::open(Arc::new(MemoryRepo::default()))
            .await
            .unwrap();
        let a = region();
        let b = region();

        assert!(store.replace_region(a.clone()).await.unwrap().is_none());
        let previous = store.replace_region(b.clone()).await.unwrap();
        assert_eq!(previous.as_ref().map(Region::id), Some(a.id()));
        assert_eq!(store.region().map(Region::id), Some(b.id()));
    }

    #[tokio::test]
    async fn test_record_transition_keeps_last_notified_when_nothing_sent() {
        let mut store = RegionStore::open(Arc::new(MemoryRepo::default()))
            .await
            .unwrap();
        store
            .record_transition(
                ContainmentState::Inside,
                Some(NotificationReason::EnteredRegion),
            )
            .await
            .unwrap();
        store
            .record_transition(ContainmentState::Outside, None)
            .await
            .unwrap();

        assert_eq!(store.containment(), ContainmentState::Outside);
        assert_eq!(
            store.last_notified(),
            Some(NotificationReason::EnteredRegion)
        );
    }

    #[tokio::test]
    async fn test_reset_keeps_region() {
        let mut store = RegionStore::open(Arc::new(MemoryRepo::default()))
            .await
            .unwrap();
        let r = region();
        store.replace_region(r.clone()).await.unwrap();
        store
            .record_transition(
                ContainmentState::Inside,
                Some(NotificationReason::EnteredRegion),
            )
            .await
            .unwrap();

        store.reset().await.unwrap();

        assert_eq!(store.containment(), ContainmentState::Unknown);
        assert!(store.last_notified().is_none());
        assert_eq!(store.region().map(Region::id), Some(r.id()));
    }

    #[tokio::test]
    async fn test_open_rejects_newer_schema() {
        let repo = MemoryRepo::default();
        *repo.state.lock().unwrap() = Some(GeofenceState {
            schema_version: 99,
            ..GeofenceState::default()
        });
        assert!(RegionStore::open(Arc::new(repo)).await.is_err());
    }
}
