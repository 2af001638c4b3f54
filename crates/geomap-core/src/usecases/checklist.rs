//! Checklist use case
//!
//! The checklist is only reachable while the device is inside the saved
//! region. Every operation checks the controller's cached containment first
//! and fails with [`ChecklistError::ListHidden`] otherwise; no live location
//! query is made.
//!
//! Changes are applied to an in-memory copy and the whole list is written
//! back on every change.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    config::ChecklistConfig,
    domain::{Checklist, ChecklistItem, ItemId},
    ports::IGeofenceRepository,
};

use super::{errors::ChecklistError, geofence_controller::GeofenceController};

/// Reads and edits the geofence-protected checklist
pub struct ChecklistUseCase {
    repository: Arc<dyn IGeofenceRepository>,
    controller: Arc<GeofenceController>,
    config: ChecklistConfig,
    // Serializes load-modify-save cycles
    write_lock: Mutex<()>,
}

impl ChecklistUseCase {
    pub fn new(
        repository: Arc<dyn IGeofenceRepository>,
        controller: Arc<GeofenceController>,
        config: ChecklistConfig,
    ) -> Self {
        Self {
            repository,
            controller,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the items in display order
    pub async fn visible_items(&self) -> Result<Vec<ChecklistItem>, ChecklistError> {
        self.ensure_visible().await?;
        // First read may seed and save
        let _guard = self.write_lock.lock().await;
        let checklist = self.load().await?;
        Ok(checklist.items().to_vec())
    }

    /// Appends a new, not completed item
    ///
    /// # Errors
    ///
    /// `TitleTooShort` if the trimmed title has fewer characters than
    /// `checklist.min_title_length`.
    pub async fn add_item(&self, title: &str) -> Result<ChecklistItem, ChecklistError> {
        self.ensure_visible().await?;

        let title = title.trim();
        let actual = title.chars().count();
        if actual < self.config.min_title_length {
            return Err(ChecklistError::TitleTooShort {
                min: self.config.min_title_length,
                actual,
            });
        }

        let _guard = self.write_lock.lock().await;
        let mut checklist = self.load().await?;
        let item = checklist.push(ChecklistItem::new(title)).clone();
        self.save(&checklist).await?;

        info!(item = %item.id(), title = %item.title(), "Checklist item added");
        Ok(item)
    }

    /// Deletes the items at the given positions and returns them
    pub async fn delete_items(
        &self,
        positions: &[usize],
    ) -> Result<Vec<ChecklistItem>, ChecklistError> {
        self.ensure_visible().await?;

        let _guard = self.write_lock.lock().await;
        let mut checklist = self.load().await?;
        let len = checklist.len();
        let removed = checklist
            .remove_at(positions)
            .ok_or(ChecklistError::InvalidPosition { len })?;
        self.save(&checklist).await?;

        info!(count = removed.len(), "Checklist items deleted");
        Ok(removed)
    }

    /// Moves the items at `positions` to land before offset `destination`
    pub async fn move_items(
        &self,
        positions: &[usize],
        destination: usize,
    ) -> Result<Vec<ChecklistItem>, ChecklistError> {
        self.ensure_visible().await?;

        let _guard = self.write_lock.lock().await;
        let mut checklist = self.load().await?;
        if !checklist.move_items(positions, destination) {
            return Err(ChecklistError::InvalidPosition {
                len: checklist.len(),
            });
        }
        self.save(&checklist).await?;

        debug!(?positions, destination, "Checklist items moved");
        Ok(checklist.items().to_vec())
    }

    /// Flips completion of the item with `id`
    pub async fn toggle_item(&self, id: &ItemId) -> Result<ChecklistItem, ChecklistError> {
        self.ensure_visible().await?;

        let _guard = self.write_lock.lock().await;
        let mut checklist = self.load().await?;
        let item = checklist
            .toggle(id)
            .cloned()
            .ok_or(ChecklistError::ItemNotFound(*id))?;
        self.save(&checklist).await?;

        debug!(item = %item.id(), completed = item.is_completed(), "Checklist item toggled");
        Ok(item)
    }

    async fn ensure_visible(&self) -> Result<(), ChecklistError> {
        if self.controller.is_list_visible().await {
            Ok(())
        } else {
            debug!("Checklist requested outside the region");
            Err(ChecklistError::ListHidden)
        }
    }

    /// Loads the stored list, seeding it on first use
    ///
    /// Callers hold `write_lock`.
    async fn load(&self) -> Result<Checklist, ChecklistError> {
        let stored = self
            .repository
            .load_checklist()
            .await
            .map_err(ChecklistError::Storage)?;

        match stored {
            Some(checklist) => {
                checklist
                    .check_schema()
                    .map_err(|e| ChecklistError::Storage(e.into()))?;
                Ok(checklist)
            }
            None if self.config.seed_defaults => {
                let seeded = Checklist::with_defaults();
                self.save(&seeded).await?;
                info!(items = seeded.len(), "Seeded checklist with starter items");
                Ok(seeded)
            }
            None => Ok(Checklist::new()),
        }
    }

    async fn save(&self, checklist: &Checklist) -> Result<(), ChecklistError> {
        self.repository
            .save_checklist(checklist)
            .await
            .map_err(ChecklistError::Storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ports::RegionEvent,
        usecases::test_support::{Harness, MemoryRepo},
    };

    /// A harness whose device is inside its region, plus a checklist use case
    async fn inside() -> (Harness, ChecklistUseCase) {
        let (h, id) = Harness::new().await.with_region().await;
        h.controller.handle_event(RegionEvent::entered(id)).await.unwrap();
        let uc = ChecklistUseCase::new(
            h.repo.clone(),
            h.controller.clone(),
            ChecklistConfig::default(),
        );
        (h, uc)
    }

    #[tokio::test]
    async fn test_hidden_while_outside() {
        let (h, id) = Harness::new().await.with_region().await;
        let uc = ChecklistUseCase::new(
            h.repo.clone(),
            h.controller.clone(),
            ChecklistConfig::default(),
        );

        assert!(matches!(
            uc.visible_items().await,
            Err(ChecklistError::ListHidden)
        ));

        h.controller.handle_event(RegionEvent::exited(id)).await.unwrap();
        assert!(matches!(
            uc.add_item("Groceries").await,
            Err(ChecklistError::ListHidden)
        ));
        // Nothing was seeded while hidden
        assert!(h.repo.checklist.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_read_seeds_defaults() {
        let (h, uc) = inside().await;
        let items = uc.visible_items().await.unwrap();

        assert_eq!(items.len(), 3);
        assert!(h.repo.checklist.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_first_reads_seed_once() {
        let (h, uc) = inside().await;

        let (first, second, added) = tokio::join!(
            uc.visible_items(),
            uc.visible_items(),
            uc.add_item("Return library books")
        );
        assert_eq!(first.unwrap().len(), 3);
        assert!(second.unwrap().len() >= 3);
        added.unwrap();

        // One seed plus one add
        assert_eq!(*h.repo.checklist_saves.lock().unwrap(), 2);
        let items = uc.visible_items().await.unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[3].title(), "Return library books");
    }

    #[tokio::test]
    async fn test_no_seed_when_disabled() {
        let (h, _) = inside().await;
        let uc = ChecklistUseCase::new(
            h.repo.clone(),
            h.controller.clone(),
            ChecklistConfig {
                seed_defaults: false,
                ..ChecklistConfig::default()
            },
        );
        assert!(uc.visible_items().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_item_enforces_min_length() {
        let (_h, uc) = inside().await;

        let err = uc.add_item("  abc  ").await.unwrap_err();
        assert!(matches!(
            err,
            ChecklistError::TitleTooShort { min: 5, actual: 3 }
        ));

        let item = uc.add_item("Water the plants").await.unwrap();
        assert!(!item.is_completed());
        let items = uc.visible_items().await.unwrap();
        assert_eq!(items.last().map(ChecklistItem::title), Some("Water the plants"));
    }

    #[tokio::test]
    async fn test_toggle_and_missing_item() {
        let (_h, uc) = inside().await;
        let first = uc.visible_items().await.unwrap()[0].clone();

        let toggled = uc.toggle_item(first.id()).await.unwrap();
        assert_ne!(toggled.is_completed(), first.is_completed());

        let missing = ItemId::new();
        assert!(matches!(
            uc.toggle_item(&missing).await,
            Err(ChecklistError::ItemNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_delete_and_move() {
        let (_h, uc) = inside().await;
        let before = uc.visible_items().await.unwrap();

        let after_move = uc.move_items(&[0], 3).await.unwrap();
        assert_eq!(after_move[2].id(), before[0].id());

        let removed = uc.delete_items(&[2]).await.unwrap();
        assert_eq!(removed[0].id(), before[0].id());
        assert_eq!(uc.visible_items().await.unwrap().len(), 2);

        assert!(matches!(
            uc.delete_items(&[7]).await,
            Err(ChecklistError::InvalidPosition { len: 2 })
        ));
        assert!(matches!(
            uc.move_items(&[0], 9).await,
            Err(ChecklistError::InvalidPosition { len: 2 })
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_is_surfaced() {
        let repo = Arc::new(MemoryRepo::default());
        let (h, id) = Harness::with_repo(repo.clone()).await.with_region().await;
        h.controller.handle_event(RegionEvent::entered(id)).await.unwrap();
        let uc = ChecklistUseCase::new(
            repo.clone(),
            h.controller.clone(),
            ChecklistConfig::default(),
        );
        *repo.fail_writes.lock().unwrap() = true;

        assert!(matches!(
            uc.visible_items().await,
            Err(ChecklistError::Storage(_))
        ));
    }
}
