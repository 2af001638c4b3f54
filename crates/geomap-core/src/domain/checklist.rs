//! Checklist domain entities
//!
//! The checklist is the content protected by the geofence. It is an
//! ordered list of items persisted as a single versioned blob.

use serde::{Deserialize, Serialize};

use super::{errors::DomainError, newtypes::ItemId};

/// A single checklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    id: ItemId,
    title: String,
    is_completed: bool,
}

impl ChecklistItem {
    /// Creates a new, uncompleted item
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            title: title.into(),
            is_completed: false,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Flips the completion flag
    pub fn toggle(&mut self) {
        self.is_completed = !self.is_completed;
    }
}

/// Ordered collection of checklist items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub schema_version: u32,
    items: Vec<ChecklistItem>,
}

impl Checklist {
    /// Current on-disk layout version
    pub const SCHEMA_VERSION: u32 = 1;

    /// Creates an empty checklist
    pub fn new() -> Self {
        Self {
            schema_version: Self::SCHEMA_VERSION,
            items: Vec::new(),
        }
    }

    /// Checklist seeded with the starter items shown on first launch
    pub fn with_defaults() -> Self {
        let first = ChecklistItem::new("Found the first picture");
        let mut second = ChecklistItem::new("Found the second picture");
        let third = ChecklistItem::new("Found the third picture");
        second.toggle();
        Self {
            schema_version: Self::SCHEMA_VERSION,
            items: vec![first, second, third],
        }
    }

    /// Checks that a loaded list can be interpreted by this build
    ///
    /// # Errors
    /// Returns `DomainError::UnsupportedSchema` for lists written by a
    /// newer version.
    pub fn check_schema(&self) -> Result<(), DomainError> {
        if self.schema_version > Self::SCHEMA_VERSION {
            return Err(DomainError::UnsupportedSchema {
                found: self.schema_version,
                supported: Self::SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an item and returns a reference to it
    pub fn push(&mut self, item: ChecklistItem) -> &ChecklistItem {
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    /// Removes the items at the given positions
    ///
    /// Positions refer to the list before removal. Duplicates are ignored.
    /// Returns the removed items in their original order, or `None` if any
    /// position is out of bounds (in which case nothing is removed).
    pub fn remove_at(&mut self, positions: &[usize]) -> Option<Vec<ChecklistItem>> {
        let mut sorted: Vec<usize> = positions.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.iter().any(|&p| p >= self.items.len()) {
            return None;
        }

        let mut removed = Vec::with_capacity(sorted.len());
        for &p in sorted.iter().rev() {
            removed.push(self.items.remove(p));
        }
        removed.reverse();
        Some(removed)
    }

    /// Moves the items at `positions` so they land before `destination`
    ///
    /// `destination` is an offset into the list *before* the move, in
    /// `0..=len`, matching list-view drag semantics: moving item 0 to
    /// offset 2 places it after the original item 1. Moved items keep
    /// their relative order. Returns `false` without changing anything if
    /// any index is out of range.
    pub fn move_items(&mut self, positions: &[usize], destination: usize) -> bool {
        let len = self.items.len();
        let mut sorted: Vec<usize> = positions.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if destination > len || sorted.iter().any(|&p| p >= len) {
            return false;
        }

        let shift = sorted.iter().filter(|&&p| p < destination).count();
        let mut moved = Vec::with_capacity(sorted.len());
        for &p in sorted.iter().rev() {
            moved.push(self.items.remove(p));
        }
        moved.reverse();

        let insert_at = destination - shift;
        for (offset, item) in moved.into_iter().enumerate() {
            self.items.insert(insert_at + offset, item);
        }
        true
    }

    /// Toggles completion of the item with `id`
    ///
    /// Returns the updated item, or `None` if no item has that id.
    pub fn toggle(&mut self, id: &ItemId) -> Option<&ChecklistItem> {
        let item = self.items.iter_mut().find(|i| i.id() == id)?;
        item.toggle();
        Some(&*item)
    }
}

impl Default for Checklist {
    fn default() -> Self {
        Self::new()
    }
}
