//! Geofence repository port (driven/secondary port)
//!
//! This module defines the interface for persisting the geofence record
//! (active region, containment, last notified reason) and the protected
//! checklist.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, filesystem, etc.) and don't need domain-level classification.
//! - Each record is written whole. A `save_*` call must be durable before
//!   it returns so a crash right after a transition does not lose it.
//! - A missing record loads as `None`; the caller supplies the default.

use crate::domain::{Checklist, GeofenceState};

/// Port trait for geofence state persistence
#[async_trait::async_trait]
pub trait IGeofenceRepository: Send + Sync {
    /// Loads the geofence record, if one has been saved
    async fn load_state(&self) -> anyhow::Result<Option<GeofenceState>>;

    /// Saves (inserts or replaces) the geofence record
    async fn save_state(&self, state: &GeofenceState) -> anyhow::Result<()>;

    /// Loads the checklist, if one has been saved
    async fn load_checklist(&self) -> anyhow::Result<Option<Checklist>>;

    /// Saves (inserts or replaces) the whole checklist
    async fn save_checklist(&self, checklist: &Checklist) -> anyhow::Result<()>;
}
