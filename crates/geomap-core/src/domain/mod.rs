//! Domain entities and business logic
//!
//! This module contains the core domain types for GeoMap:
//! - Newtypes for identifiers and validated coordinates
//! - The monitored region, containment state and persisted geofence record
//! - The geofence-protected checklist
//! - Domain-specific error types

pub mod checklist;
pub mod errors;
pub mod newtypes;
pub mod region;

// Re-export commonly used types
pub use checklist::{Checklist, ChecklistItem};
pub use errors::DomainError;
pub use newtypes::*;
pub use region::{ContainmentState, GeofenceState, NotificationReason, Region};
