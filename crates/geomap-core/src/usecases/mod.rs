//! Use cases (application services)
//!
//! Use cases orchestrate domain entities and ports. They hold no platform
//! code; adapters are injected through the port traits.
//!
//! - [`RegionStore`] - cached, write-through view of the geofence record
//! - [`GeofenceController`] - applies region callbacks and lifecycle changes
//! - [`ChecklistUseCase`] - the list gated on containment

pub mod checklist;
pub mod errors;
pub mod geofence_controller;
pub mod region_store;

#[cfg(test)]
pub(crate) mod test_support;

pub use checklist::ChecklistUseCase;
pub use errors::{ChecklistError, GeofenceError, PermissionKind};
pub use geofence_controller::{
    AuthorizationOutcome, EventOutcome, GeofenceController, IgnoreReason,
};
pub use region_store::RegionStore;
