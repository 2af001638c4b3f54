//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IAuthorizationGateway`] - Location permission, coordinate fix, region monitoring
//! - [`INotificationDispatcher`] - Local notifications and badge management
//! - [`IGeofenceRepository`] - Persistent storage for geofence state and checklist

pub mod authorization;
pub mod geofence_repository;
pub mod notification;

pub use authorization::{AuthorizationStatus, IAuthorizationGateway, RegionEvent, RegionEventKind};
pub use geofence_repository::IGeofenceRepository;
pub use notification::{INotificationDispatcher, Notification};
