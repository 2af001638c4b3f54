//! GeoMap Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Region`, `GeofenceState`, `ContainmentState`, `Checklist`
//! - **Use cases** - `GeofenceController`, `RegionStore`, `ChecklistUseCase`
//! - **Port definitions** - Traits for adapters: `IAuthorizationGateway`,
//!   `INotificationDispatcher`, `IGeofenceRepository`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no platform code.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
