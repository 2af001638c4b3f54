//! GeoMap Platform - Location and notification adapters
//!
//! Driven (secondary) adapters for the platform-facing ports of
//! `geomap-core`:
//!
//! - [`SimulatedLocationGateway`] - `IAuthorizationGateway` fed with
//!   coordinate fixes; turns boundary crossings into region events
//! - [`LogNotificationDispatcher`] - `INotificationDispatcher` that posts
//!   alerts to the log and keeps the badge count
//!
//! Both keep their state in memory. A desktop build has no OS region
//! monitor, so fixes come from a feed (see `geomapd`) or from the CLI.

pub mod location;
pub mod notifications;

pub use location::{SimulatedLocationGateway, SimulatorOptions};
pub use notifications::LogNotificationDispatcher;
