//! Authorization gateway port (driven/secondary port)
//!
//! This module defines the interface to the platform location services:
//! permission status, the current coordinate fix, region monitoring, and
//! the entry/exit events the platform reports for the monitored region.
//!
//! ## Design Notes
//!
//! - The authorization status is an opaque platform value; the core only
//!   distinguishes "not asked yet", "refused" and "granted".
//! - Events carry the id of the region they were raised for. Delivery of
//!   events is the adapter's concern (a channel, a callback bridge, ...);
//!   the controller only consumes [`RegionEvent`] values.

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, NotificationReason, Region, RegionId};

/// Location permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    NotDetermined,
    /// Access is blocked by policy (e.g. parental controls)
    Restricted,
    /// The user refused access
    Denied,
    /// Access granted while the app is in use
    AuthorizedWhenInUse,
    /// Access granted at all times (required for background region events)
    AuthorizedAlways,
}

impl AuthorizationStatus {
    /// Returns true if location access has been granted
    pub fn is_authorized(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::AuthorizedWhenInUse | AuthorizationStatus::AuthorizedAlways
        )
    }

    /// Returns true if the user or policy refused access
    pub fn is_refused(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Restricted | AuthorizationStatus::Denied
        )
    }

    /// Returns the status name as a string
    pub fn name(&self) -> &'static str {
        match self {
            AuthorizationStatus::NotDetermined => "not_determined",
            AuthorizationStatus::Restricted => "restricted",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::AuthorizedWhenInUse => "authorized_when_in_use",
            AuthorizationStatus::AuthorizedAlways => "authorized_always",
        }
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for AuthorizationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_determined" => Ok(AuthorizationStatus::NotDetermined),
            "restricted" => Ok(AuthorizationStatus::Restricted),
            "denied" => Ok(AuthorizationStatus::Denied),
            "authorized_when_in_use" => Ok(AuthorizationStatus::AuthorizedWhenInUse),
            "authorized_always" => Ok(AuthorizationStatus::AuthorizedAlways),
            other => Err(format!("unknown authorization status '{other}'")),
        }
    }
}

/// Direction of a boundary crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionEventKind {
    Entered,
    Exited,
}

impl RegionEventKind {
    /// Notification reason corresponding to this crossing
    pub fn reason(&self) -> NotificationReason {
        match self {
            RegionEventKind::Entered => NotificationReason::EnteredRegion,
            RegionEventKind::Exited => NotificationReason::LeftRegion,
        }
    }
}

/// A region entry/exit callback from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEvent {
    /// Region the platform raised the event for
    pub region_id: RegionId,
    pub kind: RegionEventKind,
}

impl RegionEvent {
    pub fn entered(region_id: RegionId) -> Self {
        Self {
            region_id,
            kind: RegionEventKind::Entered,
        }
    }

    pub fn exited(region_id: RegionId) -> Self {
        Self {
            region_id,
            kind: RegionEventKind::Exited,
        }
    }
}

/// Port trait for platform location services
///
/// ## Implementation Notes
///
/// - `current_coordinate` returns the last known fix without blocking for a
///   new one; `None` means no fix has been obtained yet.
/// - `max_monitoring_distance` is the largest radius (meters) the platform
///   can monitor; `None` means the platform cannot report one.
/// - `start_monitoring` for a region id that is already monitored is a
///   no-op; `stop_monitoring` for an unknown region is a no-op.
#[async_trait::async_trait]
pub trait IAuthorizationGateway: Send + Sync {
    /// Current location permission
    async fn authorization_status(&self) -> AuthorizationStatus;

    /// Asks the user for "always" location access
    async fn request_authorization(&self) -> anyhow::Result<()>;

    /// Last known device coordinate
    async fn current_coordinate(&self) -> Option<Coordinate>;

    /// Whether the platform supports circular region monitoring
    async fn is_monitoring_available(&self) -> bool;

    /// Largest radius (meters) the platform will monitor
    async fn max_monitoring_distance(&self) -> Option<f64>;

    /// Begins reporting entry/exit events for `region`
    async fn start_monitoring(&self, region: &Region) -> anyhow::Result<()>;

    /// Stops reporting events for `region`
    async fn stop_monitoring(&self, region: &Region) -> anyhow::Result<()>;

    /// Convenience check derived from [`authorization_status`](Self::authorization_status)
    async fn is_authorized(&self) -> bool {
        self.authorization_status().await.is_authorized()
    }
}
