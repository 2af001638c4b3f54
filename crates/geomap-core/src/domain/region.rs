//! Geofence domain entities
//!
//! This module defines the monitored [`Region`], the device's
//! [`ContainmentState`] relative to it, the [`NotificationReason`] used for
//! deduplication, and [`GeofenceState`], the versioned record that ties
//! them together for persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    errors::DomainError,
    newtypes::{Coordinate, RegionId},
};

/// Whether the device is believed to be inside the monitored region
///
/// This is a cached belief, updated only from region entry/exit callbacks.
/// It is never recomputed from a live location fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentState {
    /// No entry/exit callback has been accepted yet
    #[default]
    Unknown,
    /// Last accepted callback was an entry
    Inside,
    /// Last accepted callback was an exit
    Outside,
}

impl ContainmentState {
    /// Returns true if the protected checklist may be revealed
    pub fn is_inside(&self) -> bool {
        matches!(self, ContainmentState::Inside)
    }

    /// Returns the state name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ContainmentState::Unknown => "unknown",
            ContainmentState::Inside => "inside",
            ContainmentState::Outside => "outside",
        }
    }
}

impl std::fmt::Display for ContainmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reason a geofence notification is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationReason {
    /// The device crossed into the monitored region
    EnteredRegion,
    /// The device left the monitored region
    LeftRegion,
}

impl NotificationReason {
    /// The containment state implied by this transition
    pub fn containment(&self) -> ContainmentState {
        match self {
            NotificationReason::EnteredRegion => ContainmentState::Inside,
            NotificationReason::LeftRegion => ContainmentState::Outside,
        }
    }

    /// Stable identifier for the notification request
    ///
    /// Re-posting with the same identifier replaces a pending alert of the
    /// same kind instead of stacking a second one.
    pub fn request_identifier(&self) -> &'static str {
        match self {
            NotificationReason::EnteredRegion => "user_entered_region",
            NotificationReason::LeftRegion => "user_exit_region",
        }
    }
}

impl std::fmt::Display for NotificationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationReason::EnteredRegion => write!(f, "entered_region"),
            NotificationReason::LeftRegion => write!(f, "left_region"),
        }
    }
}

/// A circular monitored region
///
/// Regions are immutable; replacing the monitored area means creating a
/// new `Region` (with a new id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    id: RegionId,
    center: Coordinate,
    /// Radius in meters
    radius: f64,
    created_at: DateTime<Utc>,
}

impl Region {
    /// Creates a new region with a fresh id
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRadius` if `radius` is not a positive,
    /// finite number of meters.
    pub fn new(center: Coordinate, radius: f64) -> Result<Self, DomainError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(DomainError::InvalidRadius(radius));
        }
        Ok(Self {
            id: RegionId::new(),
            center,
            radius,
            created_at: Utc::now(),
        })
    }

    /// Returns the region id
    pub fn id(&self) -> &RegionId {
        &self.id
    }

    /// Returns the region center
    pub fn center(&self) -> &Coordinate {
        &self.center
    }

    /// Returns the radius in meters
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns when the region was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if `point` lies within the circle (boundary inclusive)
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.center.distance_to(point) <= self.radius
    }
}

/// The persisted geofence record
///
/// Holds the single active region, the cached containment state and the
/// last reason a notification was actually dispatched. Serialized as one
/// JSON document tagged with [`GeofenceState::SCHEMA_VERSION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceState {
    pub schema_version: u32,
    pub region: Option<Region>,
    pub containment: ContainmentState,
    pub last_notified: Option<NotificationReason>,
    pub updated_at: DateTime<Utc>,
}

impl GeofenceState {
    /// Current on-disk layout version
    pub const SCHEMA_VERSION: u32 = 1;

    /// Checks that a loaded record can be interpreted by this build
    ///
    /// # Errors
    /// Returns `DomainError::UnsupportedSchema` for records written by a
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

    /// Returns the id of the active region, if any
    pub fn active_region_id(&self) -> Option<&RegionId> {
        self.region.as_ref().map(Region::id)
    }

    /// Marks the record as modified now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for GeofenceState {
    fn default() -> Self {
        Self {
            schema_version: Self::SCHEMA_VERSION,
            region: None,
            containment: ContainmentState::Unknown,
            last_notified: None,
            updated_at: Utc::now(),
        }
    }
}
