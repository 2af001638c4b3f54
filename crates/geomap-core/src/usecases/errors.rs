//! Use-case error types
//!
//! [`GeofenceError`] covers the controller's failure modes; the first four
//! variants are expected conditions that the caller reports to the user
//! while persisted state stays as it was. [`ChecklistError`] covers the
//! protected list.

use thiserror::Error;

use crate::domain::{DomainError, ItemId};

/// Which platform permission was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Location,
    Notifications,
}

impl std::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionKind::Location => write!(f, "location"),
            PermissionKind::Notifications => write!(f, "notifications"),
        }
    }
}

/// Errors produced by the geofence controller
#[derive(Debug, Error)]
pub enum GeofenceError {
    /// The user or policy refused a permission
    #[error("Permission denied: {0}")]
    PermissionDenied(PermissionKind),

    /// The platform cannot monitor circular regions
    #[error("Region monitoring is unavailable on this device")]
    MonitoringUnavailable,

    /// No coordinate fix is known to center a new region on
    #[error("No location fix available to center the region on")]
    NoFixAvailable,

    /// The requested region is malformed
    #[error("Invalid region: {0}")]
    InvalidRegion(#[from] DomainError),

    /// The durable write or read failed
    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    /// A platform adapter call failed
    #[error("Platform error: {0:#}")]
    Platform(anyhow::Error),
}

impl GeofenceError {
    /// True for conditions that are reported to the user and otherwise
    /// leave the controller untouched
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GeofenceError::PermissionDenied(_)
                | GeofenceError::MonitoringUnavailable
                | GeofenceError::NoFixAvailable
                | GeofenceError::InvalidRegion(_)
        )
    }
}

/// Errors produced by checklist operations
#[derive(Debug, Error)]
pub enum ChecklistError {
    /// The device is not inside the monitored region
    #[error("The list is only visible inside the saved region")]
    ListHidden,

    /// New item title is shorter than the configured minimum
    #[error("Title must be at least {min} characters (got {actual})")]
    TitleTooShort {
        min: usize,
        actual: usize,
    },

    /// No item with the given id
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// A position or destination is outside the list
    #[error("Position out of range (list has {len} items)")]
    InvalidPosition {
        len: usize,
    },

    /// The persisted list could not be read or written
    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(GeofenceError::NoFixAvailable.is_recoverable());
        assert!(GeofenceError::MonitoringUnavailable.is_recoverable());
        assert!(GeofenceError::PermissionDenied(PermissionKind::Location).is_recoverable());
        assert!(!GeofenceError::Storage(anyhow::anyhow!("disk full")).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            GeofenceError::PermissionDenied(PermissionKind::Notifications).to_string(),
            "Permission denied: notifications"
        );
        assert_eq!(
            ChecklistError::TitleTooShort { min: 5, actual: 2 }.to_string(),
            "Title must be at least 5 characters (got 2)"
        );
    }
}
