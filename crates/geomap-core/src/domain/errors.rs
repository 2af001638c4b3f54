//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including coordinate validation, region construction, and ID parsing.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Latitude/longitude outside the valid WGS84 range
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Region radius is not a positive, finite distance
    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),

    /// Persisted record was written by a newer schema than this build supports
    #[error("Unsupported schema version {found} (supported up to {supported})")]
    UnsupportedSchema {
        /// Version found in storage
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}
