//! Event feed format
//!
//! `geomapd` reads one JSON object per line. Blank lines and lines starting
//! with `#` are skipped.
//!
//! ```text
//! {"type":"set_region","radius":200}
//! {"type":"fix","latitude":51.9272,"longitude":4.4840}
//! {"type":"foreground"}
//! {"type":"background"}
//! {"type":"authorization","status":"denied"}
//! ```

use geomap_core::ports::AuthorizationStatus;
use serde::Deserialize;

/// One line of the event feed
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    /// A new coordinate fix from the location service
    Fix { latitude: f64, longitude: f64 },
    /// The app came to the foreground
    Foreground,
    /// The app went to the background
    Background,
    /// The user changed the location permission
    Authorization { status: AuthorizationStatus },
    /// Replace the monitored region; missing fields use the current fix
    /// and the platform maximum radius
    SetRegion {
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius: Option<f64>,
    },
}

/// Parses one feed line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str) -> Result<Option<FeedMessage>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}
