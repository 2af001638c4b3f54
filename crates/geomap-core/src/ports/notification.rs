//! Notification dispatcher port (driven/secondary port)
//!
//! This module defines the interface for posting local user-visible alerts
//! when the device crosses the monitored region boundary, and for clearing
//! them once the user is looking at the app.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because notification delivery is adapter-specific.
//! - Notifications are fire-and-forget; the caller does not wait for
//!   user interaction.
//! - Deduplication is NOT the adapter's job; the controller decides whether
//!   a dispatch happens at all.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{config::NotificationsConfig, domain::NotificationReason};

/// A one-shot alert describing a region transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Why the alert is being sent
    pub reason: NotificationReason,
    /// Request identifier; re-posting the same identifier replaces the
    /// pending alert
    pub identifier: String,
    /// Title of the notification
    pub title: String,
    /// Body text
    pub body: String,
    /// Delay before the alert fires
    #[serde(with = "duration_secs")]
    pub delay: Duration,
}

impl Notification {
    /// Builds the alert for `reason` using the configured wording
    pub fn for_reason(reason: NotificationReason, config: &NotificationsConfig) -> Self {
        let body = match reason {
            NotificationReason::EnteredRegion => config.entered_body.clone(),
            NotificationReason::LeftRegion => config.left_body.clone(),
        };
        Self {
            reason,
            identifier: reason.request_identifier().to_string(),
            title: config.title.clone(),
            body,
            delay: Duration::from_secs(config.delay_seconds),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// Port trait for local notifications
///
/// ## Implementation Notes
///
/// - `request_permission` may be called any number of times; once the user
///   has answered, it returns the stored answer without prompting again.
/// - `dispatch` posts one alert and increments the badge counter.
/// - `clear_all` resets the badge to zero and removes every pending and
///   delivered alert.
#[async_trait::async_trait]
pub trait INotificationDispatcher: Send + Sync {
    /// Asks for permission to post alerts (alert, sound, badge)
    async fn request_permission(&self) -> anyhow::Result<bool>;

    /// Posts a one-shot notification
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()>;

    /// Clears the badge count and all pending/delivered notifications
    async fn clear_all(&self) -> anyhow::Result<()>;
}
