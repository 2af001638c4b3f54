//! Geofence notification controller
//!
//! Consumes region callbacks and app lifecycle transitions, keeps the
//! persisted containment state in step with the last accepted callback, and
//! decides whether a callback results in a user notification.
//!
//! ## Rules
//!
//! - Only callbacks tagged with the active region id are applied; anything
//!   else is a no-op.
//! - A notification is dispatched only while the app is backgrounded, and
//!   never twice in a row for the same reason.
//! - Containment is persisted for every applied callback, whether or not a
//!   notification went out.
//! - Foregrounding clears all notifications and changes nothing else.
//!
//! All state changes happen with the region store lock held, including the
//! durable write, so each callback is fully applied before the next one is
//! looked at.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::NotificationsConfig,
    domain::{
        ContainmentState, Coordinate, DomainError, GeofenceState, NotificationReason, Region,
        RegionId,
    },
    ports::{
        AuthorizationStatus, IAuthorizationGateway, INotificationDispatcher, Notification,
        RegionEvent,
    },
};

use super::{
    errors::{GeofenceError, PermissionKind},
    region_store::RegionStore,
};

/// Why a region callback was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// No region has been set yet
    NoActiveRegion,
    /// The callback refers to a region that has since been replaced
    StaleRegion,
}

/// Result of feeding one region callback to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    Ignored {
        reason: IgnoreReason,
    },
    Applied {
        containment: ContainmentState,
        /// Reason of the notification sent for this callback, if any
        dispatched: Option<NotificationReason>,
    },
}

/// Result of reacting to an authorization change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum AuthorizationOutcome {
    /// The user has been asked for location access
    PermissionRequested,
    /// Access is refused; the UI should tell the user
    Denied(AuthorizationStatus),
    /// Monitoring of the active region was (re)started
    MonitoringResumed(RegionId),
    /// Authorized, but no region has been set yet
    AwaitingRegion,
}

/// Drives containment and notifications from platform callbacks
pub struct GeofenceController {
    gateway: Arc<dyn IAuthorizationGateway>,
    dispatcher: Arc<dyn INotificationDispatcher>,
    notifications: NotificationsConfig,
    store: Mutex<RegionStore>,
    foreground: AtomicBool,
}

impl GeofenceController {
    /// Creates a controller over an opened region store
    ///
    /// The controller starts backgrounded: a process woken up by a region
    /// callback has nothing on screen.
    pub fn new(
        gateway: Arc<dyn IAuthorizationGateway>,
        dispatcher: Arc<dyn INotificationDispatcher>,
        store: RegionStore,
        notifications: NotificationsConfig,
    ) -> Self {
        Self {
            gateway,
            dispatcher,
            notifications,
            store: Mutex::new(store),
            foreground: AtomicBool::new(false),
        }
    }

    // ========================================================================
    // Region management
    // ========================================================================

    /// Replaces the active region
    ///
    /// A missing `center` uses the gateway's current fix; a missing `radius`
    /// uses the platform maximum, and a larger one is clamped to it. The
    /// previous region stops being monitored before the new one starts.
    ///
    /// # Errors
    ///
    /// Recoverable errors (`PermissionDenied`, `MonitoringUnavailable`,
    /// `NoFixAvailable`, `InvalidRegion`) are logged and leave the persisted
    /// state as it was.
    pub async fn set_region(
        &self,
        center: Option<Coordinate>,
        radius: Option<f64>,
    ) -> Result<Region, GeofenceError> {
        let result = self.replace_region(center, radius).await;
        if let Err(e) = &result {
            if e.is_recoverable() {
                warn!(error = %e, "Region not set; keeping the previous region");
            }
        }
        result
    }

    async fn replace_region(
        &self,
        center: Option<Coordinate>,
        radius: Option<f64>,
    ) -> Result<Region, GeofenceError> {
        let status = self.gateway.authorization_status().await;
        if status.is_refused() {
            return Err(GeofenceError::PermissionDenied(PermissionKind::Location));
        }
        if !self.gateway.is_monitoring_available().await {
            return Err(GeofenceError::MonitoringUnavailable);
        }
        let max_distance = self
            .gateway
            .max_monitoring_distance()
            .await
            .ok_or(GeofenceError::MonitoringUnavailable)?;

        let center = match center {
            Some(c) => c,
            None => self
                .gateway
                .current_coordinate()
                .await
                .ok_or(GeofenceError::NoFixAvailable)?,
        };
        let radius = match radius {
            Some(r) if !r.is_finite() || r <= 0.0 => {
                return Err(GeofenceError::InvalidRegion(DomainError::InvalidRadius(r)));
            }
            Some(r) => r.min(max_distance),
            None => max_distance,
        };
        let region = Region::new(center, radius)?;

        let mut store = self.store.lock().await;
        let previous = store.region().cloned();

        if let Some(prev) = &previous {
            self.gateway
                .stop_monitoring(prev)
                .await
                .map_err(GeofenceError::Platform)?;
        }
        if let Err(e) = self.gateway.start_monitoring(&region).await {
            self.restore_monitoring(previous.as_ref()).await;
            return Err(GeofenceError::Platform(e));
        }
        if let Err(e) = store.replace_region(region.clone()).await {
            if let Err(stop_err) = self.gateway.stop_monitoring(&region).await {
                warn!(error = %stop_err, region = %region.id(), "Failed to stop unsaved region");
            }
            self.restore_monitoring(previous.as_ref()).await;
            return Err(GeofenceError::Storage(e));
        }

        info!(
            region = %region.id(),
            center = %region.center(),
            radius_m = region.radius(),
            replaced = ?previous.as_ref().map(|r| *r.id()),
            "Active region set"
        );
        Ok(region)
    }

    async fn restore_monitoring(&self, previous: Option<&Region>) {
        if let Some(prev) = previous {
            if let Err(e) = self.gateway.start_monitoring(prev).await {
                warn!(error = %e, region = %prev.id(), "Failed to resume previous region");
            }
        }
    }

    /// The active region, if any
    pub async fn active_region(&self) -> Option<Region> {
        self.store.lock().await.region().cloned()
    }

    /// Last persisted containment state
    pub async fn containment(&self) -> ContainmentState {
        self.store.lock().await.containment()
    }

    /// True when the protected list may be shown
    pub async fn is_list_visible(&self) -> bool {
        self.containment().await.is_inside()
    }

    /// Copy of the persisted record
    pub async fn snapshot(&self) -> GeofenceState {
        self.store.lock().await.state().clone()
    }

    /// Forgets containment and the last notified reason; the region is kept
    pub async fn reset(&self) -> Result<(), GeofenceError> {
        let mut store = self.store.lock().await;
        store.reset().await.map_err(GeofenceError::Storage)?;
        info!("Geofence state reset");
        Ok(())
    }

    // ========================================================================
    // Platform callbacks
    // ========================================================================

    /// Applies one entry/exit callback
    pub async fn handle_event(&self, event: RegionEvent) -> Result<EventOutcome, GeofenceError> {
        let mut store = self.store.lock().await;

        let Some(active) = store.region().map(|r| *r.id()) else {
            debug!(region = %event.region_id, kind = ?event.kind, "No active region; callback ignored");
            return Ok(EventOutcome::Ignored {
                reason: IgnoreReason::NoActiveRegion,
            });
        };
        if active != event.region_id {
            debug!(
                region = %event.region_id,
                active = %active,
                kind = ?event.kind,
                "Stale region callback ignored"
            );
            return Ok(EventOutcome::Ignored {
                reason: IgnoreReason::StaleRegion,
            });
        }

        let reason = event.kind.reason();
        let containment = reason.containment();
        let mut dispatched = None;

        if self.is_foreground() {
            debug!(%reason, "App in foreground; notification suppressed");
        } else if store.last_notified() == Some(reason) {
            debug!(%reason, "Same reason as last notification; not dispatching");
        } else {
            let notification = Notification::for_reason(reason, &self.notifications);
            match self.dispatcher.dispatch(&notification).await {
                Ok(()) => {
                    info!(%reason, identifier = %notification.identifier, "Notification dispatched");
                    dispatched = Some(reason);
                }
                Err(e) => {
                    warn!(%reason, error = %e, "Notification dispatch failed");
                }
            }
        }

        store
            .record_transition(containment, dispatched)
            .await
            .map_err(GeofenceError::Storage)?;

        debug!(region = %active, %containment, "Region callback applied");
        Ok(EventOutcome::Applied {
            containment,
            dispatched,
        })
    }

    /// The app came to the foreground
    pub async fn on_foreground(&self) -> Result<(), GeofenceError> {
        self.foreground.store(true, Ordering::SeqCst);
        self.dispatcher
            .clear_all()
            .await
            .map_err(GeofenceError::Platform)?;
        debug!("Foregrounded; notifications cleared");
        Ok(())
    }

    /// The app went to the background
    pub fn on_background(&self) {
        self.foreground.store(false, Ordering::SeqCst);
        debug!("Backgrounded");
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    /// Reacts to a change of the location permission
    pub async fn on_authorization_changed(&self) -> Result<AuthorizationOutcome, GeofenceError> {
        let status = self.gateway.authorization_status().await;
        match status {
            AuthorizationStatus::NotDetermined => {
                self.gateway
                    .request_authorization()
                    .await
                    .map_err(GeofenceError::Platform)?;
                info!("Location authorization requested");
                Ok(AuthorizationOutcome::PermissionRequested)
            }
            AuthorizationStatus::Restricted | AuthorizationStatus::Denied => {
                warn!(%status, "Location access refused");
                Ok(AuthorizationOutcome::Denied(status))
            }
            AuthorizationStatus::AuthorizedWhenInUse | AuthorizationStatus::AuthorizedAlways => {
                let store = self.store.lock().await;
                let Some(region) = store.region() else {
                    debug!(%status, "Authorized; no region to monitor yet");
                    return Ok(AuthorizationOutcome::AwaitingRegion);
                };
                if !self.gateway.is_monitoring_available().await {
                    warn!("Region monitoring unavailable; cannot resume");
                    return Err(GeofenceError::MonitoringUnavailable);
                }
                self.gateway
                    .start_monitoring(region)
                    .await
                    .map_err(GeofenceError::Platform)?;
                info!(region = %region.id(), %status, "Monitoring resumed");
                Ok(AuthorizationOutcome::MonitoringResumed(*region.id()))
            }
        }
    }

    /// Asks for notification permission
    ///
    /// # Errors
    ///
    /// `PermissionDenied(Notifications)` if the user refused.
    pub async fn ensure_notification_permission(&self) -> Result<(), GeofenceError> {
        let granted = self
            .dispatcher
            .request_permission()
            .await
            .map_err(GeofenceError::Platform)?;
        if granted {
            Ok(())
        } else {
            warn!("Notification permission refused");
            Err(GeofenceError::PermissionDenied(PermissionKind::Notifications))
        }
    }
}
