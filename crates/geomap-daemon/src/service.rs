//! Daemon service
//!
//! Owns the controller for the lifetime of the process and drives it from
//! two sources: the JSON-lines feed and the region events the simulated
//! gateway emits while replaying fixes. Both are consumed by one loop, with
//! pending region events taking priority over the next feed line, so each
//! fix is fully applied before the following line is read.

use std::sync::Arc;

use anyhow::{Context, Result};
use geomap_core::{
    config::Config,
    domain::Coordinate,
    ports::RegionEvent,
    usecases::{AuthorizationOutcome, EventOutcome, GeofenceController, GeofenceError, RegionStore},
};
use geomap_platform::{LogNotificationDispatcher, SimulatedLocationGateway, SimulatorOptions};
use geomap_store::{DatabasePool, SqliteGeofenceRepository};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::feed::{parse_line, FeedMessage};

/// Counters reported when the service stops
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Feed lines read, including skipped ones
    pub lines: usize,
    /// Lines that could not be parsed
    pub skipped: usize,
    /// Region events applied to the controller
    pub events_applied: usize,
    /// Region events ignored as stale
    pub events_ignored: usize,
    /// Notifications dispatched
    pub notifications: usize,
    /// Operations that failed with an unrecoverable error
    pub failures: usize,
}

/// Background geofence service
pub struct DaemonService {
    pool: DatabasePool,
    gateway: Arc<SimulatedLocationGateway>,
    dispatcher: Arc<LogNotificationDispatcher>,
    controller: Arc<GeofenceController>,
    events: mpsc::Receiver<RegionEvent>,
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Opens the configured database and wires the controller
    pub async fn new(config: &Config, shutdown: CancellationToken) -> Result<Self> {
        let db_path = &config.storage.database_path;
        let pool = DatabasePool::new(db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        info!(db = %db_path.display(), "Database opened");

        Self::with_pool(
            config,
            pool,
            SimulatorOptions::from_config(&config.location),
            shutdown,
        )
        .await
    }

    /// Wires the controller over an already opened pool
    pub async fn with_pool(
        config: &Config,
        pool: DatabasePool,
        options: SimulatorOptions,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let repository = Arc::new(SqliteGeofenceRepository::new(pool.pool().clone()));
        let store = RegionStore::open(repository)
            .await
            .context("Failed to load geofence state")?;

        let (gateway, events) = SimulatedLocationGateway::new(options);
        let gateway = Arc::new(gateway);
        let dispatcher = Arc::new(LogNotificationDispatcher::default());
        let controller = Arc::new(GeofenceController::new(
            gateway.clone(),
            dispatcher.clone(),
            store,
            config.notifications.clone(),
        ));

        Ok(Self {
            pool,
            gateway,
            dispatcher,
            controller,
            events,
            shutdown,
        })
    }

    pub fn controller(&self) -> Arc<GeofenceController> {
        Arc::clone(&self.controller)
    }

    pub fn dispatcher(&self) -> Arc<LogNotificationDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Runs until the feed ends or shutdown is requested, then closes the
    /// database
    ///
    /// # Errors
    ///
    /// Fails only when the feed itself cannot be read. Controller errors are
    /// logged and counted in the summary.
    pub async fn run<R>(mut self, input: R) -> Result<ReplaySummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut summary = ReplaySummary::default();
        self.start(&mut summary).await;

        let mut lines = input.lines();
        let result = loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
                Some(event) = self.events.recv() => {
                    self.apply_event(event, &mut summary).await;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        summary.lines += 1;
                        self.apply_line(summary.lines, &line, &mut summary).await;
                    }
                    Ok(None) => {
                        info!(lines = summary.lines, "End of event feed");
                        break Ok(());
                    }
                    Err(e) => break Err(anyhow::Error::new(e).context("Failed to read event feed")),
                },
            }
        };

        // Crossings produced by the last fixes are still queued
        while let Ok(event) = self.events.try_recv() {
            self.apply_event(event, &mut summary).await;
        }

        self.pool.close().await;
        info!(
            lines = summary.lines,
            skipped = summary.skipped,
            applied = summary.events_applied,
            ignored = summary.events_ignored,
            notifications = summary.notifications,
            failures = summary.failures,
            "Daemon service stopped"
        );
        result.map(|()| summary)
    }

    /// Asks for both permissions and resumes monitoring of a persisted region
    async fn start(&self, summary: &mut ReplaySummary) {
        match self.controller.ensure_notification_permission().await {
            Ok(()) => debug!("Notification permission granted"),
            Err(e) => self.record_failure(&e, summary),
        }
        self.sync_authorization(summary).await;
    }

    /// Applies the current authorization status
    ///
    /// A request for permission is answered asynchronously by the platform,
    /// so the status is read a second time after asking.
    async fn sync_authorization(&self, summary: &mut ReplaySummary) {
        for _ in 0..2 {
            match self.controller.on_authorization_changed().await {
                Ok(AuthorizationOutcome::PermissionRequested) => continue,
                Ok(outcome) => {
                    info!(?outcome, "Authorization applied");
                    return;
                }
                Err(e) => {
                    self.record_failure(&e, summary);
                    return;
                }
            }
        }
        warn!("Location authorization still undecided");
    }

    async fn apply_event(&self, event: RegionEvent, summary: &mut ReplaySummary) {
        match self.controller.handle_event(event).await {
            Ok(EventOutcome::Applied {
                containment,
                dispatched,
            }) => {
                summary.events_applied += 1;
                if dispatched.is_some() {
                    summary.notifications += 1;
                }
                debug!(%containment, ?dispatched, "Region event applied");
            }
            Ok(EventOutcome::Ignored { reason }) => {
                summary.events_ignored += 1;
                debug!(?reason, "Region event ignored");
            }
            Err(e) => self.record_failure(&e, summary),
        }
    }

    async fn apply_line(&self, line_no: usize, line: &str, summary: &mut ReplaySummary) {
        let message = match parse_line(line) {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(e) => {
                summary.skipped += 1;
                warn!(line = line_no, error = %e, "Skipping malformed feed line");
                return;
            }
        };
        debug!(line = line_no, ?message, "Feed message");

        match message {
            FeedMessage::Fix {
                latitude,
                longitude,
            } => {
                let coordinate = match Coordinate::new(latitude, longitude) {
                    Ok(c) => c,
                    Err(e) => {
                        summary.skipped += 1;
                        warn!(line = line_no, error = %e, "Skipping invalid fix");
                        return;
                    }
                };
                if let Err(e) = self.gateway.update_fix(coordinate).await {
                    summary.failures += 1;
                    error!(error = %e, "Failed to deliver fix");
                }
            }
            FeedMessage::Foreground => {
                if let Err(e) = self.controller.on_foreground().await {
                    self.record_failure(&e, summary);
                }
            }
            FeedMessage::Background => self.controller.on_background(),
            FeedMessage::Authorization { status } => {
                self.gateway.set_authorization(status).await;
                self.sync_authorization(summary).await;
            }
            FeedMessage::SetRegion {
                latitude,
                longitude,
                radius,
            } => {
                let center = match (latitude, longitude) {
                    (Some(lat), Some(lon)) => match Coordinate::new(lat, lon) {
                        Ok(c) => Some(c),
                        Err(e) => {
                            summary.skipped += 1;
                            warn!(line = line_no, error = %e, "Skipping invalid region center");
                            return;
                        }
                    },
                    (None, None) => None,
                    _ => {
                        summary.skipped += 1;
                        warn!(
                            line = line_no,
                            "Region center needs both latitude and longitude"
                        );
                        return;
                    }
                };
                match self.controller.set_region(center, radius).await {
                    Ok(region) => info!(region = %region.id(), "Region set from feed"),
                    Err(e) => self.record_failure(&e, summary),
                }
            }
        }
    }

    /// Recoverable errors were already logged by the controller
    fn record_failure(&self, e: &GeofenceError, summary: &mut ReplaySummary) {
        if e.is_recoverable() {
            debug!(error = %e, "Recoverable controller error");
        } else {
            summary.failures += 1;
            error!(error = %e, "Controller operation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomap_core::domain::{ContainmentState, NotificationReason};

    const CAMPUS_FIX: &str = r#"{"type":"fix","latitude":51.917220,"longitude":4.484050}"#;
    // About 1.4 km north of the campus
    const FAR_FIX: &str = r#"{"type":"fix","latitude":51.930000,"longitude":4.484050}"#;

    fn feed(lines: &[&str]) -> std::io::Cursor<Vec<u8>> {
        std::io::Cursor::new(lines.join("\n").into_bytes())
    }

    async fn service(options: SimulatorOptions) -> DaemonService {
        let pool = DatabasePool::in_memory().await.unwrap();
        DaemonService::with_pool(&Config::default(), pool, options, CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_replay_walk_out_and_back() {
        let service = service(SimulatorOptions::default()).await;
        let controller = service.controller();
        let dispatcher = service.dispatcher();

        let summary = service
            .run(feed(&[
                r#"{"type":"set_region","radius":200}"#,
                FAR_FIX,
                CAMPUS_FIX,
            ]))
            .await
            .unwrap();

        assert_eq!(summary.lines, 3);
        assert_eq!(summary.events_applied, 2);
        assert_eq!(summary.notifications, 2);
        assert_eq!(summary.failures, 0);

        let state = controller.snapshot().await;
        assert_eq!(state.containment, ContainmentState::Inside);
        assert_eq!(state.last_notified, Some(NotificationReason::EnteredRegion));
        assert_eq!(dispatcher.badge().await, 2);
    }

    #[tokio::test]
    async fn test_foreground_suppresses_and_clears() {
        let service = service(SimulatorOptions::default()).await;
        let controller = service.controller();
        let dispatcher = service.dispatcher();

        let summary = service
            .run(feed(&[
                r#"{"type":"set_region","radius":200}"#,
                FAR_FIX,
                r#"{"type":"foreground"}"#,
                CAMPUS_FIX,
            ]))
            .await
            .unwrap();

        assert_eq!(summary.events_applied, 2);
        assert_eq!(summary.notifications, 1);

        let state = controller.snapshot().await;
        assert_eq!(state.containment, ContainmentState::Inside);
        assert_eq!(state.last_notified, Some(NotificationReason::LeftRegion));
        assert_eq!(dispatcher.badge().await, 0);
        assert!(dispatcher.outstanding().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let service = service(SimulatorOptions::default()).await;
        let controller = service.controller();

        let summary = service
            .run(feed(&[
                "# comment",
                "garbage",
                r#"{"type":"fix","latitude":123.0,"longitude":0.0}"#,
                r#"{"type":"set_region","latitude":51.9}"#,
                r#"{"type":"set_region"}"#,
            ]))
            .await
            .unwrap();

        assert_eq!(summary.lines, 5);
        assert_eq!(summary.skipped, 3);
        assert!(controller.active_region().await.is_some());
    }

    #[tokio::test]
    async fn test_no_events_while_denied() {
        let service = service(SimulatorOptions::default()).await;
        let controller = service.controller();

        let summary = service
            .run(feed(&[
                r#"{"type":"set_region","radius":200}"#,
                r#"{"type":"authorization","status":"denied"}"#,
                FAR_FIX,
            ]))
            .await
            .unwrap();

        assert_eq!(summary.events_applied, 0);
        assert_eq!(controller.containment().await, ContainmentState::Unknown);
    }

    #[tokio::test]
    async fn test_refused_location_fails_set_region_quietly() {
        let mut options = SimulatorOptions::default();
        options.grant_on_request = false;
        let service = service(options).await;
        let controller = service.controller();

        let summary = service
            .run(feed(&[r#"{"type":"set_region"}"#]))
            .await
            .unwrap();

        assert_eq!(summary.failures, 0);
        assert!(controller.active_region().await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_stops_waiting_on_input() {
        let shutdown = CancellationToken::new();
        let pool = DatabasePool::in_memory().await.unwrap();
        let service = DaemonService::with_pool(
            &Config::default(),
            pool,
            SimulatorOptions::default(),
            shutdown.clone(),
        )
        .await
        .unwrap();

        // The writer stays open, so the feed never ends on its own
        let (_writer, reader) = tokio::io::duplex(64);
        shutdown.cancel();

        let summary = service
            .run(tokio::io::BufReader::new(reader))
            .await
            .unwrap();
        assert_eq!(summary.lines, 0);
    }

    #[tokio::test]
    async fn test_region_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = dir.path().join("geomap.db");

        let first = DaemonService::new(&config, CancellationToken::new())
            .await
            .unwrap();
        let region_id = {
            let controller = first.controller();
            first
                .run(feed(&[r#"{"type":"set_region","radius":150}"#, FAR_FIX]))
                .await
                .unwrap();
            let region = controller.active_region().await.unwrap();
            *region.id()
        };

        let second = DaemonService::new(&config, CancellationToken::new())
            .await
            .unwrap();
        let controller = second.controller();
        second.run(feed(&[])).await.unwrap();

        let state = controller.snapshot().await;
        assert_eq!(state.active_region_id(), Some(&region_id));
        assert_eq!(state.containment, ContainmentState::Outside);
        assert_eq!(state.last_notified, Some(NotificationReason::LeftRegion));
    }
}
