//! Composition root for one CLI invocation
//!
//! Opens the database and wires the store, the platform adapters and the
//! controller together. Each command builds one [`App`] and drops it when
//! done; all state that outlives the process is in the database.

use std::sync::Arc;

use anyhow::{Context, Result};
use geomap_core::{
    config::Config,
    ports::AuthorizationStatus,
    usecases::{ChecklistUseCase, GeofenceController, RegionStore},
};
use geomap_platform::{LogNotificationDispatcher, SimulatedLocationGateway, SimulatorOptions};
use geomap_store::{DatabasePool, SqliteGeofenceRepository};
use tracing::debug;

pub struct App {
    pub config: Config,
    pub pool: DatabasePool,
    pub repository: Arc<SqliteGeofenceRepository>,
    pub gateway: Arc<SimulatedLocationGateway>,
    pub controller: Arc<GeofenceController>,
}

impl App {
    /// Opens the configured database and builds the controller
    ///
    /// The person at the terminal counts as having granted location access,
    /// and the configured default location serves as the current fix.
    pub async fn open(config: Config) -> Result<Self> {
        let db_path = config.storage.database_path.clone();
        let pool = DatabasePool::new(&db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        let repository = Arc::new(SqliteGeofenceRepository::new(pool.pool().clone()));

        // Region events are fed straight to the controller; nothing reads
        // the simulator's channel in a one-shot process.
        let (gateway, _events) = SimulatedLocationGateway::new(
            SimulatorOptions::from_config(&config.location)
                .with_status(AuthorizationStatus::AuthorizedAlways),
        );
        let gateway = Arc::new(gateway);
        let dispatcher = Arc::new(LogNotificationDispatcher::default());

        let store = RegionStore::open(repository.clone())
            .await
            .context("Failed to load geofence state")?;
        let controller = Arc::new(GeofenceController::new(
            gateway.clone(),
            dispatcher,
            store,
            config.notifications.clone(),
        ));

        debug!(db = %db_path.display(), "CLI application opened");

        Ok(Self {
            config,
            pool,
            repository,
            gateway,
            controller,
        })
    }

    /// Checklist use case bound to this invocation's controller
    pub fn checklist(&self) -> ChecklistUseCase {
        ChecklistUseCase::new(
            self.repository.clone(),
            self.controller.clone(),
            self.config.checklist.clone(),
        )
    }

    /// Flushes and closes the database
    pub async fn close(self) {
        self.pool.close().await;
    }
}
