//! In-memory port doubles shared by the use-case tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    config::NotificationsConfig,
    domain::{Checklist, Coordinate, GeofenceState, Region, RegionId},
    ports::{
        AuthorizationStatus, IAuthorizationGateway, IGeofenceRepository,
        INotificationDispatcher, Notification,
    },
};

use super::{GeofenceController, RegionStore};

pub struct MockGateway {
    pub status: Mutex<AuthorizationStatus>,
    pub fix: Mutex<Option<Coordinate>>,
    pub available: Mutex<bool>,
    pub max_distance: Mutex<Option<f64>>,
    pub monitored: Mutex<Vec<RegionId>>,
    pub authorization_requests: Mutex<u32>,
    pub fail_start: Mutex<bool>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            status: Mutex::new(AuthorizationStatus::AuthorizedAlways),
            fix: Mutex::new(Some(Coordinate::new(51.917220, 4.484050).unwrap())),
            available: Mutex::new(true),
            max_distance: Mutex::new(Some(400.0)),
            monitored: Mutex::new(Vec::new()),
            authorization_requests: Mutex::new(0),
            fail_start: Mutex::new(false),
        }
    }
}

impl MockGateway {
    pub fn set_status(&self, status: AuthorizationStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn monitored(&self) -> Vec<RegionId> {
        self.monitored.lock().unwrap().clone()
    }
}

#[async_trait]
impl IAuthorizationGateway for MockGateway {
    async fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.lock().unwrap()
    }

    async fn request_authorization(&self) -> anyhow::Result<()> {
        *self.authorization_requests.lock().unwrap() += 1;
        Ok(())
    }

    async fn current_coordinate(&self) -> Option<Coordinate> {
        *self.fix.lock().unwrap()
    }

    async fn is_monitoring_available(&self) -> bool {
        *self.available.lock().unwrap()
    }

    async fn max_monitoring_distance(&self) -> Option<f64> {
        *self.max_distance.lock().unwrap()
    }

    async fn start_monitoring(&self, region: &Region) -> anyhow::Result<()> {
        if *self.fail_start.lock().unwrap() {
            anyhow::bail!("monitoring refused");
        }
        let mut monitored = self.monitored.lock().unwrap();
        if !monitored.contains(region.id()) {
            monitored.push(*region.id());
        }
        Ok(())
    }

    async fn stop_monitoring(&self, region: &Region) -> anyhow::Result<()> {
        self.monitored.lock().unwrap().retain(|id| id != region.id());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockDispatcher {
    pub sent: Mutex<Vec<Notification>>,
    pub clears: Mutex<u32>,
    pub deny_permission: Mutex<bool>,
    pub fail_dispatch: Mutex<bool>,
}

impl MockDispatcher {
    pub fn sent_identifiers(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.identifier.clone())
            .collect()
    }
}

#[async_trait]
impl INotificationDispatcher for MockDispatcher {
    async fn request_permission(&self) -> anyhow::Result<bool> {
        Ok(!*self.deny_permission.lock().unwrap())
    }

    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()> {
        if *self.fail_dispatch.lock().unwrap() {
            anyhow::bail!("notification center unavailable");
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }

    async fn clear_all(&self) -> anyhow::Result<()> {
        *self.clears.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRepo {
    pub state: Mutex<Option<GeofenceState>>,
    pub checklist: Mutex<Option<Checklist>>,
    pub fail_writes: Mutex<bool>,
    pub checklist_saves: Mutex<u32>,
}

impl MemoryRepo {
    pub fn saved_state(&self) -> Option<GeofenceState> {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl IGeofenceRepository for MemoryRepo {
    async fn load_state(&self) -> anyhow::Result<Option<GeofenceState>> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn save_state(&self, state: &GeofenceState) -> anyhow::Result<()> {
        if *self.fail_writes.lock().unwrap() {
            anyhow::bail!("disk full");
        }
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }

    async fn load_checklist(&self) -> anyhow::Result<Option<Checklist>> {
        let stored = self.checklist.lock().unwrap().clone();
        // Lets a concurrent caller run between the read and its write-back
        tokio::task::yield_now().await;
        Ok(stored)
    }

    async fn save_checklist(&self, checklist: &Checklist) -> anyhow::Result<()> {
        if *self.fail_writes.lock().unwrap() {
            anyhow::bail!("disk full");
        }
        *self.checklist_saves.lock().unwrap() += 1;
        *self.checklist.lock().unwrap() = Some(checklist.clone());
        Ok(())
    }
}

pub struct Harness {
    pub gateway: Arc<MockGateway>,
    pub dispatcher: Arc<MockDispatcher>,
    pub repo: Arc<MemoryRepo>,
    pub controller: Arc<GeofenceController>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_repo(Arc::new(MemoryRepo::default())).await
    }

    pub async fn with_repo(repo: Arc<MemoryRepo>) -> Self {
        let gateway = Arc::new(MockGateway::default());
        let dispatcher = Arc::new(MockDispatcher::default());
        let store = RegionStore::open(repo.clone()).await.unwrap();
        let controller = Arc::new(GeofenceController::new(
            gateway.clone(),
            dispatcher.clone(),
            store,
            NotificationsConfig::default(),
        ));
        Self {
            gateway,
            dispatcher,
            repo,
            controller,
        }
    }

    /// Sets a region at the default fix and returns its id
    pub async fn with_region(self) -> (Self, RegionId) {
        let region = self.controller.set_region(None, None).await.unwrap();
        let id = *region.id();
        (self, id)
    }
}
