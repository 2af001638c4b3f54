//! Log-backed notification adapter (secondary/driven adapter)
//!
//! Implements [`INotificationDispatcher`] by writing each alert to the
//! tracing log and keeping the badge count and the list of outstanding
//! alerts in memory.

use geomap_core::ports::{INotificationDispatcher, Notification};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

#[derive(Debug, Default)]
struct DispatcherState {
    /// `None` until permission has been asked for
    permission: Option<bool>,
    badge: u32,
    outstanding: Vec<Notification>,
}

/// [`INotificationDispatcher`] that posts alerts to the log
#[derive(Debug)]
pub struct LogNotificationDispatcher {
    state: Mutex<DispatcherState>,
    grant_permission: bool,
}

impl LogNotificationDispatcher {
    /// Creates a dispatcher; `grant_permission` is the answer the simulated
    /// user gives the first time permission is requested
    pub fn new(grant_permission: bool) -> Self {
        Self {
            state: Mutex::new(DispatcherState::default()),
            grant_permission,
        }
    }

    /// Current badge count
    pub async fn badge(&self) -> u32 {
        self.state.lock().await.badge
    }

    /// Alerts posted since the last clear
    pub async fn outstanding(&self) -> Vec<Notification> {
        self.state.lock().await.outstanding.clone()
    }
}

impl Default for LogNotificationDispatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait::async_trait]
impl INotificationDispatcher for LogNotificationDispatcher {
    #[instrument(skip(self))]
    async fn request_permission(&self) -> anyhow::Result<bool> {
        let mut state = self.state.lock().await;
        let granted = *state.permission.get_or_insert_with(|| {
            info!(granted = self.grant_permission, "Notification permission answered");
            self.grant_permission
        });
        Ok(granted)
    }

    #[instrument(skip(self, notification), fields(identifier = %notification.identifier))]
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.badge += 1;
        // Re-posting an identifier replaces the pending alert
        state
            .outstanding
            .retain(|n| n.identifier != notification.identifier);
        state.outstanding.push(notification.clone());

        info!(
            title = %notification.title,
            body = %notification.body,
            delay_s = notification.delay.as_secs(),
            badge = state.badge,
            "Notification posted"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let cleared = state.outstanding.len();
        state.outstanding.clear();
        state.badge = 0;
        debug!(cleared, "Notifications cleared");
        Ok(())
    }
}
