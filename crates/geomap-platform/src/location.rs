//! Simulated location adapter (secondary/driven adapter)
//!
//! Implements [`IAuthorizationGateway`] without an OS location service.
//! Coordinate fixes are pushed in with [`SimulatedLocationGateway::update_fix`];
//! when a fix lands on the other side of the monitored region's boundary
//! (great-circle distance against the radius) a [`RegionEvent`] is sent on
//! the gateway's event channel.
//!
//! ## Behavior
//!
//! - Only boundary crossings raise events. The side of the boundary at the
//!   time monitoring starts (or at the first fix) is recorded silently.
//! - Events are only delivered while location access is authorized.
//! - One region is monitored at a time; starting another replaces it.
//! - `request_authorization` answers for the user: a not-determined status
//!   becomes [`AuthorizationStatus::AuthorizedAlways`] when
//!   `grant_on_request` is set, [`AuthorizationStatus::Denied`] otherwise.

use geomap_core::{
    config::LocationConfig,
    domain::{Coordinate, Region, RegionId},
    ports::{AuthorizationStatus, IAuthorizationGateway, RegionEvent},
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, instrument, warn};

/// Default capacity of the region event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Initial state of a [`SimulatedLocationGateway`]
#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    pub status: AuthorizationStatus,
    pub grant_on_request: bool,
    pub fix: Option<Coordinate>,
    pub monitoring_available: bool,
    pub max_monitoring_distance: f64,
    pub event_capacity: usize,
}

impl SimulatorOptions {
    /// Options derived from the `location` config section
    ///
    /// The configured default location becomes the initial fix; an invalid
    /// one leaves the simulator without a fix.
    pub fn from_config(config: &LocationConfig) -> Self {
        let fix = Coordinate::new(config.default_latitude, config.default_longitude).ok();
        Self {
            status: AuthorizationStatus::NotDetermined,
            grant_on_request: true,
            fix,
            monitoring_available: config.monitoring_available,
            max_monitoring_distance: config.max_monitoring_distance,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_status(mut self, status: AuthorizationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_fix(mut self, fix: Option<Coordinate>) -> Self {
        self.fix = fix;
        self
    }
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self::from_config(&LocationConfig::default())
    }
}

#[derive(Debug)]
struct Monitored {
    region: Region,
    /// Side of the boundary at the last fix; `None` until a fix is known
    inside: Option<bool>,
}

#[derive(Debug)]
struct GatewayState {
    status: AuthorizationStatus,
    fix: Option<Coordinate>,
    monitored: Option<Monitored>,
}

/// [`IAuthorizationGateway`] driven by injected fixes
pub struct SimulatedLocationGateway {
    state: Mutex<GatewayState>,
    events: mpsc::Sender<RegionEvent>,
    grant_on_request: bool,
    monitoring_available: bool,
    max_monitoring_distance: f64,
}

impl SimulatedLocationGateway {
    /// Creates the gateway and the receiving end of its event channel
    pub fn new(options: SimulatorOptions) -> (Self, mpsc::Receiver<RegionEvent>) {
        let (tx, rx) = mpsc::channel(options.event_capacity.max(1));
        let gateway = Self {
            state: Mutex::new(GatewayState {
                status: options.status,
                fix: options.fix,
                monitored: None,
            }),
            events: tx,
            grant_on_request: options.grant_on_request,
            monitoring_available: options.monitoring_available,
            max_monitoring_distance: options.max_monitoring_distance,
        };
        (gateway, rx)
    }

    /// Changes the authorization status, as the user would in settings
    pub async fn set_authorization(&self, status: AuthorizationStatus) {
        let mut state = self.state.lock().await;
        if state.status != status {
            info!(from = %state.status, to = %status, "Location authorization changed");
            state.status = status;
        }
    }

    /// Id of the region currently monitored
    pub async fn monitored_region(&self) -> Option<RegionId> {
        self.state
            .lock()
            .await
            .monitored
            .as_ref()
            .map(|m| *m.region.id())
    }

    /// Records a new fix and reports a boundary crossing, if any
    ///
    /// The event, when there is one, is sent on the event channel and also
    /// returned.
    ///
    /// # Errors
    ///
    /// Fails if the event receiver has been dropped.
    #[instrument(skip(self, coordinate), fields(fix = %coordinate))]
    pub async fn update_fix(&self, coordinate: Coordinate) -> anyhow::Result<Option<RegionEvent>> {
        let event = {
            let mut state = self.state.lock().await;
            state.fix = Some(coordinate);
            let authorized = state.status.is_authorized();

            let Some(monitored) = state.monitored.as_mut() else {
                return Ok(None);
            };
            let distance = monitored.region.center().distance_to(&coordinate);
            let inside = monitored.region.contains(&coordinate);
            let previous = monitored.inside.replace(inside);
            debug!(
                distance_m = distance,
                radius_m = monitored.region.radius(),
                inside,
                "Fix evaluated"
            );

            match previous {
                Some(was_inside) if was_inside != inside && authorized => {
                    let id = *monitored.region.id();
                    Some(if inside {
                        RegionEvent::entered(id)
                    } else {
                        RegionEvent::exited(id)
                    })
                }
                Some(was_inside) if was_inside != inside => {
                    debug!("Boundary crossed while unauthorized; no event delivered");
                    None
                }
                _ => None,
            }
        };

        if let Some(event) = event {
            info!(region = %event.region_id, kind = ?event.kind, "Region boundary crossed");
            self.events
                .send(event)
                .await
                .map_err(|_| anyhow::anyhow!("Region event receiver dropped"))?;
        }
        Ok(event)
    }
}

#[async_trait::async_trait]
impl IAuthorizationGateway for SimulatedLocationGateway {
    async fn authorization_status(&self) -> AuthorizationStatus {
        self.state.lock().await.status
    }

    #[instrument(skip(self))]
    async fn request_authorization(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if state.status != AuthorizationStatus::NotDetermined {
            debug!(status = %state.status, "Authorization already decided");
            return Ok(());
        }
        state.status = if self.grant_on_request {
            AuthorizationStatus::AuthorizedAlways
        } else {
            AuthorizationStatus::Denied
        };
        info!(status = %state.status, "Location authorization answered");
        Ok(())
    }

    async fn current_coordinate(&self) -> Option<Coordinate> {
        self.state.lock().await.fix
    }

    async fn is_monitoring_available(&self) -> bool {
        self.monitoring_available
    }

    async fn max_monitoring_distance(&self) -> Option<f64> {
        self.monitoring_available
            .then_some(self.max_monitoring_distance)
    }

    #[instrument(skip(self, region), fields(region = %region.id(), radius_m = region.radius()))]
    async fn start_monitoring(&self, region: &Region) -> anyhow::Result<()> {
        if !self.monitoring_available {
            anyhow::bail!("Region monitoring is not available");
        }
        let mut state = self.state.lock().await;
        if let Some(current) = &state.monitored {
            if current.region.id() == region.id() {
                debug!("Region already monitored");
                return Ok(());
            }
            warn!(previous = %current.region.id(), "Replacing monitored region");
        }
        let inside = state.fix.map(|fix| region.contains(&fix));
        state.monitored = Some(Monitored {
            region: region.clone(),
            inside,
        });
        info!(?inside, "Monitoring started");
        Ok(())
    }

    #[instrument(skip(self, region), fields(region = %region.id()))]
    async fn stop_monitoring(&self, region: &Region) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if state
            .monitored
            .as_ref()
            .is_some_and(|m| m.region.id() == region.id())
        {
            state.monitored = None;
            info!("Monitoring stopped");
        }
        Ok(())
    }
}
