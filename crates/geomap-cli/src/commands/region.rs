//! Region command - Set, show and reset the monitored region
//!
//! Provides the `geomap region` CLI command which:
//! 1. Replaces the monitored region (centered on a given point or on the
//!    current fix)
//! 2. Shows the active region and the cached containment state
//! 3. Resets containment and notification memory, keeping the region

use anyhow::{Context, Result};
use clap::Subcommand;
use geomap_core::{
    domain::{Coordinate, Region},
    usecases::GeofenceError,
};
use tracing::info;

use super::CommandContext;
use crate::app::App;

/// Region subcommands
#[derive(Debug, Subcommand)]
pub enum RegionCommand {
    /// Replace the monitored region
    Set {
        /// Center latitude (defaults to the current fix)
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Center longitude (defaults to the current fix)
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Radius in meters (defaults to, and is capped at, the platform maximum)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Show the active region
    Show,
    /// Forget containment and the last notification, keeping the region
    Reset,
}

impl RegionCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let app = App::open(ctx.load_config()).await?;
        let result = match self {
            RegionCommand::Set { lat, lon, radius } => {
                Self::execute_set(&app, ctx, *lat, *lon, *radius).await
            }
            RegionCommand::Show => Self::execute_show(&app, ctx).await,
            RegionCommand::Reset => Self::execute_reset(&app, ctx).await,
        };
        app.close().await;
        result
    }

    async fn execute_set(
        app: &App,
        ctx: &CommandContext,
        lat: Option<f64>,
        lon: Option<f64>,
        radius: Option<f64>,
    ) -> Result<()> {
        let formatter = ctx.formatter();

        let center = match (lat, lon) {
            (Some(lat), Some(lon)) => match Coordinate::new(lat, lon) {
                Ok(c) => Some(c),
                Err(e) => {
                    formatter.error(&e.to_string());
                    return Ok(());
                }
            },
            _ => None,
        };

        info!(?center, ?radius, "Setting region");

        match app.controller.set_region(center, radius).await {
            Ok(region) => {
                if ctx.is_json() {
                    formatter.print_json(&region_json(&region)?);
                } else {
                    formatter.success("Region saved");
                    print_region(&*formatter, &region);
                }
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                report_recoverable(ctx, &e);
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to set region")),
        }
    }

    async fn execute_show(app: &App, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let state = app.controller.snapshot().await;

        if ctx.is_json() {
            let region = match &state.region {
                Some(r) => region_json(r)?,
                None => serde_json::Value::Null,
            };
            formatter.print_json(&serde_json::json!({
                "region": region,
                "containment": state.containment,
                "last_notified": state.last_notified,
            }));
            return Ok(());
        }

        match &state.region {
            Some(region) => {
                formatter.success("Active region");
                print_region(&*formatter, region);
                formatter.field("Containment", state.containment.name());
            }
            None => {
                formatter.info("No region set. Run 'geomap region set' to create one.");
            }
        }
        Ok(())
    }

    async fn execute_reset(app: &App, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        app.controller
            .reset()
            .await
            .context("Failed to reset geofence state")?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "containment": app.controller.containment().await,
            }));
        } else {
            formatter.success("Containment and notification memory reset");
        }
        Ok(())
    }
}

pub(crate) fn region_json(region: &Region) -> Result<serde_json::Value> {
    serde_json::to_value(region).context("Failed to serialize region")
}

pub(crate) fn print_region(formatter: &dyn crate::output::OutputFormatter, region: &Region) {
    formatter.field("Id", &region.id().to_string());
    formatter.field("Center", &region.center().to_string());
    formatter.field("Radius", &format!("{:.0} m", region.radius()));
    formatter.field("Created", &region.created_at().to_rfc3339());
}

/// Prints an expected failure (permission, availability, no fix)
pub(crate) fn report_recoverable(ctx: &CommandContext, error: &GeofenceError) {
    let formatter = ctx.formatter();
    if ctx.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": false,
            "error": error.to_string(),
        }));
    } else {
        formatter.error(&error.to_string());
    }
}
