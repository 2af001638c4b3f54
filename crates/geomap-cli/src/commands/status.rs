//! Status command - Display the geofence state
//!
//! Provides the `geomap status` CLI command which shows:
//! 1. The active region, if any
//! 2. The cached containment state and the last notification sent
//! 3. Whether the protected list is currently visible
//! 4. Where the state is stored

use anyhow::Result;
use clap::Args;
use geomap_core::ports::IAuthorizationGateway;

use super::{region::print_region, region::region_json, CommandContext};
use crate::app::App;

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let app = App::open(ctx.load_config()).await?;

        let state = app.controller.snapshot().await;
        let authorization = app.gateway.authorization_status().await;
        let db_path = app.config.storage.database_path.display().to_string();
        app.close().await;

        if ctx.is_json() {
            let region = match &state.region {
                Some(r) => region_json(r)?,
                None => serde_json::Value::Null,
            };
            formatter.print_json(&serde_json::json!({
                "region": region,
                "containment": state.containment,
                "last_notified": state.last_notified,
                "list_visible": state.containment.is_inside(),
                "authorization": authorization,
                "updated_at": state.updated_at.to_rfc3339(),
                "database": db_path,
            }));
            return Ok(());
        }

        formatter.success("GeoMap status");
        formatter.field("Containment", state.containment.name());
        formatter.field(
            "Last notified",
            &state
                .last_notified
                .map(|r| r.to_string())
                .unwrap_or_else(|| "never".to_string()),
        );
        formatter.field(
            "List",
            if state.containment.is_inside() {
                "visible"
            } else {
                "hidden"
            },
        );
        formatter.field("Location", authorization.name());
        formatter.field("Updated", &state.updated_at.to_rfc3339());
        formatter.field("Database", &db_path);
        formatter.info("");

        match &state.region {
            Some(region) => {
                formatter.info("Region:");
                print_region(&*formatter, region);
            }
            None => formatter.info("No region set. Run 'geomap region set' to create one."),
        }
        Ok(())
    }
}
