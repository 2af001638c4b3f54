//! Event command - Feed a region callback to the controller
//!
//! `geomap event enter` and `geomap event exit` deliver the callback the
//! platform would raise for the active region. `--region` targets another
//! id, which the controller treats as stale.

use anyhow::Result;
use clap::{Args, Subcommand};
use geomap_core::{
    domain::RegionId,
    ports::{RegionEvent, RegionEventKind},
    usecases::EventOutcome,
};
use tracing::info;

use super::CommandContext;
use crate::app::App;

#[derive(Debug, Subcommand)]
pub enum EventCommand {
    /// The device entered the region
    Enter(EventArgs),
    /// The device left the region
    Exit(EventArgs),
}

#[derive(Debug, Args)]
pub struct EventArgs {
    /// Deliver the callback while the app is in the foreground
    #[arg(long)]
    pub foreground: bool,

    /// Region id the callback is tagged with (defaults to the active region)
    #[arg(long)]
    pub region: Option<RegionId>,
}

impl EventCommand {
    fn parts(&self) -> (RegionEventKind, &EventArgs) {
        match self {
            EventCommand::Enter(args) => (RegionEventKind::Entered, args),
            EventCommand::Exit(args) => (RegionEventKind::Exited, args),
        }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let app = App::open(ctx.load_config()).await?;
        let result = self.deliver(&app, ctx).await;
        app.close().await;
        result
    }

    async fn deliver(&self, app: &App, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let (kind, args) = self.parts();

        let active = app.controller.active_region().await.map(|r| *r.id());
        let Some(region_id) = args.region.or(active) else {
            formatter.error("No region set. Run 'geomap region set' first.");
            return Ok(());
        };

        if args.foreground {
            app.controller.on_foreground().await?;
        }

        info!(region = %region_id, ?kind, foreground = args.foreground, "Delivering region event");
        let outcome = app
            .controller
            .handle_event(RegionEvent { region_id, kind })
            .await?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::to_value(outcome)?);
            return Ok(());
        }

        match outcome {
            EventOutcome::Ignored { reason } => {
                formatter.warn(&format!("Event ignored ({:?})", reason));
            }
            EventOutcome::Applied {
                containment,
                dispatched,
            } => {
                formatter.success(&format!("Containment is now {}", containment));
                match dispatched {
                    Some(reason) => formatter.field("Notified", &reason.to_string()),
                    None => formatter.field("Notified", "no"),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let cmd = EventCommand::Exit(EventArgs {
            foreground: true,
            region: None,
        });
        let (kind, args) = cmd.parts();
        assert_eq!(kind, RegionEventKind::Exited);
        assert!(args.foreground);
    }
}
