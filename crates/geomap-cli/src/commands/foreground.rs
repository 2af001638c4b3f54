//! Foreground command - Simulate the app coming to the foreground
//!
//! Clears the badge and every pending and delivered notification. The
//! cached containment state is left as it is.

use anyhow::Result;
use clap::Args;

use super::CommandContext;
use crate::app::App;

#[derive(Debug, Args)]
pub struct ForegroundCommand {}

impl ForegroundCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let app = App::open(ctx.load_config()).await?;

        let result = app.controller.on_foreground().await;
        let containment = app.controller.containment().await;
        app.close().await;
        result?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "containment": containment,
                "list_visible": containment.is_inside(),
            }));
        } else {
            formatter.success("Notifications cleared");
            formatter.field("Containment", containment.name());
        }
        Ok(())
    }
}
