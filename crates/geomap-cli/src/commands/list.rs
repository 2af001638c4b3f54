//! List command - The geofence-protected checklist
//!
//! All subcommands refuse to run unless the cached containment state is
//! "inside". Positions on the command line are 1-based, as shown by
//! `geomap list show`.

use anyhow::Result;
use clap::Subcommand;
use geomap_core::{
    domain::{ChecklistItem, ItemId},
    usecases::{ChecklistError, ChecklistUseCase},
};

use super::CommandContext;
use crate::{app::App, output::OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    /// Show the list
    Show,
    /// Add an item
    Add {
        /// Item title
        title: String,
    },
    /// Remove items by position
    Remove {
        /// Positions to remove
        #[arg(required = true)]
        positions: Vec<usize>,
    },
    /// Move items so they land before another position
    Move {
        /// Positions to move
        #[arg(required = true)]
        positions: Vec<usize>,
        /// Position to insert before (one past the end to append)
        #[arg(long)]
        to: usize,
    },
    /// Toggle completion of an item
    Toggle {
        /// Item position or id
        item: String,
    },
}

/// How an item is referred to on the command line
#[derive(Debug, PartialEq)]
enum ItemRef {
    Position(usize),
    Id(ItemId),
}

fn parse_item_ref(s: &str) -> Result<ItemRef, String> {
    if let Ok(position) = s.parse::<usize>() {
        return Ok(ItemRef::Position(position));
    }
    s.parse::<ItemId>()
        .map(ItemRef::Id)
        .map_err(|_| format!("'{s}' is neither a position nor an item id"))
}

/// Converts 1-based positions to indices; zero is rejected
fn to_indices(positions: &[usize]) -> Option<Vec<usize>> {
    positions.iter().map(|p| p.checked_sub(1)).collect()
}

impl ListCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let app = App::open(ctx.load_config()).await?;
        let checklist = app.checklist();
        let result = self.run(&checklist, ctx).await;
        app.close().await;

        match result {
            Ok(()) => Ok(()),
            Err(ChecklistError::Storage(e)) => Err(e.context("Checklist storage failed")),
            Err(e) => {
                let formatter = ctx.formatter();
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    }));
                } else {
                    formatter.error(&e.to_string());
                }
                Ok(())
            }
        }
    }

    async fn run(
        &self,
        checklist: &ChecklistUseCase,
        ctx: &CommandContext,
    ) -> Result<(), ChecklistError> {
        let formatter = ctx.formatter();

        match self {
            ListCommand::Show => {
                let items = checklist.visible_items().await?;
                print_items(ctx, &*formatter, &items);
            }
            ListCommand::Add { title } => {
                let item = checklist.add_item(title).await?;
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!(item));
                } else {
                    formatter.success(&format!("Added \"{}\"", item.title()));
                }
            }
            ListCommand::Remove { positions } => {
                let len = checklist.visible_items().await?.len();
                let indices = to_indices(positions).ok_or(ChecklistError::InvalidPosition { len })?;
                let removed = checklist.delete_items(&indices).await?;
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({ "removed": removed }));
                } else {
                    for item in &removed {
                        formatter.success(&format!("Removed \"{}\"", item.title()));
                    }
                }
            }
            ListCommand::Move { positions, to } => {
                let len = checklist.visible_items().await?.len();
                let indices = to_indices(positions).ok_or(ChecklistError::InvalidPosition { len })?;
                let destination = to
                    .checked_sub(1)
                    .ok_or(ChecklistError::InvalidPosition { len })?;
                let items = checklist.move_items(&indices, destination).await?;
                print_items(ctx, &*formatter, &items);
            }
            ListCommand::Toggle { item } => {
                let id = match parse_item_ref(item) {
                    Ok(ItemRef::Id(id)) => id,
                    Ok(ItemRef::Position(position)) => {
                        let items = checklist.visible_items().await?;
                        let len = items.len();
                        position
                            .checked_sub(1)
                            .and_then(|i| items.get(i))
                            .map(|i| *i.id())
                            .ok_or(ChecklistError::InvalidPosition { len })?
                    }
                    Err(msg) => {
                        formatter.error(&msg);
                        return Ok(());
                    }
                };
                let toggled = checklist.toggle_item(&id).await?;
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!(toggled));
                } else {
                    let state = if toggled.is_completed() { "done" } else { "open" };
                    formatter.success(&format!("\"{}\" is now {}", toggled.title(), state));
                }
            }
        }
        Ok(())
    }
}

fn print_items(ctx: &CommandContext, formatter: &dyn OutputFormatter, items: &[ChecklistItem]) {
    if ctx.is_json() {
        formatter.print_json(&serde_json::json!({ "items": items }));
        return;
    }
    if items.is_empty() {
        formatter.info("The list is empty.");
        return;
    }
    for (i, item) in items.iter().enumerate() {
        formatter.checklist_row(i + 1, item.is_completed(), item.title());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_ref() {
        assert_eq!(parse_item_ref("2"), Ok(ItemRef::Position(2)));

        let id = ItemId::new();
        assert_eq!(parse_item_ref(&id.to_string()), Ok(ItemRef::Id(id)));

        assert!(parse_item_ref("first").is_err());
    }

    #[test]
    fn test_to_indices() {
        assert_eq!(to_indices(&[1, 3]), Some(vec![0, 2]));
        assert_eq!(to_indices(&[0, 1]), None);
    }
}
