//! GeoMap CLI - Command-line interface for GeoMap
//!
//! Provides commands for:
//! - Setting and inspecting the monitored region
//! - Delivering region entry/exit callbacks and lifecycle transitions
//! - Reading and editing the geofence-protected checklist
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use geomap_core::config::Config;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, event::EventCommand,
    foreground::ForegroundCommand, list::ListCommand, region::RegionCommand,
    status::StatusCommand, CommandContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "geomap", version, about = "Geofence-gated checklist")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the monitored region
    #[command(subcommand)]
    Region(RegionCommand),
    /// Deliver a region entry/exit callback
    #[command(subcommand)]
    Event(EventCommand),
    /// Bring the app to the foreground (clears notifications)
    Foreground(ForegroundCommand),
    /// Show the geofence state
    Status(StatusCommand),
    /// Read and edit the protected checklist
    #[command(subcommand)]
    List(ListCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Picks the log filter: `-v` flags win over the configured level
fn log_directive(verbose: u8, quiet: bool, configured: &str) -> String {
    match (quiet, verbose) {
        (true, _) => "error".to_string(),
        (false, 0) => configured.to_string(),
        (false, 1) => "debug".to_string(),
        (false, _) => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let logging = Config::load_or_default(&config_path).logging;

    let directive = log_directive(cli.verbose, cli.quiet, &logging.level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    // Logs go to stderr so --json output on stdout stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let ctx = CommandContext {
        format: OutputFormat::from_flag(cli.json),
        quiet: cli.quiet,
        config_path,
    };

    match cli.command {
        Commands::Region(cmd) => cmd.execute(&ctx).await,
        Commands::Event(cmd) => cmd.execute(&ctx).await,
        Commands::Foreground(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::List(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_region_set_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["geomap", "region", "set", "--lat", "51.9"]).is_err());

        let cli = Cli::try_parse_from([
            "geomap", "region", "set", "--lat", "51.9", "--lon", "-4.5", "--radius", "120",
        ])
        .unwrap();
        match cli.command {
            Commands::Region(RegionCommand::Set { lat, lon, radius }) => {
                assert_eq!(lat, Some(51.9));
                assert_eq!(lon, Some(-4.5));
                assert_eq!(radius, Some(120.0));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["geomap", "status", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_event_foreground_flag() {
        let cli = Cli::try_parse_from(["geomap", "event", "enter", "--foreground"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Event(EventCommand::Enter(ref args)) if args.foreground
        ));
    }

    #[test]
    fn test_list_move_parses() {
        let cli = Cli::try_parse_from(["geomap", "list", "move", "1", "2", "--to", "4"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List(ListCommand::Move { ref positions, to: 4 }) if positions == &vec![1, 2]
        ));
    }

    #[test]
    fn test_log_directive() {
        assert_eq!(log_directive(0, false, "warn"), "warn");
        assert_eq!(log_directive(1, false, "warn"), "debug");
        assert_eq!(log_directive(3, false, "warn"), "trace");
        assert_eq!(log_directive(2, true, "warn"), "error");
    }
}
