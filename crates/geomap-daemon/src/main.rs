//! GeoMap daemon - Background geofence service
//!
//! Replays platform callbacks recorded as JSON lines and handles:
//! - Location fixes, turned into region entry/exit events
//! - Foreground/background transitions
//! - Authorization changes and region updates
//! - Graceful shutdown on SIGTERM/SIGINT or end of input
//!
//! # Architecture
//!
//! The feed and the simulated gateway's region events are consumed by a
//! single loop that owns the controller. The loop is controlled by a
//! `CancellationToken` that is triggered on receipt of SIGTERM or SIGINT.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use geomap_core::config::Config;
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod feed;
mod service;

use service::DaemonService;

#[derive(Debug, Parser)]
#[command(name = "geomapd", version, about = "GeoMap geofence service")]
struct Args {
    /// Read the event feed from a file instead of stdin
    #[arg(long)]
    events: Option<PathBuf>,

    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
///
/// A handler that cannot be installed is logged and never fires; the other
/// one, and the end of the feed, still stop the service.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

type Feed = Box<dyn AsyncBufRead + Unpin + Send>;

/// The event feed: the given file, or stdin when none is given
async fn open_feed(path: Option<&Path>) -> Result<Feed> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open event feed {}", path.display()))?;
            info!(feed = %path.display(), "Reading events from file");
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(config_path = %config_path.display(), "GeoMap daemon starting (geomapd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let feed = open_feed(args.events.as_deref()).await?;
    let service = DaemonService::new(&config, shutdown_token.clone()).await?;
    let result = service.run(feed).await;

    match &result {
        Ok(summary) => info!(
            lines = summary.lines,
            notifications = summary.notifications,
            "GeoMap daemon shut down gracefully"
        ),
        Err(e) => error!(error = %e, "GeoMap daemon exiting with error"),
    }

    result.map(|_| ())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;

    #[tokio::test]
    async fn test_open_feed_reads_file_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.jsonl");
        std::fs::write(&path, "{\"type\":\"foreground\"}\n{\"type\":\"background\"}\n").unwrap();

        let mut lines = open_feed(Some(&path)).await.unwrap().lines();
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some(r#"{"type":"foreground"}"#)
        );
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some(r#"{"type":"background"}"#)
        );
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_feed_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jsonl");

        let err = open_feed(Some(&path)).await.err().unwrap();
        assert!(err.to_string().contains("missing.jsonl"));
    }

    #[test]
    fn test_args_events_file() {
        let args = Args::try_parse_from(["geomapd", "--events", "walk.jsonl"]).unwrap();
        assert_eq!(args.events, Some(PathBuf::from("walk.jsonl")));
        assert!(args.config.is_none());

        let args = Args::try_parse_from(["geomapd"]).unwrap();
        assert!(args.events.is_none());
    }

    #[test]
    fn test_config_default_path_exists() {
        let path = Config::default_path();
        assert!(!path.as_os_str().is_empty());
    }
}
