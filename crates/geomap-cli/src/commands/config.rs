//! Config command - View and manage GeoMap configuration
//!
//! Provides the `geomap config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use geomap_core::config::Config;
use tracing::info;

use super::CommandContext;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "location.max_monitoring_distance")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("storage.database_path", "SQLite database file"),
    ("notifications.title", "Notification title"),
    ("notifications.entered_body", "Body when entering the region"),
    ("notifications.left_body", "Body when leaving the region"),
    ("notifications.delay_seconds", "Seconds before a notification fires"),
    ("location.default_name", "Label of the default location"),
    ("location.default_latitude", "Default latitude"),
    ("location.default_longitude", "Default longitude"),
    ("location.max_monitoring_distance", "Largest monitored radius (m)"),
    ("location.monitoring_available", "true|false"),
    ("checklist.min_title_length", "Minimum item title length"),
    ("checklist.seed_defaults", "true|false"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.json", "true|false"),
];

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx).await,
            ConfigCommand::Set { key, value } => self.execute_set(ctx, key, value).await,
            ConfigCommand::Validate => self.execute_validate(ctx).await,
        }
    }

    async fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_config();

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    async fn execute_set(&self, ctx: &CommandContext, key: &str, value: &str) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = &ctx.config_path;
        let mut config = load_for_update(config_path)?;

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for (k, description) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {:<36} - {}", k, description));
                }
            }
            return Ok(());
        }

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "value": value,
                    "errors": messages,
                }));
            } else {
                formatter.error(&format!(
                    "Invalid value for '{}': {}",
                    key,
                    messages.join("; ")
                ));
            }
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(config_path, &yaml).context("Failed to write configuration file")?;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }
        Ok(())
    }

    async fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config_path = &ctx.config_path;

        // Load explicitly: a parse error must be reported, not defaulted
        let config = match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                let message = if config_path.exists() {
                    format!("Failed to parse configuration: {}", e)
                } else {
                    "Configuration file not found. Using defaults.".to_string()
                };
                if ctx.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [message],
                    }));
                } else if config_path.exists() {
                    formatter.error(&message);
                    formatter.info(&format!("File: {}", config_path.display()));
                } else {
                    formatter.info(&format!(
                        "Configuration file not found at {}",
                        config_path.display()
                    ));
                    formatter.info(
                        "Using default configuration. Run 'geomap config set <key> <value>' to create one.",
                    );
                }
                return Ok(());
            }
        };

        info!(config_path = %config_path.display(), "Validating configuration");

        let errors = config.validate();
        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!("Configuration has {} error(s)", errors.len()));
            for e in &errors {
                formatter.info(&format!("- {}", e));
            }
        }
        Ok(())
    }
}

/// Loads the file that `config set` is about to rewrite
///
/// A missing file starts from defaults; an unreadable one is an error, so
/// the user's settings are never replaced by defaults.
fn load_for_update(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| {
        format!(
            "Refusing to rewrite {}: it could not be parsed",
            path.display()
        )
    })
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", value, key, e))
}

/// Applies one dot-notation setting to `config`
pub(crate) fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "storage.database_path" => config.storage.database_path = PathBuf::from(value),
        "notifications.title" => config.notifications.title = value.to_string(),
        "notifications.entered_body" => config.notifications.entered_body = value.to_string(),
        "notifications.left_body" => config.notifications.left_body = value.to_string(),
        "notifications.delay_seconds" => {
            config.notifications.delay_seconds = parse_value(key, value)?
        }
        "location.default_name" => config.location.default_name = value.to_string(),
        "location.default_latitude" => config.location.default_latitude = parse_value(key, value)?,
        "location.default_longitude" => {
            config.location.default_longitude = parse_value(key, value)?
        }
        "location.max_monitoring_distance" => {
            config.location.max_monitoring_distance = parse_value(key, value)?
        }
        "location.monitoring_available" => {
            config.location.monitoring_available = parse_value(key, value)?
        }
        "checklist.min_title_length" => {
            config.checklist.min_title_length = parse_value(key, value)?
        }
        "checklist.seed_defaults" => config.checklist.seed_defaults = parse_value(key, value)?,
        "logging.level" => config.logging.level = value.to_string(),
        "logging.json" => config.logging.json = parse_value(key, value)?,
        other => anyhow::bail!("Unknown configuration key '{}'", other),
    }
    Ok(())
}
