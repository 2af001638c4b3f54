//! CLI subcommands
//!
//! Every command receives a [`CommandContext`] carrying the global flags.

use std::path::PathBuf;

use geomap_core::config::Config;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

pub mod completions;
pub mod config;
pub mod event;
pub mod foreground;
pub mod list;
pub mod region;
pub mod status;

/// Global options shared by all commands
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config_path: PathBuf,
}

impl CommandContext {
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    /// Loads the config file, falling back to defaults if it is missing
    /// or unreadable
    pub fn load_config(&self) -> Config {
        Config::load_or_default(&self.config_path)
    }
}
