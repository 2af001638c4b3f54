//! Configuration module for GeoMap.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for GeoMap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub notifications: NotificationsConfig,
    pub location: LocationConfig,
    pub checklist: ChecklistConfig,
    pub logging: LoggingConfig,
}

/// Where persistent state lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database holding geofence state and the checklist.
    pub database_path: PathBuf,
}

/// Wording and timing of geofence notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub title: String,
    /// Body used when the device enters the region.
    pub entered_body: String,
    /// Body used when the device leaves the region.
    pub left_body: String,
    /// Seconds between posting a notification and it firing.
    pub delay_seconds: u64,
}

/// Location settings, including the simulated platform used by the
/// command-line tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Label of the default map location.
    pub default_name: String,
    /// Latitude shown before the first fix arrives.
    pub default_latitude: f64,
    /// Longitude shown before the first fix arrives.
    pub default_longitude: f64,
    /// Largest radius (meters) the simulated platform will monitor.
    pub max_monitoring_distance: f64,
    /// Whether the simulated platform supports region monitoring.
    pub monitoring_available: bool,
}

/// Checklist settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecklistConfig {
    /// Minimum number of characters for a new item title.
    pub min_title_length: usize,
    /// Seed a fresh store with the starter items.
    pub seed_defaults: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/geomap/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("geomap")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("geomap");
        Self {
            database_path: data_dir.join("geomap.db"),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            title: "GeoMap Region Notifier".to_string(),
            entered_body: "You entered the saved geofence region.".to_string(),
            left_body: "You left the saved geofence region.".to_string(),
            delay_seconds: 1,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            default_name: "Hogeschool Rotterdam".to_string(),
            default_latitude: 51.917220,
            default_longitude: 4.484050,
            max_monitoring_distance: 500.0,
            monitoring_available: true,
        }
    }
}

impl Default for ChecklistConfig {
    fn default() -> Self {
        Self {
            min_title_length: 5,
            seed_defaults: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"location.default_latitude"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- storage ---
        if self.storage.database_path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.database_path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- notifications ---
        if self.notifications.title.trim().is_empty() {
            errors.push(ValidationError {
                field: "notifications.title".into(),
                message: "must not be empty".into(),
            });
        }
        if self.notifications.entered_body.trim().is_empty() {
            errors.push(ValidationError {
                field: "notifications.entered_body".into(),
                message: "must not be empty".into(),
            });
        }
        if self.notifications.left_body.trim().is_empty() {
            errors.push(ValidationError {
                field: "notifications.left_body".into(),
                message: "must not be empty".into(),
            });
        }

        // --- location ---
        if !(-90.0..=90.0).contains(&self.location.default_latitude) {
            errors.push(ValidationError {
                field: "location.default_latitude".into(),
                message: "must be in range -90..=90".into(),
            });
        }
        if !(-180.0..=180.0).contains(&self.location.default_longitude) {
            errors.push(ValidationError {
                field: "location.default_longitude".into(),
                message: "must be in range -180..=180".into(),
            });
        }
        if !self.location.max_monitoring_distance.is_finite()
            || self.location.max_monitoring_distance <= 0.0
        {
            errors.push(ValidationError {
                field: "location.max_monitoring_distance".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- checklist ---
        if self.checklist.min_title_length == 0 {
            errors.push(ValidationError {
                field: "checklist.min_title_length".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use geomap_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .storage_database_path(PathBuf::from("/tmp/geomap.db"))
///     .location_max_monitoring_distance(250.0)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- storage ---

    pub fn storage_database_path(mut self, path: PathBuf) -> Self {
        self.config.storage.database_path = path;
        self
    }

    // --- notifications ---

    pub fn notifications_title(mut self, title: impl Into<String>) -> Self {
        self.config.notifications.title = title.into();
        self
    }

    pub fn notifications_delay_seconds(mut self, seconds: u64) -> Self {
        self.config.notifications.delay_seconds = seconds;
        self
    }

    // --- location ---

    pub fn location_default(mut self, latitude: f64, longitude: f64) -> Self {
        self.config.location.default_latitude = latitude;
        self.config.location.default_longitude = longitude;
        self
    }

    pub fn location_max_monitoring_distance(mut self, meters: f64) -> Self {
        self.config.location.max_monitoring_distance = meters;
        self
    }

    pub fn location_monitoring_available(mut self, available: bool) -> Self {
        self.config.location.monitoring_available = available;
        self
    }

    // --- checklist ---

    pub fn checklist_min_title_length(mut self, n: usize) -> Self {
        self.config.checklist.min_title_length = n;
        self
    }

    pub fn checklist_seed_defaults(mut self, seed: bool) -> Self {
        self.config.checklist.seed_defaults = seed;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
