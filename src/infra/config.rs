//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument
//! (default: config/dev.toml). Every field has a default, so the
//! service also runs with no config file at all.

use crate::io::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::services::coordinator::DEFAULT_REFRESH_INTERVAL;
use anyhow::Context;
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEZONE: &str = "Europe/Helsinki";

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Endpoint serving the populartimes page
    #[serde(default = "default_source_url")]
    pub url: String,
    /// Hard per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Timezone the opening-hours table is expressed in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_secs: default_timeout_secs(),
            timezone: default_timezone(),
        }
    }
}

fn default_source_url() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: default_refresh_interval_secs() }
    }
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Interval for logging the per-location occupancy summary
    #[serde(default = "default_report_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { interval_secs: default_report_interval_secs() }
    }
}

fn default_report_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    source_url: String,
    request_timeout: Duration,
    timezone: Tz,
    refresh_interval: Duration,
    report_interval: Duration,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            request_timeout: DEFAULT_TIMEOUT,
            timezone: chrono_tz::Europe::Helsinki,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            report_interval: Duration::from_secs(default_report_interval_secs()),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let timezone: Tz = toml_config.source.timezone.parse().map_err(|e| {
            anyhow::anyhow!("Invalid timezone {:?}: {e}", toml_config.source.timezone)
        })?;

        Ok(Self {
            source_url: toml_config.source.url,
            request_timeout: Duration::from_secs(toml_config.source.timeout_secs),
            timezone,
            refresh_interval: Duration::from_secs(toml_config.refresh.interval_secs),
            report_interval: Duration::from_secs(toml_config.report.interval_secs),
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn report_interval(&self) -> Duration {
        self.report_interval
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
