//! Configuration file management for NetViewer.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Default values
//! 2. Configuration file (`netviewer.toml` or given with `--config`)
//! 3. Command-line arguments
//!
//! # Example Configuration File
//!
//! ```toml
//! start_page = "ssl"
//! output = "table"
//!
//! [provider]
//! port = 443
//! timeout_secs = 30
//!
//! [favicon]
//! enabled = true
//! endpoint = "https://www.google.com/s2/favicons"
//! request_size = 64
//! display_size = 32
//! timeout_ms = 2000
//!
//! [reminder]
//! lead_days = 14
//! open_file = true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::favicon::{self, FaviconSettings};
use crate::render::OutputFormat;
use crate::reminder::{DEFAULT_LEAD_DAYS, MAX_LEAD_DAYS};
use crate::shell::ToolKind;

/// Main configuration structure.
///
/// All fields are optional to support partial configuration and merging.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Page shown at startup: dns, ssl or ip
    pub start_page: Option<String>,
    /// Output format for one-shot lookups: table or json
    pub output: Option<String>,
    pub provider: Option<ProviderConfig>,
    pub favicon: Option<FaviconConfig>,
    pub reminder: Option<ReminderConfig>,
}

/// Certificate provider connection settings.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Port used when the domain does not carry one
    pub port: Option<u16>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct FaviconConfig {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub request_size: Option<u32>,
    pub display_size: Option<u32>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReminderConfig {
    /// Days between the reminder and the certificate expiry
    pub lead_days: Option<i64>,
    /// Hand the written file to the desktop's default application
    pub open_file: Option<bool>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use netviewer::config::Config;
    /// let config = Config::from_file("netviewer.toml")?;
    /// # Ok::<(), netviewer::config::ConfigError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Configuration with every value set to its default.
    pub fn defaults() -> Self {
        Config {
            start_page: Some("ssl".to_string()),
            output: Some("table".to_string()),
            provider: Some(ProviderConfig {
                port: Some(443),
                timeout_secs: Some(30),
            }),
            favicon: Some(FaviconConfig {
                enabled: Some(true),
                endpoint: Some(favicon::DEFAULT_ENDPOINT.to_string()),
                request_size: Some(favicon::DEFAULT_REQUEST_SIZE),
                display_size: Some(favicon::DEFAULT_DISPLAY_SIZE),
                timeout_ms: Some(favicon::DEFAULT_TIMEOUT.as_millis() as u64),
            }),
            reminder: Some(ReminderConfig {
                lead_days: Some(DEFAULT_LEAD_DAYS),
                open_file: Some(true),
            }),
        }
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// # Example
    ///
    /// ```
    /// # use netviewer::config::Config;
    /// let defaults = Config::defaults();
    /// let file_config = Config::from_file("netviewer.toml").unwrap_or_default();
    /// let merged = defaults.merge_with(file_config);
    /// ```
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.start_page.is_some() {
            self.start_page = other.start_page;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if let Some(other_provider) = other.provider {
            let provider = self.provider.get_or_insert_with(ProviderConfig::default);
            if other_provider.port.is_some() {
                provider.port = other_provider.port;
            }
            if other_provider.timeout_secs.is_some() {
                provider.timeout_secs = other_provider.timeout_secs;
            }
        }
        if let Some(other_favicon) = other.favicon {
            let favicon = self.favicon.get_or_insert_with(FaviconConfig::default);
            if other_favicon.enabled.is_some() {
                favicon.enabled = other_favicon.enabled;
            }
            if other_favicon.endpoint.is_some() {
                favicon.endpoint = other_favicon.endpoint;
            }
            if other_favicon.request_size.is_some() {
                favicon.request_size = other_favicon.request_size;
            }
            if other_favicon.display_size.is_some() {
                favicon.display_size = other_favicon.display_size;
            }
            if other_favicon.timeout_ms.is_some() {
                favicon.timeout_ms = other_favicon.timeout_ms;
            }
        }
        if let Some(other_reminder) = other.reminder {
            let reminder = self.reminder.get_or_insert_with(ReminderConfig::default);
            if other_reminder.lead_days.is_some() {
                reminder.lead_days = other_reminder.lead_days;
            }
            if other_reminder.open_file.is_some() {
                reminder.open_file = other_reminder.open_file;
            }
        }
        self
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Only provided arguments (Some values) override other layers.
    pub fn from_cli_args(
        start_page: Option<String>,
        output: Option<String>,
        lead_days: Option<i64>,
        favicon_enabled: Option<bool>,
        open_file: Option<bool>,
    ) -> Self {
        Config {
            start_page,
            output,
            provider: None,
            favicon: Some(FaviconConfig {
                enabled: favicon_enabled,
                ..FaviconConfig::default()
            }),
            reminder: Some(ReminderConfig {
                lead_days,
                open_file,
            }),
        }
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        toml::to_string_pretty(&Config::defaults())
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }

    /// Checks that every set value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.start_tool()?;
        self.output_format()?;
        if self.lead_days() < 0 {
            return Err(ConfigError::Validation(
                "reminder.lead_days cannot be negative".to_string(),
            ));
        }
        if self.lead_days() > MAX_LEAD_DAYS {
            return Err(ConfigError::Validation(format!(
                "reminder.lead_days cannot exceed {}",
                MAX_LEAD_DAYS
            )));
        }
        if let Some(settings) = self.favicon_settings() {
            if settings.display_size == 0 || settings.request_size == 0 {
                return Err(ConfigError::Validation(
                    "favicon sizes must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn start_tool(&self) -> Result<ToolKind, ConfigError> {
        let name = self.start_page.as_deref().unwrap_or("ssl");
        ToolKind::from_str(name)
            .map_err(|_| ConfigError::Validation(format!("unknown start_page '{}'", name)))
    }

    pub fn output_format(&self) -> Result<OutputFormat, ConfigError> {
        let name = self.output.as_deref().unwrap_or("table");
        OutputFormat::from_str(name)
            .map_err(|_| ConfigError::Validation(format!("unknown output '{}'", name)))
    }

    pub fn provider_port(&self) -> u16 {
        self.provider.as_ref().and_then(|p| p.port).unwrap_or(443)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.as_ref().and_then(|p| p.timeout_secs).unwrap_or(30))
    }

    /// Favicon settings, or `None` when fetching is disabled.
    pub fn favicon_settings(&self) -> Option<FaviconSettings> {
        let section = self.favicon.clone().unwrap_or_default();
        if section.enabled == Some(false) {
            return None;
        }
        let defaults = FaviconSettings::default();
        Some(FaviconSettings {
            endpoint: section.endpoint.unwrap_or(defaults.endpoint),
            request_size: section.request_size.unwrap_or(defaults.request_size),
            display_size: section.display_size.unwrap_or(defaults.display_size),
            timeout: section
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
        })
    }

    pub fn lead_days(&self) -> i64 {
        self.reminder
            .as_ref()
            .and_then(|r| r.lead_days)
            .unwrap_or(DEFAULT_LEAD_DAYS)
    }

    pub fn open_file(&self) -> bool {
        self.reminder.as_ref().and_then(|r| r.open_file).unwrap_or(true)
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (unknown names, out-of-range values, etc.)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
