use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use domain::models::{PropertyCatalog, PropertySettings};
use domain::services::{CleanupOptions, ExportOptions};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub hostex: HostexConfig,
    #[serde(default)]
    pub odoo: OdooConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    /// Static per-property settings, loaded once at startup.
    #[serde(default)]
    pub properties: Vec<PropertySettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins; empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Property-management API (Hostex v3).
#[derive(Debug, Clone, Deserialize)]
pub struct HostexConfig {
    #[serde(default = "default_hostex_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

/// CRM JSON-RPC endpoint used for loyalty cards.
#[derive(Debug, Clone, Deserialize)]
pub struct OdooConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub uid: i64,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for OdooConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            database: String::new(),
            uid: 0,
            api_key: String::new(),
            timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Messages sent before this date are left out of the export.
    #[serde(default)]
    pub cutoff_date: Option<NaiveDate>,

    #[serde(default = "default_conversation_timeout")]
    pub conversation_timeout_secs: u64,

    #[serde(default = "default_export_page_size")]
    pub page_size: u32,

    /// Time budget for one export request; 0 disables it.
    #[serde(default = "default_export_max_duration")]
    pub max_duration_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            cutoff_date: None,
            conversation_timeout_secs: default_conversation_timeout(),
            page_size: default_export_page_size(),
            max_duration_secs: default_export_max_duration(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_true")]
    pub run_on_startup: bool,

    /// Minutes between periodic voucher job runs; 0 disables the schedule.
    #[serde(default)]
    pub interval_minutes: u64,

    #[serde(default)]
    pub purge_on_empty_greenlist: bool,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            run_on_startup: true,
            interval_minutes: 0,
            purge_on_empty_greenlist: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_calendar_name")]
    pub name: String,

    /// Feeds include stays that checked in up to this many days ago.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            name: default_calendar_name(),
            lookback_days: default_lookback_days(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_request_timeout() -> u64 {
    120
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_hostex_base_url() -> String {
    "https://api.hostex.io/v3".to_string()
}
fn default_upstream_timeout_ms() -> u64 {
    30_000
}
fn default_conversation_timeout() -> u64 {
    10
}
fn default_export_page_size() -> u32 {
    100
}

fn default_export_max_duration() -> u64 {
    300
}
fn default_true() -> bool {
    true
}
fn default_calendar_name() -> String {
    "Bookings".to_string()
}
fn default_lookback_days() -> u32 {
    30
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with BB__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("BB").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests don't depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 3000
            request_timeout_secs = 120

            [logging]
            level = "info"
            format = "json"

            [hostex]
            base_url = "https://api.hostex.io/v3"
            access_token = ""
            timeout_ms = 30000

            [jobs]
            run_on_startup = true
            interval_minutes = 0

            [[properties]]
            id = 101
            name = "Seaside Loft"
            voucher_greenlist = ["SUMMER2024", "VIP"]
            thirdparty_account_id = 900

            [properties.times]
            check_in = { hour = 15, minute = 30 }
            check_out = { hour = 11 }

            [[properties]]
            id = 102
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.hostex.access_token.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "BB__HOSTEX__ACCESS_TOKEN environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.odoo.enabled && (self.odoo.url.is_empty() || self.odoo.api_key.is_empty()) {
            return Err(ConfigValidationError::MissingRequired(
                "odoo.url and odoo.api_key are required when odoo is enabled".to_string(),
            ));
        }

        if !(1..=100).contains(&self.export.page_size) {
            return Err(ConfigValidationError::InvalidValue(
                "export.page_size must be between 1 and 100".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for property in &self.properties {
            if !seen.insert(property.id) {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Duplicate property id {}",
                    property.id
                )));
            }
            if let Some(times) = property.times {
                if !times.check_in.is_valid() || !times.check_out.is_valid() {
                    return Err(ConfigValidationError::InvalidValue(format!(
                        "Property {} has an out-of-range check-in/out time",
                        property.id
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    pub fn property_catalog(&self) -> PropertyCatalog {
        PropertyCatalog::new(self.properties.clone())
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            cutoff: self.export.cutoff_date,
            conversation_timeout: Duration::from_secs(self.export.conversation_timeout_secs),
            page_size: self.export.page_size,
            deadline: (self.export.max_duration_secs > 0)
                .then(|| Duration::from_secs(self.export.max_duration_secs)),
        }
    }

    pub fn cleanup_options(&self) -> CleanupOptions {
        CleanupOptions {
            purge_on_empty_greenlist: self.jobs.purge_on_empty_greenlist,
        }
    }
}
