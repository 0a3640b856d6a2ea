//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `COVID_DASHBOARD_*` environment overrides.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable selecting the process mode
pub const APP_MODE_ENV: &str = "APP_MODE_ENV";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    80
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where the regional file comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    File,
    Http,
}

/// Input data configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: String,

    #[serde(default)]
    pub source: SourceKind,

    #[serde(default = "default_data_url")]
    pub url: String,

    /// Field delimiter of the regional file
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Background refresh period, 0 disables it
    #[serde(default)]
    pub refresh_interval_minutes: u64,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("covid-dashboard").to_string_lossy().to_string())
        .unwrap_or_else(|| "./data".to_string())
}

fn default_data_url() -> String {
    "https://www.data.gouv.fr/fr/datasets/r/406c6a23-e283-4300-9484-54e78c8ae675".to_string()
}

fn default_delimiter() -> char {
    ';'
}

fn default_http_timeout() -> u64 {
    60
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            source: SourceKind::default(),
            url: default_data_url(),
            delimiter: default_delimiter(),
            http_timeout_secs: default_http_timeout(),
            refresh_interval_minutes: 0,
        }
    }
}

impl DataConfig {
    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigError::Invalid(format!("delimiter {:?} is not ASCII", self.delimiter)))
    }
}

/// Which forecast provider to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastKind {
    #[default]
    Naive,
    Csv,
}

/// Forecast configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastConfig {
    #[serde(default)]
    pub kind: ForecastKind,

    /// Model output file, required for `csv`
    pub output_path: Option<String>,

    /// Date the model was last trained, `YYYY-MM-DD`
    pub trained_until: Option<String>,
}

impl ForecastConfig {
    pub fn trained_until_date(&self) -> Result<Option<NaiveDate>, ConfigError> {
        self.trained_until
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| ConfigError::Invalid(format!("trained_until '{}': {}", raw, e)))
            })
            .transpose()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("covid-dashboard").join("config.toml")),
            Some(PathBuf::from("/etc/covid-dashboard/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = var("COVID_DASHBOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("COVID_DASHBOARD_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Data overrides
        if let Some(dir) = var("COVID_DASHBOARD_DATA_DIR") {
            self.data.dir = dir;
        }
        if let Some(url) = var("COVID_DASHBOARD_DATA_URL") {
            self.data.url = url;
        }
        if let Some(source) = var("COVID_DASHBOARD_DATA_SOURCE") {
            match source.to_lowercase().as_str() {
                "file" => self.data.source = SourceKind::File,
                "http" => self.data.source = SourceKind::Http,
                other => tracing::warn!(source = %other, "Ignoring unknown data source"),
            }
        }

        // Forecast overrides
        if let Some(path) = var("COVID_DASHBOARD_FORECAST_OUTPUT") {
            self.forecast.kind = ForecastKind::Csv;
            self.forecast.output_path = Some(path);
        }

        // Logging overrides
        if let Some(level) = var("COVID_DASHBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("COVID_DASHBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Whether `APP_MODE_ENV` asks for a preparation test run
pub fn app_test_mode() -> bool {
    is_test_mode(std::env::var(APP_MODE_ENV).ok().as_deref())
}

fn is_test_mode(value: Option<&str>) -> bool {
    value.map(|v| v.trim() == "TEST").unwrap_or(false)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# COVID-19 Dashboard Configuration
#
# Environment variables override these settings:
# - COVID_DASHBOARD_HOST
# - COVID_DASHBOARD_PORT
# - COVID_DASHBOARD_DATA_DIR
# - COVID_DASHBOARD_DATA_URL
# - COVID_DASHBOARD_DATA_SOURCE
# - COVID_DASHBOARD_FORECAST_OUTPUT
# - COVID_DASHBOARD_LOG_LEVEL
# - COVID_DASHBOARD_LOG_FORMAT
#
# APP_MODE_ENV=TEST prepares the data once and exits.

[server]
host = "0.0.0.0"
port = 80

[data]
# Directory holding sp-pos-quot-dep.csv, features_fr.csv,
# departements.geojson and departements.csv
dir = "./data"

# file: read the directory as is
# http: download the regional file from `url` when it changes
source = "file"
url = "https://www.data.gouv.fr/fr/datasets/r/406c6a23-e283-4300-9484-54e78c8ae675"

# Field delimiter of the regional file
delimiter = ";"

http_timeout_secs = 60

# Background refresh period in minutes (0 = only on demand)
refresh_interval_minutes = 0

[forecast]
# naive: trailing 7-day mean
# csv: precomputed model output (date,pos)
kind = "naive"
# output_path = "./data/prediction.csv"
# trained_until = "2020-11-01"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
