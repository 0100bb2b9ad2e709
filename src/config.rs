//! Configuration management for the urban heat analyzer
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::UrbanHeatError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the urban heat analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrbanHeatConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream service configuration
    #[serde(default)]
    pub services: ServicesConfig,
    /// Query log storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Analysis pipeline settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_server_host")]
    pub host: String,
    /// Listen port
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory of static frontend files
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Upstream service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Nominatim base URL
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    /// Open-Meteo base URL
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    /// Full URL of the UHI prediction endpoint
    #[serde(default = "default_predictor_url")]
    pub predictor_url: String,
    /// User agent sent to public APIs
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout for geocoding and weather, in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u32,
    /// Request timeout for the prediction service, in milliseconds
    #[serde(default = "default_predictor_timeout_ms")]
    pub predictor_timeout_ms: u64,
    /// Retries on transient geocoding/weather failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Query log storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the query log database
    #[serde(default = "default_storage_path")]
    pub path: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or compact)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP endpoint for span export; disabled when unset
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

/// Analysis pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Latitude used when a query cannot be geocoded
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,
    /// Longitude used when a query cannot be geocoded
    #[serde(default = "default_longitude")]
    pub default_longitude: f64,
    /// Fixed RNG seed for reproducible simulations
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_weather_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_predictor_url() -> String {
    "http://127.0.0.1:5001/predict".to_string()
}

fn default_user_agent() -> String {
    format!("urbanheat/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_seconds() -> u32 {
    10
}

fn default_predictor_timeout_ms() -> u64 {
    3000
}

fn default_max_retries() -> u32 {
    1
}

fn default_storage_path() -> String {
    "data/searches".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_latitude() -> f64 {
    20.6
}

fn default_longitude() -> f64 {
    78.9
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            weather_url: default_weather_url(),
            predictor_url: default_predictor_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
            predictor_timeout_ms: default_predictor_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            seed: None,
        }
    }
}

impl ServicesConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn predictor_timeout(&self) -> Duration {
        Duration::from_millis(self.predictor_timeout_ms)
    }
}

impl UrbanHeatConfig {
    /// Load configuration from `config_path` (or the default location) and
    /// the environment
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. URBANHEAT__SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("URBANHEAT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        // Plain PORT and ML_URL are honored for drop-in deployments
        builder = builder
            .set_override_option("server.port", std::env::var("PORT").ok())
            .with_context(|| "Failed to apply PORT override")?
            .set_override_option("services.predictor_url", std::env::var("ML_URL").ok())
            .with_context(|| "Failed to apply ML_URL override")?;

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: UrbanHeatConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("urbanheat").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.static_dir.is_empty() {
            self.server.static_dir = default_static_dir();
        }
        if self.services.geocoding_url.is_empty() {
            self.services.geocoding_url = default_geocoding_url();
        }
        if self.services.weather_url.is_empty() {
            self.services.weather_url = default_weather_url();
        }
        if self.services.predictor_url.is_empty() {
            self.services.predictor_url = default_predictor_url();
        }
        if self.services.user_agent.is_empty() {
            self.services.user_agent = default_user_agent();
        }
        if self.services.timeout_seconds == 0 {
            self.services.timeout_seconds = default_timeout_seconds();
        }
        if self.services.predictor_timeout_ms == 0 {
            self.services.predictor_timeout_ms = default_predictor_timeout_ms();
        }
        if self.storage.path.is_empty() {
            self.storage.path = default_storage_path();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self
            .logging
            .otlp_endpoint
            .as_ref()
            .is_some_and(|endpoint| endpoint.is_empty())
        {
            self.logging.otlp_endpoint = None;
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(UrbanHeatError::config("Server port cannot be 0").into());
        }

        if self.services.timeout_seconds > 300 {
            return Err(
                UrbanHeatError::config("Service timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.services.predictor_timeout_ms > 60_000 {
            return Err(UrbanHeatError::config(
                "Prediction service timeout cannot exceed 60000 ms",
            )
            .into());
        }

        if self.services.max_retries > 10 {
            return Err(UrbanHeatError::config("Service max retries cannot exceed 10").into());
        }

        if !(-90.0..=90.0).contains(&self.analysis.default_latitude) {
            return Err(UrbanHeatError::config(
                "Default latitude must be between -90 and 90",
            )
            .into());
        }

        if !(-180.0..=180.0).contains(&self.analysis.default_longitude) {
            return Err(UrbanHeatError::config(
                "Default longitude must be between -180 and 180",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(UrbanHeatError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(UrbanHeatError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Geocoding", &self.services.geocoding_url),
            ("Weather", &self.services.weather_url),
            ("Prediction service", &self.services.predictor_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(UrbanHeatError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if let Some(endpoint) = &self.logging.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(UrbanHeatError::config(
                    "OTLP endpoint must be a valid HTTP or HTTPS URL",
                )
                .into());
            }
        }

        Ok(())
    }
}
