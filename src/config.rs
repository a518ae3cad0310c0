//! Service configuration loaded from YAML.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::noise::DEFAULT_NOISE_SEED;
use crate::region::Region;
use crate::tiles::{DEFAULT_GRID_SIZE, DEFAULT_MIN_VALUE, MAX_GRID_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub default_region: RegionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default = "default_min_value")]
    pub min_value: f64,
    #[serde(default = "default_noise_seed")]
    pub noise_seed: u64,
}

fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

fn default_min_value() -> f64 {
    DEFAULT_MIN_VALUE
}

fn default_noise_seed() -> u64 {
    DEFAULT_NOISE_SEED
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            min_value: default_min_value(),
            noise_seed: default_noise_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,
    #[serde(default = "default_geolocation_timeout_ms")]
    pub geolocation_timeout_ms: u64,
    #[serde(default = "default_geocoding_timeout_ms")]
    pub geocoding_timeout_ms: u64,
    /// Extent in degrees of the view opened on a search result.
    #[serde(default = "default_search_span_deg")]
    pub search_span_deg: f64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geolocation_url() -> String {
    "https://ipapi.co/json/".to_string()
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_geolocation_timeout_ms() -> u64 {
    5_000
}

fn default_geocoding_timeout_ms() -> u64 {
    8_000
}

fn default_search_span_deg() -> f64 {
    0.2
}

fn default_user_agent() -> String {
    concat!("solaris/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            geolocation_url: default_geolocation_url(),
            geocoding_url: default_geocoding_url(),
            geolocation_timeout_ms: default_geolocation_timeout_ms(),
            geocoding_timeout_ms: default_geocoding_timeout_ms(),
            search_span_deg: default_search_span_deg(),
            user_agent: default_user_agent(),
        }
    }
}

impl ServicesConfig {
    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.geolocation_timeout_ms)
    }

    pub fn geocoding_timeout(&self) -> Duration {
        Duration::from_millis(self.geocoding_timeout_ms)
    }
}

/// Region shown when the visitor cannot be located (New Delhi).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_delta")]
    pub latitude_delta: f64,
    #[serde(default = "default_delta")]
    pub longitude_delta: f64,
}

fn default_latitude() -> f64 {
    28.6139
}

fn default_longitude() -> f64 {
    77.209
}

fn default_delta() -> f64 {
    0.4
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            latitude_delta: default_delta(),
            longitude_delta: default_delta(),
        }
    }
}

impl RegionConfig {
    pub fn region(&self) -> Region {
        Region::new(
            self.latitude,
            self.longitude,
            self.latitude_delta,
            self.longitude_delta,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heatmap.grid_size == 0 || self.heatmap.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::Validation(format!(
                "heatmap.grid_size must be between 1 and {MAX_GRID_SIZE}, got {}",
                self.heatmap.grid_size
            )));
        }

        if !(0.0..1.0).contains(&self.heatmap.min_value) {
            return Err(ConfigError::Validation(format!(
                "heatmap.min_value must be in [0, 1), got {}",
                self.heatmap.min_value
            )));
        }

        if self.services.geolocation_timeout_ms == 0 || self.services.geocoding_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "service timeouts must be greater than zero".into(),
            ));
        }

        let span = self.services.search_span_deg;
        if span.is_nan() || span <= 0.0 {
            return Err(ConfigError::Validation(
                "services.search_span_deg must be positive".into(),
            ));
        }

        let region = &self.default_region;
        if !(-90.0..=90.0).contains(&region.latitude) || !(-180.0..=180.0).contains(&region.longitude)
        {
            return Err(ConfigError::Validation(format!(
                "default_region center ({}, {}) is not a valid coordinate",
                region.latitude, region.longitude
            )));
        }

        Ok(())
    }
}
