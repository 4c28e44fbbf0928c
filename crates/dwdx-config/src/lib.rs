use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_FORECAST_URL: &str =
    "https://dwd.api.proxy.bund.dev/v30/stationOverviewExtended";
pub const DEFAULT_OBSERVATION_URL: &str = "https://opendata.dwd.de/weather/weather_reports/poi/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("dwd-mirror/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
    pub station_ids: Vec<String>,
    pub enable_forecast1: bool,
    pub enable_forecast2: bool,
    /// Store array values as one entry per element
    pub split_arrays: bool,
    /// Cron expression (sec min hour dom month dow)
    pub schedule: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FORECAST_URL.to_string(),
            station_ids: vec!["N7075".to_string()],
            enable_forecast1: false,
            enable_forecast2: false,
            split_arrays: false,
            schedule: "0 5 * * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservationConfig {
    pub base_url: String,
    pub station_identifiers: Vec<String>,
    /// Placeholder the CSV uses for an empty cell
    pub missing_value: String,
    pub schedule: String,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OBSERVATION_URL.to_string(),
            station_identifiers: vec!["K419_-BEOB".to_string()],
            missing_value: "---".to_string(),
            schedule: "0 50 * * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Fs,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory for `fs`, database file for `sqlite`
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: "state".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub enable_logs: bool,
    /// Namespace prefix for every entry path
    pub root: String,
    pub run_on_start: bool,
    pub http: HttpConfig,
    pub forecast: ForecastConfig,
    pub observations: ObservationConfig,
    pub store: StoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enable_logs: true,
            root: "dwdWeather".to_string(),
            run_on_start: true,
            http: HttpConfig::default(),
            forecast: ForecastConfig::default(),
            observations: ObservationConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Load configuration from DWDX_CONFIG path (TOML) if present, with reasonable defaults
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("DWDX_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(path)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            Self::from_toml(&s)?
        } else {
            AppConfig::default()
        };
        Ok(cfg)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let cfg = toml::from_str::<AppConfig>(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.trim().is_empty() {
            return Err(ConfigError::Invalid("root must not be empty".into()));
        }
        if self.observations.missing_value.is_empty() {
            return Err(ConfigError::Invalid(
                "observations.missing_value must not be empty".into(),
            ));
        }
        if self.store.backend != StoreBackend::Memory && self.store.path.trim().is_empty() {
            return Err(ConfigError::Invalid("store.path must not be empty".into()));
        }
        Ok(())
    }
}
