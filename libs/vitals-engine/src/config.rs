use serde::Deserialize;

use crate::aggregator::{DEFAULT_WINDOW_SECONDS, TimestampPolicy};
use crate::error::EngineError;
use crate::locator::DistanceMetric;

/// Root configuration, parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitalsConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub heart_rate: HeartRateConfig,

    #[serde(default)]
    pub locator: LocatorConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    File,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::File => f.write_str("file"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Backend settings, handed to the store factory as JSON.
    #[serde(default)]
    pub config: Option<toml::Value>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let mut table = toml::map::Map::new();
        table.insert("data_dir".into(), toml::Value::String("data".into()));
        Self {
            backend: StoreBackend::File,
            config: Some(toml::Value::Table(table)),
        }
    }
}

impl StoreConfig {
    /// Backend settings as a JSON object string, `"{}"` when absent.
    pub fn config_json(&self) -> Result<String, EngineError> {
        match &self.config {
            Some(v) => serde_json::to_string(v)
                .map_err(|e| EngineError::Config(format!("serialize store config: {e}"))),
            None => Ok("{}".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartRateConfig {
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default)]
    pub on_bad_timestamp: TimestampPolicy,
}

fn default_window_seconds() -> u64 {
    DEFAULT_WINDOW_SECONDS
}

impl Default for HeartRateConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            on_bad_timestamp: TimestampPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocatorConfig {
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl VitalsConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }
}
