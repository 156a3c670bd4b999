use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_COOLNESS_THRESHOLD, DEFAULT_EVENT_BUFFER,
    DEFAULT_LIGHT_MERGE_GAP,
};
use super::error::ConfigError;

/// Structure representing the event display configuration.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_path: PathBuf,
    pub event_buffer: u64,
    pub coolness_threshold: Option<u64>,
    pub light_merge_gap: u64,
    pub cache_capacity: usize,
}

impl Default for Config {
    /// Generate a new Config object with the standard LArPix settings
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("."),
            event_buffer: DEFAULT_EVENT_BUFFER,
            coolness_threshold: Some(DEFAULT_COOLNESS_THRESHOLD),
            light_merge_gap: DEFAULT_LIGHT_MERGE_GAP,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Resolve a datalog name against the data directory.
    /// Absolute paths are returned unchanged
    pub fn get_datalog_path(&self, file_name: &Path) -> PathBuf {
        if file_name.is_absolute() {
            file_name.to_path_buf()
        } else {
            self.data_path.join(file_name)
        }
    }

    /// The threshold used when none is given explicitly
    pub fn get_coolness_threshold(&self) -> u64 {
        self.coolness_threshold.unwrap_or(DEFAULT_COOLNESS_THRESHOLD)
    }

    pub fn is_cache_capacity_valid(&self) -> bool {
        self.cache_capacity >= 1
    }

    pub fn is_event_buffer_valid(&self) -> bool {
        self.event_buffer >= 1
    }
}
