pub mod path;
#[cfg(test)]
pub mod config_test;

use std::{io, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drivers::xinput::descriptor::{DEFAULT_MANUFACTURER, DEFAULT_PRODUCT, DEFAULT_SERIAL};

/// Represents all possible errors loading an [XInputConfig]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
}

/// Describes how the emulated controller identifies itself to the host
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case", default)]
pub struct XInputConfig {
    pub version: u32,
    pub kind: String,
    pub name: String,
    /// String descriptor 1
    pub manufacturer: String,
    /// String descriptor 2
    pub product: String,
    /// String descriptor 3
    pub serial: String,
    /// How often the simulated controller produces a new input report
    pub report_interval_ms: u64,
}

impl Default for XInputConfig {
    fn default() -> Self {
        Self {
            version: 1,
            kind: "XInputDevice".to_string(),
            name: "Generic XInput Controller".to_string(),
            manufacturer: DEFAULT_MANUFACTURER.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            serial: DEFAULT_SERIAL.to_string(),
            report_interval_ms: 4,
        }
    }
}

impl XInputConfig {
    /// Load an [XInputConfig] from the given YAML string
    pub fn from_yaml(content: String) -> Result<XInputConfig, LoadError> {
        let config: XInputConfig = serde_yaml::from_str(content.as_str())?;
        Ok(config)
    }

    /// Load an [XInputConfig] from the given YAML file
    pub fn from_yaml_file(path: String) -> Result<XInputConfig, LoadError> {
        Self::from_yaml_path(path)
    }

    /// Load an [XInputConfig] from the given YAML file path
    pub fn from_yaml_path<P: AsRef<Path>>(path: P) -> Result<XInputConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: XInputConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Load the given config file, or the first device config found in the
    /// search paths, falling back to the defaults.
    pub fn load(config_path: Option<String>) -> Result<XInputConfig, LoadError> {
        if let Some(config_path) = config_path {
            log::debug!("Loading config from {config_path}");
            return Self::from_yaml_file(config_path);
        }

        let files = path::get_multidir_sorted_files(&path::get_devices_paths(), |entry| {
            entry.path().extension().is_some_and(|ext| ext == "yaml")
        });
        if let Some(file) = files.first() {
            log::debug!("Loading config from {}", file.display());
            return Self::from_yaml_path(file);
        }

        log::debug!("No config file found, using defaults");
        Ok(XInputConfig::default())
    }
}
