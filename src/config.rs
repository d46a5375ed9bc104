//! Configuration management for fovkit

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codecs::CompressionLevel;
use crate::error::{FovkitError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Loading settings
    #[serde(default)]
    pub loading: LoadingConfig,

    /// Conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output directory
    pub output_dir: Option<PathBuf>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Loading configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadingConfig {
    /// Image subfolder inside each FOV folder
    pub img_sub_folder: Option<String>,
    /// Pad loaded images to this side length
    pub max_image_size: Option<usize>,
}

/// Conversion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Deflate level for written TIFF data
    pub compression: CompressionLevel,
    /// File extension of single-channel images
    pub file_ext: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable colored output
    pub color: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::Balanced,
            file_ext: "tiff".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            color: true,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FovkitError::config("Could not find config directory"))?;
        Ok(config_dir.join("fovkit").join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|err| FovkitError::config(err.to_string()))?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset() -> Result<()> {
        let config = Self::default();
        config.save()
    }

    /// Initialize the configuration file
    pub fn init(force: bool) -> Result<()> {
        let path = Self::config_path()?;

        if path.exists() && !force {
            return Err(FovkitError::config(
                "Configuration file already exists. Use --force to overwrite.",
            ));
        }

        let config = Self::default();
        config.save()
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "general.output_dir" => self
                .general
                .output_dir
                .as_ref()
                .map(|path| path.display().to_string()),
            "general.jobs" => self.general.jobs.map(|jobs| jobs.to_string()),

            "loading.img_sub_folder" => self.loading.img_sub_folder.clone(),
            "loading.max_image_size" => self.loading.max_image_size.map(|size| size.to_string()),

            "conversion.compression" => Some(self.conversion.compression.to_string()),
            "conversion.file_ext" => Some(self.conversion.file_ext.clone()),

            "logging.level" => Some(self.logging.level.clone()),
            "logging.color" => Some(self.logging.color.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "general.output_dir" => {
                self.general.output_dir = Some(PathBuf::from(value));
            }
            "general.jobs" => {
                self.general.jobs = Some(
                    value
                        .parse()
                        .map_err(|_| FovkitError::config("Invalid number for jobs"))?,
                );
            }

            "loading.img_sub_folder" => {
                self.loading.img_sub_folder =
                    if value.is_empty() { None } else { Some(value.to_string()) };
            }
            "loading.max_image_size" => {
                self.loading.max_image_size = if value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .map_err(|_| FovkitError::config("Invalid number for max_image_size"))?,
                    )
                };
            }

            "conversion.compression" => {
                self.conversion.compression = value.parse()?;
            }
            "conversion.file_ext" => {
                self.conversion.file_ext = value.to_string();
            }

            "logging.level" => {
                self.logging.level = value.to_string();
            }
            "logging.color" => {
                self.logging.color = value
                    .parse()
                    .map_err(|_| FovkitError::config("Invalid boolean for color"))?;
            }

            _ => {
                return Err(FovkitError::config(format!("Unknown configuration key: {key}")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.conversion.compression, CompressionLevel::Balanced);
        assert_eq!(config.conversion.file_ext, "tiff");
        assert_eq!(config.logging.level, "info");
        assert!(config.general.jobs.is_none());
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        config.set("general.jobs", "8").unwrap();
        assert_eq!(config.get("general.jobs"), Some("8".to_string()));

        config.set("conversion.compression", "best").unwrap();
        assert_eq!(config.get("conversion.compression"), Some("best".to_string()));

        config.set("loading.img_sub_folder", "TIFs").unwrap();
        assert_eq!(config.get("loading.img_sub_folder"), Some("TIFs".to_string()));

        assert!(config.set("general.jobs", "not_a_number").is_err());
        assert!(config.set("no.such.key", "1").is_err());
        assert_eq!(config.get("no.such.key"), None);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.set("general.output_dir", "/tmp/out").unwrap();
        config.set("conversion.compression", "fast").unwrap();

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.general.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(parsed.conversion.compression, CompressionLevel::Fast);
    }
}
