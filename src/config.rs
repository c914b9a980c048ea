use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::acoustid::DEFAULT_FPCALC;
use crate::identify::Settings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME environment variable not set")]
    NoHome,

    #[error("config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no AcoustID API key; pass --api-key, set ACOUSTID_KEY or save one with --save-defaults")]
    MissingApiKey,

    #[error("threshold must be between 0 and 1, got {0}")]
    InvalidThreshold(f64),
}

/// Defaults that can be saved to a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fpcalc: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_weight: Option<u32>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// `~/.state/aidmatch/defaults.toml`
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
        Ok(Path::new(&home).join(".state").join("aidmatch").join("defaults.toml"))
    }

    /// Load the config file; a missing file is an empty config.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source: io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string).map_err(io_err)
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.api_key.is_some() {
            self.api_key = other.api_key.clone();
        }
        if other.fpcalc.is_some() {
            self.fpcalc = other.fpcalc.clone();
        }
        if other.dest.is_some() {
            self.dest = other.dest.clone();
        }
        if other.threshold.is_some() {
            self.threshold = other.threshold;
        }
        if other.tag_weight.is_some() {
            self.tag_weight = other.tag_weight;
        }
    }

    /// Aggregation settings, with defaults for anything unset.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();
        let threshold = self.threshold.unwrap_or(defaults.threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Settings {
            threshold,
            tag_weight: self.tag_weight.unwrap_or(defaults.tag_weight),
        })
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn fpcalc_path(&self) -> PathBuf {
        self.fpcalc.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_FPCALC))
    }

    pub fn dest_dir(&self) -> PathBuf {
        self.dest.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if self.api_key.is_some() {
            println!("  AcoustID key:  (set)");
        }
        if let Some(fpcalc) = &self.fpcalc {
            println!("  fpcalc:        {}", fpcalc.display());
        }
        if let Some(dest) = &self.dest {
            println!("  Destination:   {}", dest.display());
        }
        if let Some(threshold) = self.threshold {
            println!("  Threshold:     {:.2}", threshold);
        }
        if let Some(tag_weight) = self.tag_weight {
            println!("  Tag weight:    {}", tag_weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            api_key: Some("saved".to_string()),
            threshold: Some(0.8),
            tag_weight: Some(3),
            ..Config::new()
        };
        let overrides = Config {
            api_key: Some("cli".to_string()),
            dest: Some(PathBuf::from("/music")),
            ..Config::new()
        };
        base.merge(&overrides);

        assert_eq!(base.api_key.as_deref(), Some("cli"));
        assert_eq!(base.dest, Some(PathBuf::from("/music")));
        assert_eq!(base.threshold, Some(0.8));
        assert_eq!(base.tag_weight, Some(3));
    }

    #[test]
    fn test_settings_defaults_and_validation() {
        let settings = Config::new().settings().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.threshold, 0.90);
        assert_eq!(settings.tag_weight, 2);

        let bad = Config { threshold: Some(1.5), ..Config::new() };
        assert!(matches!(bad.settings(), Err(ConfigError::InvalidThreshold(_))));
    }

    #[test]
    fn test_require_api_key() {
        assert!(matches!(Config::new().require_api_key(), Err(ConfigError::MissingApiKey)));
        let blank = Config { api_key: Some("  ".to_string()), ..Config::new() };
        assert!(blank.require_api_key().is_err());
        let set = Config { api_key: Some("8XaBELgH".to_string()), ..Config::new() };
        assert_eq!(set.require_api_key().unwrap(), "8XaBELgH");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("defaults.toml");
        let config = Config {
            fpcalc: Some(PathBuf::from("/usr/local/bin/fpcalc")),
            threshold: Some(0.95),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("threshold = 0.95"));
        assert!(!text.contains("api_key"));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("absent.toml")).unwrap(), Config::new());

        let path = dir.path().join("broken.toml");
        fs::write(&path, "threshold = \"high\"").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }
}
