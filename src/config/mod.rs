//! CityScout configuration file handling
//!
//! Loads and manages the ~/.config/cityscout/config.yaml file, with
//! environment variable overrides for the port, database path, and
//! upstream API keys.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Upstream API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Geocoding provider key (env: GEOCODE_API_KEY)
    #[serde(default)]
    pub geocode: String,

    /// Weather provider key (env: WEATHER_API_KEY)
    #[serde(default)]
    pub weather: String,

    /// Events provider key (env: EVENTS_API_KEY)
    #[serde(default)]
    pub events: String,
}

/// CityScout configuration
///
/// Represents the complete ~/.config/cityscout/config.yaml file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the HTTP server (env: CITYSCOUT_PORT)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite cache database (env: CITYSCOUT_DB)
    #[serde(default = "default_database_path")]
    pub database: PathBuf,

    /// Upstream API keys
    #[serde(default)]
    pub api_keys: ApiKeys,
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> PathBuf {
    // Always use ~/.config for consistency across platforms (macOS, Linux)
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("cityscout");
    path.push("cache.db");
    path
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database: default_database_path(),
            api_keys: ApiKeys::default(),
        }
    }
}

impl AppConfig {
    /// Default configuration file path (~/.config/cityscout/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("cityscout");
        path.push("config.yaml");
        path
    }

    /// Load configuration from the default path, falling back to defaults
    /// when no file exists, then apply environment overrides.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_yaml::to_string(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Overlay environment variables onto the loaded file values
    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("CITYSCOUT_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
        if let Ok(db) = std::env::var("CITYSCOUT_DB") {
            self.database = PathBuf::from(db);
        }
        if let Ok(key) = std::env::var("GEOCODE_API_KEY") {
            self.api_keys.geocode = key;
        }
        if let Ok(key) = std::env::var("WEATHER_API_KEY") {
            self.api_keys.weather = key;
        }
        if let Ok(key) = std::env::var("EVENTS_API_KEY") {
            self.api_keys.events = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert!(config.database.ends_with("cityscout/cache.db"));
        assert!(config.api_keys.geocode.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.port = 8081;
        config.api_keys.weather = "dark-sky-key".to_string();

        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        assert_eq!(loaded.port, 8081);
        assert_eq!(loaded.api_keys.weather, "dark-sky-key");
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "port: 9090\n").unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.port, 9090);
        assert!(loaded.database.ends_with("cityscout/cache.db"));
    }
}
