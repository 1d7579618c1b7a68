//! Application configuration management.
//!
//! Configuration is stored at `~/.config/statboard/config.json`. The API URL
//! and token can be overridden from the environment (`STATBOARD_API_URL`,
//! `STATBOARD_TOKEN`), which the CLI fills from a `.env` file if present.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_API_BASE_URL;
use crate::cache::CACHE_STALE_MINUTES;
use crate::date::DEFAULT_SINCE_MONTHS;
use crate::models::EntityLevel;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "statboard";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "STATBOARD_API_URL";
pub const ENV_TOKEN: &str = "STATBOARD_TOKEN";

/// Entity used when a command does not name one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultEntity {
    pub id: String,
    pub level: EntityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub token: Option<String>,
    pub cache_ttl_minutes: i64,
    pub since_months: u32,
    pub default_entity: Option<DefaultEntity>,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            cache_ttl_minutes: CACHE_STALE_MINUTES,
            since_months: DEFAULT_SINCE_MONTHS,
            default_entity: None,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::minutes(self.cache_ttl_minutes.max(0))
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Set a field from its config key, as used by `statboard config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_base_url" => self.api_base_url = value.to_string(),
            "token" => self.token = Some(value.to_string()).filter(|v| !v.is_empty()),
            "cache_ttl_minutes" => {
                self.cache_ttl_minutes = value
                    .parse()
                    .with_context(|| format!("Invalid cache_ttl_minutes: {}", value))?
            }
            "since_months" => {
                self.since_months = value
                    .parse()
                    .with_context(|| format!("Invalid since_months: {}", value))?
            }
            "log_dir" => self.log_dir = Some(PathBuf::from(value)).filter(|_| !value.is_empty()),
            "default_entity" => {
                // "<level>:<id>"
                let (level, id) = value
                    .split_once(':')
                    .ok_or_else(|| anyhow::anyhow!("Expected <level>:<id>, got {}", value))?;
                self.default_entity = Some(DefaultEntity {
                    id: id.to_string(),
                    level: level.parse()?,
                });
            }
            other => anyhow::bail!("Unknown config key: {}", other),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache_ttl(), Duration::minutes(60));
        assert_eq!(config.since_months, 12);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set("default_entity", "structure:school-1").unwrap();
        config.set("cache_ttl_minutes", "15").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.cache_ttl_minutes, 15);
        assert_eq!(
            loaded.default_entity,
            Some(DefaultEntity {
                id: "school-1".to_string(),
                level: EntityLevel::Structure
            })
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "https://ent.example.org"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "https://ent.example.org");
        assert_eq!(config.cache_ttl_minutes, 60);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            ENV_API_URL => Some("https://stats.example.org".to_string()),
            ENV_TOKEN => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://stats.example.org");
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("cache_ttl_minutes", "soon").is_err());
        assert!(config.set("default_entity", "school-1").is_err());
        assert!(config.set("default_entity", "campus:1").is_err());
        assert!(config.set("colour", "blue").is_err());
    }
}
