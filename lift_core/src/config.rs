//! Configuration file support for lift.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/lift/config.toml`.

use crate::store::postgres::DEFAULT_STATEMENT_TIMEOUT_SECS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `database.url`
pub const DATABASE_URL_ENV: &str = "LIFT_DATABASE_URL";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub rest: RestConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Local data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Remote database configuration. Without a url, workouts go to the local journal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            statement_timeout_secs: default_statement_timeout_secs(),
        }
    }
}

/// Rest countdown configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestConfig {
    /// Duration used when the user restarts the countdown
    #[serde(default = "default_restart_seconds")]
    pub restart_seconds: u32,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            restart_seconds: default_restart_seconds(),
        }
    }
}

/// Exercise catalog source
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// JSON file mapping exercise id to its fields; built-in catalog when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("lift")
}

fn default_statement_timeout_secs() -> u64 {
    DEFAULT_STATEMENT_TIMEOUT_SECS
}

fn default_restart_seconds() -> u32 {
    60
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply environment overrides on top of file values
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.database.url = Some(url);
            }
        }
        self
    }

    /// Reject values the rest of the program cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.database.statement_timeout_secs == 0 {
            return Err(Error::Config(
                "database.statement_timeout_secs must be at least 1".into(),
            ));
        }
        if let Some(url) = &self.database.url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(Error::Config(format!(
                    "database.url must be a postgres:// url, got '{}'",
                    url
                )));
            }
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("lift").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Where the persisted draft and timer live
    pub fn state_path(&self) -> PathBuf {
        self.data.data_dir.join("state.json")
    }

    /// Where workouts go when no database is configured
    pub fn journal_path(&self) -> PathBuf {
        self.data.data_dir.join("workouts.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.url.is_none());
        assert_eq!(config.database.statement_timeout_secs, 15);
        assert_eq!(config.rest.restart_seconds, 60);
        assert!(config.catalog.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[database]
url = "postgres://lift@localhost/lift"

[rest]
restart_seconds = 90
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("postgres://lift@localhost/lift"));
        assert_eq!(config.database.statement_timeout_secs, 15); // default
        assert_eq!(config.rest.restart_seconds, 90);
    }

    #[test]
    fn test_save_and_load_from() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("lift/config.toml");

        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().join("data");
        config.rest.restart_seconds = 45;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.rest.restart_seconds, 45);
        assert_eq!(loaded.state_path(), temp_dir.path().join("data/state.json"));
        assert_eq!(loaded.journal_path(), temp_dir.path().join("data/workouts.jsonl"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.database.statement_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.database.url = Some("mysql://nope".into());
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
