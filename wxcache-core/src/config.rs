use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Cache entries expire after 20 minutes unless configured otherwise.
pub const DEFAULT_TTL_SECS: u64 = 1200;

/// A cached observation within this many meters of the requested
/// coordinate counts as a hit.
pub const DEFAULT_RADIUS_METERS: f64 = 5000.0;

/// Credentials for the hosted observation store.
///
/// Example TOML:
/// [store]
/// url = "https://xyz.supabase.co"
/// api_key = "..."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub api_key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeather API credential.
    pub api_key: Option<String>,

    /// Time-to-live for cached observations, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Cache-hit radius in meters.
    #[serde(default = "default_radius_meters")]
    pub radius_meters: f64,

    /// Hosted store credentials; when absent, lookups fall back to an
    /// in-process store that lives only for the duration of the run.
    pub store: Option<StoreConfig>,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_radius_meters() -> f64 {
    DEFAULT_RADIUS_METERS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            ttl_secs: DEFAULT_TTL_SECS,
            radius_meters: DEFAULT_RADIUS_METERS,
            store: None,
        }
    }
}

impl Config {
    /// TTL as a chrono duration, for expiry computation.
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs as i64)
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: run `wxcache configure` and enter your API key."
            )
        })
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxcache", "wxcache")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.ttl_secs, 1200);
        assert_eq!(cfg.radius_meters, 5000.0);
        assert!(cfg.api_key.is_none());
        assert!(cfg.store.is_none());
    }

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.api_key().unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn ttl_converts_to_duration() {
        let cfg = Config { ttl_secs: 600, ..Config::default() };
        assert_eq!(cfg.ttl(), Duration::seconds(600));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str(r#"api_key = "KEY""#).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("KEY"));
        assert_eq!(cfg.ttl_secs, 1200);
        assert_eq!(cfg.radius_meters, 5000.0);
    }

    #[test]
    fn store_table_round_trips() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            store: Some(StoreConfig {
                url: "https://xyz.supabase.co".to_string(),
                api_key: "SERVICE".to_string(),
            }),
            ..Config::default()
        };

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();

        let store = back.store.expect("store table must survive");
        assert_eq!(store.url, "https://xyz.supabase.co");
        assert_eq!(store.api_key, "SERVICE");
    }
}
