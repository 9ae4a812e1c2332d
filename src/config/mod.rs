use crate::attendance::ThresholdConfig;
use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variables that override values from the config file.
pub mod config_env {
    pub const WEBHOOK_SECRET: &str = "ROLLCALL_WEBHOOK_SECRET";
    pub const PROVIDER_API_KEY: &str = "ROLLCALL_PROVIDER_API_KEY";
    pub const SPREADSHEET_ID: &str = "ROLLCALL_SPREADSHEET_ID";
    pub const CREDENTIALS_PATH: &str = "ROLLCALL_CREDENTIALS_PATH";
    pub const MIN_WORDS: &str = "ROLLCALL_MIN_WORDS";
    pub const MIN_DURATION_SEC: &str = "ROLLCALL_MIN_DURATION_SEC";
    pub const MIN_QUESTIONS: &str = "ROLLCALL_MIN_QUESTIONS";
    pub const PORT: &str = "ROLLCALL_PORT";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub thresholds: ThresholdConfig,
    pub sheet: SheetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret expected on every webhook call. Empty disables the check.
    pub webhook_secret: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            webhook_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_url: String,
    pub api_key: String,
    pub request_timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.fireflies.ai/graphql".to_string(),
            api_key: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    /// A1 range rows are appended after, e.g. `Attendance!A1`.
    pub range: String,
    /// Path to a Google service-account JSON key.
    pub credentials_path: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            range: "Attendance!A1".to_string(),
            credentials_path: String::new(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            api_base_url: "https://sheets.googleapis.com/v4".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file is created with defaults; a missing explicit
    /// path is an error. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let config_path = Self::config_path()?;
                if config_path.exists() {
                    Self::load_from(&config_path)?
                } else {
                    info!(
                        "Config file not found, creating default at {:?}",
                        config_path
                    );
                    let config = Self::default();
                    config.save_to(&config_path)?;
                    config
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(config_env::WEBHOOK_SECRET) {
            self.server.webhook_secret = v;
        }
        if let Some(v) = lookup(config_env::PROVIDER_API_KEY) {
            self.provider.api_key = v;
        }
        if let Some(v) = lookup(config_env::SPREADSHEET_ID) {
            self.sheet.spreadsheet_id = v;
        }
        if let Some(v) = lookup(config_env::CREDENTIALS_PATH) {
            self.sheet.credentials_path = v;
        }

        override_threshold(&lookup, config_env::MIN_WORDS, &mut self.thresholds.min_words);
        override_threshold(
            &lookup,
            config_env::MIN_DURATION_SEC,
            &mut self.thresholds.min_duration_sec,
        );
        override_threshold(
            &lookup,
            config_env::MIN_QUESTIONS,
            &mut self.thresholds.min_questions,
        );
        override_parsed(&lookup, config_env::PORT, &mut self.server.port);
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        redact(&mut copy.server.webhook_secret);
        redact(&mut copy.provider.api_key);
        copy
    }

    pub fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warn!("Ignoring unparseable value for {}: {:?}", key, raw),
    }
}

/// Thresholds must be finite and non-negative.
fn override_threshold<F>(lookup: &F, key: &str, target: &mut f64)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => *target = value,
        _ => warn!("Ignoring unparseable value for {}: {:?}", key, raw),
    }
}

fn redact(secret: &mut String) {
    if !secret.is_empty() {
        *secret = "********".to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.thresholds, ThresholdConfig::default());
        assert_eq!(config.sheet.range, "Attendance!A1");
        assert!(config.server.webhook_secret.is_empty());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[thresholds]\nmin_words = 10\n\n[sheet]\nspreadsheet_id = \"abc\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.thresholds.min_words, 10.0);
        assert_eq!(config.thresholds.min_questions, 1.0);
        assert_eq!(config.sheet.spreadsheet_id, "abc");
        assert_eq!(config.provider.request_timeout_seconds, 30);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.port = 9000;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, 9000);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (config_env::WEBHOOK_SECRET, "s3cret"),
            (config_env::MIN_WORDS, "35"),
            (config_env::MIN_QUESTIONS, "lots"),
            (config_env::PORT, "9999"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.webhook_secret, "s3cret");
        assert_eq!(config.thresholds.min_words, 35.0);
        assert_eq!(config.thresholds.min_questions, 1.0);
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_invalid_threshold_overrides_are_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (config_env::MIN_WORDS, "NaN"),
            (config_env::MIN_DURATION_SEC, "-30"),
            (config_env::MIN_QUESTIONS, "inf"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.thresholds, ThresholdConfig::default());
    }

    #[test]
    fn test_zero_threshold_override_is_allowed() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == config_env::MIN_QUESTIONS).then(|| "0".to_string()));
        assert_eq!(config.thresholds.min_questions, 0.0);
    }

    #[test]
    fn test_redacted() {
        let mut config = Config::default();
        config.provider.api_key = "key".to_string();
        let shown = config.redacted();
        assert_eq!(shown.provider.api_key, "********");
        assert!(shown.server.webhook_secret.is_empty());
    }
}
