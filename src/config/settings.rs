//! Application settings file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::config::*;
use crate::constants::studio::{DEBOUNCE_MS, DOWNLOAD_RESOLUTIONS};
use crate::style::Extension;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where folders, projects and templates are stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Directory with `<lang>.json` bundles replacing the built-in ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locales_dir: Option<PathBuf>,
    /// Default export destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_export_size")]
    pub default_export_size: u32,
    #[serde(default = "default_export_format")]
    pub default_export_format: Extension,
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_export_size() -> u32 {
    DOWNLOAD_RESOLUTIONS[1]
}

fn default_export_format() -> Extension {
    Extension::Png
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            locales_dir: None,
            export_dir: None,
            debounce_ms: default_debounce_ms(),
            log_level: default_log_level(),
            default_export_size: default_export_size(),
            default_export_format: default_export_format(),
        }
    }
}

fn level_from_name(name: &str) -> tracing::Level {
    match name {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

impl AppConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load from `path` (or the default location), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let default_path = Self::path();
        let mut config = Self::load_from(path.unwrap_or(&default_path))?;
        config.apply_env_overrides(|var| std::env::var(var).ok());
        config.validate_and_clamp();
        Ok(config)
    }

    /// Load from `path`, writing the defaults there if the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default config");
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
        config.validate_and_clamp();
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Environment wins over the file
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(dir) = non_empty(DATA_DIR_ENV) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = non_empty(LOCALES_DIR_ENV) {
            self.locales_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = non_empty(LOG_LEVEL_ENV) {
            self.log_level = level.to_lowercase();
        }
    }

    pub fn validate_and_clamp(&mut self) {
        use crate::constants::validation::*;

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            warn!(debounce_ms = self.debounce_ms, max = MAX_DEBOUNCE_MS, "debounce_ms exceeds maximum, clamping");
            self.debounce_ms = MAX_DEBOUNCE_MS;
        }

        if self.default_export_size < MIN_EXPORT_SIZE {
            warn!(default_export_size = self.default_export_size, min = MIN_EXPORT_SIZE, "default_export_size below minimum, clamping");
            self.default_export_size = MIN_EXPORT_SIZE;
        } else if self.default_export_size > MAX_EXPORT_SIZE {
            warn!(default_export_size = self.default_export_size, max = MAX_EXPORT_SIZE, "default_export_size exceeds maximum, clamping");
            self.default_export_size = MAX_EXPORT_SIZE;
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            warn!(log_level = %self.log_level, using = "info", "Unknown log_level, using default");
            self.log_level = default_log_level();
        }
    }

    /// Data directory: configured, else the platform data dir, else the working directory
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Export directory: configured, else the downloads dir, else the working directory
    pub fn resolved_export_dir(&self) -> PathBuf {
        if let Some(dir) = &self.export_dir {
            return dir.clone();
        }
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn tracing_level(&self) -> tracing::Level {
        level_from_name(&self.log_level)
    }

    /// Level to log at while the config itself is still being loaded
    pub fn bootstrap_level(lookup: impl Fn(&str) -> Option<String>) -> tracing::Level {
        lookup(LOG_LEVEL_ENV)
            .map(|level| level_from_name(&level.trim().to_lowercase()))
            .unwrap_or(tracing::Level::INFO)
    }
}
