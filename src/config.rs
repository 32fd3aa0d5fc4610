use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::{PageLocation, resolve_for_location};

/// Env var holding an explicit API base address
pub const BASE_URL_ENV: &str = "MEMDEV_API_BASE_URL";

/// Main memdev configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub api: ApiConfig,
    pub paths: PathsConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" => Ok(LogLevel::Off),
            _ => eyre::bail!("Unknown log level: {}", s),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Explicit base address; skips LAN/public resolution when set
    pub base_url: Option<String>,
    /// Origin the console is considered to be served from
    pub origin: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the persisted user id lives
    pub state: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Print each request as it completes
    pub live: bool,
    /// Print the console table after every command
    pub show_on_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            api: ApiConfig::default(),
            paths: PathsConfig::default(),
            console: ConsoleConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            origin: "http://localhost".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("memdev"),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        if let Ok(env_path) = std::env::var("MEMDEV_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from MEMDEV_CONFIG: {}", e);
                    }
                }
            }
        }

        if let Ok(memdev_dir) = std::env::var("MEMDEV_DIR") {
            let path = PathBuf::from(memdev_dir).join("memdev.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from MEMDEV_DIR: {}", e);
                    }
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("memdev").join("memdev.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Try ./memdev.yaml (for development)
        let local_config = PathBuf::from("memdev.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Directory holding memdev.yaml when written by `config set`
    pub fn memdev_dir() -> PathBuf {
        std::env::var("MEMDEV_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("memdev"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }

    /// Resolve the API base address once for this run.
    ///
    /// Override precedence: `cli_override`, then `MEMDEV_API_BASE_URL`, then
    /// `api.base_url`.
    pub fn resolve_base_url(&self, cli_override: Option<&str>) -> Result<String> {
        let env_override = std::env::var(BASE_URL_ENV).ok();
        let explicit = [cli_override, env_override.as_deref(), self.api.base_url.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty());

        let location = PageLocation::parse(&self.api.origin).context("Invalid api.origin in config")?;
        let base = resolve_for_location(explicit, &location);
        log::info!("API base resolved to {}", base);
        Ok(base)
    }
}
