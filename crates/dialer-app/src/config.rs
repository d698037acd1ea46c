//! Application configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Preference cache settings.
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote routing/chat/export API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API root URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Preference cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    /// Path to the SQLite preference cache file.
    #[serde(default = "default_prefs_path")]
    pub path: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "dialer_voice=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_prefs_path() -> String {
    "dialer.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_prefs_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `DIALER_API_URL` overrides `api.base_url`
/// - `DIALER_API_TIMEOUT_SECONDS` overrides `api.timeout_seconds`
/// - `DIALER_PREFS_PATH` overrides `preferences.path`
/// - `DIALER_LOG_LEVEL` overrides `logging.level`
/// - `DIALER_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(url) = std::env::var("DIALER_API_URL") {
        config.api.base_url = url;
    }
    if let Ok(timeout) = std::env::var("DIALER_API_TIMEOUT_SECONDS") {
        if let Ok(parsed) = timeout.parse() {
            config.api.timeout_seconds = parsed;
        }
    }
    if let Ok(prefs_path) = std::env::var("DIALER_PREFS_PATH") {
        config.preferences.path = prefs_path;
    }
    if let Ok(level) = std::env::var("DIALER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("DIALER_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
