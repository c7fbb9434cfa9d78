//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LOOPROUTE_*)
//! 2. TOML config file (if LOOPROUTE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LOOPROUTE_*)
/// 2. TOML config file (if LOOPROUTE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite tile cache database.
    ///
    /// Set via LOOPROUTE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for tile and backend requests.
    ///
    /// Set via LOOPROUTE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Backend request timeout in milliseconds.
    ///
    /// Applies to route and favorite calls only; tile fetches have no timeout.
    /// Set via LOOPROUTE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Base URL of the route-planning backend.
    ///
    /// Set via LOOPROUTE_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Cookie header sent by the page; the `csrftoken` cookie is read from it.
    ///
    /// Set via LOOPROUTE_COOKIE environment variable.
    #[serde(default)]
    pub cookie: Option<String>,

    /// Name prefix of the tile cache family.
    ///
    /// Set via LOOPROUTE_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Hosts whose GET requests are cached.
    ///
    /// Set via LOOPROUTE_ALLOWED_HOSTS environment variable.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// Hostname suffix matching tile servers (e.g. `.tiles.mapbox.com`).
    ///
    /// Set via LOOPROUTE_TILE_HOST_SUFFIX environment variable.
    #[serde(default = "default_tile_host_suffix")]
    pub tile_host_suffix: String,

    /// Loop duration used when a request does not name one.
    ///
    /// Set via LOOPROUTE_DEFAULT_MINUTES environment variable.
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./looproute-tiles.sqlite")
}

fn default_user_agent() -> String {
    "looproute/0.1".into()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_cache_prefix() -> String {
    "mapbox-tiles".into()
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["api.mapbox.com".into(), "events.mapbox.com".into()]
}

fn default_tile_host_suffix() -> String {
    ".tiles.mapbox.com".into()
}

fn default_minutes() -> u32 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            api_base_url: default_api_base_url(),
            cookie: None,
            cache_prefix: default_cache_prefix(),
            allowed_hosts: default_allowed_hosts(),
            tile_host_suffix: default_tile_host_suffix(),
            default_minutes: default_minutes(),
        }
    }
}

impl AppConfig {
    /// Backend timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LOOPROUTE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LOOPROUTE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
