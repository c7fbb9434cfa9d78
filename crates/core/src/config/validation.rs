//! Configuration validation rules.
//!
//! Checks run once after `AppConfig` has been assembled from environment,
//! files, and defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: &str) -> Self {
        ConfigError::Invalid { field: field.into(), reason: reason.into() }
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `cache_prefix` is empty
    /// - `api_base_url` is not an http(s) URL
    /// - `tile_host_suffix` does not start with a dot
    /// - `default_minutes` is 0
    ///
    /// Returns `ConfigError::Missing` if neither `allowed_hosts` nor
    /// `tile_host_suffix` names anything to cache.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(ConfigError::invalid("api_base_url", "must be an http:// or https:// URL"));
        }

        if self.cache_prefix.trim().is_empty() {
            return Err(ConfigError::invalid("cache_prefix", "must not be empty"));
        }

        if !self.tile_host_suffix.is_empty() && !self.tile_host_suffix.starts_with('.') {
            return Err(ConfigError::invalid("tile_host_suffix", "must start with '.'"));
        }

        if self.allowed_hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(ConfigError::invalid("allowed_hosts", "must not contain empty hostnames"));
        }

        if self.allowed_hosts.is_empty() && self.tile_host_suffix.is_empty() {
            return Err(ConfigError::Missing {
                field: "allowed_hosts".into(),
                hint: "Set LOOPROUTE_ALLOWED_HOSTS or LOOPROUTE_TILE_HOST_SUFFIX".into(),
            });
        }

        if self.default_minutes == 0 {
            return Err(ConfigError::invalid("default_minutes", "must be at least 1"));
        }

        if self.cookie.as_deref().is_some_and(|c| !c.contains("csrftoken=")) {
            tracing::warn!("cookie is set but carries no csrftoken; favorite writes will be sent without a token");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(config: &AppConfig) -> Option<String> {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("user_agent"));
    }

    #[test]
    fn test_validate_api_base_url_scheme() {
        let config = AppConfig { api_base_url: "ftp://routes.local".into(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("api_base_url"));
    }

    #[test]
    fn test_validate_empty_cache_prefix() {
        let config = AppConfig { cache_prefix: "  ".into(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("cache_prefix"));
    }

    #[test]
    fn test_validate_suffix_needs_leading_dot() {
        let config = AppConfig { tile_host_suffix: "tiles.mapbox.com".into(), ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("tile_host_suffix"));
    }

    #[test]
    fn test_validate_empty_host_entry() {
        let config = AppConfig { allowed_hosts: vec!["api.mapbox.com".into(), String::new()], ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("allowed_hosts"));
    }

    #[test]
    fn test_validate_nothing_to_cache() {
        let config = AppConfig { allowed_hosts: Vec::new(), tile_host_suffix: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_validate_zero_default_minutes() {
        let config = AppConfig { default_minutes: 0, ..Default::default() };
        assert_eq!(invalid_field(&config).as_deref(), Some("default_minutes"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { timeout_ms: 100, default_minutes: 1, ..Default::default() };
        assert!(config.validate().is_ok());
        let config = AppConfig { timeout_ms: 300_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
