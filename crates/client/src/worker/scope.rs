//! Which requests the tile cache worker intercepts.

use std::collections::HashSet;

use looproute_core::AppConfig;
use reqwest::Method;

use crate::fetch::TileRequest;

/// Host allow-list plus a tile-host suffix.
///
/// Only GET requests to an allowed host, or to any host ending with the
/// suffix, are intercepted. Everything else passes through untouched.
#[derive(Debug, Clone)]
pub struct HostScope {
    hosts: HashSet<String>,
    suffix: String,
}

impl HostScope {
    /// Build a scope from explicit hosts and a suffix such as `.tiles.mapbox.com`.
    ///
    /// An empty suffix disables suffix matching.
    pub fn new<I, S>(hosts: I, suffix: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts.into_iter().map(|h| h.as_ref().trim().to_ascii_lowercase()).collect(),
            suffix: suffix.into().to_ascii_lowercase(),
        }
    }

    /// Scope described by the application config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.allowed_hosts, config.tile_host_suffix.clone())
    }

    /// Allowed hosts, sorted.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts: Vec<String> = self.hosts.iter().cloned().collect();
        hosts.sort();
        hosts
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// True if requests to `host` are eligible for caching.
    pub fn allows_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.hosts.contains(&host) || (!self.suffix.is_empty() && host.ends_with(&self.suffix))
    }

    /// True if the worker should answer this request itself.
    pub fn intercepts(&self, request: &TileRequest) -> bool {
        request.method == Method::GET && request.host().is_some_and(|host| self.allows_host(host))
    }
}
