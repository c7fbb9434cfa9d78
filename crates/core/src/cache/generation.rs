//! Monthly cache generations.
//!
//! Tile data ages out wholesale: each UTC calendar month gets its own cache
//! named `{prefix}-{year}-{month}`, and every other cache in the same family
//! is considered stale once a worker activates.

use chrono::{DateTime, Datelike, Utc};
use std::fmt;

/// The cache generation a worker reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheGeneration {
    prefix: String,
    year: i32,
    month: u32,
}

impl CacheGeneration {
    /// Generation for the current UTC month.
    pub fn current(prefix: impl Into<String>) -> Self {
        Self::at(prefix, Utc::now())
    }

    /// Generation for the month containing `now`.
    pub fn at(prefix: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { prefix: prefix.into(), year: now.year(), month: now.month() }
    }

    /// Full cache name, e.g. `mapbox-tiles-2026-03`.
    pub fn name(&self) -> String {
        format!("{}-{}-{:02}", self.prefix, self.year, self.month)
    }

    /// Name prefix shared by every generation of this family (`{prefix}-`).
    pub fn family_prefix(&self) -> String {
        format!("{}-", self.prefix)
    }

    /// True when `name` belongs to this family but is not this generation.
    pub fn is_stale(&self, name: &str) -> bool {
        name.starts_with(&self.family_prefix()) && name != self.name()
    }
}

impl fmt::Display for CacheGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
