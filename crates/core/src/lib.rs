//! Core types and shared functionality for looproute.
//!
//! This crate provides:
//! - Tile cache storage with a SQLite backend (named cache generations)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheGeneration, CacheSummary, CachedResponse, TileStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
