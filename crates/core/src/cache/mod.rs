//! SQLite-backed storage for map tile responses.
//!
//! This module models a small CacheStorage: a set of named caches, each
//! holding response snapshots keyed by request. It supports:
//!
//! - Monthly cache generations (`{prefix}-{year}-{month}`)
//! - Request-addressed entries using SHA-256 keys over method and URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Generation pruning on worker activation

pub mod connection;
pub mod entries;
pub mod generation;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::TileStore;
pub use entries::CachedResponse;
pub use generation::CacheGeneration;
pub use storage::CacheSummary;
