//! Cache-related MCP tools.
//!
//! This module provides tools for driving the tile cache worker's lifecycle
//! and inspecting the SQLite cache.

pub mod activate;
pub mod status;

pub use activate::activate_impl;
pub use status::status_impl;
