//! Sysora Core - shared infrastructure for the Sysora client crates
//!
//! Error types with context, logging bootstrap, TOML configuration and
//! async helpers used by the session and API layers.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;

// Re-export commonly used external types
pub use tracing;
