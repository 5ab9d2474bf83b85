//! RatticWeb Settings Library
//!
//! Loads the layered INI configuration of the RatticWeb credential manager
//! into a validated, immutable settings struct

pub mod config;
pub mod utils;

// Re-export common types
pub use crate::config::{settings, ConfSources, ConfStore, RuntimeEnv, Settings};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
