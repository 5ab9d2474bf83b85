//! Configuration management module
//!
//! Responsible for reading the layered INI files and turning them into the
//! validated application settings.

pub mod auth;
pub mod file;
pub mod framework;
pub mod logging;
pub mod raw_ini;
pub mod scheduler;
pub mod settings;

pub use auth::{AuthBackend, AuthMode, AuthSettings};
pub use file::{ConfSources, ConfStore};
pub use framework::RuntimeEnv;
pub use settings::{settings, PasswordExpiry, Settings};
