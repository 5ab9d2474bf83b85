//! Utilities module
//!
//! Contains error handling, logging setup and URL helpers

pub mod error;
pub mod logging;
pub mod url;
