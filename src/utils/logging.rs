//! Logging utilities
//!
//! Installs the global `tracing` subscriber from the settings logger table

use std::str::FromStr;
use tracing::subscriber::SetGlobalDefaultError;

use crate::config::logging::LoggingSettings;

/// Subscriber output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable (development)
    Text,
    /// JSON lines (production)
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Invalid log format: {}", other)),
        }
    }
}

impl LogFormat {
    /// `LOG_FORMAT`, defaulting to text
    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LogFormat::Text)
    }
}

/// Filter directives: an explicit `RUST_LOG` wins over the settings table
pub fn resolve_directives(rust_log: Option<String>, logging: &LoggingSettings) -> String {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives,
        _ => logging.filter_directives(),
    }
}

/// Initialize logging system
pub fn init_logging(
    logging: &LoggingSettings,
    format: LogFormat,
) -> Result<(), SetGlobalDefaultError> {
    let directives = resolve_directives(std::env::var("RUST_LOG").ok(), logging);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match format {
        // JSON format logs (production environment)
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(directives)
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .finish(),
        ),
        LogFormat::Text => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(directives)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish(),
        ),
    };

    tracing::subscriber::set_global_default(subscriber)
}
