//! Logging configuration
//!
//! Handler levels and the per-logger level table, rendered as
//! `tracing_subscriber` filter directives

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

// The named loggers are targets of the hosting web application. This crate's
// own events use its module paths and follow the console handler level.

/// Logger receiving request handling errors
pub const REQUEST_LOGGER: &str = "ratticweb::request";
/// Logger used by the LDAP backend
pub const LDAP_LOGGER: &str = "ratticweb::ldap";
/// Logger used by database backups
pub const BACKUP_LOGGER: &str = "ratticweb::backup";

/// Console line format
pub const CONSOLE_FORMAT: &str = "%(asctime)s [%(levelname)s] %(message)s";

/// Standard log level names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    NotSet,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::NotSet => "NOTSET",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Equivalent `tracing` filter; NOTSET lets everything through
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::NotSet => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown level name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLogLevel(pub String);

impl fmt::Display for UnknownLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level '{}'", self.0)
    }
}

impl std::error::Error for UnknownLogLevel {}

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NOTSET" => Ok(LogLevel::NotSet),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            _ => Err(UnknownLogLevel(s.to_string())),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Output handler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerSettings {
    /// Minimum level handled
    pub level: LogLevel,
    /// Only active when debug mode is off
    pub require_debug_false: bool,
    /// Line format, if the handler formats lines itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Per-logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggerSettings {
    /// Level; `None` inherits from the root
    pub level: Option<LogLevel>,
    /// Handler names
    pub handlers: Vec<String>,
    /// Pass records up to parent loggers
    pub propagate: bool,
}

impl LoggerSettings {
    fn console(level: Option<LogLevel>) -> Self {
        Self {
            level,
            handlers: vec!["console".to_string()],
            propagate: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingSettings {
    /// Keep loggers configured elsewhere
    pub disable_existing_loggers: bool,
    /// Named handlers
    pub handlers: BTreeMap<String, HandlerSettings>,
    /// Named loggers
    pub loggers: BTreeMap<String, LoggerSettings>,
}

impl LoggingSettings {
    /// Build the logging table
    ///
    /// `ldap_level` is `Some` only when LDAP authentication is enabled.
    pub fn new(request_level: LogLevel, ldap_level: Option<LogLevel>) -> Self {
        let mut handlers = BTreeMap::new();
        handlers.insert(
            "mail_admins".to_string(),
            HandlerSettings {
                level: LogLevel::Error,
                require_debug_false: true,
                format: None,
            },
        );
        handlers.insert(
            "console".to_string(),
            HandlerSettings {
                level: LogLevel::Info,
                require_debug_false: false,
                format: Some(CONSOLE_FORMAT.to_string()),
            },
        );

        let mut loggers = BTreeMap::new();
        loggers.insert(LDAP_LOGGER.to_string(), LoggerSettings::console(ldap_level));
        loggers.insert(REQUEST_LOGGER.to_string(), LoggerSettings::console(Some(request_level)));
        loggers.insert(BACKUP_LOGGER.to_string(), LoggerSettings::console(Some(LogLevel::Info)));

        Self {
            disable_existing_loggers: false,
            handlers,
            loggers,
        }
    }

    /// Level of a named logger, if set
    pub fn logger_level(&self, name: &str) -> Option<LogLevel> {
        self.loggers.get(name).and_then(|logger| logger.level)
    }

    /// Render as an `EnvFilter` directive string
    ///
    /// The console handler level is the global default; loggers with a level
    /// get a per-target directive.
    pub fn filter_directives(&self) -> String {
        let global = self
            .handlers
            .get("console")
            .map(|h| h.level)
            .unwrap_or(LogLevel::Info);

        let mut directives = vec![global.to_level_filter().to_string()];
        for (name, logger) in &self.loggers {
            if let Some(level) = logger.level {
                directives.push(format!("{}={}", name, level.to_level_filter()));
            }
        }
        directives.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("Error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("NOTSET".parse::<LogLevel>().unwrap(), LogLevel::NotSet);
        assert!("LOUD".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::NotSet.to_level_filter(), LevelFilter::TRACE);
        assert_eq!(LogLevel::Warning.to_level_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Critical.to_level_filter(), LevelFilter::ERROR);
    }

    #[test]
    fn test_filter_directives_without_ldap() {
        let logging = LoggingSettings::new(LogLevel::Error, None);
        assert_eq!(
            logging.filter_directives(),
            "info,ratticweb::backup=info,ratticweb::request=error"
        );
        assert_eq!(logging.logger_level(LDAP_LOGGER), None);
    }

    #[test]
    fn test_filter_directives_with_ldap() {
        let logging = LoggingSettings::new(LogLevel::Critical, Some(LogLevel::Debug));
        assert_eq!(
            logging.filter_directives(),
            "info,ratticweb::backup=info,ratticweb::ldap=debug,ratticweb::request=error"
        );
    }
}
