//! Error handling module
//!
//! Defines error types produced while loading and validating settings

use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration files could not be read or parsed
    #[error("Configuration load error: {0}")]
    Load(#[from] ::config::ConfigError),

    /// Required option has no value and no default
    #[error("Missing required option '{option}' in section [{section}]")]
    MissingOption {
        section: String,
        option: String,
    },

    /// Boolean text outside the accepted tokens
    #[error("Invalid boolean '{value}' for [{section}] {option}")]
    InvalidBool {
        section: String,
        option: String,
        value: String,
    },

    /// Integer text that does not parse
    #[error("Invalid integer '{value}' for [{section}] {option}")]
    InvalidInt {
        section: String,
        option: String,
        value: String,
    },

    /// Value present but not acceptable for the option
    #[error("Invalid value '{value}' for [{section}] {option}: {reason}")]
    InvalidValue {
        section: String,
        option: String,
        value: String,
        reason: String,
    },

    /// Settings validation failed
    #[error("Settings validation failed: {0}")]
    Validation(String),

    /// Both LDAP and Google OAuth2 configured
    #[error("Conflicting authentication: [ldap] and [goauth2] cannot both be configured")]
    ConflictingAuth,

    /// Process-wide settings installed twice
    #[error("Settings have already been initialized")]
    AlreadyInitialized,
}

impl AppError {
    /// Get error kind string
    pub fn error_kind(&self) -> &'static str {
        match self {
            AppError::Load(_) => "load_error",
            AppError::MissingOption { .. } => "missing_option",
            AppError::InvalidBool { .. }
            | AppError::InvalidInt { .. }
            | AppError::InvalidValue { .. } => "invalid_value",
            AppError::Validation(_) => "validation_error",
            AppError::ConflictingAuth => "conflicting_auth",
            AppError::AlreadyInitialized => "already_initialized",
        }
    }

    /// Section and option the error refers to, if any
    pub fn location(&self) -> Option<(&str, &str)> {
        match self {
            AppError::MissingOption { section, option }
            | AppError::InvalidBool { section, option, .. }
            | AppError::InvalidInt { section, option, .. }
            | AppError::InvalidValue { section, option, .. } => {
                Some((section.as_str(), option.as_str()))
            }
            _ => None,
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error construction helpers
pub mod helpers {
    use super::*;

    /// Create missing option error
    pub fn missing_option(section: &str, option: &str) -> AppError {
        AppError::MissingOption {
            section: section.to_string(),
            option: option.to_string(),
        }
    }

    /// Create invalid value error
    pub fn invalid_value(
        section: &str,
        option: &str,
        value: &str,
        reason: impl Into<String>,
    ) -> AppError {
        AppError::InvalidValue {
            section: section.to_string(),
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create validation error
    pub fn validation_error(message: impl Into<String>) -> AppError {
        AppError::Validation(message.into())
    }
}
