//! Application configuration settings
//!
//! Defines the settings structures and the single construction step that
//! turns a merged `ConfStore` into a validated, immutable `Settings`

use chrono::Duration;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use super::auth::{redact, AuthSettings};
use super::file::{ConfSources, ConfStore};
use super::framework::{FrameworkSettings, RuntimeEnv};
use super::logging::{LogLevel, LoggingSettings, UnknownLogLevel};
use super::scheduler::SchedulerSettings;
use crate::utils::error::{helpers, AppError, AppResult};
use crate::utils::url::urljoin;

/// Project wiki
pub const PUBLIC_HELP_WIKI_BASE: &str = "https://github.com/tildaslash/RatticWeb/wiki/";

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// `[ratticweb]` core options
    pub core: CoreSettings,
    /// URL layout
    pub urls: UrlSettings,
    /// `[filepaths]`
    pub files: FilePaths,
    /// `[database]`
    pub database: DatabaseSettings,
    /// `[backup]`
    pub backup: BackupSettings,
    /// `[email]`
    pub email: EmailSettings,
    /// Task queue and periodic schedule
    pub scheduler: SchedulerSettings,
    /// Authentication mode and backends
    pub auth: AuthSettings,
    /// Password rotation policy
    pub password_expiry: PasswordExpiry,
    /// Logging table
    pub logging: LoggingSettings,
    /// Fixed framework wiring
    pub framework: FrameworkSettings,
    /// Override files that were read
    pub configured_by: Vec<PathBuf>,
}

/// Core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreSettings {
    pub debug: bool,
    pub template_debug: bool,
    pub time_zone: String,
    #[serde(serialize_with = "redact")]
    pub secret_key: String,
    pub hostname: String,
    pub allowed_hosts: Vec<String>,
    /// Maximum attachment size in bytes
    pub max_attachment_size: u64,
    pub disable_export: bool,
    /// Header set by a TLS-terminating proxy, and the value meaning "secure"
    pub secure_proxy_ssl_header: Option<(String, String)>,
}

impl CoreSettings {
    fn from_store(store: &ConfStore) -> AppResult<Self> {
        let debug = store.get_bool_or("ratticweb", "debug", false)?;
        let hostname = store.get("ratticweb", "hostname")?;

        let secure_proxy_ssl_header = match store.get_opt("ratticweb", "ssl_header") {
            Some(header) if !header.is_empty() => {
                Some((header, store.get("ratticweb", "ssl_header_value")?))
            }
            _ => None,
        };

        Ok(Self {
            debug,
            template_debug: debug,
            time_zone: store.get("ratticweb", "timezone")?,
            secret_key: store.get("ratticweb", "secretkey")?,
            allowed_hosts: vec![hostname.clone(), "localhost".to_string()],
            hostname,
            max_attachment_size: store.get_int("ratticweb", "max_attachment_size")?,
            disable_export: store.get_bool("ratticweb", "disable_export")?,
            secure_proxy_ssl_header,
        })
    }
}

/// URL layout derived from the URL root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlSettings {
    pub root: String,
    pub media: String,
    #[serde(rename = "static")]
    pub static_url: String,
    pub login: String,
    pub login_redirect: String,
    pub login_error: Option<String>,
    pub public_help_wiki_base: String,
}

impl UrlSettings {
    /// Resolve every URL against `root`; Google OAuth2 moves the login pages
    pub fn new(root: &str, google_oauth2: bool) -> AppResult<Self> {
        let join = |reference: &str| {
            urljoin(root, reference)
                .map_err(|e| helpers::invalid_value("ratticweb", "urlroot", root, e.to_string()))
        };

        let (login, login_redirect, login_error) = if google_oauth2 {
            (
                join("account/login/google-oauth2/")?,
                join("account/autocreateusergroup")?,
                Some(join("account/login-error/")?),
            )
        } else {
            (root.to_string(), join("cred/list/")?, None)
        };

        Ok(Self {
            root: root.to_string(),
            media: join("media/")?,
            static_url: join("static/")?,
            login,
            login_redirect,
            login_error,
            public_help_wiki_base: PUBLIC_HELP_WIKI_BASE.to_string(),
        })
    }
}

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePaths {
    /// Local help pages; `None` uses the public wiki
    pub help: Option<PathBuf>,
    pub media_root: String,
    pub static_root: String,
}

impl FilePaths {
    fn from_store(store: &ConfStore) -> Self {
        Self {
            help: store
                .get_opt("filepaths", "help")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            media_root: store.get_or("filepaths", "media", ""),
            static_root: store.get_or("filepaths", "static", ""),
        }
    }
}

/// Default database connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSettings {
    pub engine: String,
    pub name: String,
    pub user: String,
    #[serde(serialize_with = "redact")]
    pub password: String,
    pub host: String,
    pub port: String,
}

impl DatabaseSettings {
    fn from_store(store: &ConfStore) -> Self {
        Self {
            engine: store.get_or("database", "engine", "django.db.backends.sqlite3"),
            name: store.get_or("database", "name", "db/ratticweb"),
            user: store.get_or("database", "user", ""),
            password: store.get_or("database", "password", ""),
            host: store.get_or("database", "host", ""),
            port: store.get_or("database", "port", ""),
        }
    }
}

/// Database backup options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupSettings {
    pub dir: Option<String>,
    pub gpg_home: Option<String>,
    pub s3_bucket: Option<String>,
    pub recipients: Option<String>,
}

impl BackupSettings {
    fn from_store(store: &ConfStore) -> Self {
        Self {
            dir: store.get_opt("backup", "dir"),
            gpg_home: store.get_opt("backup", "gpg_home"),
            s3_bucket: store.get_opt("backup", "s3_bucket"),
            recipients: store.get_opt("backup", "recipients"),
        }
    }
}

/// Outgoing mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailSettings {
    pub backend: String,
    pub file_path: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(serialize_with = "redact")]
    pub password: String,
    pub use_tls: bool,
    pub from_email: String,
}

impl EmailSettings {
    fn from_store(store: &ConfStore) -> AppResult<Self> {
        Ok(Self {
            backend: store.get("email", "backend")?,
            file_path: store.get("email", "filepath")?,
            host: store.get("email", "host")?,
            port: store.get_int("email", "port")?,
            user: store.get("email", "user")?,
            password: store.get("email", "password")?,
            use_tls: store.get_bool_or("email", "usetls", false)?,
            from_email: store.get("email", "from_email")?,
        })
    }
}

/// Forced password rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordExpiry {
    Disabled,
    Days(u32),
}

impl PasswordExpiry {
    /// Read `passwordexpirydays`; Google OAuth2 always disables expiry
    ///
    /// Missing, unparsable or non-positive values disable expiry.
    pub fn from_store(store: &ConfStore, google_oauth2: bool) -> Self {
        if google_oauth2 {
            return PasswordExpiry::Disabled;
        }

        let Some(raw) = store.get_opt("ratticweb", "passwordexpirydays") else {
            return PasswordExpiry::Disabled;
        };

        match raw.trim().parse::<i64>() {
            Ok(days) if days > 0 => {
                PasswordExpiry::Days(u32::try_from(days).unwrap_or(u32::MAX))
            }
            Ok(_) => PasswordExpiry::Disabled,
            Err(_) => {
                warn!("Ignoring unparsable passwordexpirydays: {:?}", raw);
                PasswordExpiry::Disabled
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, PasswordExpiry::Days(_))
    }

    /// Time after which a password must be changed
    pub fn duration(&self) -> Option<Duration> {
        match self {
            PasswordExpiry::Disabled => None,
            PasswordExpiry::Days(days) => Some(Duration::days(i64::from(*days))),
        }
    }
}

impl Settings {
    /// Load from the standard locations, honouring `RATTICWEB_DEFAULTS` and `RATTICWEB_CONFIG`
    pub fn load_default() -> AppResult<Self> {
        Self::load(&ConfSources::from_env())
    }

    /// Load configuration files and build settings
    pub fn load(sources: &ConfSources) -> AppResult<Self> {
        let store = ConfStore::load(sources)?;
        Self::from_store(&store, &RuntimeEnv::from_env())
    }

    /// Build and validate settings from a merged store
    pub fn from_store(store: &ConfStore, env: &RuntimeEnv) -> AppResult<Self> {
        let core = CoreSettings::from_store(store)?;

        let raw_level = store.get("ratticweb", "loglevel")?;
        let request_level: LogLevel = raw_level.parse().map_err(|e: UnknownLogLevel| {
            helpers::invalid_value("ratticweb", "loglevel", &raw_level, e.to_string())
        })?;

        let root = store.get("ratticweb", "urlroot")?;
        let files = FilePaths::from_store(store);
        let database = DatabaseSettings::from_store(store);
        let backup = BackupSettings::from_store(store);
        let email = EmailSettings::from_store(store)?;
        let scheduler = SchedulerSettings::from_store(store, &core.time_zone)?;

        let auth = AuthSettings::from_store(store)?;
        let google_oauth2 = auth.google_oauth2_enabled();
        let urls = UrlSettings::new(&root, google_oauth2)?;
        let logging = LoggingSettings::new(request_level, auth.ldap().map(|ldap| ldap.log_level));
        let password_expiry = PasswordExpiry::from_store(store, google_oauth2);

        let settings = Self {
            core,
            urls,
            files,
            database,
            backup,
            email,
            scheduler,
            auth,
            password_expiry,
            logging,
            framework: FrameworkSettings::new(env),
            configured_by: store.configured_by().to_vec(),
        };

        settings.validate()?;

        info!(
            "Settings built (debug: {}, password expiry: {:?})",
            settings.core.debug, settings.password_expiry
        );
        Ok(settings)
    }

    /// Validate configuration validity
    fn validate(&self) -> AppResult<()> {
        if self.core.secret_key.trim().is_empty() {
            return Err(helpers::validation_error("secretkey cannot be empty"));
        }

        if self.core.hostname.trim().is_empty() {
            return Err(helpers::validation_error("hostname cannot be empty"));
        }

        if self.core.time_zone.trim().is_empty() {
            return Err(helpers::validation_error("timezone cannot be empty"));
        }

        if self.urls.root.trim().is_empty() {
            return Err(helpers::validation_error("urlroot cannot be empty"));
        }

        if let Some((header, value)) = &self.core.secure_proxy_ssl_header {
            if value.is_empty() {
                return Err(helpers::validation_error(format!(
                    "ssl_header_value cannot be empty when ssl_header is {}",
                    header
                )));
            }
        }

        Ok(())
    }

    /// Install as the process-wide settings
    pub fn install(self) -> AppResult<&'static Settings> {
        SETTINGS
            .try_insert(self)
            .map_err(|_| AppError::AlreadyInitialized)
    }

    /// Check if in debug mode
    pub fn is_debug(&self) -> bool {
        self.core.debug
    }
}

/// Process-wide settings, once installed
pub fn settings() -> Option<&'static Settings> {
    SETTINGS.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_expiry_values() {
        let store = |days: &str| {
            let ini = format!("[ratticweb]\npasswordexpirydays = {}\n", days);
            ConfStore::from_ini_layers(&[&ini]).unwrap()
        };

        assert_eq!(PasswordExpiry::from_store(&store("90"), false), PasswordExpiry::Days(90));
        assert_eq!(PasswordExpiry::from_store(&store("0"), false), PasswordExpiry::Disabled);
        assert_eq!(PasswordExpiry::from_store(&store("never"), false), PasswordExpiry::Disabled);
        assert_eq!(PasswordExpiry::from_store(&store("90"), true), PasswordExpiry::Disabled);

        let empty = ConfStore::from_ini_layers(&["[ratticweb]\ndebug = false\n"]).unwrap();
        assert_eq!(PasswordExpiry::from_store(&empty, false), PasswordExpiry::Disabled);
    }

    #[test]
    fn test_password_expiry_duration() {
        assert_eq!(PasswordExpiry::Days(30).duration(), Some(Duration::days(30)));
        assert_eq!(PasswordExpiry::Disabled.duration(), None);
        assert!(!PasswordExpiry::Disabled.is_enabled());
    }

    #[test]
    fn test_url_layout() {
        let urls = UrlSettings::new("/", false).unwrap();
        assert_eq!(urls.media, "/media/");
        assert_eq!(urls.static_url, "/static/");
        assert_eq!(urls.login, "/");
        assert_eq!(urls.login_redirect, "/cred/list/");
        assert_eq!(urls.login_error, None);

        let urls = UrlSettings::new("/rattic/", true).unwrap();
        assert_eq!(urls.login, "/rattic/account/login/google-oauth2/");
        assert_eq!(urls.login_redirect, "/rattic/account/autocreateusergroup");
        assert_eq!(urls.login_error.as_deref(), Some("/rattic/account/login-error/"));
    }
}
