//! Framework wiring
//!
//! Fixed lists the hosting framework consumes: installed apps, the
//! middleware chain, template and static file configuration, i18n and
//! session options

use serde::Serialize;

/// Apps provided by the surrounding ecosystem
pub const EXTERNAL_APPS: &[&str] = &[
    "django.contrib.auth",
    "django.contrib.sessions",
    "django.contrib.contenttypes",
    "django.contrib.messages",
    "django.contrib.staticfiles",
    "django.contrib.admin",
    "django.contrib.admindocs",
    "user_sessions",
    "django_otp",
    "django_otp.plugins.otp_static",
    "django_otp.plugins.otp_totp",
    "two_factor",
    "south",
    "tastypie",
    "kombu.transport.django",
    "djcelery",
    "database_files",
    "social_auth",
];

/// RatticWeb's own apps
pub const LOCAL_APPS: &[&str] = &["ratticweb", "cred", "account", "staff", "help"];

/// App added when the test suite is enabled
pub const TEST_APP: &str = "django_nose";

/// Middleware chain, outermost first
pub const MIDDLEWARE: &[&str] = &[
    "user_sessions.middleware.SessionMiddleware",
    "django.middleware.locale.LocaleMiddleware",
    "django.middleware.common.CommonMiddleware",
    "django.middleware.csrf.CsrfViewMiddleware",
    "django.contrib.auth.middleware.AuthenticationMiddleware",
    "django_otp.middleware.OTPMiddleware",
    "account.middleware.StrictAuthentication",
    "account.middleware.PasswordExpirer",
    "ratticweb.middleware.DisableClientSideCachingMiddleware",
    "ratticweb.middleware.XUACompatibleMiddleware",
    "ratticweb.middleware.CSPMiddleware",
    "ratticweb.middleware.HSTSMiddleware",
    "ratticweb.middleware.DisableContentTypeSniffing",
    "django.contrib.messages.middleware.MessageMiddleware",
    "django.middleware.clickjacking.XFrameOptionsMiddleware",
];

pub const TEMPLATE_CONTEXT_PROCESSORS: &[&str] = &[
    "django.contrib.auth.context_processors.auth",
    "django.core.context_processors.debug",
    "django.core.context_processors.i18n",
    "django.core.context_processors.media",
    "django.core.context_processors.static",
    "django.core.context_processors.tz",
    "django.contrib.messages.context_processors.messages",
    "ratticweb.context_processors.base_template_reqs",
    "ratticweb.context_processors.logo_selector",
];

pub const TEMPLATE_LOADERS: &[&str] = &[
    "django.template.loaders.filesystem.Loader",
    "django.template.loaders.app_directories.Loader",
];

pub const STATICFILES_FINDERS: &[&str] = &[
    "django.contrib.staticfiles.finders.FileSystemFinder",
    "django.contrib.staticfiles.finders.AppDirectoriesFinder",
];

/// Supported UI languages as (code, name)
pub const LANGUAGES: &[(&str, &str)] = &[("en", "English"), ("fr", "French"), ("de", "German")];

pub const LOCALE_PATHS: &[&str] = &["conf/locale"];

/// Environment flags that affect the framework wiring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeEnv {
    /// `ENABLE_TESTS=1`
    pub enable_tests: bool,
}

impl RuntimeEnv {
    /// Read flags from the process environment
    pub fn from_env() -> Self {
        Self {
            enable_tests: std::env::var("ENABLE_TESTS")
                .map(|v| v == "1")
                .unwrap_or(false),
        }
    }
}

/// Internationalization options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct I18nSettings {
    pub use_i18n: bool,
    pub use_l10n: bool,
    pub use_tz: bool,
    pub languages: Vec<(String, String)>,
    pub locale_paths: Vec<String>,
}

/// Template engine options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSettings {
    pub context_processors: Vec<String>,
    pub loaders: Vec<String>,
    pub dirs: Vec<String>,
}

/// Session storage options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSettings {
    pub engine: String,
    pub expire_at_browser_close: bool,
}

/// Credential icon asset locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconSettings {
    pub json: String,
    pub css: String,
    pub sprite: String,
    pub basedir: String,
    pub clear: String,
    pub default: String,
}

/// Framework-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkSettings {
    pub installed_apps: Vec<String>,
    pub middleware: Vec<String>,
    pub staticfiles_finders: Vec<String>,
    pub staticfiles_dirs: Vec<String>,
    pub templates: TemplateSettings,
    pub i18n: I18nSettings,
    pub sessions: SessionSettings,
    pub icons: IconSettings,
    pub root_urlconf: String,
    pub wsgi_application: String,
    pub test_runner: String,
    pub admins: Vec<(String, String)>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl FrameworkSettings {
    /// Build the fixed framework wiring
    pub fn new(env: &RuntimeEnv) -> Self {
        let mut installed_apps = owned(EXTERNAL_APPS);
        installed_apps.extend(owned(LOCAL_APPS));
        if env.enable_tests {
            installed_apps.push(TEST_APP.to_string());
        }

        Self {
            installed_apps,
            middleware: owned(MIDDLEWARE),
            staticfiles_finders: owned(STATICFILES_FINDERS),
            staticfiles_dirs: Vec::new(),
            templates: TemplateSettings {
                context_processors: owned(TEMPLATE_CONTEXT_PROCESSORS),
                loaders: owned(TEMPLATE_LOADERS),
                dirs: Vec::new(),
            },
            i18n: I18nSettings {
                use_i18n: true,
                use_l10n: true,
                use_tz: true,
                languages: LANGUAGES
                    .iter()
                    .map(|(code, name)| (code.to_string(), name.to_string()))
                    .collect(),
                locale_paths: owned(LOCALE_PATHS),
            },
            sessions: SessionSettings {
                engine: "user_sessions.backends.db".to_string(),
                expire_at_browser_close: true,
            },
            icons: IconSettings {
                json: "db/icons.json".to_string(),
                css: "ratticweb/static/rattic/css/icons.css".to_string(),
                sprite: "rattic/img/sprite.png".to_string(),
                basedir: "rattic/img/credicons".to_string(),
                clear: "rattic/img/clear.gif".to_string(),
                default: "Key.png".to_string(),
            },
            root_urlconf: "ratticweb.urls".to_string(),
            wsgi_application: "ratticweb.wsgi.application".to_string(),
            test_runner: "tests.runner.ExcludeAppsTestSuiteRunner".to_string(),
            admins: Vec::new(),
        }
    }

    /// Whether an app is installed
    pub fn has_app(&self, app: &str) -> bool {
        self.installed_apps.iter().any(|a| a == app)
    }
}
