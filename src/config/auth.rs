//! Authentication backend selection
//!
//! The presence of the `[ldap]` or `[goauth2]` section picks the mode. Without
//! either, users authenticate against the local database only.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::file::ConfStore;
use super::logging::LogLevel;
use crate::utils::error::{helpers, AppError, AppResult};

/// Group mirroring is requested globally; LDAP without a group search turns it off
pub const MIRROR_GROUPS_DEFAULT: bool = true;

/// Scopes requested from Google
pub const GOOGLE_OAUTH2_SCOPE: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// Pluggable identity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthBackend {
    Ldap,
    GoogleOAuth2,
    Model,
}

impl AuthBackend {
    /// Name the hosting framework loads the backend by
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthBackend::Ldap => "django_auth_ldap.backend.LDAPBackend",
            AuthBackend::GoogleOAuth2 => "social_auth.backends.google.GoogleOAuth2Backend",
            AuthBackend::Model => "django.contrib.auth.backends.ModelBackend",
        }
    }
}

impl Serialize for AuthBackend {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// LDAP search scope; user and group lookups search the whole subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    Subtree,
}

/// A directory search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LdapSearch {
    pub base_dn: String,
    pub scope: SearchScope,
    pub filter: String,
}

impl LdapSearch {
    fn subtree(base_dn: String, filter: String) -> Self {
        Self {
            base_dn,
            scope: SearchScope::Subtree,
            filter,
        }
    }
}

/// How group membership is read from the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LdapGroupType {
    PosixGroupType,
    NestedGroupOfNamesType,
    GroupOfNamesType,
    NestedGroupOfUniqueNamesType,
    GroupOfUniqueNamesType,
    ActiveDirectoryGroupType,
    NestedActiveDirectoryGroupType,
    OrganizationalRoleGroupType,
    NestedOrganizationalRoleGroupType,
}

impl LdapGroupType {
    const ALL: [LdapGroupType; 9] = [
        LdapGroupType::PosixGroupType,
        LdapGroupType::NestedGroupOfNamesType,
        LdapGroupType::GroupOfNamesType,
        LdapGroupType::NestedGroupOfUniqueNamesType,
        LdapGroupType::GroupOfUniqueNamesType,
        LdapGroupType::ActiveDirectoryGroupType,
        LdapGroupType::NestedActiveDirectoryGroupType,
        LdapGroupType::OrganizationalRoleGroupType,
        LdapGroupType::NestedOrganizationalRoleGroupType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LdapGroupType::PosixGroupType => "PosixGroupType",
            LdapGroupType::NestedGroupOfNamesType => "NestedGroupOfNamesType",
            LdapGroupType::GroupOfNamesType => "GroupOfNamesType",
            LdapGroupType::NestedGroupOfUniqueNamesType => "NestedGroupOfUniqueNamesType",
            LdapGroupType::GroupOfUniqueNamesType => "GroupOfUniqueNamesType",
            LdapGroupType::ActiveDirectoryGroupType => "ActiveDirectoryGroupType",
            LdapGroupType::NestedActiveDirectoryGroupType => "NestedActiveDirectoryGroupType",
            LdapGroupType::OrganizationalRoleGroupType => "OrganizationalRoleGroupType",
            LdapGroupType::NestedOrganizationalRoleGroupType => {
                "NestedOrganizationalRoleGroupType"
            }
        }
    }
}

impl fmt::Display for LdapGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LdapGroupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| format!("unknown LDAP group type '{}'", name))
    }
}

/// Group lookup used for mirroring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LdapGroupSearch {
    pub search: LdapSearch,
    pub group_type: LdapGroupType,
}

/// Connection options applied globally to the LDAP client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LdapGlobalOptions {
    pub require_cert: bool,
    pub referrals: bool,
}

/// `[ldap]` settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LdapSettings {
    pub log_level: LogLevel,
    pub server_uri: String,
    pub bind_dn: String,
    #[serde(serialize_with = "redact")]
    pub bind_password: String,
    pub user_search: LdapSearch,
    pub user_attr_map: BTreeMap<String, String>,
    /// User flag -> group DN
    pub user_flags_by_group: BTreeMap<String, String>,
    pub group_search: Option<LdapGroupSearch>,
    pub mirror_groups: bool,
    pub allow_password_change: bool,
    pub start_tls: bool,
    pub global_options: LdapGlobalOptions,
}

impl LdapSettings {
    /// Read `[ldap]`
    pub fn from_store(store: &ConfStore) -> AppResult<Self> {
        let raw_level = store.get_or("ldap", "loglevel", "WARNING");
        let log_level = raw_level
            .parse()
            .map_err(|e: super::logging::UnknownLogLevel| {
                helpers::invalid_value("ldap", "loglevel", &raw_level, e.to_string())
            })?;

        let mut user_flags_by_group = BTreeMap::new();
        if let Some(staff) = store.get_opt("ldap", "staff") {
            user_flags_by_group.insert("is_staff".to_string(), staff);
        }

        let mut user_attr_map = BTreeMap::new();
        user_attr_map.insert("email".to_string(), "mail".to_string());

        let user_search = LdapSearch::subtree(
            store.get("ldap", "userbase")?,
            store.get("ldap", "userfilter")?,
        );

        let group_search = if store.has_option("ldap", "groupfilter") {
            let raw_type = store.get("ldap", "grouptype")?;
            let group_type = raw_type
                .parse()
                .map_err(|reason: String| {
                    helpers::invalid_value("ldap", "grouptype", &raw_type, reason)
                })?;
            Some(LdapGroupSearch {
                search: LdapSearch::subtree(
                    store.get("ldap", "groupbase")?,
                    store.get("ldap", "groupfilter")?,
                ),
                group_type,
            })
        } else {
            warn!("[ldap] has no groupfilter, group mirroring disabled");
            None
        };
        let mirror_groups = MIRROR_GROUPS_DEFAULT && group_search.is_some();

        Ok(Self {
            log_level,
            server_uri: store.get("ldap", "uri")?,
            bind_dn: store.get_or("ldap", "binddn", ""),
            bind_password: store.get_or("ldap", "bindpw", ""),
            user_search,
            user_attr_map,
            user_flags_by_group,
            group_search,
            mirror_groups,
            allow_password_change: store.get_bool_or("ldap", "pwchange", false)?,
            start_tls: store.get_bool_or("ldap", "starttls", false)?,
            global_options: LdapGlobalOptions {
                require_cert: store.get_bool_or("ldap", "requirecert", true)?,
                referrals: store.get_bool_or("ldap", "referrals", false)?,
            },
        })
    }
}

/// `[goauth2]` settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleOAuth2Settings {
    pub client_id: String,
    #[serde(serialize_with = "redact")]
    pub client_secret: String,
    pub white_listed_domains: Vec<String>,
    pub redirect_is_https: bool,
    pub raise_exceptions: bool,
    pub process_exceptions: String,
    pub username_is_full_email: bool,
    pub complete_url_name: String,
    pub associate_url_name: String,
    pub ignore_default_scope: bool,
    pub scope: Vec<String>,
    pub session_serializer: String,
}

impl GoogleOAuth2Settings {
    /// Read `[goauth2]`
    pub fn from_store(store: &ConfStore) -> AppResult<Self> {
        Ok(Self {
            client_id: store.get("goauth2", "client_id")?,
            client_secret: store.get("goauth2", "client_secret")?,
            white_listed_domains: vec![store.get("goauth2", "domain")?],
            redirect_is_https: store.get_bool_or("goauth2", "https_redirect", false)?,
            raise_exceptions: false,
            process_exceptions: "social_auth.utils.log_exceptions_to_messages".to_string(),
            username_is_full_email: true,
            complete_url_name: "socialauth_complete".to_string(),
            associate_url_name: "socialauth_associate_complete".to_string(),
            ignore_default_scope: true,
            scope: GOOGLE_OAUTH2_SCOPE.iter().map(|s| s.to_string()).collect(),
            session_serializer: "django.contrib.sessions.serializers.PickleSerializer".to_string(),
        })
    }
}

/// Selected authentication mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthMode {
    Local,
    Ldap(LdapSettings),
    #[serde(rename = "google_oauth2")]
    GoogleOAuth2(GoogleOAuth2Settings),
}

/// Authentication settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSettings {
    /// Backends tried in order
    pub backends: Vec<AuthBackend>,
    pub mode: AuthMode,
}

impl AuthSettings {
    /// Pick the mode from the configured sections
    ///
    /// Both `[ldap]` and `[goauth2]` present is rejected.
    pub fn from_store(store: &ConfStore) -> AppResult<Self> {
        let ldap = store.has_section("ldap");
        let goauth2 = store.has_section("goauth2");

        let (backends, mode) = match (ldap, goauth2) {
            (true, true) => return Err(AppError::ConflictingAuth),
            (true, false) => (
                vec![AuthBackend::Ldap, AuthBackend::Model],
                AuthMode::Ldap(LdapSettings::from_store(store)?),
            ),
            (false, true) => (
                vec![AuthBackend::GoogleOAuth2, AuthBackend::Model],
                AuthMode::GoogleOAuth2(GoogleOAuth2Settings::from_store(store)?),
            ),
            (false, false) => (vec![AuthBackend::Model], AuthMode::Local),
        };

        info!(
            "Authentication backends: {:?}",
            backends.iter().map(AuthBackend::as_str).collect::<Vec<_>>()
        );
        Ok(Self { backends, mode })
    }

    pub fn ldap(&self) -> Option<&LdapSettings> {
        match &self.mode {
            AuthMode::Ldap(ldap) => Some(ldap),
            _ => None,
        }
    }

    pub fn google_oauth2(&self) -> Option<&GoogleOAuth2Settings> {
        match &self.mode {
            AuthMode::GoogleOAuth2(google) => Some(google),
            _ => None,
        }
    }

    pub fn google_oauth2_enabled(&self) -> bool {
        self.google_oauth2().is_some()
    }
}

/// Serialize a secret as a fixed marker
pub(crate) fn redact<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_empty() {
        serializer.serialize_str("")
    } else {
        serializer.serialize_str("********")
    }
}
