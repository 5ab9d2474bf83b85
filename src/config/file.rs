//! File-based configuration loading
//!
//! Merges INI files into a single section -> option -> value store. The
//! defaults file is required; override files are read when present and later
//! files win for matching keys.

use ::config::{Config, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use super::raw_ini::RawIni;
use crate::utils::error::{helpers, AppError, AppResult};

/// Default location of the shipped defaults
pub const DEFAULTS_PATH: &str = "conf/defaults.cfg";

/// Default override locations, in load order
pub const OVERRIDE_PATHS: [&str; 2] = ["conf/local.cfg", "/etc/ratticweb.cfg"];

/// Where configuration is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfSources {
    /// Required defaults file
    pub defaults: PathBuf,
    /// Optional overrides, later entries take precedence
    pub overrides: Vec<PathBuf>,
}

impl Default for ConfSources {
    fn default() -> Self {
        Self {
            defaults: PathBuf::from(DEFAULTS_PATH),
            overrides: OVERRIDE_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl ConfSources {
    /// Sources from `RATTICWEB_DEFAULTS` and `RATTICWEB_CONFIG` (colon separated),
    /// falling back to the standard locations
    pub fn from_env() -> Self {
        let mut sources = Self::default();
        if let Ok(defaults) = std::env::var("RATTICWEB_DEFAULTS") {
            sources.defaults = PathBuf::from(defaults);
        }
        if let Ok(overrides) = std::env::var("RATTICWEB_CONFIG") {
            sources.overrides = overrides
                .split(':')
                .filter(|s| !s.trim().is_empty())
                .map(|s| PathBuf::from(s.trim()))
                .collect();
        }
        sources
    }
}

type Section = BTreeMap<String, String>;

/// Merged layers as produced by [`RawIni`]
#[derive(Debug, Deserialize)]
struct MergedLayers {
    #[serde(default)]
    sections: BTreeMap<String, Section>,
}

/// Merged key/value store read from INI files
#[derive(Debug, Clone, Default)]
pub struct ConfStore {
    sections: BTreeMap<String, Section>,
    configured_by: Vec<PathBuf>,
}

impl ConfStore {
    /// Load the defaults file and every override file that exists
    pub fn load(sources: &ConfSources) -> AppResult<Self> {
        info!("Loading defaults from: {:?}", sources.defaults);

        let mut builder = Config::builder()
            .add_source(File::new(&sources.defaults.to_string_lossy(), RawIni).required(true));

        let mut configured_by = Vec::new();
        for path in &sources.overrides {
            if path.is_file() {
                configured_by.push(path.clone());
            } else {
                debug!("Override file not present: {:?}", path);
            }
            let layer = File::new(&path.to_string_lossy(), RawIni).required(false);
            builder = builder.add_source(layer);
        }

        let store = Self::from_config(builder.build()?, configured_by)?;
        info!("Configured by: {:?}", store.configured_by);
        Ok(store)
    }

    /// Build a store from in-memory INI layers, later layers winning
    pub fn from_ini_layers(layers: &[&str]) -> AppResult<Self> {
        let builder = layers.iter().fold(Config::builder(), |builder, layer| {
            builder.add_source(File::from_str(layer, RawIni))
        });
        Self::from_config(builder.build()?, Vec::new())
    }

    fn from_config(config: Config, configured_by: Vec<PathBuf>) -> AppResult<Self> {
        let merged: MergedLayers = config.try_deserialize()?;

        let sections = merged
            .sections
            .into_iter()
            .map(|(name, options)| {
                let options = options
                    .into_iter()
                    .map(|(key, value)| (key.to_lowercase(), value))
                    .collect();
                (name.to_lowercase(), options)
            })
            .collect();

        Ok(Self {
            sections,
            configured_by,
        })
    }

    /// Override files that were actually read
    pub fn configured_by(&self) -> &[PathBuf] {
        &self.configured_by
    }

    /// Names of all sections
    pub fn sections(&self) -> Vec<&str> {
        self.sections.keys().map(String::as_str).collect()
    }

    /// Whether a section exists
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(&section.to_lowercase())
    }

    /// Whether an option exists in a section
    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.lookup(section, option).is_some()
    }

    fn lookup(&self, section: &str, option: &str) -> Option<&str> {
        self.sections
            .get(&section.to_lowercase())?
            .get(&option.to_lowercase())
            .map(String::as_str)
    }

    /// Optional lookup; a missing section counts as a missing option
    pub fn get_opt(&self, section: &str, option: &str) -> Option<String> {
        self.lookup(section, option).map(str::to_string)
    }

    /// Required string lookup
    pub fn get(&self, section: &str, option: &str) -> AppResult<String> {
        self.get_opt(section, option)
            .ok_or_else(|| helpers::missing_option(section, option))
    }

    /// String lookup falling back to `default`
    pub fn get_or(&self, section: &str, option: &str, default: &str) -> String {
        self.get_opt(section, option).unwrap_or_else(|| {
            debug!("[{}] {} not set, using default {:?}", section, option, default);
            default.to_string()
        })
    }

    /// Required boolean lookup
    pub fn get_bool(&self, section: &str, option: &str) -> AppResult<bool> {
        let value = self.get(section, option)?;
        parse_bool(&value).ok_or_else(|| AppError::InvalidBool {
            section: section.to_string(),
            option: option.to_string(),
            value,
        })
    }

    /// Boolean lookup falling back to `default`; present but malformed text is an error
    pub fn get_bool_or(&self, section: &str, option: &str, default: bool) -> AppResult<bool> {
        if self.has_option(section, option) {
            self.get_bool(section, option)
        } else {
            Ok(default)
        }
    }

    /// Required integer lookup
    pub fn get_int<T: FromStr>(&self, section: &str, option: &str) -> AppResult<T> {
        let value = self.get(section, option)?;
        value.trim().parse().map_err(|_| AppError::InvalidInt {
            section: section.to_string(),
            option: option.to_string(),
            value,
        })
    }
}

/// Parse the INI boolean tokens, case-insensitively
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
