use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod validation;
pub use validation::{
    agent_config_validator, AppNameRule, NonEmptyRule, PatternRule, ValidationError,
    ValidationErrorKind, ValidationResult, ValidationRule, ValidationSeverity, Validator,
    MAX_APP_NAMES,
};

pub const ENV_LICENSE_KEY: &str = "NEWRELIC_LICENSE_KEY";
pub const ENV_APP_NAME: &str = "NEWRELIC_APP_NAME";
pub const ENV_APP_LANGUAGE: &str = "NEWRELIC_APP_LANGUAGE";
pub const ENV_APP_LANGUAGE_VERSION: &str = "NEWRELIC_APP_LANGUAGE_VERSION";
pub const ENV_EMBEDDED_COLLECTOR: &str = "NEWRELIC_EMBEDDED_COLLECTOR";

pub const DEFAULT_LANGUAGE: &str = "Rust";
pub const DEFAULT_LANGUAGE_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
}

/// Settings passed to the agent at initialization.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub license_key: String,
    /// One name, or up to three separated by `;`.
    pub app_name: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_language_version")]
    pub language_version: String,
    /// Report through the in-process collector client instead of a daemon.
    #[serde(default = "default_embedded_collector")]
    pub embedded_collector: bool,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_language_version() -> String {
    DEFAULT_LANGUAGE_VERSION.to_string()
}

fn default_embedded_collector() -> bool {
    true
}

impl AgentConfig {
    pub fn new(license_key: &str, app_name: &str) -> Self {
        AgentConfig {
            license_key: license_key.to_string(),
            app_name: app_name.to_string(),
            language: default_language(),
            language_version: default_language_version(),
            embedded_collector: default_embedded_collector(),
        }
    }

    pub fn with_language(mut self, language: &str, language_version: &str) -> Self {
        self.language = language.to_string();
        self.language_version = language_version.to_string();
        self
    }

    pub fn with_embedded_collector(mut self, embedded_collector: bool) -> Self {
        self.embedded_collector = embedded_collector;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self).map_err(|e| {
            ValidationError::new(
                ValidationErrorKind::RuleFailed(
                    format!("Failed to serialize configuration: {}", e),
                    ValidationSeverity::Critical,
                ),
                "config",
            )
        })?;
        agent_config_validator().validate(&value, "config")
    }

    /// Loads and validates configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AgentConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        log::debug!("loaded agent config for {:?} from {}", config.app_name, path.display());
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the `NEWRELIC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from `lookup`, which maps a variable name to its
    /// value. License key and app name are required; the rest fall back to
    /// defaults. The result is validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingEnv(name));

        let mut config = AgentConfig::new(&required(ENV_LICENSE_KEY)?, &required(ENV_APP_NAME)?);
        if let Some(language) = lookup(ENV_APP_LANGUAGE) {
            config.language = language;
        }
        if let Some(version) = lookup(ENV_APP_LANGUAGE_VERSION) {
            config.language_version = version;
        }
        if let Some(value) = lookup(ENV_EMBEDDED_COLLECTOR) {
            config.embedded_collector = parse_bool(&value).ok_or(ConfigError::InvalidEnv {
                name: ENV_EMBEDDED_COLLECTOR,
                value,
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("license_key", &mask(&self.license_key))
            .field("app_name", &self.app_name)
            .field("language", &self.language)
            .field("language_version", &self.language_version)
            .field("embedded_collector", &self.embedded_collector)
            .finish()
    }
}

// Short values are hidden entirely; the tail would be most of the secret.
fn mask(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(len - 4).collect();
    format!("****{}", tail)
}
