//! Application configuration.
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! - `CADASTRO_API_URL`: REST API base URL
//! - `CADASTRO_PAGE_LIMIT`: rows per list page (default 10)
//! - `CADASTRO_TOKEN`: bearer token sent with every request
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:3333"
//! page_limit = 20
//!
//! [log]
//! level = "debug"
//! json = false
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Default rows per list page.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Default REST API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// REST API settings.
    pub api: ApiConfig,
    /// Logging settings.
    pub log: LogConfig,
}

/// REST API settings.
///
/// Custom `Debug` implementation redacts the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every resource path is joined to.
    pub base_url: String,
    /// Rows requested per list page.
    pub page_limit: u32,
    /// Bearer token, if already logged in.
    pub token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            token: None,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("page_limit", &self.page_limit)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ApiConfig {
    /// Parses the base URL.
    ///
    /// # Errors
    /// Returns [`ConfigError::Url`] if the URL is malformed.
    pub fn url(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(&self.base_url)?)
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] if parsing fails.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if reading or parsing fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Builds configuration from defaults and the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if an override is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Loads `path` if given (defaults otherwise), then applies the
    /// environment overrides.
    ///
    /// # Errors
    /// Returns `ConfigError` if reading, parsing or an override fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for a malformed page limit and
    /// [`ConfigError::Url`] for a malformed URL.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("CADASTRO_API_URL") {
            self.api.base_url = url;
        }
        if let Some(limit) = lookup("CADASTRO_PAGE_LIMIT") {
            self.api.page_limit = limit
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "CADASTRO_PAGE_LIMIT",
                    value: limit,
                })?;
        }
        if let Some(token) = lookup("CADASTRO_TOKEN").filter(|t| !t.is_empty()) {
            self.api.token = Some(token);
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.api.url()?;
        if self.api.page_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.page_limit",
                value: "0".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.api.page_limit, 10);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml("[api]\npage_limit = 25\n").unwrap();
        assert_eq!(config.api.page_limit, 25);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert!(!config.log.json);
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("CADASTRO_API_URL", "https://api.example.com/v1/"),
            ("CADASTRO_PAGE_LIMIT", "50"),
            ("CADASTRO_TOKEN", "abc"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/v1/");
        assert_eq!(config.api.page_limit, 50);
        assert_eq!(config.api.token.as_deref(), Some("abc"));
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "CADASTRO_PAGE_LIMIT").then(|| "zero".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "CADASTRO_API_URL").then(|| "not a url".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Url(_)));
    }

    #[test]
    fn debug_redacts_token() {
        let mut config = Config::default();
        config.api.token = Some("secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("REDACTED"));
    }
}
