//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORAGE_DIR: &str = ".academy";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend endpoint every action is sent to.
    pub base_url: String,
    /// Shared credential injected into each request.
    pub api_key: String,
    /// Directory holding the persisted session.
    pub storage_dir: PathBuf,
    /// Overall request timeout. `None` keeps the HTTP client default.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            timeout: None,
        }
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `ACADEMY_BASE_URL`
    /// - `ACADEMY_API_KEY`
    ///
    /// Optional:
    /// - `ACADEMY_STORAGE_DIR`: default `.academy`
    /// - `ACADEMY_TIMEOUT_SECS`: unset means no explicit timeout
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reads values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or a value fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let base_url = get("ACADEMY_BASE_URL").ok_or(ConfigError::Missing("ACADEMY_BASE_URL"))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid { var: "ACADEMY_BASE_URL", value: base_url });
        }
        let api_key = get("ACADEMY_API_KEY").ok_or(ConfigError::Missing("ACADEMY_API_KEY"))?;
        let storage_dir = get("ACADEMY_STORAGE_DIR").map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);
        let timeout = match get("ACADEMY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid { var: "ACADEMY_TIMEOUT_SECS", value: raw.clone() })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self { base_url, api_key, storage_dir, timeout })
    }
}
