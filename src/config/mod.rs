//! Configuration system (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::store::default_soko_dir;
use crate::error::SokoError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Client configuration.
///
/// Resolution order for every field:
/// 1. Values set in code (`with_*`)
/// 2. `SOKO_*` environment variables (a `.env` file is honoured)
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq)]
pub struct SokoConfig {
    pub base_url: String,
    pub credentials_dir: PathBuf,
    pub profile: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub cache_capacity: usize,
}

impl Default for SokoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials_dir: default_soko_dir(),
            profile: "default".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl SokoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `SOKO_*` environment variables, after reading a `.env`
    /// file when one exists.
    pub fn from_env() -> Result<Self, SokoError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SokoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("SOKO_API_BASE_URL") {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(dir) = get("SOKO_CREDENTIALS_DIR") {
            config.credentials_dir = PathBuf::from(dir);
        }
        if let Some(profile) = get("SOKO_PROFILE") {
            config.profile = profile;
        }
        if let Some(raw) = get("SOKO_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_number("SOKO_REQUEST_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = get("SOKO_POLL_INTERVAL_SECS") {
            config.poll_interval = Duration::from_secs(parse_number("SOKO_POLL_INTERVAL_SECS", &raw)?);
        }
        if let Some(raw) = get("SOKO_CACHE_CAPACITY") {
            config.cache_capacity = parse_number("SOKO_CACHE_CAPACITY", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_credentials_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.credentials_dir = dir.into();
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Reject values the client cannot run with.
    pub fn validate(&self) -> Result<(), SokoError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SokoError::Configuration(format!(
                "base url must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(SokoError::Configuration(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(SokoError::Configuration(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, SokoError> {
    raw.trim()
        .parse()
        .map_err(|_| SokoError::Configuration(format!("{key} must be a non-negative integer, got {raw:?}")))
}
