//! # Client Configuration
//!
//! Validated settings for the flag manager: environment token, cache
//! backend and TTL, usage-reporting toggle and API endpoint override.
//!
//! Configuration is built through [`Config::builder`] or read from
//! `FLAGPOLE_*` environment variables with [`Config::from_env`]; both fail
//! fast with [`FlagpoleError::Config`] on an invalid combination.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::FlagpoleError;
use crate::fetch::DEFAULT_API_URL;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Which cache backend the manager stores rule sets in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Filesystem,
    Null,
}

impl<'a> From<&'a str> for CacheBackend {
    fn from(s: &'a str) -> Self {
        match s.to_lowercase().as_str() {
            "filesystem" | "fs" => CacheBackend::Filesystem,
            "null" | "disabled" => CacheBackend::Null,
            _ => CacheBackend::Memory,
        }
    }
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Filesystem => write!(f, "filesystem"),
            CacheBackend::Null => write!(f, "null"),
        }
    }
}

/// Validated client settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub cache_backend: CacheBackend,
    pub cache_ttl: Duration,
    pub cache_dir: Option<PathBuf>,
    pub report_usage: bool,
    pub api_url: String,
}

impl Config {
    pub fn builder(token: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Reads configuration from `FLAGPOLE_TOKEN`, `FLAGPOLE_CACHE`,
    /// `FLAGPOLE_CACHE_TTL` (seconds), `FLAGPOLE_CACHE_DIR`,
    /// `FLAGPOLE_REPORT_USAGE` and `FLAGPOLE_API_URL`.
    pub fn from_env() -> Result<Config, FlagpoleError> {
        let token = std::env::var("FLAGPOLE_TOKEN")
            .map_err(|_| FlagpoleError::Config("FLAGPOLE_TOKEN is not set".to_string()))?;
        let mut builder = Config::builder(token);

        if let Ok(backend) = std::env::var("FLAGPOLE_CACHE") {
            builder = builder.with_cache_backend(CacheBackend::from(backend.as_str()));
        }
        if let Some(ttl) = std::env::var("FLAGPOLE_CACHE_TTL")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            builder = builder.with_cache_ttl(Duration::from_secs(ttl));
        }
        if let Ok(dir) = std::env::var("FLAGPOLE_CACHE_DIR") {
            builder = builder.with_cache_dir(dir);
        }
        if let Ok(report) = std::env::var("FLAGPOLE_REPORT_USAGE") {
            builder = builder.with_report_usage(!matches!(
                report.to_lowercase().as_str(),
                "false" | "0" | "off"
            ));
        }
        if let Ok(api_url) = std::env::var("FLAGPOLE_API_URL") {
            builder = builder.with_api_url(api_url);
        }

        builder.build()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    token: String,
    cache_backend: Option<CacheBackend>,
    cache_ttl: Option<Duration>,
    cache_dir: Option<PathBuf>,
    report_usage: Option<bool>,
    api_url: Option<String>,
}

impl ConfigBuilder {
    pub fn with_cache_backend(mut self, backend: CacheBackend) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn with_report_usage(mut self, enabled: bool) -> Self {
        self.report_usage = Some(enabled);
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    pub fn build(self) -> Result<Config, FlagpoleError> {
        if self.token.is_empty() {
            return Err(FlagpoleError::Config(
                "environment token cannot be empty".to_string(),
            ));
        }

        let cache_backend = self.cache_backend.unwrap_or(CacheBackend::Memory);
        if cache_backend == CacheBackend::Filesystem && self.cache_dir.is_none() {
            return Err(FlagpoleError::Config(
                "the filesystem cache backend requires a cache directory".to_string(),
            ));
        }

        let api_url = self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let parsed = url::Url::parse(&api_url)
            .map_err(|e| FlagpoleError::Config(format!("invalid API URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FlagpoleError::Config(format!(
                "invalid API URL scheme '{}'. Only http and https are supported",
                parsed.scheme()
            )));
        }

        Ok(Config {
            token: self.token,
            cache_backend,
            cache_ttl: self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
            cache_dir: self.cache_dir,
            report_usage: self.report_usage.unwrap_or(true),
            api_url,
        })
    }
}
