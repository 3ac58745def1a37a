//! Server configuration from environment variables.
//!
//! Loaded once at startup (after `dotenvy` has merged any `.env` file):
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `BASE_URL` | `http://localhost:{PORT}` |
//! | `STORE_BACKEND` | `redis` (`redis` or `memory`) |
//! | `REDIS_URL` | `redis://localhost:6379` |
//! | `COLLECTION_TTL_SECS` | `604800` |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` |
//! | `MAX_BODY_BYTES` | `1048576` |
//! | `RATE_LIMIT_ENABLED` | `true` |
//! | `RATE_LIMIT_REQUESTS` | `100` |
//! | `RATE_LIMIT_PERIOD_SECS` | `60` |
//! | `LOG_FORMAT` | `text` (`text` or `json`) |
//! | `LOG_FILE` | unset (stdout) |
//! | `LOG_ANSI` | auto |
//!
//! Malformed values fail startup with [`Error::Config`] rather than being
//! silently replaced by defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use clipshare_core::{defaults, Error, Result};

/// Which [`KvStore`](clipshare_core::KvStore) backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    /// Process-local, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(Error::Config(format!(
                "STORE_BACKEND must be 'redis' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::Config(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Daily-rotated log file; stdout when unset
    pub file: Option<PathBuf>,
    /// Force ANSI colors on or off; auto-detected when unset
    pub ansi: Option<bool>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            file: None,
            ansi: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests: u64,
    pub period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: defaults::RATE_LIMIT_REQUESTS,
            period_secs: defaults::RATE_LIMIT_PERIOD_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for share URLs, `{base_url}/clip/{id}`
    pub base_url: String,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub collection_ttl_secs: u64,
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub rate_limit: RateLimitConfig,
    pub log: LogConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            base_url: format!("http://localhost:{}", defaults::SERVER_PORT),
            store_backend: StoreBackend::Redis,
            redis_url: defaults::REDIS_URL.to_string(),
            collection_ttl_secs: defaults::COLLECTION_TTL_SECS,
            allowed_origins: vec![format!("http://localhost:{}", defaults::SERVER_PORT)],
            max_body_bytes: defaults::MAX_BODY_BYTES,
            rate_limit: RateLimitConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fallback = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", fallback.port)?;
        let base_url = get("BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let collection_ttl_secs =
            parse_or(&get, "COLLECTION_TTL_SECS", fallback.collection_ttl_secs)?;
        if collection_ttl_secs == 0 {
            return Err(Error::Config(
                "COLLECTION_TTL_SECS must be greater than zero".to_string(),
            ));
        }

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => fallback.allowed_origins,
        };

        let rate_limit = RateLimitConfig {
            enabled: match get("RATE_LIMIT_ENABLED") {
                Some(v) => parse_bool("RATE_LIMIT_ENABLED", &v)?,
                None => fallback.rate_limit.enabled,
            },
            requests: parse_or(&get, "RATE_LIMIT_REQUESTS", fallback.rate_limit.requests)?,
            period_secs: parse_or(
                &get,
                "RATE_LIMIT_PERIOD_SECS",
                fallback.rate_limit.period_secs,
            )?,
        };
        if rate_limit.enabled && (rate_limit.requests == 0 || rate_limit.period_secs == 0) {
            return Err(Error::Config(
                "RATE_LIMIT_REQUESTS and RATE_LIMIT_PERIOD_SECS must be non-zero".to_string(),
            ));
        }

        let log = LogConfig {
            format: match get("LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => fallback.log.format,
            },
            file: get("LOG_FILE").map(PathBuf::from),
            ansi: match get("LOG_ANSI") {
                Some(v) => Some(parse_bool("LOG_ANSI", &v)?),
                None => None,
            },
        };

        Ok(Self {
            host: get("HOST").unwrap_or(fallback.host),
            port,
            base_url,
            store_backend: match get("STORE_BACKEND") {
                Some(v) => v.parse()?,
                None => fallback.store_backend,
            },
            redis_url: get("REDIS_URL").unwrap_or(fallback.redis_url),
            collection_ttl_secs,
            allowed_origins,
            max_body_bytes: parse_or(&get, "MAX_BODY_BYTES", fallback.max_body_bytes)?,
            rate_limit,
            log,
        })
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid HOST '{}': {}", self.host, e)))
    }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", name, raw, e))),
        None => Ok(default),
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be true or false, got '{}'",
            name, raw
        ))),
    }
}
