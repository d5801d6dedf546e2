use std::fmt;
use std::time::Duration;

use crate::{error::ConfigError, ClientOptions};

/// Default protocol scheme.
pub const DEFAULT_SCHEME: &str = "https";
/// Host of the public Cloudcraft API.
pub const DEFAULT_HOST: &str = "api.cloudcraft.co";
/// Default port of the Cloudcraft API.
pub const DEFAULT_PORT: &str = "443";
/// Default base path of the Cloudcraft API.
pub const DEFAULT_PATH: &str = "/";
/// Exact length of a Cloudcraft API key.
pub const API_KEY_LENGTH: usize = 44;

pub const ENV_SCHEME: &str = "CLOUDCRAFT_PROTOCOL";
pub const ENV_HOST: &str = "CLOUDCRAFT_HOST";
pub const ENV_PORT: &str = "CLOUDCRAFT_PORT";
pub const ENV_PATH: &str = "CLOUDCRAFT_PATH";
pub const ENV_TIMEOUT: &str = "CLOUDCRAFT_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "CLOUDCRAFT_MAX_RETRIES";
pub const ENV_API_KEY: &str = "CLOUDCRAFT_API_KEY";

/// Connection settings for the Cloudcraft API.
#[derive(Clone, PartialEq)]
pub struct Config {
    /// `http` or `https`.
    pub scheme: String,
    pub host: String,
    /// Port number; may be empty to use the scheme's default.
    pub port: String,
    /// Base path of the API, `/` when empty.
    pub path: String,
    /// API key sent as a bearer token.
    pub key: String,
    /// Timeout, retry and pacing behavior.
    pub options: ClientOptions,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("key", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl Config {
    /// Creates a config for the public API with the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_owned(),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT.to_owned(),
            path: DEFAULT_PATH.to_owned(),
            key: key.into(),
            options: ClientOptions::default(),
        }
    }

    /// Creates a config from environment variables.
    ///
    /// Reads:
    /// - `CLOUDCRAFT_PROTOCOL`, `CLOUDCRAFT_HOST`, `CLOUDCRAFT_PORT`,
    ///   `CLOUDCRAFT_PATH` — endpoint fragments
    /// - `CLOUDCRAFT_TIMEOUT` — e.g. `80s`, `500ms`, `1m30s`, `1.5s` or bare seconds
    /// - `CLOUDCRAFT_MAX_RETRIES` — retries after the first attempt
    /// - `CLOUDCRAFT_API_KEY` — API key
    ///
    /// Unset, empty or unparsable values fall back to the defaults. The
    /// result is not validated; see [`Config::validate`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, fallback: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| fallback.to_owned())
        };

        let mut options = ClientOptions::default();
        if let Some(timeout) = lookup(ENV_TIMEOUT).as_deref().and_then(parse_duration) {
            options.timeout = timeout;
        }
        if let Some(retries) = lookup(ENV_MAX_RETRIES).and_then(|value| value.trim().parse().ok()) {
            options.max_retries = retries;
        }

        Self {
            scheme: get(ENV_SCHEME, DEFAULT_SCHEME),
            host: get(ENV_HOST, DEFAULT_HOST),
            port: get(ENV_PORT, DEFAULT_PORT),
            path: get(ENV_PATH, DEFAULT_PATH),
            key: get(ENV_API_KEY, ""),
            options,
        }
    }

    /// Applies timeout, retry and pacing options.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Checks required fields and the API key length.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheme.is_empty() {
            return Err(ConfigError::MissingScheme);
        }
        if self.host.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.key.is_empty() {
            return Err(ConfigError::MissingKey);
        }
        if self.key.len() != API_KEY_LENGTH {
            return Err(ConfigError::InvalidKeyLength {
                expected: API_KEY_LENGTH,
                actual: self.key.len(),
            });
        }
        if self.options.min_retry_delay > self.options.max_retry_delay {
            return Err(ConfigError::InvalidRetryDelays);
        }
        Ok(())
    }
}

/// Parses a bare number of seconds, or a sequence of decimal numbers with
/// unit suffixes (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`) such as `80s`,
/// `1.5s` or `1m30s`.
fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if raw.is_empty() {
        return None;
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut rest = raw;
    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        let value: f64 = rest[..number_end].parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_number).unwrap_or(rest.len());
        let unit_nanos = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_end..];

        let nanos = (value * unit_nanos).round();
        if !nanos.is_finite() || nanos >= u64::MAX as f64 {
            return None;
        }
        total = total.checked_add(Duration::from_nanos(nanos as u64))?;
    }
    Some(total)
}
