//! Layered configuration loading.
//!
//! [`ConfigLoader`] builds a [`ServiceConfig`] from, in order:
//!
//! 1. Defaults
//! 2. A configuration file (TOML for `.toml`, JSON otherwise)
//! 3. Environment variables `PREFIX_SECTION__KEY`, e.g.
//!    `BFWEB_RATE_LIMIT__MAX_REQUESTS=50` or `BFWEB_SERVER__PORT=9000`
//!
//! and validates the result.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bfweb_middleware::admission::RateLimitPolicy;

use crate::file::{ConfigFile, FileFormat};
use crate::{ConfigError, ServiceConfig};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "BFWEB";

/// Configuration loader with layered approach.
///
/// # Example
///
/// ```no_run
/// use bfweb_config::ConfigLoader;
///
/// # fn main() -> Result<(), bfweb_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("config.json")?
///     .with_env_prefix("BFWEB")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: ServiceConfig,
    env_prefix: Option<String>,
    overrides: Vec<(String, String)>,
}

impl ConfigLoader {
    /// Creates a loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current configuration with the contents of `path`.
    ///
    /// Sections missing from the file take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read or
    /// does not parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let file: ConfigFile<ServiceConfig> = ConfigFile::open(path)?;
        self.config = file.into_inner();
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Replaces the current configuration with `content` in the given format.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    pub fn with_string(mut self, content: &str, format: FileFormat) -> Result<Self, ConfigError> {
        self.config = format.parse(content)?;
        Ok(self)
    }

    /// Reads overrides from process environment variables starting with
    /// `prefix`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Adds explicit overrides in the `PREFIX_SECTION__KEY` form, applied
    /// after the process environment. Without
    /// [`with_env_prefix`](Self::with_env_prefix) the prefix is `BFWEB`.
    #[must_use]
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Loads a `.env` file from the working directory into the process
    /// environment, if there is one.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        // A missing .env is not an error.
        let _ = dotenvy::dotenv();
        self
    }

    /// Applies overrides, validates, and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<ServiceConfig, ConfigError> {
        let mut vars: Vec<(String, String)> = Vec::new();
        if let Some(prefix) = &self.env_prefix {
            vars.extend(env::vars().filter(|(k, _)| k.starts_with(prefix.as_str())));
            vars.sort();
        }
        vars.append(&mut self.overrides);

        let prefix = self
            .env_prefix
            .take()
            .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string());
        for (key, value) in vars {
            self.apply_env_var(&key, &value, &prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> ServiceConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(path) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix('_'))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            // Server section
            ["SERVER", "HOST"] => config.server.host = value.to_string(),
            ["SERVER", "PORT"] => config.server.port = parse_number(key, value)?,
            ["SERVER", "READ_TIMEOUT"] => config.server.read_timeout = parse_number(key, value)?,
            ["SERVER", "WRITE_TIMEOUT"] => {
                config.server.write_timeout = parse_number(key, value)?;
            }
            ["SERVER", "SHUTDOWN_TIMEOUT"] => {
                config.server.shutdown_timeout = parse_number(key, value)?;
            }

            // Logging section
            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "JSON_FORMAT"] => config.logging.json_format = parse_flag(key, value)?,
            ["LOGGING", "FILE"] => config.logging.file = optional_path(value),

            // Metrics section
            ["METRICS", "ENABLED"] => config.metrics.enabled = parse_flag(key, value)?,
            ["METRICS", "ADDR"] => config.metrics.addr = value.to_string(),

            // CORS section
            ["CORS", "ALLOWED_ORIGINS"] => config.cors.allowed_origins = parse_list(value),
            ["CORS", "ALLOWED_METHODS"] => config.cors.allowed_methods = parse_list(value),
            ["CORS", "ALLOWED_HEADERS"] => config.cors.allowed_headers = parse_list(value),
            ["CORS", "ALLOW_CREDENTIALS"] => {
                config.cors.allow_credentials = parse_flag(key, value)?;
            }
            ["CORS", "MAX_AGE"] => config.cors.max_age = parse_number(key, value)?,

            // Rate limit section; the policy is rebuilt so it stays valid.
            ["RATE_LIMIT", field] => {
                let current = config.rate_limit;
                let (max_requests, max_clients, window) = match *field {
                    "MAX_REQUESTS" => (
                        parse_number(key, value)?,
                        current.max_clients(),
                        current.window(),
                    ),
                    "MAX_CLIENTS" => (
                        current.max_requests(),
                        parse_number(key, value)?,
                        current.window(),
                    ),
                    "WINDOW" => (
                        current.max_requests(),
                        current.max_clients(),
                        parse_seconds(key, value)?,
                    ),
                    _ => return Ok(()),
                };
                config.rate_limit = RateLimitPolicy::new(max_requests, max_clients, window)
                    .map_err(|e| ConfigError::invalid_value(key, e.to_string()))?;
            }

            ["ERROR_TEMPLATE"] => config.error_template = optional_path(value),

            // Unknown keys are ignored.
            _ => {}
        }

        Ok(())
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected a non-negative integer"))
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ConfigError::env_parse_error(key, "expected a duration in seconds"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Comma-separated list; blank entries are dropped.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn optional_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}
