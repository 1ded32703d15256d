//! The full configuration of a bfweb service.

use std::path::PathBuf;

use bfweb_middleware::admission::RateLimitPolicy;
use bfweb_middleware::stages::CorsConfig;
use bfweb_server::ServerConfig;
use bfweb_telemetry::{LogConfig, MetricsConfig};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Every configuration section of a service, as one serde document.
///
/// All sections are optional in files; missing ones take their defaults.
///
/// ```json
/// {
///   "server": { "host": "0.0.0.0", "port": 8080, "read_timeout": 30, "write_timeout": 30 },
///   "logging": { "enabled": true, "level": "info", "file": "logs/service.log" },
///   "cors": { "allowed_origins": ["https://app.example"], "allow_credentials": true },
///   "rate_limit": { "max_requests": 100, "max_clients": 1000, "window": 60 },
///   "error_template": "templates/error.html"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener and timeouts.
    pub server: ServerConfig,

    /// Log output.
    pub logging: LogConfig,

    /// Prometheus exporter.
    pub metrics: MetricsConfig,

    /// CORS headers.
    pub cors: CorsConfig,

    /// Per-client admission limits.
    pub rate_limit: RateLimitPolicy,

    /// HTML template for error pages; `None` sends bare status codes.
    pub error_template: Option<PathBuf>,
}

impl ServiceConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// The rate limit policy validates itself when it is built, so only the
    /// server and logging sections are checked here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::validation_error("server.host must not be empty"));
        }
        if self.server.port == 0 {
            return Err(ConfigError::validation_error("server.port must not be 0"));
        }
        if self.server.read_timeout == 0 {
            return Err(ConfigError::validation_error(
                "server.read_timeout must be at least 1 second",
            ));
        }
        if self.server.write_timeout == 0 {
            return Err(ConfigError::validation_error(
                "server.write_timeout must be at least 1 second",
            ));
        }
        if self.logging.enabled {
            bfweb_telemetry::logging::create_env_filter(&self.logging.level).map_err(|e| {
                ConfigError::validation_error(format!("logging.level is invalid: {e}"))
            })?;
        }
        if self
            .error_template
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::validation_error(
                "error_template must not be an empty path",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit, RateLimitPolicy::default());
        assert!(config.error_template.is_none());
    }

    #[test]
    fn test_parses_example_document() {
        let json = r#"{
            "server": { "host": "127.0.0.1", "port": 9000, "read_timeout": 5, "write_timeout": 10 },
            "logging": { "enabled": true, "level": "debug" },
            "cors": { "allowed_origins": ["https://app.example"] },
            "rate_limit": { "max_requests": 10, "max_clients": 50, "window": 30 },
            "error_template": "templates/error.html"
        }"#;

        let config: ServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.cors.allowed_origins, vec!["https://app.example"]);
        assert_eq!(config.cors.max_age, 600);
        assert_eq!(config.rate_limit.max_requests(), 10);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(30));
        assert_eq!(
            config.error_template.as_deref(),
            Some(std::path::Path::new("templates/error.html"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_policy_fails_to_parse() {
        let json = r#"{ "rate_limit": { "max_requests": 0 } }"#;
        assert!(serde_json::from_str::<ServiceConfig>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let mut config = ServiceConfig::default();
        config.server.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = ServiceConfig::default();
        config.server.write_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = ServiceConfig::default();
        config.logging.level = "bfweb=loud".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }
}
