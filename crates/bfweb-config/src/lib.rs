//! Typed configuration for bfweb services.
//!
//! - [`ConfigFile`]: a serde value bound to the file it was loaded from,
//!   with explicit load and save
//! - [`ServiceConfig`]: every section a service needs (server, logging,
//!   metrics, CORS, rate limit, error template)
//! - [`ConfigLoader`]: defaults, then a file, then environment overrides,
//!   then validation
//!
//! # Example
//!
//! ```no_run
//! use bfweb_config::ConfigLoader;
//!
//! # fn main() -> Result<(), bfweb_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()
//!     .with_optional_file("bfweb.toml")?
//!     .with_env_prefix("BFWEB")
//!     .load()?;
//!
//! println!("listening on {}", config.server.bind_addr());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! error_template = "templates/error.html"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! read_timeout = 30
//! write_timeout = 30
//!
//! [logging]
//! level = "info"
//! json_format = false
//!
//! [cors]
//! allowed_origins = ["https://app.example"]
//! allow_credentials = true
//!
//! [rate_limit]
//! max_requests = 100
//! max_clients = 1000
//! window = 60
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX_SECTION__KEY` variables:
//!
//! - `BFWEB_SERVER__PORT=9000`
//! - `BFWEB_RATE_LIMIT__WINDOW=0.5`
//! - `BFWEB_CORS__ALLOWED_ORIGINS=https://a.example,https://b.example`
//! - `BFWEB_ERROR_TEMPLATE=templates/error.html`

#![doc(html_root_url = "https://docs.rs/bfweb-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod file;
mod loader;
mod service;

pub use error::ConfigError;
pub use file::{ConfigFile, FileFormat};
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use service::ServiceConfig;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
