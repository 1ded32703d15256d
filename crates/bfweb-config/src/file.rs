//! A typed configuration value bound to the file it lives in.
//!
//! The filename is part of the state: [`ConfigFile::load`] and
//! [`ConfigFile::save_as`] update it, [`ConfigFile::save`] writes back to it.
//! Nothing reloads or saves implicitly.
//!
//! The format follows the extension: `.toml` is TOML, anything else JSON.
//!
//! # Example
//!
//! ```no_run
//! use bfweb_config::{ConfigFile, ServiceConfig};
//!
//! # fn main() -> Result<(), bfweb_config::ConfigError> {
//! let mut config = ConfigFile::new("config.json", ServiceConfig::default());
//! config.load("config.json")?;
//! config.get_mut().server.port = 9090;
//! config.save()?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ConfigError;

/// Supported on-disk formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON, pretty-printed on save.
    Json,
    /// TOML.
    Toml,
}

impl FileFormat {
    /// Picks the format from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }

    /// Parses a value from text in this format.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the content does not match `T`.
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, ConfigError> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Toml => toml::from_str(content)?,
        })
    }

    /// Renders a value as text in this format.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `T` cannot be represented.
    pub fn render<T: Serialize>(self, value: &T) -> Result<String, ConfigError> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(value)?,
            Self::Toml => toml::to_string_pretty(value)?,
        })
    }
}

/// A typed configuration plus the filename it was loaded from or saved to.
///
/// Not synchronized; configure at startup, then hand out the value.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile<T> {
    filename: Option<PathBuf>,
    value: T,
}

impl<T> ConfigFile<T> {
    /// Wraps `value`, remembering `filename` for [`save`](Self::save).
    pub fn new(filename: impl Into<PathBuf>, value: T) -> Self {
        Self {
            filename: Some(filename.into()),
            value,
        }
    }

    /// Wraps `value` without a filename.
    pub fn unnamed(value: T) -> Self {
        Self {
            filename: None,
            value,
        }
    }

    /// Returns the current filename, if any.
    #[must_use]
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Replaces the filename.
    pub fn set_filename(&mut self, filename: impl Into<PathBuf>) {
        self.filename = Some(filename.into());
    }

    /// Returns the configuration value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Returns the configuration value for in-place edits.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Consumes the wrapper, returning the value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: DeserializeOwned> ConfigFile<T> {
    /// Reads `path` into the value and makes it the current filename.
    ///
    /// On error the value and filename are unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::file_not_found(path),
            _ => ConfigError::read_error(path, e),
        })?;

        self.value = FileFormat::from_path(path).parse(&content)?;
        self.filename = Some(path.to_path_buf());
        Ok(())
    }

    /// Opens `path` as a new config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::file_not_found(path),
            _ => ConfigError::read_error(path, e),
        })?;

        Ok(Self::new(path, FileFormat::from_path(path).parse(&content)?))
    }
}

impl<T: Serialize> ConfigFile<T> {
    /// Writes the value to the current filename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoFilename`] if no filename is set, or any
    /// error from [`save_as`](Self::save_as).
    pub fn save(&mut self) -> Result<(), ConfigError> {
        let filename = self.filename.clone().ok_or(ConfigError::NoFilename)?;
        self.save_as(filename)
    }

    /// Writes the value to `path`, creating parent directories, and makes it
    /// the current filename.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = FileFormat::from_path(path).render(&self.value)?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ConfigError::write_error(dir, e))?;
        }
        fs::write(path, content).map_err(|e| ConfigError::write_error(path, e))?;

        self.filename = Some(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        port: u16,
    }

    fn sample() -> Sample {
        Sample {
            name: "svc".to_string(),
            port: 8080,
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.toml")), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new("a.TOML")), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new("a.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("config")), FileFormat::Json);
    }

    #[test]
    fn test_accessors() {
        let mut config = ConfigFile::new("a.json", sample());
        assert_eq!(config.filename(), Some(Path::new("a.json")));

        config.get_mut().port = 9000;
        assert_eq!(config.get().port, 9000);

        config.set_filename("b.json");
        assert_eq!(config.filename(), Some(Path::new("b.json")));
        assert_eq!(config.into_inner().port, 9000);
    }

    #[test]
    fn test_save_without_filename() {
        let mut config = ConfigFile::unnamed(sample());
        assert!(matches!(config.save(), Err(ConfigError::NoFilename)));
    }

    #[test]
    fn test_save_as_creates_directories_and_updates_filename() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/config.json");

        let mut config = ConfigFile::unnamed(sample());
        config.save_as(&path).unwrap();

        assert_eq!(config.filename(), Some(path.as_path()));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"name\": \"svc\""));
    }

    #[test]
    fn test_save_then_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ConfigFile::new(&path, sample());
        config.save().unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("port = 8080"));

        let mut loaded = ConfigFile::unnamed(Sample::default());
        loaded.load(&path).unwrap();
        assert_eq!(loaded.get(), &sample());
        assert_eq!(loaded.filename(), Some(path.as_path()));
    }

    #[test]
    fn test_load_missing_file() {
        let mut config = ConfigFile::new("keep.json", sample());
        let result = config.load("/nonexistent/bfweb/config.json");

        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
        assert_eq!(config.filename(), Some(Path::new("keep.json")));
    }

    #[test]
    fn test_load_malformed_keeps_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let mut config = ConfigFile::new("keep.json", sample());
        assert!(matches!(config.load(&path), Err(ConfigError::JsonError(_))));
        assert_eq!(config.get(), &sample());
        assert_eq!(config.filename(), Some(Path::new("keep.json")));
    }

    #[test]
    fn test_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"name": "opened", "port": 1}"#).unwrap();

        let config: ConfigFile<Sample> = ConfigFile::open(&path).unwrap();
        assert_eq!(config.get().name, "opened");
        assert_eq!(config.filename(), Some(path.as_path()));
    }
}
