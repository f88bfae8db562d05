//! Configuration management.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::codec::ROW_KEY_HEADER;
use crate::codec::columns::check_row_key_header;
use crate::models::{Schema, SchemaRegistry};
use crate::{Error, Result};

/// Environment variable overriding the database path.
pub const ENV_DB_PATH: &str = "TABLESMITH_DB";

/// Environment variable overriding the schema directory.
pub const ENV_SCHEMA_DIR: &str = "TABLESMITH_SCHEMA_DIR";

/// Main configuration for tablesmith.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablesmithConfig {
    /// Path to the `SQLite` record store.
    pub db_path: PathBuf,
    /// Directory of per-kind JSON schema overrides (`<kind>.json`).
    pub schema_dir: Option<PathBuf>,
    /// Header of the leading row-key column.
    pub row_key_header: String,
    /// Logging section, applied by [`crate::observability`].
    pub logging: LoggingSettings,
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive (`info`, `tablesmith=debug`, ...).
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Database path.
    pub db_path: Option<String>,
    /// Schema override directory.
    pub schema_dir: Option<String>,
    /// Row-key column header.
    pub row_key_header: Option<String>,
    /// Logging configuration.
    pub logging: Option<LoggingSettings>,
}

impl Default for TablesmithConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("tablesmith.db"),
            schema_dir: None,
            row_key_header: ROW_KEY_HEADER.to_string(),
            logging: LoggingSettings::default(),
        }
    }
}

impl TablesmithConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config_file", format!("{}: {e}", path.display())))?;

        let file: ConfigFile = toml::from_str(&contents)
            .map_err(|e| Error::operation("parse_config_file", format!("{}: {e}", path.display())))?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Reads `<config_dir>/tablesmith/config.toml` (platform config dir as
    /// resolved by `directories`). Returns defaults when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Returns the default config file location, if a home directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("tablesmith").join("config.toml"))
    }

    /// Converts a `ConfigFile` to `TablesmithConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(db_path) = file.db_path {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(schema_dir) = file.schema_dir {
            config.schema_dir = Some(PathBuf::from(schema_dir));
        }
        if let Some(header) = file.row_key_header {
            check_row_key_header(&header, std::iter::empty::<&Schema>())?;
            config.row_key_header = header;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Applies `TABLESMITH_DB` and `TABLESMITH_SCHEMA_DIR` from the process
    /// environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies environment-style overrides from an arbitrary lookup.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(db_path) = lookup(ENV_DB_PATH).filter(|v| !v.trim().is_empty()) {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(dir) = lookup(ENV_SCHEMA_DIR).filter(|v| !v.trim().is_empty()) {
            self.schema_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Sets the schema override directory.
    #[must_use]
    pub fn with_schema_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(path.into());
        self
    }

    /// Loads the schema registry this configuration points at.
    ///
    /// # Errors
    ///
    /// Returns an error if a schema document cannot be read or parsed, or
    /// if the row-key header names a declared field.
    pub fn load_schemas(&self) -> Result<SchemaRegistry> {
        let registry = match &self.schema_dir {
            Some(dir) => SchemaRegistry::load_dir(dir)?,
            None => SchemaRegistry::builtin()?,
        };
        check_row_key_header(&self.row_key_header, registry.schemas())?;
        Ok(registry)
    }
}
