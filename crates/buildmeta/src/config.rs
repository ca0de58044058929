//! Session configuration (`buildmeta.toml` format).

use crate::error::{MetadataError, Result};
use crate::schema::Validation;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name of the metadata for single-configuration generators.
pub const METADATA_FILE_NAME: &str = "cmake-metadata.json";

/// File name of the schema the generator copies next to the metadata.
pub const SCHEMA_FILE_NAME: &str = "cmake-metadata-schema.json";

/// Root session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Where to find the metadata.
    pub metadata: MetadataConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Location and loading options for the metadata files.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataConfig {
    /// Build directory the generator wrote into.
    pub build_dir: PathBuf,

    /// Configuration name for multi-configuration generators (e.g. "Debug").
    #[serde(default)]
    pub configuration: Option<String>,

    /// Schema path; relative paths are taken from `build_dir`.
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// Schema enforcement on load.
    #[serde(default)]
    pub validation: Validation,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. "buildmeta=debug".
    #[serde(default)]
    pub filter: Option<String>,
}

impl SessionConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MetadataError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// A configuration reading the default file names from `build_dir`.
    pub fn for_build_dir(build_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata: MetadataConfig {
                build_dir: build_dir.into(),
                configuration: None,
                schema: None,
                validation: Validation::default(),
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Select a configuration of a multi-configuration build.
    pub fn with_configuration(mut self, name: impl Into<String>) -> Self {
        self.metadata.configuration = Some(name.into());
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.metadata.validation = validation;
        self
    }

    /// Path of the metadata file: `cmake-metadata[-<configuration>].json`.
    pub fn metadata_path(&self) -> PathBuf {
        let name = match &self.metadata.configuration {
            Some(config) => format!("cmake-metadata-{}.json", config),
            None => METADATA_FILE_NAME.to_string(),
        };
        self.metadata.build_dir.join(name)
    }

    /// Install the process-wide log subscriber using `[logging] filter`.
    ///
    /// Only the first call in a process takes effect.
    pub fn init_logging(&self) {
        crate::logging::init_tracing(self.logging.filter.as_deref());
    }

    /// Path of the schema file.
    pub fn schema_path(&self) -> PathBuf {
        match &self.metadata.schema {
            Some(schema) => self.metadata.build_dir.join(schema),
            None => self.metadata.build_dir.join(SCHEMA_FILE_NAME),
        }
    }
}
