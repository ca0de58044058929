//! Error types for buildmeta.

use crate::language::Language;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for buildmeta operations.
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Errors that can occur while loading or querying build metadata.
#[derive(Error, Diagnostic, Debug)]
pub enum MetadataError {
    /// Failed to read an input file.
    #[error("Failed to read {}: {source}", .path.display())]
    #[diagnostic(code(buildmeta::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The metadata payload or its schema is not well-formed structured data.
    #[error("Malformed {input}: {source}")]
    #[diagnostic(
        code(buildmeta::malformed_input),
        help("the file must be a JSON object as written by the build system generator")
    )]
    MalformedInput {
        input: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The payload parsed but does not have the expected shape.
    #[error("Schema mismatch at '{pointer}': {message}")]
    #[diagnostic(code(buildmeta::schema_mismatch))]
    SchemaMismatch { pointer: String, message: String },

    /// Failed to write a value out as JSON.
    #[error("Failed to serialize compile database: {source}")]
    #[diagnostic(
        code(buildmeta::serialize),
        help("paths written to a compile database must be valid UTF-8")
    )]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    /// Failed to parse a TOML session configuration.
    #[error("Failed to parse TOML config: {0}")]
    #[diagnostic(code(buildmeta::config))]
    ParseConfig(#[from] toml::de::Error),

    /// Target not found.
    #[error("Target not found: {0}")]
    #[diagnostic(code(buildmeta::not_found))]
    TargetNotFound(String),

    /// The file is not compiled by the target in any known language.
    #[error("File {} has no language in target '{target}'", .file.display())]
    #[diagnostic(
        code(buildmeta::unknown_language),
        help("only object sources listed for the target are classified")
    )]
    UnknownLanguage { target: String, file: PathBuf },

    /// The document carries no compiler identity for the language.
    #[error("No {0} compiler recorded in the metadata")]
    #[diagnostic(code(buildmeta::compiler_not_configured))]
    CompilerNotConfigured(Language),
}

impl MetadataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MetadataError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn mismatch(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        MetadataError::SchemaMismatch {
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}
