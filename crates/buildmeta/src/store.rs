//! Loading metadata into a shareable, immutable store.

use crate::config::SessionConfig;
use crate::document::MetadataDocument;
use crate::error::{MetadataError, Result};
use crate::resolve::PropertyResolver;
use crate::schema::{Schema, Validation};
use std::path::Path;
use std::sync::Arc;

/// A loaded metadata document.
///
/// The document is never mutated after load, so a store can be cloned
/// cheaply and queried from any number of threads.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    document: Arc<MetadataDocument>,
}

impl MetadataStore {
    /// Load a payload and its schema with structural validation.
    pub fn load(payload: &str, schema: &str) -> Result<Self> {
        Self::load_with(payload, schema, Validation::Structural)
    }

    /// Load a payload and its schema.
    ///
    /// Both texts must be well-formed JSON regardless of `validation`.
    pub fn load_with(payload: &str, schema: &str, validation: Validation) -> Result<Self> {
        let schema = Schema::parse(schema)?;
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|source| MetadataError::MalformedInput {
                input: "metadata",
                source,
            })?;

        if validation == Validation::Structural {
            schema.validate(&value)?;
        }

        let document = MetadataDocument::from_value(value)?;
        tracing::debug!(
            targets = document.target_count(),
            sources = document.source_override_count(),
            ?validation,
            "loaded build metadata"
        );

        Ok(Self {
            document: Arc::new(document),
        })
    }

    /// Load from a metadata file and a schema file.
    pub fn from_files(payload: &Path, schema: &Path, validation: Validation) -> Result<Self> {
        let payload_text =
            std::fs::read_to_string(payload).map_err(|e| MetadataError::io(payload, e))?;
        let schema_text = std::fs::read_to_string(schema).map_err(|e| MetadataError::io(schema, e))?;

        tracing::debug!(
            metadata = %payload.display(),
            schema = %schema.display(),
            "reading build metadata"
        );
        Self::load_with(&payload_text, &schema_text, validation)
    }

    /// Load the files named by a session configuration.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        Self::from_files(
            &config.metadata_path(),
            &config.schema_path(),
            config.metadata.validation,
        )
    }

    pub fn document(&self) -> &MetadataDocument {
        &self.document
    }

    /// A handle to the document that outlives this store.
    pub fn shared(&self) -> Arc<MetadataDocument> {
        Arc::clone(&self.document)
    }

    pub fn resolver(&self) -> PropertyResolver<'_> {
        PropertyResolver::new(&self.document)
    }
}
