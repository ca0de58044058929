//! Per-file compile property queries.
//!
//! Every query is keyed by the `(target, file)` pair: a file's language comes
//! from the target's object source lists, never from its extension, and the
//! same path may be compiled differently by different targets.

use crate::compile_commands::CompileCommand;
use crate::document::{CompilerIdentity, MetadataDocument};
use crate::error::{MetadataError, Result};
use crate::language::{Language, PropertyKind};
use std::path::{Path, PathBuf};

/// Read-only query view over a loaded document.
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'a> {
    document: &'a MetadataDocument,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(document: &'a MetadataDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &'a MetadataDocument {
        self.document
    }

    /// The language `target` compiles `file` as.
    ///
    /// Returns `Ok(None)` when the target does not compile the file, and
    /// [`MetadataError::TargetNotFound`] when the target does not exist.
    pub fn language_for_file(&self, target: &str, file: impl AsRef<Path>) -> Result<Option<Language>> {
        let descriptor = self.document.target(target)?;
        Ok(descriptor.language_of(file.as_ref()))
    }

    /// Path of the compiler used for `file`.
    pub fn compiler_for_file(&self, target: &str, file: impl AsRef<Path>) -> Result<&'a str> {
        self.identity_field(target, file.as_ref(), |c| c.path.as_deref())
    }

    /// Compiler id (e.g. `GNU`, `Clang`) used for `file`.
    pub fn compiler_id_for_file(&self, target: &str, file: impl AsRef<Path>) -> Result<&'a str> {
        self.identity_field(target, file.as_ref(), |c| c.id.as_deref())
    }

    /// Compiler version used for `file`.
    pub fn compiler_version_for_file(&self, target: &str, file: impl AsRef<Path>) -> Result<&'a str> {
        self.identity_field(target, file.as_ref(), |c| c.version.as_deref())
    }

    /// Resolve one compile property for `file` as built by `target`.
    ///
    /// The target's language-specific list is used if present, otherwise its
    /// base list. The file's own entries for the property follow. Nothing is
    /// deduplicated or reordered.
    pub fn compile_property(
        &self,
        target: &str,
        file: impl AsRef<Path>,
        kind: PropertyKind,
    ) -> Result<Vec<String>> {
        let file = file.as_ref();
        let language = self.require_language(target, file)?;
        let descriptor = self.document.target(target)?;

        let base = descriptor.properties(kind).for_language(language);
        let extra = self
            .document
            .source_override(file)
            .and_then(|o| o.property(kind))
            .unwrap_or(&[]);

        tracing::trace!(
            target_name = target,
            file = %file.display(),
            %language,
            property = %kind,
            base = base.len(),
            appended = extra.len(),
            "resolved compile property"
        );

        let mut resolved = Vec::with_capacity(base.len() + extra.len());
        resolved.extend_from_slice(base);
        resolved.extend_from_slice(extra);
        Ok(resolved)
    }

    pub fn compile_definitions(&self, target: &str, file: impl AsRef<Path>) -> Result<Vec<String>> {
        self.compile_property(target, file, PropertyKind::CompileDefinitions)
    }

    pub fn include_directories(&self, target: &str, file: impl AsRef<Path>) -> Result<Vec<String>> {
        self.compile_property(target, file, PropertyKind::IncludeDirectories)
    }

    pub fn compile_options(&self, target: &str, file: impl AsRef<Path>) -> Result<Vec<String>> {
        self.compile_property(target, file, PropertyKind::CompileOptions)
    }

    /// Compiler arguments for `file`: `-D` definitions, `-I` include
    /// directories, then compile options.
    ///
    /// Empty definitions and include directories are skipped; a bare `-D` or
    /// `-I` would take the following argument as its value.
    pub fn compile_arguments(&self, target: &str, file: impl AsRef<Path>) -> Result<Vec<String>> {
        let file = file.as_ref();
        let definitions = self.compile_definitions(target, file)?;
        let includes = self.include_directories(target, file)?;
        let options = self.compile_options(target, file)?;

        let mut args = Vec::with_capacity(definitions.len() + includes.len() + options.len());
        args.extend(
            definitions
                .iter()
                .filter(|d| !d.is_empty())
                .map(|d| format!("-D{}", d)),
        );
        args.extend(
            includes
                .iter()
                .filter(|i| !i.is_empty())
                .map(|i| format!("-I{}", i)),
        );
        args.extend(options);
        Ok(args)
    }

    /// A compile database entry for `file`, run from `directory`.
    pub fn compile_command(
        &self,
        target: &str,
        file: impl AsRef<Path>,
        directory: impl AsRef<Path>,
    ) -> Result<CompileCommand> {
        let file = file.as_ref();
        let compiler = self.compiler_for_file(target, file)?;

        let mut arguments = vec![compiler.to_string()];
        arguments.extend(self.compile_arguments(target, file)?);
        arguments.push("-c".to_string());
        arguments.push(file.to_string_lossy().into_owned());

        Ok(CompileCommand {
            directory: directory.as_ref().to_path_buf(),
            file: PathBuf::from(file),
            command: None,
            arguments: Some(arguments),
            output: None,
        })
    }

    fn require_language(&self, target: &str, file: &Path) -> Result<Language> {
        self.language_for_file(target, file)?
            .ok_or_else(|| MetadataError::UnknownLanguage {
                target: target.to_string(),
                file: file.to_path_buf(),
            })
    }

    fn identity_field(
        &self,
        target: &str,
        file: &Path,
        field: impl Fn(&'a CompilerIdentity) -> Option<&'a str>,
    ) -> Result<&'a str> {
        let language = self.require_language(target, file)?;
        field(self.document.compiler(language)).ok_or(MetadataError::CompilerNotConfigured(language))
    }
}

impl MetadataDocument {
    /// Query view over this document.
    pub fn resolver(&self) -> PropertyResolver<'_> {
        PropertyResolver::new(self)
    }
}
