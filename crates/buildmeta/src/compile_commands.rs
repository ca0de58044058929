//! compile_commands.json view of a metadata document.
//!
//! Tools that only understand a JSON compilation database can be served from
//! the metadata: one entry per compiled (target, file) pair, with the
//! arguments the resolver produces.

use crate::document::MetadataDocument;
use crate::error::{MetadataError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single compile command from compile_commands.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// The working directory for compilation.
    pub directory: PathBuf,

    /// The source file path.
    pub file: PathBuf,

    /// The full compilation command (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// The compilation arguments (array form).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,

    /// Output file (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Get the compilation arguments as a vector.
    pub fn get_args(&self) -> Vec<String> {
        if let Some(args) = &self.arguments {
            args.clone()
        } else if let Some(cmd) = &self.command {
            shlex::split(cmd)
                .unwrap_or_else(|| cmd.split_whitespace().map(|s| s.to_string()).collect())
        } else {
            Vec::new()
        }
    }

    /// Include directories named by `-I` / `-isystem`, in argument order.
    pub fn get_includes(&self) -> Vec<String> {
        flag_values(&self.get_args(), &["-I", "-isystem"])
    }

    /// Preprocessor definitions named by `-D`, in argument order.
    pub fn get_defines(&self) -> Vec<String> {
        flag_values(&self.get_args(), &["-D"])
    }
}

/// Collect the values of `flags`, accepting both `-Ifoo` and `-I foo`.
fn flag_values(args: &[String], flags: &[&str]) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        for flag in flags {
            if arg == flag {
                if let Some(value) = iter.next() {
                    values.push(value.clone());
                }
                break;
            }
            if let Some(value) = arg.strip_prefix(flag) {
                values.push(value.to_string());
                break;
            }
        }
    }
    values
}

/// Collection of compile commands (a JSON compilation database).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileCommands {
    commands: Vec<CompileCommand>,
}

impl CompileCommands {
    /// Build the database for every compiled file of every target.
    ///
    /// Targets appear in document order and files in the order the target
    /// lists them. A file compiled by two targets gets two entries.
    pub fn from_document(document: &MetadataDocument, directory: impl AsRef<Path>) -> Result<Self> {
        let resolver = document.resolver();
        let directory = directory.as_ref();

        let mut commands = Vec::new();
        for target in document.targets() {
            for (file, _) in target.classified_files() {
                commands.push(resolver.compile_command(target.name(), file, directory)?);
            }
        }

        tracing::debug!(
            entries = commands.len(),
            directory = %directory.display(),
            "built compile database from metadata"
        );
        Ok(Self { commands })
    }

    /// Load compile commands from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MetadataError::io(path, e))?;
        Self::from_str(&content)
    }

    /// Parse compile commands from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self> {
        let commands: Vec<CompileCommand> =
            serde_json::from_str(json).map_err(|source| MetadataError::MalformedInput {
                input: "compile database",
                source,
            })?;
        Ok(Self { commands })
    }

    /// Serialize as compile_commands.json text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.commands)
            .map_err(|source| MetadataError::Serialize { source })
    }

    /// Get all compile commands.
    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// Find the first compile command for a specific source file.
    pub fn find_command(&self, source: &Path) -> Option<&CompileCommand> {
        self.commands
            .iter()
            .find(|cmd| cmd.file == source || cmd.file.ends_with(source))
    }
}
