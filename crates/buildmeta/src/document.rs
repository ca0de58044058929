//! The build metadata document (`cmake-metadata.json` format).
//!
//! The generator writes one JSON object per configuration. The `Raw*` types
//! mirror that wire format; [`MetadataDocument`] is the immutable, indexed form
//! that queries run against.

use crate::error::{MetadataError, Result};
use crate::language::{Language, PropertyKind};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Target type as reported by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    Executable,
    StaticLibrary,
    SharedLibrary,
    ModuleLibrary,
    ObjectLibrary,
    Utility,
    #[serde(other)]
    Unknown,
}

/// One frame of the listfile backtrace that created a target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BacktraceFrame {
    pub path: PathBuf,
    #[serde(deserialize_with = "line_number")]
    pub line: u32,
}

/// Files a target produces on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetArtifacts {
    /// The linked binary or archive.
    pub target_file: Option<PathBuf>,
    /// Import library, on platforms that have them.
    pub linker_file: Option<PathBuf>,
    /// SONAME symlink for shared libraries.
    pub soname_file: Option<PathBuf>,
}

/// Compiler identity for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerIdentity {
    pub path: Option<String>,
    pub id: Option<String>,
    pub version: Option<String>,
}

impl CompilerIdentity {
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.id.is_none() && self.version.is_none()
    }
}

/// Project-wide facts recorded next to the targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub source_dir: Option<PathBuf>,
    pub generator: Option<String>,
    pub platform: Option<String>,
}

/// A property's language-agnostic list plus its per-language variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyLists {
    base: Option<Vec<String>>,
    per_language: [Option<Vec<String>>; 2],
}

impl PropertyLists {
    /// The list used for files of `language`.
    ///
    /// A language-specific list replaces the base list entirely. A property
    /// that is not set at all resolves to an empty list.
    pub fn for_language(&self, language: Language) -> &[String] {
        self.per_language[language.index()]
            .as_deref()
            .or(self.base.as_deref())
            .unwrap_or(&[])
    }

    pub fn base(&self) -> Option<&[String]> {
        self.base.as_deref()
    }

    pub fn specialized(&self, language: Language) -> Option<&[String]> {
        self.per_language[language.index()].as_deref()
    }
}

/// A build target and its per-target property tables.
#[derive(Debug, Clone)]
pub struct TargetDescriptor {
    name: String,
    kind: Option<TargetKind>,
    backtrace: Vec<BacktraceFrame>,
    artifacts: TargetArtifacts,
    classification: IndexMap<String, Language>,
    generated: FxHashSet<String>,
    header_sources: Vec<PathBuf>,
    extra_sources: Vec<PathBuf>,
    excluded_sources: Vec<PathBuf>,
    properties: [PropertyLists; 3],
}

impl TargetDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Option<TargetKind> {
        self.kind
    }

    pub fn backtrace(&self) -> &[BacktraceFrame] {
        &self.backtrace
    }

    pub fn artifacts(&self) -> &TargetArtifacts {
        &self.artifacts
    }

    /// The language this target compiles `file` as, if it compiles it at all.
    ///
    /// Paths match exactly as written in the document; `/p/./a.cpp` is not
    /// the same file as `/p/a.cpp`.
    pub fn language_of(&self, file: &Path) -> Option<Language> {
        file.to_str()
            .and_then(|file| self.classification.get(file))
            .copied()
    }

    /// Compiled files with their languages, in document order.
    pub fn classified_files(&self) -> impl Iterator<Item = (&Path, Language)> {
        self.classification
            .iter()
            .map(|(path, lang)| (Path::new(path.as_str()), *lang))
    }

    /// Whether the build generates `file` rather than reading it from the source tree.
    pub fn is_generated(&self, file: &Path) -> bool {
        file.to_str().is_some_and(|file| self.generated.contains(file))
    }

    pub fn header_sources(&self) -> &[PathBuf] {
        &self.header_sources
    }

    pub fn extra_sources(&self) -> &[PathBuf] {
        &self.extra_sources
    }

    pub fn excluded_sources(&self) -> &[PathBuf] {
        &self.excluded_sources
    }

    pub fn properties(&self, kind: PropertyKind) -> &PropertyLists {
        &self.properties[kind.index()]
    }
}

/// Per-file property entries appended after the target-level lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOverride {
    path: Option<PathBuf>,
    lists: [Option<Vec<String>>; 3],
}

impl SourceOverride {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn property(&self, kind: PropertyKind) -> Option<&[String]> {
        self.lists[kind.index()].as_deref()
    }
}

/// An immutable, loaded build description.
#[derive(Debug, Clone)]
pub struct MetadataDocument {
    info: DocumentInfo,
    compilers: [CompilerIdentity; 2],
    targets: IndexMap<String, TargetDescriptor>,
    sources: FxHashMap<String, SourceOverride>,
}

impl MetadataDocument {
    /// Decode a payload into a document.
    ///
    /// Fails with [`MetadataError::MalformedInput`] when the text is not JSON or
    /// a value has the wrong type, and with [`MetadataError::SchemaMismatch`]
    /// when a target classifies one file as two languages.
    pub fn from_json(payload: &str) -> Result<Self> {
        let raw: RawDocument =
            serde_json::from_str(payload).map_err(|source| MetadataError::MalformedInput {
                input: "metadata",
                source,
            })?;
        Self::from_raw(raw)
    }

    /// Decode an already parsed payload.
    pub fn from_value(payload: serde_json::Value) -> Result<Self> {
        let raw: RawDocument =
            serde_json::from_value(payload).map_err(|source| MetadataError::MalformedInput {
                input: "metadata",
                source,
            })?;
        Self::from_raw(raw)
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn compiler(&self, language: Language) -> &CompilerIdentity {
        &self.compilers[language.index()]
    }

    /// Look up a target by name.
    pub fn target(&self, name: &str) -> Result<&TargetDescriptor> {
        self.targets
            .get(name)
            .ok_or_else(|| MetadataError::TargetNotFound(name.to_string()))
    }

    /// All targets, in document order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetDescriptor> {
        self.targets.values()
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn source_override(&self, file: &Path) -> Option<&SourceOverride> {
        file.to_str().and_then(|file| self.sources.get(file))
    }

    pub fn source_override_count(&self) -> usize {
        self.sources.len()
    }

    fn from_raw(raw: RawDocument) -> Result<Self> {
        let compilers = [
            CompilerIdentity {
                path: raw.c_compiler,
                id: raw.c_compiler_id,
                version: raw.c_compiler_version,
            },
            CompilerIdentity {
                path: raw.cxx_compiler,
                id: raw.cxx_compiler_id,
                version: raw.cxx_compiler_version,
            },
        ];

        let mut targets = IndexMap::with_capacity(raw.targets.len());
        for (key, target) in raw.targets {
            let descriptor = target.into_descriptor(&key)?;
            targets.insert(key, descriptor);
        }

        let mut sources = FxHashMap::default();
        for (key, source) in raw.sources {
            let source = source.into_override(&key)?;
            sources.insert(key, source);
        }

        let document = MetadataDocument {
            info: DocumentInfo {
                source_dir: raw.source_dir.map(PathBuf::from),
                generator: raw.generator,
                platform: raw.platform,
            },
            compilers,
            targets,
            sources,
        };

        for file in document.sources.keys() {
            let compiled = document
                .targets
                .values()
                .any(|t| t.classification.contains_key(file));
            if !compiled {
                tracing::warn!(
                    file = %file,
                    "source properties recorded for a file no target compiles"
                );
            }
        }

        Ok(document)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocument {
    #[serde(rename = "sourceDir")]
    source_dir: Option<String>,
    generator: Option<String>,
    platform: Option<String>,
    c_compiler: Option<String>,
    c_compiler_id: Option<String>,
    c_compiler_version: Option<String>,
    cxx_compiler: Option<String>,
    cxx_compiler_id: Option<String>,
    cxx_compiler_version: Option<String>,
    targets: IndexMap<String, RawTarget>,
    sources: IndexMap<String, RawSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTarget {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<TargetKind>,
    backtrace: Vec<BacktraceFrame>,
    target_file: Option<String>,
    target_linker_file: Option<String>,
    target_soname_file: Option<String>,

    object_sources_c: Vec<String>,
    object_sources_cxx: Vec<String>,
    generated_object_sources_c: Vec<String>,
    generated_object_sources_cxx: Vec<String>,
    header_sources: Vec<String>,
    generated_header_sources: Vec<String>,
    extra_sources: Vec<String>,
    generated_extra_sources: Vec<String>,
    excluded_sources: Vec<String>,

    compile_definitions: Option<RawList>,
    compile_definitions_c: Option<RawList>,
    compile_definitions_cxx: Option<RawList>,
    include_directories: Option<RawList>,
    include_directories_c: Option<RawList>,
    include_directories_cxx: Option<RawList>,
    compile_options: Option<RawList>,
    compile_options_c: Option<RawList>,
    compile_options_cxx: Option<RawList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSource {
    path: Option<String>,
    compile_definitions: Option<RawList>,
    include_directories: Option<RawList>,
    compile_options: Option<RawList>,
    /// The generator's name for per-file options; appended after `compile_options`.
    compile_flags: Option<RawList>,
}

/// A property value: an array, or a single space-joined string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawList {
    Items(Vec<String>),
    Joined(String),
}

impl RawList {
    /// Joined strings are split with shell quoting rules, as the generator
    /// quotes arguments that contain spaces.
    fn into_vec(self, pointer: impl FnOnce() -> String) -> Result<Vec<String>> {
        match self {
            RawList::Items(items) => Ok(items),
            RawList::Joined(s) => shlex::split(&s).ok_or_else(|| {
                MetadataError::mismatch(pointer(), format!("unbalanced quoting in '{}'", s))
            }),
        }
    }
}

fn list(value: Option<RawList>, pointer: impl FnOnce() -> String) -> Result<Option<Vec<String>>> {
    value.map(|v| v.into_vec(pointer)).transpose()
}

fn lists(
    pointer: &str,
    kind: PropertyKind,
    base: Option<RawList>,
    c: Option<RawList>,
    cxx: Option<RawList>,
) -> Result<PropertyLists> {
    let key = |suffix: Option<Language>| match suffix {
        Some(lang) => format!("{}/{}_{}", pointer, kind.key(), lang.key_suffix()),
        None => format!("{}/{}", pointer, kind.key()),
    };
    Ok(PropertyLists {
        base: list(base, || key(None))?,
        per_language: [
            list(c, || key(Some(Language::C)))?,
            list(cxx, || key(Some(Language::Cxx)))?,
        ],
    })
}

fn paths(list: Vec<String>) -> impl Iterator<Item = PathBuf> {
    list.into_iter().map(PathBuf::from)
}

/// Escape a key for use in a JSON pointer.
fn pointer_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

impl RawTarget {
    fn into_descriptor(self, key: &str) -> Result<TargetDescriptor> {
        let pointer = format!("/targets/{}", pointer_token(key));
        let mut classification = IndexMap::new();
        let mut generated = FxHashSet::default();

        let object_lists = [
            (self.object_sources_c, Language::C, false),
            (self.object_sources_cxx, Language::Cxx, false),
            (self.generated_object_sources_c, Language::C, true),
            (self.generated_object_sources_cxx, Language::Cxx, true),
        ];
        for (files, language, is_generated) in object_lists {
            for file in files {
                if let Some(previous) = classification.get(&file) {
                    if *previous != language {
                        return Err(MetadataError::mismatch(
                            pointer.clone(),
                            format!(
                                "{} is listed as both {} and {} object source",
                                file,
                                previous,
                                language
                            ),
                        ));
                    }
                    continue;
                }
                if is_generated {
                    generated.insert(file.clone());
                }
                classification.insert(file, language);
            }
        }

        let mut header_sources: Vec<PathBuf> = paths(self.header_sources).collect();
        for file in self.generated_header_sources {
            header_sources.push(PathBuf::from(&file));
            generated.insert(file);
        }
        let mut extra_sources: Vec<PathBuf> = paths(self.extra_sources).collect();
        for file in self.generated_extra_sources {
            extra_sources.push(PathBuf::from(&file));
            generated.insert(file);
        }

        Ok(TargetDescriptor {
            name: self.name.unwrap_or_else(|| key.to_string()),
            kind: self.kind,
            backtrace: self.backtrace,
            artifacts: TargetArtifacts {
                target_file: self.target_file.map(PathBuf::from),
                linker_file: self.target_linker_file.map(PathBuf::from),
                soname_file: self.target_soname_file.map(PathBuf::from),
            },
            classification,
            generated,
            header_sources,
            extra_sources,
            excluded_sources: paths(self.excluded_sources).collect(),
            properties: [
                lists(
                    &pointer,
                    PropertyKind::CompileDefinitions,
                    self.compile_definitions,
                    self.compile_definitions_c,
                    self.compile_definitions_cxx,
                )?,
                lists(
                    &pointer,
                    PropertyKind::IncludeDirectories,
                    self.include_directories,
                    self.include_directories_c,
                    self.include_directories_cxx,
                )?,
                lists(
                    &pointer,
                    PropertyKind::CompileOptions,
                    self.compile_options,
                    self.compile_options_c,
                    self.compile_options_cxx,
                )?,
            ],
        })
    }
}

impl RawSource {
    fn into_override(self, key: &str) -> Result<SourceOverride> {
        let pointer = format!("/sources/{}", pointer_token(key));
        let at = |name: &str| format!("{}/{}", pointer, name);

        let options = list(self.compile_options, || at("compile_options"))?;
        let flags = list(self.compile_flags, || at("compile_flags"))?;
        let options = match (options, flags) {
            (Some(mut options), Some(flags)) => {
                options.extend(flags);
                Some(options)
            }
            (options, flags) => options.or(flags),
        };

        Ok(SourceOverride {
            path: self.path.map(PathBuf::from),
            lists: [
                list(self.compile_definitions, || at("compile_definitions"))?,
                list(self.include_directories, || at("include_directories"))?,
                options,
            ],
        })
    }
}

/// The generator writes backtrace lines as strings; accept numbers too.
fn line_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Line {
        Number(u32),
        Text(String),
    }

    match Line::deserialize(deserializer)? {
        Line::Number(n) => Ok(n),
        Line::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
