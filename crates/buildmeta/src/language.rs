use std::fmt;
use std::str::FromStr;

/// A compiled source language known to the metadata format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    C,
    Cxx,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::C, Language::Cxx];

    /// Position in per-language tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Language::C => 0,
            Language::Cxx => 1,
        }
    }

    /// The lowercase suffix used by metadata keys, e.g. `object_sources_cxx`.
    pub fn key_suffix(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "cxx",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::C => f.write_str("C"),
            Language::Cxx => f.write_str("CXX"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" => Ok(Language::C),
            "cxx" | "c++" | "cpp" => Ok(Language::Cxx),
            _ => Err(format!("unknown language '{}'", s)),
        }
    }
}

/// A compile property carried per target and per source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    CompileDefinitions,
    IncludeDirectories,
    CompileOptions,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 3] = [
        PropertyKind::CompileDefinitions,
        PropertyKind::IncludeDirectories,
        PropertyKind::CompileOptions,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            PropertyKind::CompileDefinitions => 0,
            PropertyKind::IncludeDirectories => 1,
            PropertyKind::CompileOptions => 2,
        }
    }

    /// The unsuffixed metadata key for this property.
    pub fn key(self) -> &'static str {
        match self {
            PropertyKind::CompileDefinitions => "compile_definitions",
            PropertyKind::IncludeDirectories => "include_directories",
            PropertyKind::CompileOptions => "compile_options",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
