//! Per-file compile property queries over generated build metadata.
//!
//! The build system writes a `cmake-metadata.json` document describing every
//! target: which files it compiles and as which language, and its compile
//! definitions, include directories and compile options. Files may carry
//! extra entries of their own. This crate provides:
//! - Loading and structural schema validation of the document
//! - Per-(target, file) property resolution
//! - A compile_commands.json view of the same data
//!
//! # Example
//!
//! ```json
//! {
//!   "cxx_compiler": "/usr/bin/clang++",
//!   "targets": {
//!     "main": {
//!       "object_sources_cxx": ["/src/main.cpp", "/src/compiled_as_cxx.c"],
//!       "compile_definitions": ["MAIN_DEF"]
//!     }
//!   },
//!   "sources": {
//!     "/src/main.cpp": { "compile_definitions": ["THIS_IS_THE_MAIN_FILE"] }
//!   }
//! }
//! ```
//!
//! Resolving `compile_definitions` for `("main", "/src/main.cpp")` yields
//! `["MAIN_DEF", "THIS_IS_THE_MAIN_FILE"]`, and `/src/compiled_as_cxx.c` is
//! compiled with `/usr/bin/clang++` whatever its suffix says.

mod compile_commands;
mod config;
mod document;
mod error;
mod language;
mod logging;
mod resolve;
mod schema;
mod store;

pub use compile_commands::{CompileCommand, CompileCommands};
pub use config::{LoggingConfig, MetadataConfig, SessionConfig, METADATA_FILE_NAME, SCHEMA_FILE_NAME};
pub use document::{
    BacktraceFrame, CompilerIdentity, DocumentInfo, MetadataDocument, PropertyLists, SourceOverride,
    TargetArtifacts, TargetDescriptor, TargetKind,
};
pub use error::{MetadataError, Result};
pub use language::{Language, PropertyKind};
pub use logging::init_tracing;
pub use resolve::PropertyResolver;
pub use schema::{Schema, Validation};
pub use store::MetadataStore;
