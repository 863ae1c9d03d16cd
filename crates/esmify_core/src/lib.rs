//! Core utilities for esmify tools.
//!
//! This crate provides the pieces shared by the transform engine and the
//! command line converter:
//! - Parsing CommonJS sources with oxc
//! - A chunk based text editor that renders edits in one pass
//! - V3 source map generation for edited output
//! - Collecting input files and locating `esmify.json`

mod collector;
mod config;
mod constants;
mod editor;
mod parser;
mod sourcemap;

// Re-export public API
pub use collector::{CollectorConfig, collect_inputs};
pub use config::{find_config_file, find_config_file_from, read_config};
pub use constants::{CJS_EXTENSIONS, CONFIG_FILE_NAME, SKIP_DIRS};
pub use editor::{EditError, Editor};
pub use parser::{ParseFailure, parse_program, read_source, source_type_for};
pub use sourcemap::SourceMap;
