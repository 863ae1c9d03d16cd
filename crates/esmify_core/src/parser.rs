use anyhow::{Context, Result};
use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::{ParseOptions, Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse source: {}", messages.join("; "))]
pub struct ParseFailure {
    pub messages: Vec<String>,
}

/// Source type for a CommonJS input file. Everything is parsed as a script,
/// `.mjs`/`.mts` files are not CommonJS and never reach the parser.
pub fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    SourceType::default()
        .with_module(false)
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("cts")))
}

pub fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    source_type: SourceType,
) -> std::result::Result<Program<'a>, ParseFailure> {
    // CommonJS modules run inside a function wrapper, so a top-level `return` is legal
    let options = ParseOptions { allow_return_outside_function: true, ..ParseOptions::default() };
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(allocator, source, source_type).with_options(options).parse();
    if panicked || !errors.is_empty() {
        debug!("Parser reported {} errors (panicked: {})", errors.len(), panicked);
        return Err(ParseFailure { messages: errors.iter().map(|e| e.to_string()).collect() });
    }
    trace!("Parsed {} top-level statements", program.body.len());
    Ok(program)
}

pub fn read_source(file: &Path) -> Result<String> {
    trace!("Reading source: {}", file.display());
    fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_source_type_for_js() {
        let st = source_type_for(Path::new("lib/index.js"));
        assert!(st.is_script());
        assert!(!st.is_jsx());
        assert!(!st.is_typescript());
    }

    #[test]
    fn test_source_type_for_jsx_and_ts() {
        assert!(source_type_for(Path::new("a.jsx")).is_jsx());
        assert!(source_type_for(Path::new("a.cts")).is_typescript());
        assert!(source_type_for(Path::new("a.tsx")).is_jsx());
    }

    #[test]
    fn test_parse_program_script_features() {
        // top-level return and `with` are only legal in scripts
        let allocator = Allocator::default();
        let src = "if (done) return;\nwith (obj) { x; }\nmodule.exports = 1;";
        let program = parse_program(&allocator, src, source_type_for(Path::new("a.js"))).unwrap();
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_parse_program_error() {
        let allocator = Allocator::default();
        let err = parse_program(&allocator, "const = ;", source_type_for(Path::new("a.js")))
            .unwrap_err();
        assert!(!err.messages.is_empty());
    }

    #[test]
    fn test_read_source_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing: PathBuf = temp_dir.path().join("missing.js");
        let err = read_source(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
