use esmify_core::{Editor, SourceMap, parse_program};
use log::debug;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_span::SourceType;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::classifier::classify;
use crate::error::TransformError;
use crate::export_plan::ExportPlan;
use crate::export_writer::write_exports;
use crate::import_writer::write_imports;
use crate::options::{Style, TransformOptions, Warning};
use crate::style::StyleResolver;

/// The rewritten module and what was learned while rewriting it.
#[derive(Debug, Clone, Serialize)]
pub struct TransformOutput {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<SourceMap>,
    /// Whether any edit was made. When false `code` is the input verbatim.
    pub is_touched: bool,
    /// Style chosen for every imported module id.
    pub import_styles: BTreeMap<String, Style>,
    pub imported_properties: BTreeMap<String, Vec<String>>,
    pub export_plan: ExportPlan,
    pub warnings: Vec<Warning>,
}

/// Rewrites the CommonJS constructs of an already parsed program.
///
/// `source` must be the text `program` was parsed from; every edit is made
/// against its byte offsets.
pub fn transform(
    program: &Program<'_>,
    source: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, TransformError> {
    let analysis = classify(program, options);
    let mut editor = Editor::new(source);
    let mut resolver = StyleResolver::new(&options.import_style, &options.export_style);

    let (import_styles, export_plan) = if analysis.has_cjs() {
        let import_styles = write_imports(&mut editor, &analysis, &mut resolver)?;
        let export_plan = write_exports(&mut editor, &analysis, &mut resolver, options.hoist)?;
        (import_styles, export_plan)
    } else {
        debug!("No CommonJS constructs found");
        (BTreeMap::new(), ExportPlan::None)
    };

    let is_touched = editor.has_changed();
    let code = if is_touched { editor.to_string() } else { source.to_string() };
    let map = options
        .source_map
        .as_ref()
        .map(|sm| editor.generate_map(&sm.source_name, sm.include_content));
    debug!(
        "Transformed module: touched={}, {} imports, exports {:?}",
        is_touched,
        import_styles.len(),
        export_plan
    );

    Ok(TransformOutput {
        code,
        map,
        is_touched,
        import_styles,
        imported_properties: analysis.imported_properties,
        export_plan,
        warnings: analysis.warnings,
    })
}

/// Parses `source` as a script and transforms it.
pub fn transform_source(
    source: &str,
    source_type: SourceType,
    options: &TransformOptions,
) -> Result<TransformOutput, TransformError> {
    let allocator = Allocator::default();
    let program = parse_program(&allocator, source, source_type)?;
    transform(&program, source, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformErrorKind;
    use crate::options::{ExportStyle, ImportStyle, SourceMapOptions};
    use crate::test_util::{convert, transform_script};
    use pretty_assertions::assert_eq;

    fn all_options() -> Vec<TransformOptions> {
        let mut out = Vec::new();
        for style in [Style::Default, Style::Named] {
            for nested in [false, true] {
                for dynamic_import in [false, true] {
                    out.push(TransformOptions {
                        import_style: ImportStyle::Fixed(style),
                        export_style: ExportStyle::Fixed(style),
                        nested,
                        dynamic_import,
                        ..TransformOptions::default()
                    });
                }
            }
        }
        out
    }

    #[test]
    fn test_untouched_without_commonjs() {
        let src = "const x = load(\"x\");\nconst y = x + 1;\nfunction f() { return this; }\n";
        for options in all_options() {
            let output = transform_script(src, &options).unwrap();
            assert!(!output.is_touched, "{options:?}");
            assert_eq!(output.code, src);
            assert_eq!(output.export_plan, ExportPlan::None);
        }
    }

    #[test]
    fn test_shadowed_require_untouched() {
        let src = "function f(require) {\n  return require(\"foo\");\n}\n";
        for options in all_options() {
            let output = transform_script(src, &options).unwrap();
            assert!(!output.is_touched, "{options:?}");
            assert_eq!(output.code, src);
        }
    }

    #[test]
    fn test_repeated_require_hoisted_once() {
        let src = "const a = require(\"foo\");\nconst b = require(\"foo\").b;\n";
        assert_eq!(
            convert(src, TransformOptions::default()),
            "import * as _require_foo_ from \"foo\";\nconst a = _require_foo_;\nconst b = _require_foo_.b;\n"
        );
    }

    #[test]
    fn test_imports_and_exports_together() {
        let src = "const path = require(\"path\");\nexports.join = (...p) => path.join(...p);\n";
        assert_eq!(
            convert(src, TransformOptions::default()),
            "import * as path from \"path\";\nexport const join = (...p) => path.join(...p);\n"
        );
    }

    #[test]
    fn test_dynamic_import_with_nested_require_fn() {
        let options = TransformOptions { dynamic_import: true, ..TransformOptions::default() };
        let src = "async function load() {\n  return Promise.resolve(require(\"foo\"));\n}\n";
        assert_eq!(
            convert(src, options),
            "async function load() {\n  return import(\"foo\");\n}\n"
        );
    }

    #[test]
    fn test_parse_error() {
        let err = transform_source("const = ;", SourceType::default(), &TransformOptions::default())
            .unwrap_err();
        assert!(matches!(err.kind, TransformErrorKind::Parse(_)));
        assert_eq!(err.pos, None);
    }

    #[test]
    fn test_source_map() {
        let options = TransformOptions {
            source_map: Some(SourceMapOptions {
                source_name: "input.js".to_string(),
                include_content: true,
            }),
            ..TransformOptions::default()
        };
        let src = "module.exports = 5;";
        let output = transform_script(src, &options).unwrap();
        let map = output.map.unwrap();
        assert_eq!(map.version, 3);
        assert_eq!(map.sources, vec!["input.js".to_string()]);
        assert_eq!(map.sources_content, Some(vec![src.to_string()]));
        assert!(!map.mappings.is_empty());
    }

    #[test]
    fn test_output_reports_analysis() {
        let src = "const {a} = require(\"x\");\nconst y = require(\"y\");\ny.z;\n";
        let output = transform_script(src, &TransformOptions::default()).unwrap();
        assert_eq!(output.imported_properties["x"], vec!["a".to_string()]);
        assert_eq!(output.imported_properties["y"], vec!["z".to_string()]);
        assert_eq!(output.import_styles["x"], Style::Named);
        assert!(output.warnings.is_empty());
    }
}
