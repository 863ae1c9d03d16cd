//! CommonJS to ES module rewriting.
//!
//! The engine works on a parsed oxc program and its source text:
//! - A scope pre-pass and one classification walk find every `require`,
//!   `module` and `exports` use that can be expressed as ESM
//! - The import writer turns require calls into import declarations
//! - The export writer picks one export strategy for the whole module and
//!   applies it
//!
//! All edits go through one [`esmify_core::Editor`], so untouched code is
//! copied byte for byte.

mod classifier;
mod error;
mod export_plan;
mod export_writer;
mod import_writer;
mod model;
mod names;
mod options;
mod scope;
mod sites;
mod style;
mod transformer;

// Re-export public API
pub use error::{TransformError, TransformErrorKind};
pub use export_plan::{ExportPlan, NamedStrategy, WrapperReason};
pub use names::path_to_name;
pub use options::{
    ExportPolicy, ExportStyle, ImportPolicy, ImportStyle, SourceMapOptions, Style,
    TransformOptions, WarnSink, Warning,
};
pub use transformer::{TransformOutput, transform, transform_source};

#[cfg(test)]
pub(crate) mod test_util {
    use oxc_span::SourceType;

    use crate::{TransformError, TransformOptions, TransformOutput, transform_source};

    pub fn transform_script(
        src: &str,
        options: &TransformOptions,
    ) -> Result<TransformOutput, TransformError> {
        transform_source(src, SourceType::default().with_module(false), options)
    }

    pub fn convert(src: &str, options: TransformOptions) -> String {
        transform_script(src, &options).unwrap().code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{convert, transform_script};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_require_named() {
        assert_eq!(
            convert("const foo = require(\"foo\");\nfoo.bar();", TransformOptions::default()),
            "import * as foo from \"foo\";\nfoo.bar();"
        );
    }

    #[test]
    fn test_object_of_locals() {
        let src = "const a = 1;\nfunction b() {}\nmodule.exports = {a, b};";
        assert_eq!(
            convert(src, TransformOptions::default()),
            "const a = 1;\nfunction b() {}\nexport {a};\nexport {b};"
        );
    }

    #[test]
    fn test_named_exports_without_default() {
        let output =
            transform_script("exports.a = 1;\nexports.b = 2;", &TransformOptions::default())
                .unwrap();
        assert_eq!(output.code, "export const a = 1;\nexport const b = 2;");
        assert!(!output.code.contains("export default"));
    }

    #[test]
    fn test_reassigned_exports_uses_wrapper() {
        let output =
            transform_script("exports = {};", &TransformOptions::default()).unwrap();
        assert_eq!(
            output.export_plan,
            ExportPlan::Wrapper { reason: WrapperReason::BareReference }
        );
        assert!(output.code.ends_with("export default _exports_;"));
    }

    #[test]
    fn test_export_style_policy_called_once() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let options = TransformOptions {
            export_style: ExportStyle::policy(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Style::Named
            }),
            ..TransformOptions::default()
        };
        convert("exports.a = 1;\nexports.b = 2;", options);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_import_policy_per_module() {
        let options = TransformOptions {
            import_style: ImportStyle::policy(|id| {
                if id.starts_with('.') { Style::Default } else { Style::Named }
            }),
            ..TransformOptions::default()
        };
        assert_eq!(
            convert("const a = require(\"./a\");\nconst b = require(\"b\");", options),
            "import a from \"./a\";\nimport * as b from \"b\";"
        );
    }
}
