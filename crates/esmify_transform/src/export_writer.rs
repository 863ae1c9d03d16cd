use esmify_core::Editor;
use log::trace;
use std::collections::HashSet;

use crate::classifier::Analysis;
use crate::error::{TransformError, TransformErrorKind};
use crate::export_plan::{
    Buckets, ExportPlan, ExportStrategy, NamedStrategy, ObjectSplit, plan_exports,
};
use crate::names::{export_binding_name, is_reserved_word};
use crate::sites::{EntryValue, ExportObject, ExportShape, ExportSite, ValueKind};
use crate::style::StyleResolver;

const MODULE_EXPORTS: &str = "_module_exports_";

/// Rewrites every `module`/`exports` reference according to the plan chosen
/// for the module, and returns that plan.
pub fn write_exports(
    editor: &mut Editor<'_>,
    analysis: &Analysis<'_>,
    resolver: &mut StyleResolver<'_>,
    hoist: bool,
) -> Result<ExportPlan, TransformError> {
    let buckets = Buckets::new(analysis);
    let strategy = plan_exports(&buckets, analysis, editor.source(), resolver);

    match &strategy {
        ExportStrategy::None => {}
        ExportStrategy::Wrapper(_) => write_wrapper(editor, analysis, hoist)?,
        ExportStrategy::ObjectSplit(split) => {
            write_object_split(editor, split).map_err(|e| e.with_pos_if_missing(split.start))?;
        }
        ExportStrategy::DefaultDirect(site) => {
            write_default_direct(editor, site)
                .map_err(|e| e.with_pos_if_missing(site.leftmost.start))?;
        }
        ExportStrategy::DefaultMutable { sites, members, init_in_place } => {
            write_default_mutable(editor, sites, members, *init_in_place)
                .map_err(|e| e.with_pos_if_missing(sites[0].leftmost.start))?;
        }
        ExportStrategy::Named(strategies) => {
            for ((name, sites), strategy) in buckets.named.iter().zip(strategies) {
                trace!("export {:?} as {:?}", name, strategy);
                let written = match strategy {
                    NamedStrategy::Direct => {
                        write_named_direct(editor, name, sites, &analysis.used_names)
                    }
                    NamedStrategy::Mutable => write_named_mutable(editor, name, sites),
                };
                written.map_err(|e| e.with_pos_if_missing(sites[0].leftmost.start))?;
            }
        }
    }
    Ok(strategy.plan())
}

fn first_root(sites: &[ExportSite<'_>]) -> Option<u32> {
    sites.iter().map(|s| s.root).min()
}

/// Keeps the CommonJS objects alive as local bindings and exports the final
/// value of `module.exports` as the default export.
fn write_wrapper(
    editor: &mut Editor<'_>,
    analysis: &Analysis<'_>,
    hoist: bool,
) -> Result<(), TransformError> {
    let first = analysis
        .module_sites
        .iter()
        .chain(&analysis.exports_sites)
        .map(|s| s.leftmost.start)
        .min()
        .unwrap_or(0);
    if !hoist {
        return Err(TransformError::new(TransformErrorKind::HoistDisabled, Some(first)));
    }

    let module_root = first_root(&analysis.module_sites);
    let exports_root = first_root(&analysis.exports_sites);
    if let Some(root) = exports_root {
        let root = module_root.map_or(root, |m| m.min(root));
        editor.append_left(root, "let _exports_ = {};\n")?;
    }
    if let Some(root) = module_root {
        let initial = if exports_root.is_some() { "_exports_" } else { "{}" };
        editor.append_left(root, &format!("const _module_ = {{exports: {initial}}};\n"))?;
    }

    for site in analysis.module_sites.iter().chain(&analysis.exports_sites) {
        let name = match site.object {
            ExportObject::Module => "_module_",
            ExportObject::Exports => "_exports_",
        };
        editor.overwrite(site.leftmost.start, site.leftmost.end, name, true)?;
    }

    let exported = if module_root.is_some() { "_module_.exports" } else { "_exports_" };
    if let Some(last) = analysis.last_root() {
        editor.append_left(last.end, &format!("\nexport default {exported};"))?;
    }
    Ok(())
}

/// `module.exports = {a, b: 1}` becomes one named export per property.
fn write_object_split(
    editor: &mut Editor<'_>,
    split: &ObjectSplit<'_, '_>,
) -> Result<(), TransformError> {
    let mut start = split.start;
    for (index, entry) in split.entries.iter().enumerate() {
        if index > 0 {
            editor.append_left(start, "\n")?;
        }
        match entry.value {
            EntryValue::Binding | EntryValue::Import => {
                let local = match entry.value {
                    EntryValue::Binding => editor.slice(entry.value_start, entry.value_end),
                    _ => "",
                };
                let alias =
                    if local == entry.key { String::new() } else { format!(" as {}", entry.key) };
                editor.overwrite(start, entry.value_start, "export {", true)?;
                editor.append_left(entry.value_end, &format!("{alias}}}"))?;
            }
            EntryValue::Method { .. } | EntryValue::Other => {
                let binding = export_binding_name(entry.key);
                let prefix = match entry.value {
                    EntryValue::Method { is_async, generator } => format!(
                        "{}function{} ",
                        if is_async { "async " } else { "" },
                        if generator { "*" } else { "" }
                    ),
                    _ => String::new(),
                };
                let decl = format!("const {binding} = {prefix}");
                editor.overwrite(start, entry.value_start, &decl, true)?;
                editor.append_left(
                    entry.value_end,
                    &format!(";\nexport {{{binding} as {}}}", entry.key),
                )?;
            }
        }
        editor.append_left(entry.value_end, ";")?;
        start = entry.value_end;
    }
    editor.remove(start, split.statement.end)?;
    Ok(())
}

/// A single `module.exports = value` becomes `export default value`.
fn write_default_direct(
    editor: &mut Editor<'_>,
    site: &ExportSite<'_>,
) -> Result<(), TransformError> {
    match &site.shape {
        ExportShape::Assign { value, statement, .. } => {
            editor.overwrite(site.leftmost.start, value.span.start, "export default ", false)?;
            match value.kind {
                // a named function or class would otherwise become a declaration
                ValueKind::NamedFunction => {
                    editor.append_left(value.span.start, "(")?;
                    editor.safe_overwrite(value.span.end, statement.end, ");")?;
                }
                ValueKind::AnonymousFunction => editor.remove(value.span.end, statement.end)?,
                ValueKind::Iife { head } => {
                    editor.append_right(head.start, "(")?;
                    editor.append_left(head.end, ")")?;
                    editor.safe_overwrite(value.span.end, statement.end, ";")?;
                }
                _ => editor.safe_overwrite(value.span.end, statement.end, ";")?,
            }
        }
        ExportShape::Declare { id, id_span, value, declaration, .. } => {
            editor.overwrite(id_span.end, value.span.start, " = ", false)?;
            editor.remove(value.span.end, declaration.end)?;
            editor.append_left(declaration.end, &format!(";\nexport default {id};"))?;
        }
        ExportShape::Nested { .. } | ExportShape::Bare => {}
    }
    Ok(())
}

fn is_reassigned(sites: &[&ExportSite<'_>]) -> bool {
    sites.iter().any(|s| matches!(s.shape, ExportShape::Nested { is_assignment: true, .. }))
}

fn rename_module_exports(
    editor: &mut Editor<'_>,
    site: &ExportSite<'_>,
) -> Result<(), TransformError> {
    if let Some(span) = site.module_exports {
        editor.overwrite(span.start, span.end, MODULE_EXPORTS, true)?;
    }
    Ok(())
}

/// The default export lives in `_module_exports_`, exported as a live binding.
/// `members` are `module.exports.name` references, which become properties of
/// that binding.
fn write_default_mutable(
    editor: &mut Editor<'_>,
    sites: &[&ExportSite<'_>],
    members: &[&ExportSite<'_>],
    init_in_place: bool,
) -> Result<(), TransformError> {
    if init_in_place {
        let kind = if is_reassigned(sites) { "let" } else { "const" };
        for site in sites {
            match &site.shape {
                ExportShape::Assign { left, statement, .. } => {
                    let decl = format!("{kind} {MODULE_EXPORTS}");
                    editor.overwrite(left.start, left.end, &decl, true)?;
                    editor.append_left(
                        statement.end,
                        &format!("\nexport {{{MODULE_EXPORTS} as default}};"),
                    )?;
                }
                _ => rename_module_exports(editor, site)?,
            }
        }
    } else {
        let reassigned = is_reassigned(sites) || sites.iter().any(|s| s.is_init());
        let kind = if reassigned { "let" } else { "const" };
        let top = sites.iter().chain(members).map(|s| s.root).min().unwrap_or(0);
        editor.append_left(
            top,
            &format!("{kind} {MODULE_EXPORTS} = {{}};\nexport {{{MODULE_EXPORTS} as default}};\n"),
        )?;
        for site in sites {
            rename_module_exports(editor, site)?;
        }
    }
    for member in members {
        rename_module_exports(editor, member)?;
    }
    Ok(())
}

/// `export const name = value` needs a name nothing else in the module uses.
fn can_bind_directly(name: &str, used_names: &HashSet<String>) -> bool {
    !is_reserved_word(name) && !used_names.contains(name)
}

fn write_named_direct(
    editor: &mut Editor<'_>,
    name: &str,
    sites: &[&ExportSite<'_>],
    used_names: &HashSet<String>,
) -> Result<(), TransformError> {
    let Some(init) = sites.iter().find(|s| s.is_init()) else { return Ok(()) };
    let nested: Vec<&&ExportSite<'_>> = sites.iter().filter(|s| !s.is_init()).collect();

    match &init.shape {
        ExportShape::Declare { id, id_span, kind, key, value, declaration, .. } => {
            match key {
                Some(key) if *id == name => {
                    let prefix = format!("export {kind} ");
                    editor.overwrite(declaration.start, key.start, &prefix, false)?;
                }
                _ => {
                    editor.overwrite(id_span.end, value.span.start, " = ", false)?;
                    editor.remove(value.span.end, declaration.end)?;
                    editor.append_left(declaration.end, &format!(";\nexport {{{id} as {name}}};"))?;
                }
            }
        }
        ExportShape::Assign { value, statement, .. } => {
            let start = init.leftmost.start;
            let binding = export_binding_name(name);
            if !nested.is_empty() {
                let kind = if is_reassigned(sites) { "let" } else { "const" };
                editor.overwrite(start, value.span.start, &format!("{kind} {binding} = "), true)?;
                editor.safe_overwrite(
                    value.span.end,
                    statement.end,
                    &format!(";\nexport {{{binding} as {name}}};"),
                )?;
                for site in nested {
                    if let ExportShape::Nested { node, .. } = &site.shape {
                        editor.overwrite(node.start, node.end, &binding, true)?;
                    }
                }
            } else if matches!(value.kind, ValueKind::Binding | ValueKind::Import) {
                let local = match value.kind {
                    ValueKind::Binding => editor.slice(value.span.start, value.span.end),
                    _ => "",
                };
                let alias = if local == name { String::new() } else { format!(" as {name}") };
                editor.overwrite(start, value.span.start, "export {", true)?;
                editor.safe_overwrite(value.span.end, statement.end, &format!("{alias}}};"))?;
            } else if can_bind_directly(name, used_names) {
                let prefix = format!("export const {name} = ");
                editor.overwrite(start, value.span.start, &prefix, true)?;
                editor.safe_overwrite(value.span.end, statement.end, ";")?;
            } else {
                editor.overwrite(start, value.span.start, &format!("const {binding} = "), true)?;
                editor.safe_overwrite(
                    value.span.end,
                    statement.end,
                    &format!(";\nexport {{{binding} as {name}}};"),
                )?;
            }
        }
        ExportShape::Nested { .. } | ExportShape::Bare => {}
    }
    Ok(())
}

/// Declares `let _export_<name>_` ahead of every use and exports it as a live
/// binding.
fn write_named_mutable(
    editor: &mut Editor<'_>,
    name: &str,
    sites: &[&ExportSite<'_>],
) -> Result<(), TransformError> {
    let binding = export_binding_name(name);
    let top = sites.iter().map(|s| s.root).min().unwrap_or(0);
    editor.append_left(top, &format!("let {binding};\nexport {{{binding} as {name}}};\n"))?;
    for site in sites {
        let span = match &site.shape {
            ExportShape::Assign { left, .. } | ExportShape::Declare { left, .. } => *left,
            ExportShape::Nested { node, .. } => *node,
            ExportShape::Bare => continue,
        };
        editor.overwrite(span.start, span.end, &binding, true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::error::TransformErrorKind;
    use crate::options::{ExportStyle, ImportStyle, Style, TransformOptions};
    use crate::test_util::{convert, transform_script};
    use pretty_assertions::assert_eq;

    fn esm(src: &str) -> String {
        convert(src, TransformOptions::default())
    }

    fn nested(src: &str) -> String {
        convert(src, TransformOptions { nested: true, ..TransformOptions::default() })
    }

    #[test]
    fn test_default_direct() {
        assert_eq!(esm("module.exports = 5;"), "export default 5;");
        assert_eq!(
            esm("module.exports = {a: 1}; // default"),
            "export default {a: 1}; // default"
        );
        assert_eq!(
            esm("module.exports = require(\"foo\");"),
            "import * as _require_foo_ from \"foo\";\nexport default _require_foo_;"
        );
    }

    #[test]
    fn test_default_reexport_of_default_import() {
        let options = TransformOptions {
            import_style: ImportStyle::Fixed(Style::Default),
            export_style: ExportStyle::Fixed(Style::Default),
            ..TransformOptions::default()
        };
        assert_eq!(
            convert("module.exports = require(\"foo\");", options),
            "import _require_foo_ from \"foo\";\nexport default _require_foo_;"
        );
    }

    #[test]
    fn test_default_direct_functions() {
        assert_eq!(
            esm("module.exports = function foo() {};"),
            "export default (function foo() {});"
        );
        assert_eq!(esm("module.exports = function () {};"), "export default function () {}");
        assert_eq!(
            esm("module.exports = function () { return 1; }();"),
            "export default (function () { return 1; })();"
        );
    }

    #[test]
    fn test_default_declared() {
        assert_eq!(
            esm("const foo = module.exports = 1;"),
            "const foo = 1;\nexport default foo;"
        );
    }

    #[test]
    fn test_object_split() {
        assert_eq!(
            esm("const a = 1, b = 2;\nmodule.exports = {a, b};"),
            "const a = 1, b = 2;\nexport {a};\nexport {b};"
        );
        assert_eq!(
            esm("module.exports = {a, b};"),
            "const _export_a_ = a;\nexport {_export_a_ as a};\nconst _export_b_ = b;\nexport {_export_b_ as b};"
        );
        assert_eq!(
            esm("function foo() {}\nmodule.exports = {bar: foo};"),
            "function foo() {}\nexport {foo as bar};"
        );
    }

    #[test]
    fn test_object_split_methods() {
        assert_eq!(
            esm("module.exports = {foo() { return 1; }};"),
            "const _export_foo_ = function () { return 1; };\nexport {_export_foo_ as foo};"
        );
        assert_eq!(
            esm("module.exports = {async *foo() {}};"),
            "const _export_foo_ = async function* () {};\nexport {_export_foo_ as foo};"
        );
    }

    #[test]
    fn test_named_direct() {
        assert_eq!(
            esm("exports.a = 1;\nexports.b = 2;"),
            "export const a = 1;\nexport const b = 2;"
        );
        assert_eq!(
            esm("function foo() {}\nexports.foo = foo;"),
            "function foo() {}\nexport {foo};"
        );
        assert_eq!(
            esm("function foo() {}\nexports.bar = foo;"),
            "function foo() {}\nexport {foo as bar};"
        );
    }

    #[test]
    fn test_named_direct_with_taken_name() {
        assert_eq!(
            esm("const a = 1;\nexports.a = a + 1;"),
            "const a = 1;\nconst _export_a_ = a + 1;\nexport {_export_a_ as a};"
        );
        assert_eq!(
            esm("exports.default = 1;"),
            "const _export_default_ = 1;\nexport {_export_default_ as default};"
        );
    }

    #[test]
    fn test_named_declared() {
        assert_eq!(esm("const foo = exports.foo = 1;"), "export const foo = 1;");
        assert_eq!(
            esm("const foo = exports.bar = 1;"),
            "const foo = 1;\nexport {foo as bar};"
        );
    }

    #[test]
    fn test_named_direct_with_later_references() {
        assert_eq!(
            nested("exports.a = 1;\nfunction f() { exports.a = 2; }"),
            "let _export_a_ = 1;\nexport {_export_a_ as a};\nfunction f() { _export_a_ = 2; }"
        );
    }

    #[test]
    fn test_named_mutable() {
        assert_eq!(
            esm("exports.a = 1;\nexports.a = 2;"),
            "let _export_a_;\nexport {_export_a_ as a};\n_export_a_ = 1;\n_export_a_ = 2;"
        );
    }

    #[test]
    fn test_default_mutable_in_place() {
        assert_eq!(
            nested("module.exports = 1;\nfunction f() { return module.exports; }"),
            "const _module_exports_ = 1;\nexport {_module_exports_ as default};\nfunction f() { return _module_exports_; }"
        );
    }

    #[test]
    fn test_default_mutable_hoisted() {
        assert_eq!(
            esm("module.exports = 1;\nmodule.exports = 2;"),
            "let _module_exports_ = {};\nexport {_module_exports_ as default};\n_module_exports_ = 1;\n_module_exports_ = 2;"
        );
    }

    #[test]
    fn test_wrapper() {
        assert_eq!(
            esm("exports = {};"),
            "let _exports_ = {};\n_exports_ = {};\nexport default _exports_;"
        );
        assert_eq!(
            esm("module.exports = {};\nexports.a = 1;"),
            "let _exports_ = {};\nconst _module_ = {exports: _exports_};\n_module_.exports = {};\n_exports_.a = 1;\nexport default _module_.exports;"
        );
    }

    #[test]
    fn test_wrapper_for_module_as_value() {
        assert_eq!(
            esm("foo(module);"),
            "const _module_ = {exports: {}};\nfoo(_module_);\nexport default _module_.exports;"
        );
        assert_eq!(
            esm("module.exports = 1;\nfoo(module);"),
            "const _module_ = {exports: {}};\n_module_.exports = 1;\nfoo(_module_);\nexport default _module_.exports;"
        );
    }

    #[test]
    fn test_typeof_exports() {
        assert_eq!(
            esm("if (typeof exports === \"object\") {}\nexports.a = 1;"),
            "let _exports_ = {};\nif (typeof _exports_ === \"object\") {}\n_exports_.a = 1;\nexport default _exports_;"
        );
        assert_eq!(
            esm("module.exports = 1;\nif (typeof module.exports) {}"),
            "let _module_exports_ = {};\nexport {_module_exports_ as default};\n_module_exports_ = 1;\nif (typeof _module_exports_) {}"
        );
    }

    #[test]
    fn test_module_members_in_place() {
        assert_eq!(
            esm("module.exports = {a: 1};\nconsole.log(module.exports.a);"),
            "const _module_exports_ = {a: 1};\nexport {_module_exports_ as default};\nconsole.log(_module_exports_.a);"
        );
        assert_eq!(
            esm("module.exports = f;\nmodule.exports.helper = 1;"),
            "const _module_exports_ = f;\nexport {_module_exports_ as default};\n_module_exports_.helper = 1;"
        );
    }

    #[test]
    fn test_module_members_hoisted() {
        assert_eq!(
            esm("use(module.exports.a);\nmodule.exports = {a: 1};"),
            "let _module_exports_ = {};\nexport {_module_exports_ as default};\nuse(_module_exports_.a);\n_module_exports_ = {a: 1};"
        );
    }

    #[test]
    fn test_exports_without_semicolons() {
        assert_eq!(esm("module.exports = 5"), "export default 5;");
        assert_eq!(
            esm("module.exports = function foo() {}"),
            "export default (function foo() {});"
        );
        assert_eq!(esm("exports.a = 1\nexports.b = 2"), "export const a = 1;\nexport const b = 2;");
        assert_eq!(
            esm("const a = 1\nmodule.exports = {a, b: 2}"),
            "const a = 1\nexport {a};\nconst _export_b_ = 2;\nexport {_export_b_ as b};"
        );
        assert_eq!(
            esm("exports.a = 1\nexports.a = 2"),
            "let _export_a_;\nexport {_export_a_ as a};\n_export_a_ = 1\n_export_a_ = 2"
        );
    }

    #[test]
    fn test_wrapper_for_default_export_style() {
        let options = TransformOptions {
            export_style: ExportStyle::Fixed(Style::Default),
            ..TransformOptions::default()
        };
        assert_eq!(
            convert("exports.a = 1;", options),
            "let _exports_ = {};\n_exports_.a = 1;\nexport default _exports_;"
        );
    }

    #[test]
    fn test_wrapper_without_hoist_fails() {
        let options = TransformOptions { hoist: false, ..TransformOptions::default() };
        let err = transform_script("foo();\nexports = {};", &options).unwrap_err();
        assert!(matches!(err.kind, TransformErrorKind::HoistDisabled));
        assert_eq!(err.pos, Some(7));
    }
}
