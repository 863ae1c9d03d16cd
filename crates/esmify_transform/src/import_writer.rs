use esmify_core::Editor;
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};

use crate::classifier::Analysis;
use crate::error::TransformError;
use crate::names::{has_default_comment, import_binding_name};
use crate::options::Style;
use crate::sites::{DeclaredBinding, Declarator, RequireKind, RequireSite};
use crate::style::StyleResolver;

fn quote(id: &str) -> String {
    serde_json::Value::from(id).to_string()
}

/// Rewrites every require site into an import. Returns the style chosen for
/// each module id.
pub fn write_imports(
    editor: &mut Editor<'_>,
    analysis: &Analysis<'_>,
    resolver: &mut StyleResolver<'_>,
) -> Result<BTreeMap<String, Style>, TransformError> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&RequireSite<'_>>> = HashMap::new();

    for site in &analysis.requires {
        match &site.kind {
            RequireKind::Dynamic { span } => {
                trace!("dynamic import of {:?}", site.id);
                editor.overwrite(span.start, site.callee.end, "import", false)?;
                editor.remove(site.call.end, span.end)?;
            }
            RequireKind::Bare => {
                trace!("side effect import of {:?}", site.id);
                editor.overwrite(site.call.start, site.arg.start, "import ", false)?;
                editor.remove(site.arg.end, site.call.end)?;
            }
            RequireKind::Declared(_) | RequireKind::Inline => {
                groups
                    .entry(site.id)
                    .or_insert_with(|| {
                        order.push(site.id);
                        Vec::new()
                    })
                    .push(site);
            }
        }
    }

    let mut styles = BTreeMap::new();
    for id in order {
        let sites = &groups[id];
        let source = editor.source();
        let comment = sites.iter().any(|s| has_default_comment(source, s.call.end));
        let callable =
            analysis.should_import_default.contains(id) || sites.iter().any(|s| s.callable);
        let decision = resolver.import_style(id, comment, callable);
        trace!("import {:?} as {:?} ({:?})", id, decision.style, decision.reason);
        let prefer_default = decision.style == Style::Default;
        styles.insert(id.to_string(), decision.style);

        let in_place = match sites.as_slice() {
            [site] => match &site.kind {
                RequireKind::Declared(declarator)
                    if !prefer_default
                        || matches!(declarator.binding, DeclaredBinding::Single { .. }) =>
                {
                    Some((*site, declarator))
                }
                _ => None,
            },
            _ => None,
        };
        let written = match in_place {
            Some((site, declarator)) => write_declared(editor, site, declarator, prefer_default),
            None => write_hoisted(editor, id, sites, prefer_default),
        };
        written.map_err(|e| e.with_pos_if_missing(sites[0].call.start))?;
    }
    debug!("Wrote imports for {} modules", styles.len());
    Ok(styles)
}

/// Turns a top-level declarator into an import declaration in place.
fn write_declared(
    editor: &mut Editor<'_>,
    site: &RequireSite<'_>,
    declarator: &Declarator<'_>,
    prefer_default: bool,
) -> Result<(), TransformError> {
    let left = declarator.left;
    match &declarator.binding {
        DeclaredBinding::Single { .. } => {
            let prefix = if prefer_default { "import " } else { "import * as " };
            editor.append_right(left.start, prefix)?;
        }
        DeclaredBinding::Property { local, property } => {
            let rename = if local == property { String::new() } else { format!("{property} as ") };
            editor.append_right(left.start, &format!("import {{{rename}"))?;
            editor.append_left(left.end, "}")?;
        }
        DeclaredBinding::Destructured { pattern, props } => {
            editor.append_right(pattern.start, "import ")?;
            for prop in props {
                if prop.key_span.end < prop.value_span.start {
                    editor.overwrite(prop.key_span.end, prop.value_span.start, " as ", false)?;
                }
            }
        }
    }
    editor.overwrite(left.end, site.arg.start, " from ", false)?;

    match declarator.prev {
        None => editor.remove(declarator.declaration.start, declarator.node.start)?,
        Some(prev) => editor.overwrite(prev.span.end, declarator.node.start, ";\n", true)?,
    }
    match declarator.next {
        Some(next) if !next.is_require => editor.overwrite(
            site.arg.end,
            next.span.start,
            &format!(";\n{} ", declarator.kind),
            false,
        )?,
        _ => editor.remove(site.arg.end, declarator.init.end)?,
    }
    Ok(())
}

/// Adds one import per module ahead of the topmost statement using it and
/// replaces every call with the import binding.
fn write_hoisted(
    editor: &mut Editor<'_>,
    id: &str,
    sites: &[&RequireSite<'_>],
    prefer_default: bool,
) -> Result<(), TransformError> {
    let top = sites.iter().map(|s| s.root).min().unwrap_or(0);
    let name = import_binding_name(id);
    let namespace = if prefer_default { "" } else { "* as " };
    editor.append_left(top, &format!("import {namespace}{name} from {};\n", quote(id)))?;

    for site in sites {
        editor.overwrite(site.call.start, site.call.end, &name, true)?;
        if let RequireKind::Declared(declarator) = &site.kind
            && let Some(prev) = declarator.prev
            && prev.is_require
        {
            editor.overwrite(
                prev.span.end,
                declarator.node.start,
                &format!(";\n{} ", declarator.kind),
                true,
            )?;
        }
    }
    Ok(())
}
