use log::trace;
use std::collections::HashMap;

use crate::options::{ExportStyle, ImportStyle, Style};

/// Why an import ended up with its style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleReason {
    /// A `// default` comment follows one of its require calls.
    DefaultComment,
    /// Its value is called, constructed or reassigned.
    Callable,
    Policy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleDecision {
    pub style: Style,
    pub reason: StyleReason,
}

/// Decides import and export styles, asking each policy at most once per
/// module id (imports) or once per transform (exports).
pub struct StyleResolver<'o> {
    import_style: &'o ImportStyle,
    export_style: &'o ExportStyle,
    imports: HashMap<String, StyleDecision>,
    export: Option<Style>,
}

impl<'o> StyleResolver<'o> {
    pub fn new(import_style: &'o ImportStyle, export_style: &'o ExportStyle) -> Self {
        Self { import_style, export_style, imports: HashMap::new(), export: None }
    }

    pub fn import_style(
        &mut self,
        id: &str,
        has_default_comment: bool,
        callable: bool,
    ) -> StyleDecision {
        if let Some(decision) = self.imports.get(id) {
            return *decision;
        }
        let decision = if has_default_comment {
            StyleDecision { style: Style::Default, reason: StyleReason::DefaultComment }
        } else if callable {
            StyleDecision { style: Style::Default, reason: StyleReason::Callable }
        } else {
            StyleDecision { style: self.import_style.resolve(id), reason: StyleReason::Policy }
        };
        trace!("import style for {:?}: {:?}", id, decision);
        self.imports.insert(id.to_string(), decision);
        decision
    }

    pub fn export_style(&mut self) -> Style {
        *self.export.get_or_insert_with(|| self.export_style.resolve())
    }
}
