use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

/// How a module is imported, or how the exports of the current module are
/// laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// `import x from "x"` / `export default ...`
    Default,
    /// `import * as x from "x"` / `export const ...`
    #[default]
    Named,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Default => write!(f, "default"),
            Style::Named => write!(f, "named"),
        }
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Style::Default),
            "named" => Ok(Style::Named),
            other => Err(format!("unknown style `{other}`, expected `default` or `named`")),
        }
    }
}

pub type ImportPolicy = Arc<dyn Fn(&str) -> Style + Send + Sync>;
pub type ExportPolicy = Arc<dyn Fn() -> Style + Send + Sync>;
pub type WarnSink = Arc<dyn Fn(&Warning) + Send + Sync>;

/// Import style for every required module, either fixed or decided per
/// module id.
#[derive(Clone)]
pub enum ImportStyle {
    Fixed(Style),
    Policy(ImportPolicy),
}

impl ImportStyle {
    pub fn policy(f: impl Fn(&str) -> Style + Send + Sync + 'static) -> Self {
        ImportStyle::Policy(Arc::new(f))
    }

    pub(crate) fn resolve(&self, id: &str) -> Style {
        match self {
            ImportStyle::Fixed(style) => *style,
            ImportStyle::Policy(f) => f(id),
        }
    }
}

impl Default for ImportStyle {
    fn default() -> Self {
        ImportStyle::Fixed(Style::Named)
    }
}

impl From<Style> for ImportStyle {
    fn from(style: Style) -> Self {
        ImportStyle::Fixed(style)
    }
}

impl fmt::Debug for ImportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStyle::Fixed(style) => write!(f, "Fixed({style})"),
            ImportStyle::Policy(_) => write!(f, "Policy(..)"),
        }
    }
}

#[derive(Clone)]
pub enum ExportStyle {
    Fixed(Style),
    Policy(ExportPolicy),
}

impl ExportStyle {
    pub fn policy(f: impl Fn() -> Style + Send + Sync + 'static) -> Self {
        ExportStyle::Policy(Arc::new(f))
    }

    pub(crate) fn resolve(&self) -> Style {
        match self {
            ExportStyle::Fixed(style) => *style,
            ExportStyle::Policy(f) => f(),
        }
    }
}

impl Default for ExportStyle {
    fn default() -> Self {
        ExportStyle::Fixed(Style::Named)
    }
}

impl From<Style> for ExportStyle {
    fn from(style: Style) -> Self {
        ExportStyle::Fixed(style)
    }
}

impl fmt::Debug for ExportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStyle::Fixed(style) => write!(f, "Fixed({style})"),
            ExportStyle::Policy(_) => write!(f, "Policy(..)"),
        }
    }
}

/// A non-fatal diagnostic. `pos` is a byte offset into the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub message: String,
    pub pos: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapOptions {
    /// Name recorded in the map's `sources`.
    pub source_name: String,
    pub include_content: bool,
}

#[derive(Clone)]
pub struct TransformOptions {
    pub import_style: ImportStyle,
    pub export_style: ExportStyle,
    /// Also convert `require`, `module` and `exports` found inside functions.
    pub nested: bool,
    /// Rewrite `Promise.resolve(require("x"))` into `import("x")`.
    pub dynamic_import: bool,
    /// Allow declarations to be placed ahead of the statement that needs them.
    pub hoist: bool,
    pub source_map: Option<SourceMapOptions>,
    /// Receives warnings. Without a sink they are logged.
    pub warn: Option<WarnSink>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            import_style: ImportStyle::default(),
            export_style: ExportStyle::default(),
            nested: false,
            dynamic_import: false,
            hoist: true,
            source_map: None,
            warn: None,
        }
    }
}

impl fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformOptions")
            .field("import_style", &self.import_style)
            .field("export_style", &self.export_style)
            .field("nested", &self.nested)
            .field("dynamic_import", &self.dynamic_import)
            .field("hoist", &self.hoist)
            .field("source_map", &self.source_map)
            .field("warn", &self.warn.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_from_str() {
        assert_eq!("default".parse::<Style>(), Ok(Style::Default));
        assert_eq!("named".parse::<Style>(), Ok(Style::Named));
        assert!("both".parse::<Style>().is_err());
    }

    #[test]
    fn test_style_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Style::Default).unwrap(), r#""default""#);
        let style: Style = serde_json::from_str(r#""named""#).unwrap();
        assert_eq!(style, Style::Named);
    }

    #[test]
    fn test_import_policy_resolves_per_id() {
        let style =
            ImportStyle::policy(|id| if id == "react" { Style::Default } else { Style::Named });
        assert_eq!(style.resolve("react"), Style::Default);
        assert_eq!(style.resolve("fs"), Style::Named);
    }

    #[test]
    fn test_default_options() {
        let options = TransformOptions::default();
        assert!(options.hoist);
        assert!(!options.nested);
        assert!(!options.dynamic_import);
        assert_eq!(options.export_style.resolve(), Style::Named);
    }
}
