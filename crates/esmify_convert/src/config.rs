use anyhow::Result;
use clap::Parser;
use esmify_core::{find_config_file, read_config};
use esmify_transform::{ExportStyle, ImportStyle, SourceMapOptions, Style, TransformOptions};
use log::debug;
use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "convert")]
#[command(about = "Convert CommonJS modules to ES modules")]
pub struct Config {
    /// Files or directories to convert
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Overwrite the input files with the converted code
    #[arg(long, conflicts_with = "out_dir")]
    pub write: bool,

    /// Write converted files under this directory, mirroring the input layout
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Import style for required modules: `named` or `default`
    #[arg(long)]
    pub import_style: Option<Style>,

    /// Export style for the converted module: `named` or `default`
    #[arg(long)]
    pub export_style: Option<Style>,

    /// Also convert code inside functions
    #[arg(long)]
    pub nested: bool,

    /// Convert `Promise.resolve(require("x"))` into `import("x")`
    #[arg(long)]
    pub dynamic_import: bool,

    /// Never place declarations ahead of the statement using them
    #[arg(long)]
    pub no_hoist: bool,

    /// Write a source map next to every converted file
    #[arg(long)]
    pub source_map: bool,

    /// Skip `*.test.*` and `*.spec.*` files inside directories
    #[arg(long)]
    pub skip_tests: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to the nearest esmify.json)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Contents of `esmify.json`. Command line flags win over these values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    pub import_style: Option<Style>,
    pub export_style: Option<Style>,
    /// Import style per module id, overriding `importStyle`.
    #[serde(default)]
    pub import_styles: HashMap<String, Style>,
    pub nested: Option<bool>,
    pub dynamic_import: Option<bool>,
    pub hoist: Option<bool>,
    pub source_map: Option<bool>,
    pub skip_tests: Option<bool>,
}

/// Settings for one run after merging the command line with the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub options: TransformOptions,
    pub skip_tests: bool,
}

impl Config {
    /// Reads the file named by `--config`, or the nearest `esmify.json`.
    pub fn load_file_config(&self) -> Result<FileConfig> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => find_config_file()?,
        };
        match path {
            Some(path) => {
                debug!("Using config file: {}", path.display());
                read_config(&path)
            }
            None => Ok(FileConfig::default()),
        }
    }

    pub fn settings(&self, file: FileConfig) -> Settings {
        let base = self.import_style.or(file.import_style).unwrap_or_default();
        let import_style = if file.import_styles.is_empty() {
            ImportStyle::Fixed(base)
        } else {
            let per_module = file.import_styles;
            ImportStyle::policy(move |id| per_module.get(id).copied().unwrap_or(base))
        };
        let export_style =
            ExportStyle::Fixed(self.export_style.or(file.export_style).unwrap_or_default());

        let source_map = (self.source_map || file.source_map.unwrap_or(false))
            .then(|| SourceMapOptions { source_name: String::new(), include_content: false });

        let options = TransformOptions {
            import_style,
            export_style,
            nested: self.nested || file.nested.unwrap_or(false),
            dynamic_import: self.dynamic_import || file.dynamic_import.unwrap_or(false),
            hoist: !self.no_hoist && file.hoist.unwrap_or(true),
            source_map,
            warn: None,
        };
        debug!("Transform options: {:?}", options);
        Settings { options, skip_tests: self.skip_tests || file.skip_tests.unwrap_or(false) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("convert").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_flags() {
        let cfg = parse(&["src", "--import-style", "default", "--nested", "--no-hoist"]);
        assert_eq!(cfg.paths, vec![PathBuf::from("src")]);
        assert_eq!(cfg.import_style, Some(Style::Default));
        assert!(cfg.nested);
        assert!(cfg.no_hoist);
        assert!(!cfg.write);
    }

    #[test]
    fn test_write_conflicts_with_out_dir() {
        let result = Config::try_parse_from(["convert", "src", "--write", "--out-dir", "dist"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_style() {
        assert!(Config::try_parse_from(["convert", "src", "--export-style", "both"]).is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let cfg = parse(&["src", "--export-style", "named"]);
        let file = FileConfig {
            export_style: Some(Style::Default),
            nested: Some(true),
            hoist: Some(false),
            ..FileConfig::default()
        };
        let settings = cfg.settings(file);
        assert!(matches!(settings.options.export_style, ExportStyle::Fixed(Style::Named)));
        assert!(settings.options.nested);
        assert!(!settings.options.hoist);
        assert!(settings.options.source_map.is_none());
    }

    #[test]
    fn test_per_module_import_styles() {
        let cfg = parse(&["src", "--import-style", "default"]);
        let file = FileConfig {
            import_styles: HashMap::from([("lodash".to_string(), Style::Named)]),
            ..FileConfig::default()
        };
        let settings = cfg.settings(file);
        let ImportStyle::Policy(policy) = &settings.options.import_style else {
            panic!("expected a per-module policy");
        };
        assert_eq!(policy("lodash"), Style::Named);
        assert_eq!(policy("react"), Style::Default);
    }

    #[test]
    fn test_load_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.json");
        fs::write(&path, r#"{"importStyle": "default", "dynamicImport": true}"#).unwrap();

        let cfg = parse(&["src", "--config", path.to_str().unwrap()]);
        let file = cfg.load_file_config().unwrap();
        assert_eq!(file.import_style, Some(Style::Default));
        assert_eq!(file.dynamic_import, Some(true));
    }

    #[test]
    fn test_unknown_config_key_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("esmify.json");
        fs::write(&path, r#"{"nestd": true}"#).unwrap();

        let cfg = parse(&["src", "--config", path.to_str().unwrap()]);
        let err = cfg.load_file_config().unwrap_err();
        assert!(err.to_string().contains("Invalid config"));
    }
}
