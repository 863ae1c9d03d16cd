use anyhow::{Context, Result, anyhow};
use esmify_core::{CollectorConfig, SourceMap, collect_inputs, read_source, source_type_for};
use esmify_transform::{TransformOptions, TransformOutput, transform_source};
use log::{debug, info, trace, warn};
use path_clean::clean;
use rayon::prelude::*;
use std::{
    env, fs,
    path::{Component, Path, PathBuf},
    thread,
};

use crate::{
    config::Config,
    types::{ConvertResult, FileReport, FileStatus, FileWarning},
};

/// Where converted code goes.
#[derive(Debug, Clone)]
enum Destination {
    InPlace,
    OutDir(PathBuf),
    /// Keep the code in the report.
    Report,
}

impl Destination {
    fn for_config(cfg: &Config) -> Self {
        match (&cfg.out_dir, cfg.write) {
            (Some(dir), _) => Destination::OutDir(dir.clone()),
            (None, true) => Destination::InPlace,
            (None, false) => Destination::Report,
        }
    }
}

pub fn run_convert(cfg: Config) -> Result<ConvertResult> {
    info!("Starting conversion");
    let file_config = cfg.load_file_config()?;
    let settings = cfg.settings(file_config);

    let inputs = collect_inputs(&CollectorConfig {
        paths: cfg.paths.clone(),
        skip_tests: settings.skip_tests,
    })?;
    if inputs.is_empty() {
        warn!("No CommonJS files found");
        return Err(anyhow!("No CommonJS files found in the given paths"));
    }
    info!("Converting {} files", inputs.len());

    let cwd = env::current_dir()?;
    let destination = Destination::for_config(&cfg);
    debug!("Destination: {:?}", destination);

    let files: Vec<FileReport> = inputs
        .par_iter()
        .map(|file| {
            trace!("Thread {:?} converting: {}", thread::current().id(), file.display());
            let path = display_path(file, &cwd);
            match convert_file(file, &cwd, &destination, &settings.options) {
                Ok(report) => report,
                Err(e) => {
                    warn!("{:#}", e);
                    FileReport {
                        path,
                        status: FileStatus::Failed { error: format!("{e:#}") },
                        export_plan: None,
                        warnings: Vec::new(),
                        written_to: None,
                        code: None,
                    }
                }
            }
        })
        .collect();

    let result = ConvertResult { files };
    info!(
        "Conversion complete: {} converted, {} unchanged, {} failed",
        result.converted(),
        result.unchanged(),
        result.failed()
    );
    Ok(result)
}

fn convert_file(
    file: &Path,
    cwd: &Path,
    destination: &Destination,
    options: &TransformOptions,
) -> Result<FileReport> {
    let source = read_source(file)?;
    let target = match destination {
        Destination::InPlace => Some(file.to_path_buf()),
        Destination::OutDir(dir) => Some(output_path(dir, file, cwd)),
        Destination::Report => None,
    };

    let mut options = options.clone();
    if let Some(source_map) = &mut options.source_map {
        source_map.source_name = map_source_name(file, target.as_deref());
    }
    let output = transform_source(&source, source_type_for(file), &options)
        .with_context(|| format!("Failed to convert {}", file.display()))?;
    debug!("{}: touched={}", file.display(), output.is_touched);

    let warnings = output
        .warnings
        .iter()
        .map(|w| {
            let (line, column) = line_column(&source, w.pos);
            FileWarning { message: w.message.clone(), line, column }
        })
        .collect();
    let status = if output.is_touched { FileStatus::Converted } else { FileStatus::Unchanged };

    // unchanged files are still copied so the output directory is complete
    let written_to = match &target {
        Some(target) if output.is_touched || matches!(destination, Destination::OutDir(_)) => {
            write_output(target, &output)?;
            Some(target.clone())
        }
        _ => None,
    };
    let code = match destination {
        Destination::Report if output.is_touched => Some(output.code.clone()),
        _ => None,
    };

    Ok(FileReport {
        path: display_path(file, cwd),
        status,
        export_plan: Some(output.export_plan),
        warnings,
        written_to,
        code,
    })
}

fn write_output(target: &Path, output: &TransformOutput) -> Result<()> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut code = output.code.clone();
    if let Some(map) = &output.map {
        let map_path = map_path_for(target);
        let map_name =
            map_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&SourceMap::url_comment(&map_name));
        code.push('\n');
        let json = map.to_json().context("Failed to serialize source map")?;
        fs::write(&map_path, json)
            .with_context(|| format!("Failed to write {}", map_path.display()))?;
    }

    trace!("Writing {}", target.display());
    fs::write(target, code).with_context(|| format!("Failed to write {}", target.display()))
}

fn map_path_for(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".map");
    target.with_file_name(name)
}

/// The input as seen from the map file, which sits next to the output.
fn map_source_name(file: &Path, target: Option<&Path>) -> String {
    let dir = target.and_then(Path::parent).filter(|p| !p.as_os_str().is_empty());
    let relative = dir.and_then(|dir| {
        let file = env::current_dir().ok()?.join(file);
        let dir = env::current_dir().ok()?.join(dir);
        make_relative(&clean(file), &clean(dir))
    });
    relative
        .unwrap_or_else(|| file.file_name().map(PathBuf::from).unwrap_or_default())
        .to_string_lossy()
        .replace('\\', "/")
}

/// Mirrors `file` under `out_dir`, relative to the working directory.
fn output_path(out_dir: &Path, file: &Path, cwd: &Path) -> PathBuf {
    let absolute = clean(cwd.join(file));
    let relative = absolute.strip_prefix(cwd).unwrap_or(&absolute);
    let mut out = out_dir.to_path_buf();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            out.push(part);
        }
    }
    out
}

fn display_path(file: &Path, cwd: &Path) -> PathBuf {
    let absolute = clean(cwd.join(file));
    absolute.strip_prefix(cwd).map(Path::to_path_buf).unwrap_or(absolute)
}

/// 1-based line and column of a byte offset.
fn line_column(source: &str, pos: u32) -> (usize, usize) {
    let pos = (pos as usize).min(source.len());
    let before = &source[..pos];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, before[line_start..].chars().count() + 1)
}

/// Relative path from `base` to `target`.
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let mut target_components = target.components().peekable();
    let mut base_components = base.components().peekable();

    if target_components.peek() != base_components.peek() {
        return None;
    }
    while let (Some(t), Some(b)) = (target_components.peek(), base_components.peek()) {
        if t != b {
            break;
        }
        target_components.next();
        base_components.next();
    }

    let mut result = PathBuf::new();
    for _ in base_components {
        result.push("..");
    }
    for component in target_components {
        result.push(component);
    }
    Some(result)
}
