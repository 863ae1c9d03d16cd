use anyhow::{Result, anyhow};
use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::{Path, PathBuf};

use crate::constants::{CJS_EXTENSIONS, SKIP_DIRS};

pub struct CollectorConfig {
    pub paths: Vec<PathBuf>,
    /// Skip `*.test.*` and `*.spec.*` files found while walking directories.
    pub skip_tests: bool,
}

fn has_cjs_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|ext| CJS_EXTENSIONS.contains(&ext))
}

/// Expands the configured paths into a sorted, de-duplicated list of input
/// files. Files named explicitly are taken as they are; directories are walked
/// honoring `.gitignore`.
pub fn collect_inputs(cfg: &CollectorConfig) -> Result<Vec<PathBuf>> {
    debug!("Collecting input files from {} paths", cfg.paths.len());
    let mut files: Vec<PathBuf> = Vec::new();

    for root in &cfg.paths {
        if root.is_file() {
            trace!("Explicit input file: {}", root.display());
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            return Err(anyhow!("Input path does not exist: {}", root.display()));
        }

        debug!("Walking directory tree from root: {}", root.display());
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .ignore(true)
            .git_ignore(true)
            .filter_entry(|dent| {
                let name = dent.file_name().to_string_lossy();
                !SKIP_DIRS.iter().any(|skip| *skip == name)
            })
            .build();

        for res in walker {
            let dent = res?;
            let p = dent.path();
            if !p.is_file() || !has_cjs_extension(p) {
                continue;
            }

            let path_str = p.to_string_lossy();
            if cfg.skip_tests && (path_str.contains(".test.") || path_str.contains(".spec.")) {
                trace!("Skipping test file: {}", path_str);
                continue;
            }
            trace!("Found input file: {}", p.display());
            files.push(p.to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    debug!("Collected {} input files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_collect_walks_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/a.js", "");
        create_test_file(root, "src/b.cjs", "");
        create_test_file(root, "src/c.mjs", "");
        create_test_file(root, "src/readme.md", "");
        create_test_file(root, "node_modules/dep/index.js", "");

        let files =
            collect_inputs(&CollectorConfig { paths: vec![root.to_path_buf()], skip_tests: false })
                .unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["src/a.js", "src/b.cjs"]);
    }

    #[test]
    fn test_collect_skips_tests_when_asked() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "a.js", "");
        create_test_file(root, "a.test.js", "");
        create_test_file(root, "a.spec.js", "");

        let files =
            collect_inputs(&CollectorConfig { paths: vec![root.to_path_buf()], skip_tests: true })
                .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.js"));
    }

    #[test]
    fn test_collect_explicit_file_and_dedup() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let file = create_test_file(root, "lib/x.js", "");

        let files = collect_inputs(&CollectorConfig {
            paths: vec![file.clone(), root.join("lib")],
            skip_tests: false,
        })
        .unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_collect_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let result = collect_inputs(&CollectorConfig {
            paths: vec![temp_dir.path().join("nope")],
            skip_tests: false,
        });
        assert!(result.is_err());
    }
}
