use esmify_transform::ExportPlan;
use serde::Serialize;
use std::path::PathBuf;

/// A transform warning located by line and column (both 1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileWarning {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FileStatus {
    Converted,
    Unchanged,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_plan: Option<ExportPlan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<FileWarning>,
    /// Where the converted code was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<PathBuf>,
    /// Converted code when nothing is written to disk.
    #[serde(skip)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub files: Vec<FileReport>,
}

impl ConvertResult {
    fn count(&self, f: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|r| f(&r.status)).count()
    }

    pub fn converted(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Converted))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Unchanged))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    pub fn warnings(&self) -> usize {
        self.files.iter().map(|r| r.warnings.len()).sum()
    }
}
