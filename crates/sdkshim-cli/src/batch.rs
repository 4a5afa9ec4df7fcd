//! Discovering and patching project files
//!
//! A batch never stops on a failing file: every file gets exactly one
//! outcome line and the failure is logged.

use std::collections::BTreeSet;
use std::fs;

use similar::TextDiff;

use sdkshim_cbp::{Document, PatchContext, PatchOutcome, PatchStatus, patch};
use sdkshim_fs::{NormalizedPath, io};

use crate::error::Result;
use crate::plan::ExecutionPlan;

/// Extension of Code::Blocks project files, compared case-insensitively.
const PROJECT_EXTENSION: &str = "cbp";

/// SDK binding applied to every file of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSettings {
    pub build_dir: String,
    pub sdk_dir: String,
    pub extra_add_directory: Vec<String>,
    pub gcc_clang_fixes: BTreeSet<String>,
    pub config_path: String,
}

impl From<&ExecutionPlan> for PatchSettings {
    fn from(plan: &ExecutionPlan) -> Self {
        Self {
            build_dir: plan.build_dir.clone(),
            sdk_dir: plan.sdk_dir.clone(),
            extra_add_directory: plan.extra_add_directory.clone(),
            gcc_clang_fixes: plan.gcc_clang_fixes.clone(),
            config_path: plan.config_path.clone(),
        }
    }
}

impl PatchSettings {
    fn context(&self, file: &NormalizedPath) -> PatchContext {
        let mut context = PatchContext::new(file.as_str(), &self.build_dir, &self.sdk_dir);
        context.extra_add_directory = self.extra_add_directory.clone();
        context.gcc_clang_fixes = self.gcc_clang_fixes.clone();
        context
    }
}

/// Outcome of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: NormalizedPath,
    pub status: PatchStatus,
    /// Unified diff of the change, only collected in dry runs.
    pub diff: Option<String>,
}

impl FileReport {
    pub fn line(&self) -> String {
        format!("{}: {}", self.path, self.status)
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// One line per file, then the SDK and config lines when any file was
    /// processed.
    pub fn lines(&self, settings: &PatchSettings) -> Vec<String> {
        let mut lines: Vec<String> = self.files.iter().map(FileReport::line).collect();
        if !self.files.is_empty() {
            lines.push(format!("SDK:    {}", settings.sdk_dir));
            lines.push(format!("Config: {}", settings.config_path));
        }
        lines
    }

    pub fn count(&self, status: PatchStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

/// Project files directly inside each search path, sorted per directory.
///
/// Unreadable directories are logged and skipped.
pub fn discover(search_paths: &[String]) -> Vec<NormalizedPath> {
    let mut found = Vec::new();
    for dir in search_paths {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir, "cannot scan for project files: {}", e);
                continue;
            }
        };

        let mut files: Vec<NormalizedPath> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .map(|entry| NormalizedPath::new(entry.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION))
            })
            .collect();
        files.sort();
        tracing::debug!(dir = %dir, count = files.len(), "discovered project files");
        found.extend(files);
    }
    found
}

/// Read, parse and patch one file without writing anything.
///
/// Returns the original text along with the outcome.
pub fn patch_text(path: &NormalizedPath, settings: &PatchSettings) -> Result<(String, PatchOutcome)> {
    let original = io::read_text(path)?;
    let mut doc = Document::parse(&original)?;
    let mut context = settings.context(path);
    let outcome = patch(&mut context, &mut doc)?;
    Ok((original, outcome))
}

/// Patch one file on disk.
///
/// A changed file is backed up once as `<file>.bak` before it is replaced
/// atomically.
pub fn patch_file(path: &NormalizedPath, settings: &PatchSettings) -> Result<PatchOutcome> {
    let (_, outcome) = patch_text(path, settings)?;
    if let PatchOutcome::Changed(text) = &outcome {
        io::backup_once(path)?;
        io::write_atomic(path, text.as_bytes())?;
    }
    Ok(outcome)
}

/// Unified diff between the current and the patched text of `path`.
pub fn unified_diff(path: &NormalizedPath, original: &str, modified: &str) -> String {
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(path.as_str(), path.as_str())
        .to_string()
}

/// Patch every file, writing changes unless `dry_run` is set.
pub fn patch_all(files: &[NormalizedPath], settings: &PatchSettings, dry_run: bool) -> BatchReport {
    let mut report = BatchReport::default();
    for path in files {
        let result = if dry_run {
            patch_text(path, settings).map(|(original, outcome)| {
                let diff = match &outcome {
                    PatchOutcome::Changed(text) => Some(unified_diff(path, &original, text)),
                    PatchOutcome::Unchanged => None,
                };
                (outcome, diff)
            })
        } else {
            patch_file(path, settings).map(|outcome| (outcome, None))
        };

        let file_report = match result {
            Ok((outcome, diff)) => FileReport {
                path: path.clone(),
                status: outcome.status(),
                diff,
            },
            Err(e) => {
                tracing::warn!(path = %path, "failed to patch: {}", e);
                FileReport {
                    path: path.clone(),
                    status: PatchStatus::Error,
                    diff: None,
                }
            }
        };
        report.files.push(file_report);
    }
    report
}
