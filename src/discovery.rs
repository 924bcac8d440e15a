//! Discovery Module
//!
//! Recursively scans a directory for source files with the configured
//! extension, rewrites each one and writes it back when the text changed.
//! A file that fails is recorded and skipped; the walk goes on.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::diagnostics::{Advisory, RewriteError};
use crate::options::RewriteOptions;
use crate::rewrite::{rewrite_source, FileRewrite};

// ═══════════════════════════════════════════════════════════════════════════════
// REPORT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub path: String,
    pub message: String,
}

/// Outcome of a whole run over a directory tree.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub files_visited: usize,
    pub files_rewritten: usize,
    pub advisories: Vec<Advisory>,
    pub failures: Vec<FileFailure>,
}

impl RunReport {
    fn record(&mut self, rewrite: FileRewrite) {
        if rewrite.changed {
            self.files_rewritten += 1;
        }
        self.advisories.extend(rewrite.advisories);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Recursively find all files with `extension`, in file-name order.
/// Symbolic links are not followed.
fn find_source_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, RewriteError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == extension) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Rewrite one file on disk. The file is only written when its text changed.
pub fn translate_file(path: &Path, options: &RewriteOptions) -> Result<FileRewrite, RewriteError> {
    let source = fs::read_to_string(path).map_err(|source| RewriteError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let rewrite = rewrite_source(&path.to_string_lossy(), &source, options)?;
    if rewrite.changed {
        fs::write(path, &rewrite.output).map_err(|source| RewriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(rewrite)
}

/// Rewrite every matching file under `root`.
pub fn translate_tree(root: &Path, options: &RewriteOptions) -> Result<RunReport, RewriteError> {
    if !root.is_dir() {
        return Err(RewriteError::MissingRoot(root.to_path_buf()));
    }

    let files = find_source_files(root, &options.extension)?;
    let mut report = RunReport::default();

    for path in files {
        debug!(path = %path.display(), "visiting");
        report.files_visited += 1;

        match translate_file(&path, options) {
            Ok(rewrite) => {
                if rewrite.changed {
                    info!(
                        path = %path.display(),
                        declarations = rewrite.declarations,
                        usages = rewrite.usages,
                        published = rewrite.published,
                        "rewritten"
                    );
                }
                report.record(rewrite);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                report.failures.push(FileFailure {
                    path: path.to_string_lossy().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
