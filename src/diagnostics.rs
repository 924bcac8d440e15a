use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// ADVISORIES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryKind {
    /// A matched constructor or accessor call had more than one argument.
    ExtraArguments,
    /// A reference to a matched declaration outside the accessor grammar.
    UnexpectedUsage,
}

/// Informational hint emitted while rewriting a file. Never aborts processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl Advisory {
    pub fn extra_arguments(file: &str, line: u32, callee: &str) -> Self {
        Self {
            kind: AdvisoryKind::ExtraArguments,
            file: file.to_string(),
            line,
            message: format!("Additional arguments to {} ignored", callee),
        }
    }

    pub fn unexpected_usage(file: &str, line: u32, declaration: &str) -> Self {
        Self {
            kind: AdvisoryKind::UnexpectedUsage,
            file: file.to_string(),
            line,
            message: format!("Unexpected usage {} ignored", declaration),
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.file, self.line, self.message)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("failed to parse {file}: {}", .messages.join("; "))]
    Parse { file: String, messages: Vec<String> },

    #[error("overlapping edits at offset {offset}")]
    OverlappingEdits { offset: u32 },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("root directory {} does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error("invalid options file {}: {source}", .path.display())]
    Options {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
