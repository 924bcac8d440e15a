//! Source Model for the translator
//!
//! Owned, lifetime-free view of one TypeScript file: the top-level statements
//! (with comment-only statements kept as their own items), every variable
//! declarator with the shape of its `new` initializer and of each resolved
//! reference, the exported names and the set of identifiers already in use.
//!
//! The oxc adapter (`oxc_adapter.rs`) produces it; matching, classification and
//! rewriting only ever read it, so tests can also build one by hand.

use oxc_span::Span;
use std::collections::HashSet;

// ═══════════════════════════════════════════════════════════════════════════════
// LINE HANDLING
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    /// Picks the most frequent separator. Ties (and files without any line
    /// break) fall back to LF.
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        let (mut crlf, mut cr, mut lf) = (0usize, 0usize, 0usize);
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    crlf += 1;
                    i += 1;
                }
                b'\r' => cr += 1,
                b'\n' => lf += 1,
                _ => {}
            }
            i += 1;
        }

        if crlf > lf && crlf >= cr {
            LineEnding::CrLf
        } else if cr > lf && cr > crlf {
            LineEnding::Cr
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

/// Offsets of every line start, for 1-based line lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 1;
                    line_starts.push(i as u32 + 1);
                }
                b'\r' | b'\n' => line_starts.push(i as u32 + 1),
                _ => {}
            }
            i += 1;
        }
        Self { line_starts }
    }

    pub fn line_of(&self, offset: u32) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(index) => index as u32 + 1,
            Err(index) => index as u32,
        }
    }

    pub fn line_start(&self, offset: u32) -> u32 {
        self.line_starts[self.line_of(offset) as usize - 1]
    }
}

/// Position right after the line terminator of the line containing `offset`.
/// Returns `None` when that line is the last one and has no terminator.
pub fn end_of_line(text: &str, offset: u32) -> Option<u32> {
    let bytes = text.as_bytes();
    let mut i = offset as usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => return Some(i as u32 + 2),
            b'\r' | b'\n' => return Some(i as u32 + 1),
            _ => i += 1,
        }
    }
    None
}

/// Leading whitespace of the line containing `offset`.
pub fn indentation_at(text: &str, lines: &LineIndex, offset: u32) -> String {
    let start = lines.line_start(offset) as usize;
    text[start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

pub fn slice(text: &str, span: Span) -> &str {
    &text[span.start as usize..span.end as usize]
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOP-LEVEL ITEMS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    pub module: String,
    /// Local alias of `import * as alias from '...'`.
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Import(ImportSite),
    Comment,
    /// Any other statement. `constructs` is set for expression statements that
    /// are a bare `new` expression.
    Statement { constructs: Option<Callee> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelItem {
    pub span: Span,
    /// End of the item including any trailing comment on its last line.
    pub extent_end: u32,
    pub kind: ItemKind,
    pub trailing_comment: bool,
}

impl TopLevelItem {
    pub fn new(span: Span, kind: ItemKind) -> Self {
        Self {
            span,
            extent_end: span.end,
            kind,
            trailing_comment: false,
        }
    }

    pub fn is_prologue(&self) -> bool {
        matches!(self.kind, ItemKind::Import(_) | ItemKind::Comment)
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, ItemKind::Comment)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECLARATIONS AND REFERENCES
// ═══════════════════════════════════════════════════════════════════════════════

/// Callee of a `new` or call expression, reduced to what the matcher compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    Identifier(String),
    Member { object: String, property: String },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSite {
    pub span: Span,
    pub line: u32,
    pub text: String,
    /// Value of a string literal or of a template literal without substitutions.
    pub literal: Option<String>,
    /// Set when the argument is a template literal.
    pub template: bool,
}

impl ArgumentSite {
    pub fn is_template(&self) -> bool {
        self.template
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSite {
    pub span: Span,
    pub callee: Callee,
    pub type_argument_count: usize,
    pub arguments: Vec<ArgumentSite>,
}

/// `<reference>.<method>(...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCallSite {
    pub span: Span,
    pub line: u32,
    pub method: String,
    pub type_argument_count: usize,
    pub arguments: Vec<ArgumentSite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceShape {
    MethodCall(MethodCallSite),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSite {
    pub span: Span,
    pub line: u32,
    pub shape: ReferenceShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSite {
    pub name: String,
    /// Span of the declarator (`name = init`).
    pub span: Span,
    pub line: u32,
    pub indentation: String,
    pub top_level: bool,
    pub initializer: Option<NewSite>,
    pub references: Vec<ReferenceSite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedName {
    pub exported: String,
    pub local: String,
}

impl ExportedName {
    pub fn field(&self) -> String {
        if self.exported == self.local {
            self.exported.clone()
        } else {
            format!("{}: {}", self.exported, self.local)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE MODEL
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct SourceModel {
    pub path: String,
    pub text: String,
    pub line_ending: LineEnding,
    pub items: Vec<TopLevelItem>,
    /// Every variable declarator with a plain identifier binding, in source order.
    pub variables: Vec<VariableSite>,
    pub exports: Vec<ExportedName>,
    pub bound_identifiers: HashSet<String>,
}

impl SourceModel {
    pub fn top_level_variables(&self) -> impl Iterator<Item = &VariableSite> {
        self.variables.iter().filter(|v| v.top_level)
    }

    /// Index of the first item that is neither an import nor comment-only.
    /// When every item belongs to the leading block, the block is the file.
    pub fn after_imports_index(&self) -> usize {
        self.items
            .iter()
            .position(|item| !item.is_prologue())
            .unwrap_or(self.items.len())
    }
}
