//! Text-preserving mutation of a source file.
//!
//! Edits are recorded as `(start, end, text)` replacements against the original
//! text and applied in a single forward pass, so everything outside the edited
//! ranges (line endings, indentation, comments) is carried over verbatim.

use crate::diagnostics::RewriteError;
use oxc_span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextEdit {
    start: u32,
    end: u32,
    text: String,
    seq: usize,
}

pub struct SourcePatch<'s> {
    source: &'s str,
    edits: Vec<TextEdit>,
    next_seq: usize,
}

impl<'s> SourcePatch<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Replaces the text covered by `span`.
    pub fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.push(span.start, span.end, text.into());
    }

    /// Inserts `text` at `offset`. Insertions at the same offset keep their
    /// registration order.
    pub fn insert(&mut self, offset: u32, text: impl Into<String>) {
        self.push(offset, offset, text.into());
    }

    fn push(&mut self, start: u32, end: u32, text: String) {
        self.edits.push(TextEdit {
            start,
            end,
            text,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Returns the text of `span` with every edit lying inside it applied, and
    /// removes those edits from the patch.
    pub fn absorb(&mut self, span: Span) -> Result<String, RewriteError> {
        let (inner, outer): (Vec<_>, Vec<_>) = self
            .edits
            .drain(..)
            .partition(|e| e.start >= span.start && e.end <= span.end);
        self.edits = outer;
        render(self.source, span.start, span.end, inner)
    }

    /// Drops every edit lying inside `span`.
    pub fn discard_within(&mut self, span: Span) {
        self.edits
            .retain(|e| !(e.start >= span.start && e.end <= span.end));
    }

    pub fn apply(self) -> Result<String, RewriteError> {
        render(self.source, 0, self.source.len() as u32, self.edits)
    }
}

fn render(
    source: &str,
    start: u32,
    end: u32,
    mut edits: Vec<TextEdit>,
) -> Result<String, RewriteError> {
    edits.sort_by_key(|e| (e.start, e.end, e.seq));

    let mut result = String::with_capacity(source.len());
    let mut cursor = start;
    for edit in edits {
        if edit.start < cursor {
            return Err(RewriteError::OverlappingEdits { offset: edit.start });
        }
        result.push_str(&source[cursor as usize..edit.start as usize]);
        result.push_str(&edit.text);
        cursor = edit.end;
    }
    result.push_str(&source[cursor as usize..end as usize]);
    Ok(result)
}
