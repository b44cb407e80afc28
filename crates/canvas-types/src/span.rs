use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span.
///
/// `lo`/`hi` are byte offsets into the source text (half-open). `line` and
/// `column` locate `lo` and are 1-based for human-readable messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub lo: u32,
    pub hi: u32,
    pub line: u32,
    #[serde(rename = "column")]
    pub col: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(lo: u32, hi: u32, line: u32, col: u32) -> Self {
        Self { lo, hi, line, col }
    }

    /// Create a zero-width span at a single position.
    pub fn point(lo: u32, line: u32, col: u32) -> Self {
        Self::new(lo, lo, line, col)
    }

    /// A span covering nothing at the very start of a file.
    pub fn dummy() -> Self {
        Self::new(0, 0, 1, 1)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        let (line, col) = if other.lo < self.lo {
            (other.line, other.col)
        } else {
            (self.line, self.col)
        };
        Span::new(self.lo.min(other.lo), self.hi.max(other.hi), line, col)
    }

    /// Byte range of the span, usable for slicing the source text.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.lo as usize..self.hi as usize
    }

    pub fn len(&self) -> usize {
        self.hi.saturating_sub(self.lo) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.hi <= self.lo
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Holds the source text of one project file for error reporting.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Cached line start byte offsets for fast line lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number.
    ///
    /// Returns `None` if the line number is out of range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        if idx >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1)) // strip the \n
            .unwrap_or(self.source.len());
        let line = &self.source[start..end];
        // Also strip trailing \r for CRLF
        Some(line.trim_end_matches('\r'))
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a 1-based `(line, column)` pair.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.source.len());
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let col = self.source[self.line_starts[idx]..offset].chars().count() + 1;
        (idx as u32 + 1, col as u32)
    }

    /// The text covered by a span, or `""` when the span is out of range.
    pub fn slice(&self, span: Span) -> &str {
        self.source.get(span.range()).unwrap_or("")
    }

    /// Numbered lines around `line`, `context` lines before and after.
    pub fn excerpt(&self, line: u32, context: u32) -> Vec<(u32, String)> {
        let first = line.saturating_sub(context).max(1);
        let last = line.saturating_add(context);
        (first..=last)
            .filter_map(|n| self.line(n).map(|text| (n, text.to_string())))
            .collect()
    }
}
