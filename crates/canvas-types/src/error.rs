use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of diagnostics stored before fail-fast.
pub const MAX_ERRORS: usize = 20;

/// Lines of context shown on each side of the offending line in an excerpt.
pub const MAX_EXCERPT_CONTEXT: u32 = 2;

// ══════════════════════════════════════════════════════════════════════════════
// Syntax diagnostics (lexer + parser)
// ══════════════════════════════════════════════════════════════════════════════

/// Numeric diagnostic code (E100–E299).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical errors (E100–E149) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const UNTERMINATED_COMMENT: Self = Self(102);
    pub const UNTERMINATED_TEMPLATE: Self = Self(103);
    pub const INVALID_ESCAPE: Self = Self(104);

    // ── Syntax errors (E150–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(150);
    pub const UNCLOSED_DELIMITER: Self = Self(151);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(152);
    pub const NESTING_LIMIT_EXCEEDED: Self = Self(153);

    // ── Markup errors (E200–E249) ──
    pub const UNCLOSED_ELEMENT: Self = Self(200);
    pub const MISMATCHED_CLOSING_TAG: Self = Self(201);

    // ── Unsupported syntax (E250–E299) ──
    pub const UNSUPPORTED_SYNTAX: Self = Self(250);
    pub const DUPLICATE_DEFAULT_EXPORT: Self = Self(251);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured lexer/parser diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Project path of the file.
    pub file: String,
    pub code: ErrorCode,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    /// Optional fix suggestion (useful when re-prompting a generator).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.span, self.code, self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Diagnostics collected by one lexer or parser run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub total_errors: usize,
}

impl Diagnostics {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Returns `true` once [`MAX_ERRORS`] have been reported.
    pub fn saturated(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push(&mut self, error: Diagnostic) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Move every diagnostic of `other` into `self`.
    pub fn extend(&mut self, other: Diagnostics) {
        let hidden = other.total_errors - other.errors.len();
        for error in other.errors {
            self.push(error);
        }
        self.total_errors += hidden;
    }

    /// Drop diagnostics recorded after `mark` (speculative parsing rollback).
    pub fn truncate(&mut self, mark: usize) {
        if mark < self.total_errors {
            self.errors.truncate(mark.min(self.errors.len()));
            self.total_errors = mark;
        }
    }

    pub fn first(&self) -> Option<&Diagnostic> {
        self.errors.first()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Fatal render errors
// ══════════════════════════════════════════════════════════════════════════════

/// Category of a fatal render error, as surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Resolution,
    Transpile,
    ModuleNotFound,
    Evaluation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolution => write!(f, "resolution"),
            Self::Transpile => write!(f, "transpile"),
            Self::ModuleNotFound => write!(f, "module not found"),
            Self::Evaluation => write!(f, "evaluation"),
        }
    }
}

/// Every fatal failure a render attempt can end with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// An import specifier matched no project file and no shim.
    #[error("cannot resolve '{specifier}' imported from '{importer}'")]
    Resolution { specifier: String, importer: String },

    /// The source of a module is not valid after sanitization.
    #[error("{path}: {message}")]
    Transpile {
        path: String,
        message: String,
        span: Option<Span>,
    },

    /// A reference that passed resolution is missing from the module table.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// An exception escaped module evaluation, first paint or an effect.
    #[error("{message}")]
    Evaluation {
        message: String,
        path: Option<String>,
        span: Option<Span>,
    },
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolution { .. } => ErrorKind::Resolution,
            Self::Transpile { .. } => ErrorKind::Transpile,
            Self::ModuleNotFound(_) => ErrorKind::ModuleNotFound,
            Self::Evaluation { .. } => ErrorKind::Evaluation,
        }
    }

    /// Evaluation error without a known location.
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
            path: None,
            span: None,
        }
    }

    /// The project path the error points into, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Resolution { importer, .. } => Some(importer),
            Self::Transpile { path, .. } => Some(path),
            Self::ModuleNotFound(_) => None,
            Self::Evaluation { path, .. } => path.as_deref(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Transpile { span, .. } | Self::Evaluation { span, .. } => *span,
            _ => None,
        }
    }
}

/// A few numbered source lines around the location of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceExcerpt {
    pub path: String,
    /// The 1-based line the error points at.
    pub line: u32,
    pub lines: Vec<(u32, String)>,
}

impl SourceExcerpt {
    /// Build an excerpt around `line` of `file`.
    pub fn around(file: &SourceFile, line: u32) -> Self {
        Self {
            path: file.name.clone(),
            line,
            lines: file.excerpt(line, MAX_EXCERPT_CONTEXT),
        }
    }
}

impl fmt::Display for SourceExcerpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, text) in &self.lines {
            let marker = if *n == self.line { '>' } else { ' ' };
            writeln!(f, "{marker} {n:>4} | {text}")?;
        }
        Ok(())
    }
}

/// The serialisable form of a failed render: message plus source excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFailure {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<SourceExcerpt>,
}

impl RenderFailure {
    /// Describe `error`, pulling an excerpt from `file` when the error has
    /// a location inside it.
    pub fn from_error(error: &RenderError, file: Option<&SourceFile>) -> Self {
        let excerpt = match (file, error.span()) {
            (Some(file), Some(span)) => Some(SourceExcerpt::around(file, span.line)),
            (Some(file), None) => Some(SourceExcerpt::around(file, 1)),
            _ => None,
        };
        Self {
            kind: error.kind(),
            message: error.to_string(),
            path: error.path().map(str::to_string),
            excerpt,
        }
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
