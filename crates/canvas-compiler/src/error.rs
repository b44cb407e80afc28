//! Compiler error types.

use canvas_types::{Diagnostics, RenderError, RenderFailure, SourceFile, Span};
use serde_json::Error as JsonError;
use thiserror::Error;

/// A module whose text is not valid source after sanitization.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{path}: {message}")]
pub struct TranspileError {
    pub path: String,
    pub message: String,
    pub span: Option<Span>,
    /// The offending line, when known.
    pub source_line: Option<String>,
}

impl TranspileError {
    pub fn new(path: impl Into<String>, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            span,
            source_line: None,
        }
    }

    /// Summarise parser diagnostics; the first one locates the error.
    pub fn from_diagnostics(path: &str, diagnostics: &Diagnostics) -> Self {
        let Some(first) = diagnostics.first() else {
            return Self::new(path, "invalid source", None);
        };
        let mut message = format!("{} {}", first.code, first.message);
        let more = diagnostics.total_errors.saturating_sub(1);
        if more > 0 {
            message.push_str(&format!(" (and {more} more error(s))"));
        }
        Self {
            path: path.to_string(),
            message,
            span: Some(first.span),
            source_line: Some(first.source_line.clone()).filter(|l| !l.is_empty()),
        }
    }
}

impl From<TranspileError> for RenderError {
    fn from(error: TranspileError) -> Self {
        RenderError::Transpile {
            path: error.path,
            message: error.message,
            span: error.span,
        }
    }
}

/// A fatal error from compiling a project, with the text it points into.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct CompileError {
    pub error: RenderError,
    /// The sanitized text of the module the error is located in.
    pub file: Option<SourceFile>,
}

impl CompileError {
    pub fn new(error: RenderError, file: Option<SourceFile>) -> Self {
        Self { error, file }
    }

    /// The serialisable form shown to the user.
    pub fn failure(&self) -> RenderFailure {
        RenderFailure::from_error(&self.error, self.file.as_ref())
    }
}

impl From<RenderError> for CompileError {
    fn from(error: RenderError) -> Self {
        Self::new(error, None)
    }
}

/// Errors reading configuration or a manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Config(#[source] JsonError),

    #[error("invalid manifest: {0}")]
    Manifest(#[source] JsonError),
}

/// Compiler result type alias.
pub type CompileResult<T> = Result<T, CompileError>;
