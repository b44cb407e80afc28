//! Shared types for the live canvas render pipeline.
//!
//! This crate defines source spans, the in-memory virtual project, the AST
//! for the supported TSX subset, diagnostics and the fatal error taxonomy
//! shared by every pipeline stage.

mod error;
mod project;
mod span;
pub mod ast;

pub use error::{
    Diagnostic, Diagnostics, ErrorCode, ErrorKind, RenderError, RenderFailure, SourceExcerpt,
    MAX_ERRORS, MAX_EXCERPT_CONTEXT,
};
pub use project::{
    normalize_path, parent_dir, ProjectError, SpecifierKind, VirtualProject, DEFAULT_ALIAS_PREFIXES,
};
pub use span::{SourceFile, Span};

/// Result type used by stages that fail with a [`RenderError`].
pub type Result<T> = std::result::Result<T, RenderError>;
