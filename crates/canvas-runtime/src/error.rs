//! Runtime error types.

use canvas_types::{RenderError, Span};
use std::rc::Rc;
use thiserror::Error;

use crate::value::Value;

/// An error raised while evaluating script or rendering its output.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// A value thrown by script.
    #[error("Uncaught {}", .0.describe_thrown())]
    Thrown(Value),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("ReferenceError: {0} is not defined")]
    Reference(String),

    #[error("RangeError: {0}")]
    Range(String),

    /// A resolved reference with no record in the module table.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// The configured step limit was exhausted.
    #[error("evaluation exceeded {0} steps")]
    StepLimit(u64),

    #[error("unsupported at runtime: {0}")]
    Unsupported(String),

    /// A tree that cannot be mounted: invalid children, runaway updates.
    #[error("render error: {0}")]
    Render(String),

    /// Events are not delivered to shared-scope mounts.
    #[error("interaction is blocked in shared mode")]
    InteractionBlocked,

    /// A panic caught at the error boundary.
    #[error("internal error: {0}")]
    Panic(String),
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Whether a script `catch` may observe this error.
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            Self::Thrown(_) | Self::Type(_) | Self::Reference(_) | Self::Range(_)
        )
    }

    /// Convert into the pipeline's error taxonomy.
    pub fn into_render_error(self, location: Option<Location>) -> RenderError {
        match self {
            Self::ModuleNotFound(specifier) => RenderError::ModuleNotFound(specifier),
            other => {
                let (path, span) = match location {
                    Some(Location { path, span }) => (path.map(|p| p.to_string()), Some(span)),
                    None => (None, None),
                };
                RenderError::Evaluation {
                    message: other.to_string(),
                    path,
                    span,
                }
            }
        }
    }
}

/// Where in the project an error was first observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub path: Option<Rc<str>>,
    pub span: Span,
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
