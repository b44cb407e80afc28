//! What the sanitizer did to a text: applied fixes, refused rewrites and the
//! external bindings it removed.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::census::DeclCensus;

/// One applied repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "fix", rename_all = "snake_case")]
pub enum Fix {
    StrippedFences,
    RemovedImports { count: usize },
    RemovedReexports { count: usize },
    /// `export { X as default }` became `export default X;`.
    RewroteDefaultReexport { local: String },
    StrippedTypeAnnotations { count: usize },
    RemovedTrailingProse { bytes: usize },
    NestedHelpers { names: Vec<String> },
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fix::StrippedFences => write!(f, "stripped code fences"),
            Fix::RemovedImports { count } => write!(f, "removed {count} external import(s)"),
            Fix::RemovedReexports { count } => write!(f, "removed {count} re-export(s)"),
            Fix::RewroteDefaultReexport { local } => {
                write!(f, "rewrote default re-export of '{local}'")
            }
            Fix::StrippedTypeAnnotations { count } => {
                write!(f, "stripped {count} type annotation(s)")
            }
            Fix::RemovedTrailingProse { bytes } => {
                write!(f, "removed {bytes} byte(s) of trailing prose")
            }
            Fix::NestedHelpers { names } => {
                write!(f, "nested helper(s) {} inside the main export", names.join(", "))
            }
        }
    }
}

/// A rewrite that was computed but thrown away because it changed the
/// declaration census.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum SanitizeWarning {
    #[error("type stripping refused: declarations {before} became {after}")]
    TypeStripRefused { before: DeclCensus, after: DeclCensus },

    #[error("helper nesting refused for {}: declarations {before} became {after}", .helpers.join(", "))]
    HelperNestingRefused {
        before: DeclCensus,
        after: DeclCensus,
        helpers: Vec<String>,
    },
}

/// The name a removed import bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ImportedName {
    Default,
    Named(String),
    Namespace,
}

/// A local binding introduced by an external import the sanitizer removed.
/// The transpiler re-links it to the matching shim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalBinding {
    pub local: String,
    pub imported: ImportedName,
    pub source: String,
}

/// Sanitizer output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sanitized {
    pub text: String,
    pub fixes: Vec<Fix>,
    pub warnings: Vec<SanitizeWarning>,
    pub external_bindings: Vec<ExternalBinding>,
}

impl Sanitized {
    /// Text unchanged and nothing to report.
    pub fn is_clean(&self) -> bool {
        self.fixes.is_empty() && self.warnings.is_empty()
    }
}

/// Result of a census-guarded pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    Unchanged,
    Applied { text: String, fix: Fix },
    Refused(SanitizeWarning),
}
