//! Import specifier resolution against the project's file set.
//!
//! Resolution is total: every specifier maps to a project path, a shim
//! name, or [`Resolution::Unresolved`]. Nothing here fails or panics.

use canvas_types::{normalize_path, parent_dir, SpecifierKind, VirtualProject, DEFAULT_ALIAS_PREFIXES};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::trace;

use crate::shims::Shim;

/// Suffixes tried, in order, when a candidate path has no exact match.
/// Markup sources win over plain ones at both levels.
pub const PROBE_SUFFIXES: [&str; 8] = [
    ".tsx",
    ".jsx",
    ".ts",
    ".js",
    "/index.tsx",
    "/index.jsx",
    "/index.ts",
    "/index.js",
];

/// Where a specifier points.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Resolution {
    /// A file of the project.
    Path(String),
    /// A host shim, by specifier.
    External(String),
    Unresolved,
}

impl Resolution {
    /// The key a lowered `require` call receives.
    pub fn target(&self) -> Option<&str> {
        match self {
            Resolution::Path(path) => Some(path),
            Resolution::External(name) => Some(name),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// One import of one module, after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImport {
    pub from_path: String,
    pub specifier: String,
    pub resolution: Resolution,
}

/// Anything that can answer "is this a project file".
pub trait ProjectPaths {
    fn has_path(&self, path: &str) -> bool;
}

impl ProjectPaths for VirtualProject {
    fn has_path(&self, path: &str) -> bool {
        self.contains(path)
    }
}

impl ProjectPaths for BTreeSet<String> {
    fn has_path(&self, path: &str) -> bool {
        self.contains(path)
    }
}

impl ProjectPaths for HashSet<String> {
    fn has_path(&self, path: &str) -> bool {
        self.contains(path)
    }
}

impl ProjectPaths for [&str] {
    fn has_path(&self, path: &str) -> bool {
        self.contains(&path)
    }
}

impl ProjectPaths for [String] {
    fn has_path(&self, path: &str) -> bool {
        self.iter().any(|p| p == path)
    }
}

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Prefixes that stand for the project root, e.g. `@/`.
    pub alias_prefixes: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            alias_prefixes: DEFAULT_ALIAS_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Resolves specifiers for one configuration.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn alias_prefixes(&self) -> &[String] {
        &self.config.alias_prefixes
    }

    /// Resolve `specifier` as written in the file at `from_path`.
    pub fn resolve<P>(&self, from_path: &str, specifier: &str, paths: &P) -> Resolution
    where
        P: ProjectPaths + ?Sized,
    {
        let resolution = self.resolve_inner(from_path, specifier, paths);
        trace!(from = from_path, specifier, ?resolution, "resolved import");
        resolution
    }

    fn resolve_inner<P>(&self, from_path: &str, specifier: &str, paths: &P) -> Resolution
    where
        P: ProjectPaths + ?Sized,
    {
        if let Some(base) = self.candidate(from_path, specifier) {
            if let Some(path) = probe(&base, paths) {
                return Resolution::Path(path);
            }
        }
        match Shim::from_specifier(specifier) {
            Some(shim) => Resolution::External(shim.specifier().to_string()),
            None => Resolution::Unresolved,
        }
    }

    /// The project path a specifier names before probing, if it names one.
    fn candidate(&self, from_path: &str, specifier: &str) -> Option<String> {
        let prefixes = self.alias_prefixes();
        match SpecifierKind::classify(specifier, prefixes) {
            SpecifierKind::Relative => Some(normalize_path(&format!(
                "{}/{}",
                parent_dir(from_path),
                specifier
            ))),
            SpecifierKind::Absolute => Some(normalize_path(specifier)),
            SpecifierKind::Aliased => {
                let prefix = prefixes.iter().find(|p| specifier.starts_with(p.as_str()))?;
                Some(normalize_path(&specifier[prefix.len()..]))
            }
            SpecifierKind::Bare => None,
        }
    }
}

/// Exact match first, then the suffixes in order. No scoring.
fn probe<P>(base: &str, paths: &P) -> Option<String>
where
    P: ProjectPaths + ?Sized,
{
    if paths.has_path(base) {
        return Some(base.to_string());
    }
    PROBE_SUFFIXES
        .iter()
        .map(|suffix| normalize_path(&format!("{base}{suffix}")))
        .find(|candidate| paths.has_path(candidate))
}

/// Resolve with the default alias prefixes.
pub fn resolve<P>(from_path: &str, specifier: &str, paths: &P) -> Resolution
where
    P: ProjectPaths + ?Sized,
{
    Resolver::default().resolve(from_path, specifier, paths)
}
