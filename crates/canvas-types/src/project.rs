//! In-memory project: a sorted map of normalised paths to raw source text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while assembling a [`VirtualProject`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("project has no files")]
    Empty,
    #[error("entry '{0}' is not a project file")]
    MissingEntry(String),
    #[error("two files normalise to the same path '{0}'")]
    DuplicatePath(String),
}

/// In-memory mapping of file paths to source text plus the entry path.
///
/// Paths are always normalised with [`normalize_path`]; iteration order is
/// sorted so everything derived from a project is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualProject {
    files: BTreeMap<String, String>,
    entry: String,
}

impl VirtualProject {
    /// Build a project, normalising every path.
    pub fn new<I, P, T>(files: I, entry: &str) -> Result<Self, ProjectError>
    where
        I: IntoIterator<Item = (P, T)>,
        P: AsRef<str>,
        T: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (path, text) in files {
            let path = normalize_path(path.as_ref());
            if map.insert(path.clone(), text.into()).is_some() {
                return Err(ProjectError::DuplicatePath(path));
            }
        }
        if map.is_empty() {
            return Err(ProjectError::Empty);
        }
        let requested = normalize_path(entry);
        let entry = Self::lookup_entry(&map, &requested)
            .ok_or(ProjectError::MissingEntry(requested))?;
        Ok(Self { files: map, entry })
    }

    /// A project made of a single entry file.
    pub fn single(path: &str, text: impl Into<String>) -> Self {
        let path = normalize_path(path);
        let mut files = BTreeMap::new();
        files.insert(path.clone(), text.into());
        Self { files, entry: path }
    }

    // The entry may be given without its extension, like any import.
    fn lookup_entry(files: &BTreeMap<String, String>, requested: &str) -> Option<String> {
        if files.contains_key(requested) {
            return Some(requested.to_string());
        }
        [".tsx", ".ts", ".jsx", ".js"]
            .iter()
            .map(|ext| format!("{requested}{ext}"))
            .find(|candidate| files.contains_key(candidate))
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// All paths, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// All `(path, text)` pairs, sorted by path.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, t)| (p.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Replace the text of one file (edits from project storage).
    pub fn set(&mut self, path: &str, text: impl Into<String>) {
        self.files.insert(normalize_path(path), text.into());
    }

    /// Switch the entry path.
    pub fn with_entry(mut self, entry: &str) -> Result<Self, ProjectError> {
        let requested = normalize_path(entry);
        self.entry = Self::lookup_entry(&self.files, &requested)
            .ok_or(ProjectError::MissingEntry(requested))?;
        Ok(self)
    }
}

/// Normalise a POSIX-style project path.
///
/// The result always starts with `/`, has no empty, `.` or `..` segments
/// (`..` clamps at the root) and never ends with `/` unless it is the root.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// The directory containing `path` (`/` for top-level files).
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// Alias prefixes that map onto the project root (`@/components/Button`).
pub const DEFAULT_ALIAS_PREFIXES: [&str; 2] = ["@/", "~/"];

/// How an import specifier is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `./x`, `../x`
    Relative,
    /// `/src/x`
    Absolute,
    /// Starts with one of the alias prefixes.
    Aliased,
    /// A package name such as `react` or `@radix-ui/react-slot`.
    Bare,
}

impl SpecifierKind {
    pub fn classify<S: AsRef<str>>(specifier: &str, alias_prefixes: &[S]) -> Self {
        let relative = specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier == "."
            || specifier == "..";
        if relative {
            SpecifierKind::Relative
        } else if specifier.starts_with('/') {
            SpecifierKind::Absolute
        } else if alias_prefixes
            .iter()
            .any(|prefix| specifier.starts_with(prefix.as_ref()))
        {
            SpecifierKind::Aliased
        } else {
            SpecifierKind::Bare
        }
    }

    /// Bare specifiers can only be satisfied by a host shim.
    pub fn is_external(self) -> bool {
        self == SpecifierKind::Bare
    }
}
