//! Live canvas sanitizer: repairs machine-generated TSX before compilation.
//!
//! The sanitizer never fails. Each pass either recognises its pattern and
//! rewrites the text or leaves it alone; rewrites that would change the
//! number of declarations are refused and reported as warnings.
//!
//! Passes, in order:
//!
//! 1. [`passes::strip_fences`]: markdown fences and language-name lines.
//! 2. [`passes::remove_external_imports`]: package imports and re-exports
//!    (entry only).
//! 3. [`passes::strip_type_annotations`]: simple inline annotations (entry
//!    only).
//! 4. [`passes::strip_trailing_prose`]: explanation text after the code.
//! 5. [`passes::nest_helpers`]: sibling helpers moved into the main
//!    component (entry only).

mod census;
mod config;
mod report;
mod scan;
pub mod passes;

pub use census::{census, DeclCensus};
pub use config::{Profile, SanitizerConfig};
pub use report::{ExternalBinding, Fix, ImportedName, Rewrite, SanitizeWarning, Sanitized};

use canvas_types::DEFAULT_ALIAS_PREFIXES;
use tracing::{debug, instrument, warn};

/// Runs the enabled passes over a text.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    config: SanitizerConfig,
    alias_prefixes: Vec<String>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(SanitizerConfig::default())
    }
}

impl Sanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self {
            config,
            alias_prefixes: DEFAULT_ALIAS_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Import prefixes that refer to project files rather than packages.
    pub fn with_alias_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    #[instrument(level = "debug", skip(self, text), fields(bytes = text.len()))]
    pub fn run(&self, text: &str, profile: Profile) -> Sanitized {
        let config = &self.config;
        let entry = profile == Profile::Entry;
        let mut out = Sanitized {
            text: text.to_string(),
            ..Sanitized::default()
        };

        // ── a: fences ──
        if config.strip_fences {
            if let Some(text) = passes::strip_fences(&out.text) {
                out.text = text;
                record(&mut out, Fix::StrippedFences);
            }
        }

        // ── b: external imports ──
        if entry && config.remove_external_imports {
            let prefixes = self.alias_prefixes.as_slice();
            if let Some(removal) = passes::remove_external_imports(&out.text, prefixes) {
                for fix in removal.fixes() {
                    record(&mut out, fix);
                }
                out.text = removal.text;
                out.external_bindings = removal.bindings;
            }
        }

        // ── c: type annotations ──
        if entry && config.strip_type_annotations {
            let rewrite = passes::strip_type_annotations(&out.text);
            apply(&mut out, rewrite);
        }

        // ── d: trailing prose ──
        if config.strip_trailing_prose {
            if let Some(removal) = passes::strip_trailing_prose(&out.text) {
                out.text = removal.text;
                record(
                    &mut out,
                    Fix::RemovedTrailingProse {
                        bytes: removal.prose.len(),
                    },
                );
            }
        }

        // ── e: helper nesting ──
        if entry && config.nest_helpers {
            let rewrite = passes::nest_helpers(&out.text);
            apply(&mut out, rewrite);
        }

        out
    }
}

/// Sanitize with the default configuration.
pub fn sanitize(text: &str, profile: Profile) -> Sanitized {
    Sanitizer::default().run(text, profile)
}

fn record(out: &mut Sanitized, fix: Fix) {
    debug!(%fix, "sanitizer fix applied");
    out.fixes.push(fix);
}

fn apply(out: &mut Sanitized, rewrite: Rewrite) {
    match rewrite {
        Rewrite::Unchanged => {}
        Rewrite::Applied { text, fix } => {
            out.text = text;
            record(out, fix);
        }
        Rewrite::Refused(warning) => {
            warn!(%warning, "sanitizer rewrite refused");
            out.warnings.push(warning);
        }
    }
}
