//! Compile cache keyed by content fingerprints.
//!
//! Compilation is pure, so a module whose sanitized text, profile and
//! re-linked bindings are unchanged compiles to the same result. Module
//! records of the loader are never cached.

use canvas_sanitizer::{ExternalBinding, ImportedName, Profile};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::pipeline::CompiledModule;

/// SHA-256 of everything a compiled module depends on besides the file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(path: &str, profile: Profile, text: &str, bindings: &[ExternalBinding]) -> Self {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };
        field(path.as_bytes());
        field(match profile {
            Profile::Entry => b"entry".as_slice(),
            Profile::Module => b"module".as_slice(),
        });
        field(text.as_bytes());
        for binding in bindings {
            field(binding.local.as_bytes());
            match &binding.imported {
                ImportedName::Default => field(b"default"),
                ImportedName::Namespace => field(b"*"),
                ImportedName::Named(name) => field(name.as_bytes()),
            }
            field(binding.source.as_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex()[..12])
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Compiled modules by fingerprint, for one session.
#[derive(Debug, Default)]
pub struct CompileCache {
    entries: HashMap<Fingerprint, Rc<CompiledModule>>,
    hits: usize,
    misses: usize,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached module for `fingerprint` if `still_valid` accepts it.
    pub fn lookup(
        &mut self,
        fingerprint: &Fingerprint,
        still_valid: impl FnOnce(&CompiledModule) -> bool,
    ) -> Option<Rc<CompiledModule>> {
        match self.entries.get(fingerprint) {
            Some(module) if still_valid(module) => {
                self.hits += 1;
                Some(Rc::clone(module))
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, module: Rc<CompiledModule>) {
        self.entries.insert(module.fingerprint, module);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_depends_on_every_input() {
        let base = Fingerprint::of("/App.tsx", Profile::Entry, "x", &[]);
        assert_eq!(base, Fingerprint::of("/App.tsx", Profile::Entry, "x", &[]));
        assert_ne!(base, Fingerprint::of("/App.ts", Profile::Entry, "x", &[]));
        assert_ne!(base, Fingerprint::of("/App.tsx", Profile::Module, "x", &[]));
        assert_ne!(base, Fingerprint::of("/App.tsx", Profile::Entry, "y", &[]));
        let binding = ExternalBinding {
            local: "React".into(),
            imported: ImportedName::Default,
            source: "react".into(),
        };
        assert_ne!(base, Fingerprint::of("/App.tsx", Profile::Entry, "x", &[binding]));
    }

    #[test]
    fn test_fields_do_not_run_together() {
        assert_ne!(
            Fingerprint::of("/ab", Profile::Entry, "c", &[]),
            Fingerprint::of("/a", Profile::Entry, "bc", &[]),
        );
    }

    #[test]
    fn test_hex_form() {
        let fp = Fingerprint::of("/App.tsx", Profile::Entry, "", &[]);
        assert_eq!(fp.to_hex().len(), 64);
        assert_eq!(fp.to_string().len(), 12);
    }
}
