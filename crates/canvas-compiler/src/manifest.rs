//! The advisory dependency manifest generated projects may carry.
//!
//! Versions are never enforced. A package the host has no shim for only
//! produces a warning; importing it still fails resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::pipeline::CompileWarning;
use crate::shims::Shim;

/// `{ "dependencies": { "name": "version" } }`; other keys are ignored so a
/// whole `package.json` can be passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Manifest)
    }

    /// One warning per declared package without a shim, sorted by name.
    pub fn advisories(&self) -> Vec<CompileWarning> {
        self.dependencies
            .iter()
            .filter(|(name, _)| !Self::is_provided(name))
            .map(|(name, version)| CompileWarning::Manifest {
                package: name.clone(),
                version: version.clone(),
            })
            .collect()
    }

    /// Packages the host supplies itself, either as a shim or as the
    /// runtime every shim sits on.
    fn is_provided(name: &str) -> bool {
        Shim::from_specifier(name).is_some() || matches!(name, "react-dom" | "typescript")
    }
}
