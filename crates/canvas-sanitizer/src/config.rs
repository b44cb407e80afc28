use serde::{Deserialize, Serialize};

/// Which passes run. Every pass is on by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizerConfig {
    pub strip_fences: bool,
    pub remove_external_imports: bool,
    pub strip_type_annotations: bool,
    pub strip_trailing_prose: bool,
    pub nest_helpers: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            strip_fences: true,
            remove_external_imports: true,
            strip_type_annotations: true,
            strip_trailing_prose: true,
            nest_helpers: true,
        }
    }
}

/// The entry file gets every pass. Other project files keep their imports,
/// annotations and named exports since the pipeline links them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Entry,
    Module,
}
