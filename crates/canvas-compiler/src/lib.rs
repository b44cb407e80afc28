//! Live canvas compiler: turns a virtual project into linked, executable
//! modules.
//!
//! ```text
//! raw files → Sanitizer → Resolver + Transpiler (per reachable file) → CompiledProject
//! ```
//!
//! Every step is a deterministic function of the project, the entry path
//! and the configuration.

pub mod cache;
pub mod config;
pub mod emit;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod resolver;
pub mod shims;
pub mod transpile;

pub use cache::{CompileCache, Fingerprint};
pub use config::{CanvasConfig, RuntimeConfig};
pub use emit::emit_js;
pub use error::{CompileError, CompileResult, ConfigError, TranspileError};
pub use manifest::Manifest;
pub use pipeline::{compile_project, CompileWarning, CompiledModule, CompiledProject, ProjectCompiler};
pub use resolver::{
    resolve, ProjectPaths, Resolution, ResolvedImport, Resolver, ResolverConfig, PROBE_SUFFIXES,
};
pub use shims::{shim_names, Shim};
pub use transpile::{transpile, ExecutableModule, JsxTranspiler, TranspileInput, Transpiler};
