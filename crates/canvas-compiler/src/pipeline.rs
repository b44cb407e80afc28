//! Project compilation: sanitize, transpile and resolve every module
//! reachable from the entry.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use canvas_sanitizer::{Fix, Profile, SanitizeWarning, Sanitizer};
use canvas_types::{RenderError, RenderFailure, SourceFile, VirtualProject};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::cache::{CompileCache, Fingerprint};
use crate::config::CanvasConfig;
use crate::error::{CompileError, CompileResult};
use crate::manifest::Manifest;
use crate::resolver::{Resolution, ResolvedImport, Resolver};
use crate::transpile::{ExecutableModule, JsxTranspiler, TranspileInput, Transpiler};

/// A non-fatal finding of a compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CompileWarning {
    /// A sanitizer rewrite was refused.
    Sanitizer {
        path: String,
        warning: SanitizeWarning,
    },
    /// The manifest declares a package the host does not provide.
    Manifest { package: String, version: String },
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileWarning::Sanitizer { path, warning } => write!(f, "{path}: {warning}"),
            CompileWarning::Manifest { package, version } => {
                write!(f, "package '{package}@{version}' has no host shim")
            }
        }
    }
}

/// One module after sanitization and transpilation.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub path: String,
    pub executable: ExecutableModule,
    /// The sanitized text; spans of the executable body point into it.
    pub source: SourceFile,
    pub fixes: Vec<Fix>,
    pub warnings: Vec<SanitizeWarning>,
    pub fingerprint: Fingerprint,
}

impl CompiledModule {
    pub fn imports(&self) -> &[ResolvedImport] {
        &self.executable.imports
    }
}

/// Every module reachable from the entry, keyed by path.
#[derive(Debug, Clone)]
pub struct CompiledProject {
    pub entry: String,
    pub modules: BTreeMap<String, Rc<CompiledModule>>,
    pub warnings: Vec<CompileWarning>,
}

impl CompiledProject {
    pub fn module(&self, path: &str) -> Option<&CompiledModule> {
        self.modules.get(path).map(Rc::as_ref)
    }

    pub fn entry_module(&self) -> Option<&CompiledModule> {
        self.module(&self.entry)
    }

    /// Fixes the sanitizer applied to the entry file.
    pub fn entry_fixes(&self) -> &[Fix] {
        self.entry_module()
            .map(|m| m.fixes.as_slice())
            .unwrap_or_default()
    }

    /// Describe `error` with an excerpt of the module it points into.
    pub fn failure(&self, error: &RenderError) -> RenderFailure {
        let source = error
            .path()
            .and_then(|path| self.module(path))
            .map(|module| &module.source);
        RenderFailure::from_error(error, source)
    }
}

/// Compiles projects, caching modules across calls.
#[derive(Debug)]
pub struct ProjectCompiler {
    sanitizer: Sanitizer,
    resolver: Resolver,
    cache: CompileCache,
}

impl ProjectCompiler {
    pub fn new(config: &CanvasConfig) -> Self {
        let resolver = Resolver::new(config.resolver.clone());
        let sanitizer = Sanitizer::new(config.sanitizer.clone())
            .with_alias_prefixes(resolver.alias_prefixes().to_vec());
        Self {
            sanitizer,
            resolver,
            cache: CompileCache::new(),
        }
    }

    pub fn cache(&self) -> &CompileCache {
        &self.cache
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Compile the entry and, breadth-first, every project file it reaches.
    /// Files nothing imports are never read.
    #[instrument(level = "debug", skip_all, fields(entry = project.entry(), files = project.len()))]
    pub fn compile(
        &mut self,
        project: &VirtualProject,
        transpiler: &dyn Transpiler,
        manifest: Option<&Manifest>,
    ) -> CompileResult<CompiledProject> {
        let entry = project.entry().to_string();
        let mut warnings = Vec::new();
        if let Some(manifest) = manifest {
            for advisory in manifest.advisories() {
                warn!(%advisory, "manifest advisory");
                warnings.push(advisory);
            }
        }

        let mut modules = BTreeMap::new();
        let mut queue = VecDeque::from([entry.clone()]);
        let mut seen = BTreeSet::from([entry.clone()]);
        while let Some(path) = queue.pop_front() {
            let profile = if path == entry {
                Profile::Entry
            } else {
                Profile::Module
            };
            let module = self.compile_module(project, &path, profile, transpiler)?;

            for import in module.imports() {
                match &import.resolution {
                    Resolution::Unresolved => {
                        let error = RenderError::Resolution {
                            specifier: import.specifier.clone(),
                            importer: path.clone(),
                        };
                        return Err(CompileError::new(error, Some(module.source.clone())));
                    }
                    Resolution::Path(target) => {
                        if seen.insert(target.clone()) {
                            queue.push_back(target.clone());
                        }
                    }
                    Resolution::External(_) => {}
                }
            }
            for warning in &module.warnings {
                warnings.push(CompileWarning::Sanitizer {
                    path: path.clone(),
                    warning: warning.clone(),
                });
            }
            modules.insert(path, module);
        }

        debug!(modules = modules.len(), "project compiled");
        Ok(CompiledProject {
            entry,
            modules,
            warnings,
        })
    }

    fn compile_module(
        &mut self,
        project: &VirtualProject,
        path: &str,
        profile: Profile,
        transpiler: &dyn Transpiler,
    ) -> CompileResult<Rc<CompiledModule>> {
        let text = project
            .get(path)
            .ok_or_else(|| RenderError::ModuleNotFound(path.to_string()))?;
        let sanitized = self.sanitizer.run(text, profile);
        let fingerprint =
            Fingerprint::of(path, profile, &sanitized.text, &sanitized.external_bindings);

        let resolver = &self.resolver;
        let cached = self.cache.lookup(&fingerprint, |module| {
            module
                .imports()
                .iter()
                .all(|i| resolver.resolve(path, &i.specifier, project) == i.resolution)
        });
        if let Some(module) = cached {
            debug!(path, %fingerprint, "compile cache hit");
            return Ok(module);
        }

        let resolve = |specifier: &str| resolver.resolve(path, specifier, project);
        let input = TranspileInput::new(path, &sanitized.text, &resolve)
            .with_bindings(&sanitized.external_bindings);
        let source = SourceFile::new(path, sanitized.text.as_str());
        let executable = transpiler
            .transpile(&input)
            .map_err(|e| CompileError::new(e.into(), Some(source.clone())))?;

        let module = Rc::new(CompiledModule {
            path: path.to_string(),
            executable,
            source,
            fixes: sanitized.fixes,
            warnings: sanitized.warnings,
            fingerprint,
        });
        self.cache.insert(Rc::clone(&module));
        Ok(module)
    }
}

/// Compile a project once with the built-in transpiler.
pub fn compile_project(project: &VirtualProject, config: &CanvasConfig) -> CompileResult<CompiledProject> {
    ProjectCompiler::new(config).compile(project, &JsxTranspiler, None)
}
