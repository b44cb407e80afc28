//! Render sessions: last-input-wins scheduling of renders.
//!
//! Every [`RenderSession::request`] bumps a generation counter; running a
//! ticket from an older generation does nothing. Until a transpiler is
//! provided, runs are queued and only the latest input is kept. Compiled
//! modules are cached across renders of one session; module records never
//! are, since every render builds its own loader.

use std::collections::BTreeMap;

use canvas_compiler::{CanvasConfig, JsxTranspiler, Manifest, ProjectCompiler, Transpiler};
use canvas_types::{ProjectError, RenderError, RenderFailure, VirtualProject};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::strategy::{strategy_for, HostPage, Mode, PropBag, RenderOutcome};

/// Everything one render depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInput {
    pub project: VirtualProject,
    pub mode: Mode,
    pub props: PropBag,
    pub manifest: Option<Manifest>,
}

impl RenderInput {
    pub fn new(project: VirtualProject, mode: Mode) -> Self {
        Self {
            project,
            mode,
            props: PropBag::default(),
            manifest: None,
        }
    }

    pub fn with_props(mut self, props: PropBag) -> Self {
        self.props = props;
        self
    }

    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }
}

/// Identifies one [`RenderSession::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What [`RenderSession::run`] did with a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Rendered,
    /// A newer request exists; the ticket was discarded.
    Superseded,
    /// No transpiler yet; the input waits for [`RenderSession::provide_transpiler`].
    Queued,
}

/// Owns the current outcome of one canvas.
pub struct RenderSession {
    config: CanvasConfig,
    compiler: ProjectCompiler,
    transpiler: Option<Box<dyn Transpiler>>,
    host: HostPage,
    generation: u64,
    latest: Option<RenderInput>,
    /// Generation of the outcome currently held.
    rendered: Option<u64>,
    current: Option<RenderOutcome>,
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("generation", &self.generation)
            .field("rendered", &self.rendered)
            .field("ready", &self.transpiler.is_some())
            .finish_non_exhaustive()
    }
}

impl RenderSession {
    /// A session waiting for its transpiler.
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            compiler: ProjectCompiler::new(&config),
            config,
            transpiler: None,
            host: HostPage::new(),
            generation: 0,
            latest: None,
            rendered: None,
            current: None,
        }
    }

    /// A session using the built-in transpiler from the start.
    pub fn ready(config: CanvasConfig) -> Self {
        let mut session = Self::new(config);
        session.transpiler = Some(Box::new(JsxTranspiler));
        session
    }

    /// Use `host` for shared-mode renders.
    pub fn with_host(mut self, host: HostPage) -> Self {
        self.host = host;
        self
    }

    pub fn host(&self) -> &HostPage {
        &self.host
    }

    pub fn is_ready(&self) -> bool {
        self.transpiler.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a new input; it supersedes every earlier one.
    pub fn request(&mut self, input: RenderInput) -> Ticket {
        self.generation += 1;
        self.latest = Some(input);
        debug!(generation = self.generation, "render requested");
        Ticket {
            generation: self.generation,
        }
    }

    pub fn run(&mut self, ticket: Ticket) -> RunStatus {
        if ticket.generation != self.generation {
            debug!(ticket = ticket.generation, latest = self.generation, "stale ticket discarded");
            return RunStatus::Superseded;
        }
        if self.transpiler.is_none() {
            return RunStatus::Queued;
        }
        self.render_latest();
        RunStatus::Rendered
    }

    /// `request` then `run`.
    pub fn submit(&mut self, input: RenderInput) -> RunStatus {
        let ticket = self.request(input);
        self.run(ticket)
    }

    /// Make the session ready. Only the first transpiler is kept; the
    /// latest queued input, if any, renders right away.
    pub fn provide_transpiler(&mut self, transpiler: Box<dyn Transpiler>) -> Option<RunStatus> {
        if self.transpiler.is_some() {
            return None;
        }
        info!("transpiler ready");
        self.transpiler = Some(transpiler);
        let pending = self.latest.is_some() && self.rendered != Some(self.generation);
        pending.then(|| {
            self.render_latest();
            RunStatus::Rendered
        })
    }

    pub fn outcome(&self) -> Option<&RenderOutcome> {
        self.current.as_ref()
    }

    pub fn outcome_mut(&mut self) -> Option<&mut RenderOutcome> {
        self.current.as_mut()
    }

    /// Drop the current outcome, unmounting it.
    pub fn clear(&mut self) {
        self.current = None;
        self.rendered = None;
    }

    pub fn compiler(&self) -> &ProjectCompiler {
        &self.compiler
    }

    #[instrument(level = "debug", skip(self), fields(generation = self.generation))]
    fn render_latest(&mut self) {
        let (Some(input), Some(transpiler)) = (self.latest.as_ref(), self.transpiler.as_deref()) else {
            return;
        };
        // The previous mount may occupy the same host container.
        self.current = None;
        let outcome = match self.compiler.compile(&input.project, transpiler, input.manifest.as_ref()) {
            Ok(project) => {
                let strategy = strategy_for(input.mode, Some(&self.host), self.config.runtime.clone());
                strategy.execute(&project, &input.props)
            }
            Err(error) => RenderOutcome::Error(error.failure()),
        };
        self.current = Some(outcome);
        self.rendered = Some(self.generation);
    }
}

/// Compile and mount `project` once, outside any session.
pub fn render(project: &VirtualProject, mode: Mode, props: &PropBag, config: &CanvasConfig) -> RenderOutcome {
    let mut compiler = ProjectCompiler::new(config);
    match compiler.compile(project, &JsxTranspiler, None) {
        Ok(compiled) => strategy_for(mode, None, config.runtime.clone()).execute(&compiled, props),
        Err(error) => RenderOutcome::Error(error.failure()),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// JSON requests
// ══════════════════════════════════════════════════════════════════════════════

/// The JSON form of a render request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderRequest {
    pub files: BTreeMap<String, String>,
    pub entry: String,
    #[serde(default)]
    pub mode: Mode,
    /// Call-time overrides.
    #[serde(default)]
    pub props: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub defaults: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub manifest: Option<Manifest>,
    #[serde(default)]
    pub config: Option<CanvasConfig>,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid render request: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl RequestError {
    /// A missing entry is reported like any missing module.
    pub fn failure(&self) -> RenderFailure {
        let error = match self {
            RequestError::Project(ProjectError::MissingEntry(path)) => RenderError::ModuleNotFound(path.clone()),
            other => RenderError::evaluation(other.to_string()),
        };
        RenderFailure::from_error(&error, None)
    }
}

impl RenderRequest {
    pub fn from_json(text: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn into_input(self) -> Result<(RenderInput, CanvasConfig), RequestError> {
        let project = VirtualProject::new(self.files, &self.entry)?;
        let input = RenderInput {
            project,
            mode: self.mode,
            props: PropBag {
                defaults: self.defaults,
                overrides: self.props,
            },
            manifest: self.manifest,
        };
        Ok((input, self.config.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_types::ErrorKind;
    use pretty_assertions::assert_eq;

    fn app(text: &str) -> RenderInput {
        RenderInput::new(VirtualProject::single("/App.tsx", text), Mode::Isolated)
    }

    #[test]
    fn test_only_the_latest_ticket_renders() {
        let mut session = RenderSession::ready(CanvasConfig::default());
        let first = session.request(app("export default () => <p>one</p>;"));
        let second = session.request(app("export default () => <p>two</p>;"));
        assert_eq!(session.run(first), RunStatus::Superseded);
        assert!(session.outcome().is_none());
        assert_eq!(session.run(second), RunStatus::Rendered);
        assert_eq!(session.outcome().unwrap().tree().unwrap().html(), "<p>two</p>");
    }

    #[test]
    fn test_runs_queue_until_the_transpiler_arrives() {
        let mut session = RenderSession::new(CanvasConfig::default());
        let ticket = session.request(app("export default () => <p>one</p>;"));
        assert_eq!(session.run(ticket), RunStatus::Queued);
        let ticket = session.request(app("export default () => <p>latest</p>;"));
        assert_eq!(session.run(ticket), RunStatus::Queued);
        assert!(session.outcome().is_none());

        assert_eq!(session.provide_transpiler(Box::new(JsxTranspiler)), Some(RunStatus::Rendered));
        assert_eq!(session.outcome().unwrap().tree().unwrap().html(), "<p>latest</p>");
        assert_eq!(session.provide_transpiler(Box::new(JsxTranspiler)), None);
    }

    #[test]
    fn test_compile_cache_survives_renders() {
        let mut session = RenderSession::ready(CanvasConfig::default());
        let input = app("export default () => <p>same</p>;");
        session.submit(input.clone());
        session.submit(input);
        assert_eq!(session.compiler().cache().hits(), 1);
    }

    #[test]
    fn test_request_json() {
        let request = RenderRequest::from_json(
            r#"{ "files": { "App.tsx": "export default ({ n }) => <b>{n}</b>;" }, "entry": "/App", "mode": "shared", "props": { "n": 3 } }"#,
        )
        .unwrap();
        let (input, config) = request.into_input().unwrap();
        assert_eq!(input.mode, Mode::Shared);
        assert_eq!(input.project.entry(), "/App.tsx");
        assert_eq!(config, CanvasConfig::default());
        let outcome = render(&input.project, input.mode, &input.props, &config);
        assert_eq!(outcome.tree().unwrap().html(), "<b>3</b>");
    }

    #[test]
    fn test_missing_entry_is_module_not_found() {
        let request = RenderRequest::from_json(r#"{ "files": { "/A.tsx": "" }, "entry": "/App" }"#).unwrap();
        let err = request.into_input().unwrap_err();
        assert_eq!(err.failure().kind, ErrorKind::ModuleNotFound);
    }
}
