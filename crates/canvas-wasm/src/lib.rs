//! The live canvas pipeline as a WASM module for browser environments.
//!
//! Every entry point takes and returns JSON strings, except
//! [`shim_names`], which returns a plain array.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { render, sanitize } from 'canvas-wasm';
//!
//! await init();
//!
//! const outcome = JSON.parse(render(JSON.stringify({
//!   files: { "/App.tsx": "export default () => <p>hi</p>;" },
//!   entry: "/App.tsx",
//!   mode: "isolated",
//! })));
//! // { status: "ready", mode: "isolated", html: "<p>hi</p>", text: "hi", console: [] }
//! ```

use std::collections::BTreeSet;

use canvas_compiler::Resolution;
use canvas_runtime::{OutcomeReport, RenderRequest, RenderSession};
use canvas_sanitizer::Profile;
use canvas_types::{normalize_path, RenderError, RenderFailure};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Compile and mount a project described by a render request.
///
/// Returns an outcome report: `{"status": "ready", "html", "text", ...}`
/// or `{"status": "error", "kind", "message", "path"?, "excerpt"?}`.
#[wasm_bindgen]
pub fn render(request_json: &str) -> String {
    to_json(&render_report(request_json))
}

fn render_report(request_json: &str) -> OutcomeReport {
    let parsed = RenderRequest::from_json(request_json).and_then(RenderRequest::into_input);
    let (input, config) = match parsed {
        Ok(parsed) => parsed,
        Err(error) => {
            return OutcomeReport::Error {
                failure: error.failure(),
            }
        }
    };
    let mut session = RenderSession::ready(config);
    session.submit(input);
    match session.outcome() {
        Some(outcome) => outcome.report(),
        None => OutcomeReport::Error {
            failure: RenderFailure::from_error(&RenderError::evaluation("render produced no outcome"), None),
        },
    }
}

/// Run the entry-profile sanitizer over `text`.
///
/// Returns `{"text", "fixes", "warnings", "external_bindings"}`.
#[wasm_bindgen]
pub fn sanitize(text: &str) -> String {
    to_json(&canvas_sanitizer::sanitize(text, Profile::Entry))
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum TranspileReport {
    Ok {
        code: String,
    },
    Error {
        #[serde(flatten)]
        failure: RenderFailure,
    },
}

/// Lower one file to JavaScript.
///
/// Returns `{"status": "ok", "code"}`, or an error report like
/// [`render`]'s.
#[wasm_bindgen]
pub fn transpile(text: &str, path: &str) -> String {
    let path = normalize_path(path);
    let report = match canvas_compiler::transpile(text, &path) {
        Ok(module) => TranspileReport::Ok { code: module.to_js() },
        Err(error) => TranspileReport::Error {
            failure: RenderFailure::from_error(&error.into(), None),
        },
    };
    to_json(&report)
}

/// Resolve `specifier` imported from `from_path` against a JSON array of
/// project paths.
///
/// Returns `{"kind": "path" | "external", "target"}` or
/// `{"kind": "unresolved"}`. A malformed path list resolves nothing.
#[wasm_bindgen]
pub fn resolve(from_path: &str, specifier: &str, paths_json: &str) -> String {
    let paths: BTreeSet<String> = serde_json::from_str::<Vec<String>>(paths_json)
        .map(|paths| paths.iter().map(|p| normalize_path(p)).collect())
        .unwrap_or_default();
    let resolution: Resolution = canvas_compiler::resolve(&normalize_path(from_path), specifier, &paths);
    to_json(&resolution)
}

/// The package specifiers the host provides, as a JS array of strings.
#[wasm_bindgen]
pub fn shim_names() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&canvas_compiler::shim_names()).map_err(JsValue::from)
}

/// Return the pipeline version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(
            r#"{{"status":"error","kind":"evaluation","message":"Serialization error: {}"}}"#,
            e.to_string().replace('"', "'")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn parse(text: &str) -> Value {
        serde_json::from_str(text).expect("valid json")
    }

    #[test]
    fn test_render_ready() {
        let request = json!({
            "files": { "/App.tsx": "export default ({ who }) => <p>hi {who}</p>;" },
            "entry": "/App",
            "defaults": { "who": "there" },
        });
        let outcome = parse(&render(&request.to_string()));
        assert_eq!(outcome["status"], "ready");
        assert_eq!(outcome["mode"], "isolated");
        assert_eq!(outcome["html"], "<p>hi there</p>");
    }

    #[test]
    fn test_render_missing_entry() {
        let request = json!({ "files": { "/A.tsx": "" }, "entry": "/App.tsx" });
        let outcome = parse(&render(&request.to_string()));
        assert_eq!(outcome["status"], "error");
        assert_eq!(outcome["kind"], "module_not_found");
    }

    #[test]
    fn test_render_rejects_malformed_requests() {
        let outcome = parse(&render("{ not json"));
        assert_eq!(outcome["status"], "error");
        assert_eq!(outcome["kind"], "evaluation");
    }

    #[test]
    fn test_sanitize_reports_fixes() {
        let out = parse(&sanitize("```tsx\nexport default () => <b>x</b>;\n```"));
        let text = out["text"].as_str().unwrap();
        assert!(!text.contains("```"), "{text}");
        assert!(text.contains("export default () => <b>x</b>;"), "{text}");
        assert_eq!(out["fixes"][0]["fix"], "stripped_fences");
    }

    #[test]
    fn test_transpile_ok_and_error() {
        let ok = parse(&transpile("export default () => <b>x</b>;", "App.tsx"));
        assert_eq!(ok["status"], "ok");
        assert!(ok["code"].as_str().unwrap().contains("exports.default"));

        let err = parse(&transpile("export default (", "/App.tsx"));
        assert_eq!(err["status"], "error");
        assert_eq!(err["kind"], "transpile");
        assert_eq!(err["path"], "/App.tsx");
    }

    #[test]
    fn test_resolve() {
        let paths = r#"["/App.tsx", "/components/Card.tsx"]"#;
        assert_eq!(
            parse(&resolve("/App.tsx", "./components/Card", paths)),
            json!({ "kind": "path", "target": "/components/Card.tsx" })
        );
        assert_eq!(
            parse(&resolve("/App.tsx", "react", paths)),
            json!({ "kind": "external", "target": "react" })
        );
        assert_eq!(parse(&resolve("/App.tsx", "./Nope", paths)), json!({ "kind": "unresolved" }));
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
