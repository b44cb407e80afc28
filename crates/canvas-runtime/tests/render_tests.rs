//! End-to-end renders: compile a virtual project, mount it, inspect the
//! document.

use canvas_compiler::CanvasConfig;
use canvas_runtime::{
    render, strategy_for, DomSnapshot, HostPage, Mode, OutcomeReport, PropBag, RenderOutcome,
    INERT_ATTRIBUTE, STYLE_ATTRIBUTE,
};
use canvas_types::{ErrorKind, VirtualProject};
use pretty_assertions::assert_eq;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn project(files: &[(&str, &str)], entry: &str) -> VirtualProject {
    VirtualProject::new(files.iter().copied(), entry).expect("valid project")
}

fn isolated(project: &VirtualProject) -> RenderOutcome {
    render(project, Mode::Isolated, &PropBag::new(), &CanvasConfig::default())
}

fn html(outcome: &RenderOutcome) -> String {
    match outcome {
        RenderOutcome::Ready(tree) => tree.html(),
        RenderOutcome::Error(failure) => panic!("render failed: {}", failure.message),
    }
}

const FENCED_COUNTER: &str = r#"```tsx
import React, { useState } from "react";

export default function App() {
  const [count, setCount] = useState(0);
  return <button onClick={() => setCount(count + 1)}>Clicked {count}</button>;
}
```

This component renders a counter button.
"#;

const SIBLING_HELPERS: &str = r#"import { cn } from "@/lib/utils";

function Avatar({ name }) {
  return <span className={cn("avatar")}>{name[0]}</span>;
}

const Greeting = ({ name }) => <h1>Hello, {name}</h1>;

export default function Profile() {
  return (
    <div>
      <Avatar name="Ada" />
      <Greeting name="Ada" />
    </div>
  );
}
"#;

// ─────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_child_component_renders() {
    let project = project(
        &[
            ("/App", "import Child from './Child';\nexport default function App() { return <main><Child /></main>; }"),
            ("/Child", "export default function Child() { return 'hi'; }"),
        ],
        "/App",
    );
    let outcome = isolated(&project);
    assert_eq!(html(&outcome), "<main>hi</main>");
    assert_eq!(outcome.tree().unwrap().text(), "hi");
}

#[test]
fn test_missing_import_is_a_resolution_error() {
    let project = project(
        &[("/App", "import Missing from './Missing';\nexport default () => <Missing />;")],
        "/App",
    );
    let outcome = isolated(&project);
    let failure = outcome.failure().expect("error outcome");
    assert_eq!(failure.kind, ErrorKind::Resolution);
    assert!(failure.message.contains("./Missing"), "{}", failure.message);
    assert!(failure.message.contains("/App"), "{}", failure.message);
}

#[test]
fn test_fenced_entry_with_prose_renders() {
    let project = VirtualProject::single("/App.tsx", FENCED_COUNTER);
    assert_eq!(html(&isolated(&project)), "<button>Clicked 0</button>");
}

#[test]
fn test_sibling_helpers_render_inside_the_component() {
    let project = VirtualProject::single("/Profile.tsx", SIBLING_HELPERS);
    assert_eq!(
        html(&isolated(&project)),
        "<div><span class=\"avatar\">A</span><h1>Hello, Ada</h1></div>"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_shared_dependency_evaluates_once() {
    let project = project(
        &[
            (
                "/App.tsx",
                "import { log } from './log';\nimport A from './A';\nimport B from './B';\n\
                 export default function App() { return <p><A /><B />{log.length}</p>; }",
            ),
            ("/A.tsx", "import { log } from './log';\nexport default () => 'a';"),
            ("/B.tsx", "import { log } from './log';\nexport default () => 'b';"),
            ("/log.ts", "export const log = [];\nlog.push('evaluated');"),
        ],
        "/App",
    );
    assert_eq!(html(&isolated(&project)), "<p>ab1</p>");
}

#[test]
fn test_isolated_renders_do_not_share_module_state() {
    let project = project(
        &[
            (
                "/App.tsx",
                "import { next } from './counter';\nconst first = next();\n\
                 export default function App() { return <p>{first}</p>; }",
            ),
            ("/counter.ts", "let calls = 0;\nexport function next() { calls += 1; return calls; }"),
        ],
        "/App",
    );
    let first = isolated(&project);
    let second = isolated(&project);
    assert_eq!(html(&first), "<p>1</p>");
    assert_eq!(html(&second), "<p>1</p>");
}

#[test]
fn test_unreachable_broken_file_is_ignored() {
    let project = project(
        &[("/App.tsx", "export default () => <b>fine</b>;"), ("/Broken.tsx", "export default (")],
        "/App",
    );
    assert_eq!(html(&isolated(&project)), "<b>fine</b>");
}

// ─────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_thrown_error_carries_an_excerpt() {
    let project = VirtualProject::single(
        "/App.tsx",
        "export default function App() {\n  throw new Error('boom');\n}\n",
    );
    let outcome = isolated(&project);
    let failure = outcome.failure().expect("error outcome");
    assert_eq!(failure.kind, ErrorKind::Evaluation);
    assert_eq!(failure.message, "Uncaught Error: boom");
    assert_eq!(failure.path.as_deref(), Some("/App.tsx"));
    let excerpt = failure.excerpt.as_ref().expect("excerpt");
    assert_eq!(excerpt.line, 2);
    assert!(excerpt.lines.iter().any(|(_, text)| text.contains("throw")));
}

#[test]
fn test_syntax_error_is_a_transpile_error() {
    let project = VirtualProject::single("/App.tsx", "export default function App() { return <div>; }");
    let failure = isolated(&project).failure().cloned().expect("error outcome");
    assert_eq!(failure.kind, ErrorKind::Transpile);
    assert_eq!(failure.path.as_deref(), Some("/App.tsx"));
}

#[test]
fn test_undefined_name_is_reported() {
    let project = VirtualProject::single("/App.tsx", "export default function App() { return <Card />; }");
    let failure = isolated(&project).failure().cloned().expect("error outcome");
    assert_eq!(failure.message, "ReferenceError: Card is not defined");
}

#[test]
fn test_runaway_allocation_is_a_range_error() {
    for source in [
        "export default function App() { const a = []; a[3000000000] = 1; return <p>{a.length}</p>; }",
        "export default function App() { return <p>{'x'.repeat(2 ** 40)}</p>; }",
    ] {
        let project = VirtualProject::single("/App.tsx", source);
        let failure = isolated(&project).failure().cloned().expect("error outcome");
        assert_eq!(failure.kind, ErrorKind::Evaluation);
        assert!(failure.message.starts_with("RangeError: Invalid"), "{}", failure.message);
    }
}

#[test]
fn test_error_report_serialises_flat() {
    let project = VirtualProject::single("/App.tsx", "export default 42;");
    let report = serde_json::to_value(isolated(&project).report()).unwrap();
    assert_eq!(report["status"], "error");
    assert_eq!(report["kind"], "evaluation");
}

// ─────────────────────────────────────────────────────────────────────
// Shared mode
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_shared_mount_is_inert_and_cleans_up() {
    let host = HostPage::new();
    let project = canvas_compiler::compile_project(
        &VirtualProject::single("/App.tsx", "export default () => <button onClick={() => {}}>Go</button>;"),
        &CanvasConfig::default(),
    )
    .unwrap();
    let strategy = strategy_for(Mode::Shared, Some(&host), Default::default());
    assert_eq!(strategy.mode(), Mode::Shared);

    let mut outcome = strategy.execute(&project, &PropBag::new());
    {
        let doc = host.document();
        assert!(doc.has_attribute(host.container(), INERT_ATTRIBUTE));
        assert_eq!(doc.attribute(host.container(), "style"), Some("pointer-events: none"));
        assert!(doc.query_selector(doc.body(), &format!("style[{STYLE_ATTRIBUTE}]")).is_some());
    }
    let tree = outcome.tree_mut().expect("ready");
    assert_eq!(tree.html(), "<button>Go</button>");
    assert!(matches!(
        tree.click("button"),
        Err(canvas_runtime::EvalError::InteractionBlocked)
    ));

    drop(outcome);
    assert_eq!(host.body_html(), "<div id=\"canvas-root\"></div>");
}

#[test]
fn test_dropping_a_superseded_shared_mount_keeps_the_newer_one() {
    let host = HostPage::new();
    let compile = |source: &str| {
        canvas_compiler::compile_project(&VirtualProject::single("/App.tsx", source), &CanvasConfig::default())
            .unwrap()
    };
    let strategy = strategy_for(Mode::Shared, Some(&host), Default::default());
    let older = strategy.execute(&compile("export default () => <p>older</p>;"), &PropBag::new());
    let newer = strategy.execute(&compile("export default () => <p>newer</p>;"), &PropBag::new());
    assert_eq!(host.body_html().matches("<style").count(), 1);

    drop(older);
    assert_eq!(newer.tree().expect("ready").html(), "<p>newer</p>");
    let page = host.body_html();
    assert!(page.contains("<p>newer</p>"), "{page}");
    assert_eq!(page.matches("<style").count(), 1);
    assert!(host.document().has_attribute(host.container(), INERT_ATTRIBUTE));

    drop(newer);
    assert_eq!(host.body_html(), "<div id=\"canvas-root\"></div>");
}

#[test]
fn test_ready_report_names_the_mode() {
    let project = VirtualProject::single("/App.tsx", "export default () => <i>x</i>;");
    let outcome = render(&project, Mode::Shared, &PropBag::new(), &CanvasConfig::default());
    match outcome.report() {
        OutcomeReport::Ready { mode, html, text, .. } => {
            assert_eq!(mode, Mode::Shared);
            assert_eq!(html, "<i>x</i>");
            assert_eq!(text, "x");
        }
        OutcomeReport::Error { failure } => panic!("render failed: {}", failure.message),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_renders_are_deterministic() {
    let project = VirtualProject::single(
        "/App.tsx",
        r#"import { Star } from "lucide-react";
import { useState, useMemo } from "react";

export default function App() {
  const [items] = useState(() => ["b", "a", "c"]);
  const sorted = useMemo(() => [...items].sort(), [items]);
  const roll = Math.floor(Math.random() * 1000);
  return (
    <ul className="list" data-roll={roll}>
      {sorted.map((item) => <li key={item}><Star size={12} />{item}</li>)}
    </ul>
  );
}
"#,
    );
    let first: Vec<DomSnapshot> = isolated(&project).tree().expect("ready").snapshot();
    for _ in 0..100 {
        assert_eq!(isolated(&project).tree().expect("ready").snapshot(), first);
    }
}
