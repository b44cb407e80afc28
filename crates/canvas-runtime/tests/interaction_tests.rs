//! Isolated mounts stay live: events, state updates, timers and routing.

use canvas_compiler::{CanvasConfig, JsxTranspiler};
use canvas_runtime::{
    render, Event, Mode, MountedTree, PropBag, RenderInput, RenderOutcome, RenderSession, RunStatus,
};
use canvas_types::VirtualProject;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn mount(source: &str) -> RenderOutcome {
    let project = VirtualProject::single("/App.tsx", source);
    let outcome = render(&project, Mode::Isolated, &PropBag::new(), &CanvasConfig::default());
    if let Some(failure) = outcome.failure() {
        panic!("render failed: {}", failure.message);
    }
    outcome
}

fn tree(outcome: &mut RenderOutcome) -> &mut MountedTree {
    outcome.tree_mut().expect("ready")
}

const COUNTER: &str = r#"import { useState } from "react";

export default function Counter({ step = 1 }) {
  const [count, setCount] = useState(0);
  return (
    <div>
      <span id="count">{count}</span>
      <button id="inc" onClick={() => setCount((c) => c + step)}>+</button>
      <button id="reset" onClick={() => setCount(0)}>reset</button>
    </div>
  );
}
"#;

// ─────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_counter_click_updates_state() {
    let mut outcome = mount(COUNTER);
    let tree = tree(&mut outcome);
    tree.click("#inc").unwrap();
    tree.click("#inc").unwrap();
    assert_eq!(tree.document().text_content(tree.query("#count").unwrap()), "2");
    tree.click("#reset").unwrap();
    assert_eq!(tree.document().text_content(tree.query("#count").unwrap()), "0");
}

#[test]
fn test_typing_into_a_controlled_input() {
    let mut outcome = mount(
        r#"import { useState } from "react";
export default function Greeter() {
  const [name, setName] = useState("");
  return (
    <form>
      <input name="who" value={name} onChange={(e) => setName(e.target.value)} />
      <p>Hello {name || "stranger"}</p>
    </form>
  );
}
"#,
    );
    let tree = tree(&mut outcome);
    assert_eq!(tree.text(), "Hello stranger");
    tree.input("input[name=who]", "Ada").unwrap();
    assert_eq!(tree.text(), "Hello Ada");
    let input = tree.query("input").unwrap();
    assert_eq!(tree.document().attribute(input, "value"), Some("Ada"));
}

#[test]
fn test_checkbox_toggles() {
    let mut outcome = mount(
        r#"import { useState } from "react";
export default function Toggle() {
  const [on, setOn] = useState(false);
  return (
    <label>
      <input type="checkbox" checked={on} onChange={(e) => setOn(e.target.checked)} />
      {on ? "on" : "off"}
    </label>
  );
}
"#,
    );
    let tree = tree(&mut outcome);
    tree.click("input").unwrap();
    assert_eq!(tree.text(), "on");
    tree.click("input").unwrap();
    assert_eq!(tree.text(), "off");
}

#[test]
fn test_events_bubble_and_can_be_stopped() {
    let mut outcome = mount(
        r#"import { useState } from "react";
export default function List() {
  const [log, setLog] = useState([]);
  const note = (what) => setLog((l) => [...l, what]);
  return (
    <div onClick={() => note("outer")}>
      <button id="plain" onClick={() => note("plain")}>a</button>
      <button id="stop" onClick={(e) => { e.stopPropagation(); note("stop"); }}>b</button>
      <p>{log.join(",")}</p>
    </div>
  );
}
"#,
    );
    let tree = tree(&mut outcome);
    tree.click("#plain").unwrap();
    tree.click("#stop").unwrap();
    assert_eq!(tree.document().text_content(tree.query("p").unwrap()), "plain,outer,stop");
}

#[test]
fn test_dispatch_reports_prevent_default() {
    let mut outcome = mount(
        r#"export default function Form() {
  return <form onSubmit={(e) => e.preventDefault()}><button>Send</button></form>;
}
"#,
    );
    let tree = tree(&mut outcome);
    let form = tree.query("form").unwrap();
    assert!(tree.dispatch(form, Event::new("submit")).unwrap());
}

#[test]
fn test_handler_error_is_returned() {
    let mut outcome = mount(
        r#"export default function Broken() {
  return <button onClick={() => { throw new Error("nope"); }}>x</button>;
}
"#,
    );
    let err = tree(&mut outcome).click("button").unwrap_err();
    assert_eq!(err.to_string(), "Uncaught Error: nope");
}

// ─────────────────────────────────────────────────────────────────────
// Effects and timers
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_timers_drive_state() {
    let mut outcome = mount(
        r#"import { useState, useEffect } from "react";
export default function Clock() {
  const [ticks, setTicks] = useState(0);
  useEffect(() => {
    const id = setTimeout(() => setTicks((t) => t + 1), 1000);
    return () => clearTimeout(id);
  }, [ticks]);
  return <time>{ticks}</time>;
}
"#,
    );
    let tree = tree(&mut outcome);
    assert_eq!(tree.text(), "0");
    assert_eq!(tree.run_timers().unwrap(), 1);
    assert_eq!(tree.text(), "1");
    tree.run_timers().unwrap();
    assert_eq!(tree.text(), "2");
}

#[test]
fn test_console_is_captured() {
    let outcome = mount(
        r#"export default function Logged() {
  console.log("rendering", 1);
  return null;
}
"#,
    );
    let tree = outcome.tree().unwrap();
    assert_eq!(tree.html(), "");
    assert_eq!(tree.console().len(), 1);
    assert_eq!(tree.console()[0].message, "rendering 1");
}

// ─────────────────────────────────────────────────────────────────────
// Routing
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_link_click_navigates() {
    let mut outcome = mount(
        r#"import { MemoryRouter, Routes, Route, Link, NavLink, useParams } from "react-router-dom";

function Home() {
  return <Link to="/users/7">Open user</Link>;
}

function User() {
  const { id } = useParams();
  return <h1>User {id}</h1>;
}

export default function App() {
  return (
    <MemoryRouter>
      <nav><NavLink to="/">Home</NavLink></nav>
      <Routes>
        <Route path="/" element={<Home />} />
        <Route path="/users/:id" element={<User />} />
      </Routes>
    </MemoryRouter>
  );
}
"#,
    );
    let tree = tree(&mut outcome);
    assert_eq!(tree.text(), "HomeOpen user");
    assert!(tree.query("a.active").is_some());

    tree.click("a[href=\"/users/7\"]").unwrap();
    assert_eq!(tree.text(), "HomeUser 7");
    assert!(tree.query("a.active").is_none());
}

// ─────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────

fn input(source: &str, mode: Mode) -> RenderInput {
    RenderInput::new(VirtualProject::single("/App.tsx", source), mode)
}

#[test]
fn test_session_replaces_shared_mount() {
    let mut session = RenderSession::ready(CanvasConfig::default());
    assert_eq!(session.submit(input("export default () => <p>first</p>;", Mode::Shared)), RunStatus::Rendered);
    assert_eq!(session.submit(input("export default () => <p>second</p>;", Mode::Shared)), RunStatus::Rendered);
    let page = session.host().body_html();
    assert!(!page.contains("first"), "{page}");
    assert!(page.contains("<p>second</p>"), "{page}");
    assert_eq!(page.matches("<style").count(), 1);

    session.clear();
    assert_eq!(session.host().body_html(), "<div id=\"canvas-root\"></div>");
}

#[test]
fn test_session_queue_keeps_only_the_latest_input() {
    let mut session = RenderSession::new(CanvasConfig::default());
    let early = session.request(input("export default () => <p>early</p>;", Mode::Isolated));
    let late = session.request(input("export default () => <p>late</p>;", Mode::Isolated));
    assert_eq!(session.run(early), RunStatus::Superseded);
    assert_eq!(session.run(late), RunStatus::Queued);
    assert_eq!(session.provide_transpiler(Box::new(JsxTranspiler)), Some(RunStatus::Rendered));
    assert_eq!(session.outcome().unwrap().tree().unwrap().html(), "<p>late</p>");
}

#[test]
fn test_session_error_then_recovery() {
    let mut session = RenderSession::ready(CanvasConfig::default());
    session.submit(input("export default () => <p>;", Mode::Isolated));
    assert!(!session.outcome().unwrap().is_ready());
    session.submit(input("export default () => <p>ok</p>;", Mode::Isolated));
    assert_eq!(session.outcome().unwrap().tree().unwrap().html(), "<p>ok</p>");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_last_request_always_wins(texts in prop::collection::vec("[a-z]{1,8}", 1..6)) {
        let mut session = RenderSession::ready(CanvasConfig::default());
        let tickets: Vec<_> = texts
            .iter()
            .map(|t| session.request(input(&format!("export default () => <p>{t}</p>;"), Mode::Isolated)))
            .collect();
        for ticket in tickets.iter().rev() {
            session.run(*ticket);
        }
        let last = texts.last().unwrap();
        prop_assert_eq!(session.outcome().unwrap().tree().unwrap().html(), format!("<p>{last}</p>"));
    }
}
