//! Browser-side checks of the exported bindings.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn shim_names_is_an_array() {
    let names = canvas_wasm::shim_names().expect("serialises");
    let names: Vec<String> = serde_wasm_bindgen::from_value(names).expect("array of strings");
    assert!(names.iter().any(|n| n == "react"));
    assert!(names.iter().any(|n| n == "lucide-react"));
}

#[wasm_bindgen_test]
fn render_round_trips_json() {
    let out = canvas_wasm::render(
        r#"{"files":{"/App.tsx":"export default () => <p>hi</p>;"},"entry":"/App.tsx","mode":"shared"}"#,
    );
    let out: serde_json::Value = serde_json::from_str(&out).expect("json");
    assert_eq!(out["status"], "ready");
    assert_eq!(out["html"], "<p>hi</p>");
}
