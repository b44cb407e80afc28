//! Pass a: markdown code fences and bare language-name lines.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(```|~~~)[\w+#.-]*\s*$").expect("fence regex must compile"));

const LANGUAGE_NAMES: &[&str] = &[
    "tsx",
    "jsx",
    "ts",
    "js",
    "typescript",
    "javascript",
    "react",
    "typescriptreact",
    "javascriptreact",
];

fn is_language_name(line: &str) -> bool {
    let word = line.trim();
    LANGUAGE_NAMES.iter().any(|name| word.eq_ignore_ascii_case(name))
}

/// Remove fence lines (```` ```tsx ````, `~~~`), a language name on the line
/// right after a fence, and language names before the first line of code.
/// Returns `None` when nothing was removed.
pub fn strip_fences(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut keep = vec![true; lines.len()];
    let mut after_fence = false;
    let mut seen_code = false;

    for (i, line) in lines.iter().enumerate() {
        if FENCE.is_match(line.trim_end_matches(['\n', '\r'])) {
            keep[i] = false;
            after_fence = true;
            continue;
        }
        if is_language_name(line) && (after_fence || !seen_code) {
            keep[i] = false;
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        after_fence = false;
        seen_code = true;
    }

    if keep.iter().all(|k| *k) {
        return None;
    }
    let out: String = lines
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(line, _)| *line)
        .collect();
    Some(out)
}
