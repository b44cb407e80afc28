//! Pass d: explanation text appended after the code.

use canvas_lexer::TokenKind;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::scan::{Chunk, Scan};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+\S").expect("heading regex"));
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+\.|[-*+])\s+[A-Za-z*_`]").expect("list regex"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\*\*|__)\S").expect("emphasis regex"));
static SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z'’]*(\s+\S+){2,}").expect("sentence regex"));

/// Output of [`strip_trailing_prose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProseRemoval {
    pub text: String,
    /// The removed tail.
    pub prose: String,
}

/// Cut everything after the main export when the text following it, on
/// the closing line or the first non-blank line below, reads as prose (a heading, list item, emphasis or a plain
/// capitalised sentence) and no further imports or declarations follow.
pub fn strip_trailing_prose(text: &str) -> Option<ProseRemoval> {
    let scan = Scan::new(text);
    let chunks = scan.chunks();
    let main = main_export(&scan, &chunks)?;
    let end = export_end(&scan, main)?;
    let cut = scan.hi(end);

    let rest = &text[cut..];
    let offset = rest.find(|c: char| !c.is_whitespace())?;
    let prose_start = cut + offset;
    let line = text[prose_start..].lines().next().unwrap_or_default().trim_end();
    if !is_prose(line) {
        return None;
    }

    let code_follows = chunks.iter().any(|c| {
        scan.lo(c.first) >= prose_start
            && matches!(
                scan.kind(c.first),
                TokenKind::Import
                    | TokenKind::Export
                    | TokenKind::Const
                    | TokenKind::Let
                    | TokenKind::Var
                    | TokenKind::Function
            )
    });
    if code_follows {
        return None;
    }

    let mut out = text[..cut].to_string();
    out.push('\n');
    Some(ProseRemoval {
        text: out,
        prose: text[cut..].to_string(),
    })
}

fn is_prose(line: &str) -> bool {
    HEADING.is_match(line)
        || LIST_ITEM.is_match(line)
        || EMPHASIS.is_match(line)
        || (SENTENCE.is_match(line) && !line.contains(['{', '}', '=', ';']))
}

/// The default export, or failing that the last top-level export.
fn main_export(scan: &Scan, chunks: &[Chunk]) -> Option<Chunk> {
    let exports = || {
        chunks
            .iter()
            .copied()
            .filter(|c| scan.kind(c.first) == &TokenKind::Export)
    };
    exports()
        .find(|c| scan.kind(c.first + 1) == &TokenKind::Default)
        .or_else(|| exports().last())
}

/// Last token of the export statement.
fn export_end(scan: &Scan, chunk: Chunk) -> Option<usize> {
    if let Some(open) = scan.function_body_open(chunk) {
        let close = scan.matching(open)?;
        let end = if scan.kind(close + 1) == &TokenKind::Semicolon {
            close + 1
        } else {
            close
        };
        return Some(end);
    }
    for i in chunk.first + 1..=chunk.last {
        if scan.nesting(i) != 0 {
            continue;
        }
        if scan.kind(i) == &TokenKind::Semicolon {
            return Some(i);
        }
        let previous = scan.kind(i - 1);
        if scan.newline_before(i) && (previous.ends_expression() || previous == &TokenKind::RBrace) {
            return Some(i - 1);
        }
    }
    Some(chunk.last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_sentence_after_function_export() {
        let removal = strip_trailing_prose(
            "export default function App() {\n  return <p>hi</p>;\n}\n\nThis component renders a greeting.\n",
        )
        .unwrap();
        assert_eq!(
            removal.text,
            "export default function App() {\n  return <p>hi</p>;\n}\n"
        );
        assert!(removal.prose.contains("greeting"));
    }

    #[test]
    fn test_strips_heading_after_identifier_export() {
        let removal =
            strip_trailing_prose("const App = () => null;\nexport default App\n## Notes\n- uses hooks\n")
                .unwrap();
        assert_eq!(removal.text, "const App = () => null;\nexport default App\n");
    }

    #[test]
    fn test_keeps_code_after_the_export() {
        let text = "export default function App() {\n  return null;\n}\nApp.displayName = \"App\";\n";
        assert_eq!(strip_trailing_prose(text), None);
    }

    #[test]
    fn test_keeps_later_declarations() {
        let text = "export default function App() {}\nHere is a helper below.\nfunction helper() {}\n";
        assert_eq!(strip_trailing_prose(text), None);
    }

    #[test]
    fn test_strips_sentence_on_the_closing_line() {
        let removal = strip_trailing_prose(
            "export default function App() {\n  return <p>ok</p>;\n} This is the component you asked for.\n",
        )
        .unwrap();
        assert_eq!(removal.text, "export default function App() {\n  return <p>ok</p>;\n}\n");
        assert_eq!(removal.prose, " This is the component you asked for.\n");
    }

    #[test]
    fn test_keeps_code_on_the_closing_line() {
        let text = "export default function App() {} App.displayName = \"App\";\n";
        assert_eq!(strip_trailing_prose(text), None);
    }

    #[test]
    fn test_apostrophes_in_prose() {
        let removal = strip_trailing_prose(
            "export const Button = () => <button />;\n\nHere's the button you asked for.\n",
        )
        .unwrap();
        assert_eq!(removal.text, "export const Button = () => <button />;\n");
    }

    #[test]
    fn test_no_export_is_noop() {
        assert_eq!(strip_trailing_prose("const a = 1;\nThis is text.\n"), None);
    }
}
