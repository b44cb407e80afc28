//! Pass e: helper declarations left beside the main component.
//!
//! Generated code often declares small components and functions next to
//! the default export instead of inside it. Helpers used only by the main
//! component are moved to the top of its body, keeping their order.

use canvas_lexer::TokenKind;

use crate::census::{census, census_of};
use crate::report::{Fix, Rewrite, SanitizeWarning};
use crate::scan::{apply_edits, line_range, Chunk, Edit, Scan};

/// Body of the main component: its chunk and the `{`/`}` token indices.
#[derive(Debug, Clone, Copy)]
struct MainBody {
    chunk: Chunk,
    open: usize,
    close: usize,
}

struct Helper {
    name: String,
    chunk: Chunk,
}

pub fn nest_helpers(text: &str) -> Rewrite {
    let scan = Scan::new(text);
    let chunks = scan.chunks();
    let Some(main) = main_body(&scan, &chunks) else {
        return Rewrite::Unchanged;
    };

    let mut helpers: Vec<Helper> = chunks
        .iter()
        .copied()
        .filter(|&chunk| chunk != main.chunk)
        .filter_map(|chunk| {
            helper_name(&scan, chunk).map(|name| Helper {
                name: name.to_string(),
                chunk,
            })
        })
        .filter(|h| scan.mentions(&h.name, main.open + 1, main.close.saturating_sub(1)))
        .filter(|h| !declared_in_body(&scan, main, &h.name))
        .collect();

    // A helper stays where it is if anything left at the top level uses it.
    loop {
        let staying: Vec<Chunk> = chunks
            .iter()
            .copied()
            .filter(|c| *c != main.chunk && helpers.iter().all(|h| h.chunk != *c))
            .collect();
        let before = helpers.len();
        helpers.retain(|h| {
            let used_outside = staying
                .iter()
                .any(|c| scan.mentions(&h.name, c.first, c.last))
                || scan.mentions(&h.name, main.chunk.first, main.open)
                || (main.close < main.chunk.last
                    && scan.mentions(&h.name, main.close + 1, main.chunk.last));
            !used_outside
        });
        if helpers.len() == before {
            break;
        }
    }

    if helpers.is_empty() {
        return Rewrite::Unchanged;
    }

    let mut moved = String::new();
    let mut edits = Vec::new();
    for helper in &helpers {
        let (lo, hi) = (scan.lo(helper.chunk.first), scan.hi(helper.chunk.last));
        moved.push('\n');
        moved.push_str(&text[lo..hi]);
        let (lo, hi) = line_range(text, lo, hi);
        edits.push(Edit::remove(lo, hi));
    }
    edits.push(Edit::insert(scan.hi(main.open), moved));
    let nested = apply_edits(text, edits);

    let names: Vec<String> = helpers.into_iter().map(|h| h.name).collect();
    let before = census_of(&scan);
    let after = census(&nested);
    let expected_top_level = before.top_level.checked_sub(names.len());
    if after.total != before.total || Some(after.top_level) != expected_top_level {
        return Rewrite::Refused(SanitizeWarning::HelperNestingRefused {
            before,
            after,
            helpers: names,
        });
    }
    Rewrite::Applied {
        text: nested,
        fix: Fix::NestedHelpers { names },
    }
}

/// The default-exported component's body: `export default function …`,
/// `export default (…) => { … }`, or the declaration named by
/// `export default Name`.
fn main_body(scan: &Scan, chunks: &[Chunk]) -> Option<MainBody> {
    let export = chunks.iter().copied().find(|c| {
        scan.kind(c.first) == &TokenKind::Export && scan.kind(c.first + 1) == &TokenKind::Default
    })?;

    let body = |chunk: Chunk| {
        let open = scan.function_body_open(chunk)?;
        let close = scan.matching(open)?;
        Some(MainBody { chunk, open, close })
    };

    if let Some(main) = body(export) {
        return Some(main);
    }
    let name = scan.ident(export.first + 2)?;
    let bare = export.last == export.first + 2
        || (export.last == export.first + 3 && scan.kind(export.last) == &TokenKind::Semicolon);
    if !bare {
        return None;
    }
    let declaration = chunks
        .iter()
        .copied()
        .find(|&c| declared_name(scan, c) == Some(name))?;
    body(declaration)
}

/// Name declared by `function Name` or `const|let|var Name` at the start of
/// a chunk.
fn declared_name(scan: &Scan, chunk: Chunk) -> Option<&str> {
    match scan.kind(chunk.first) {
        TokenKind::Function | TokenKind::Const | TokenKind::Let | TokenKind::Var => {
            scan.ident(chunk.first + 1)
        }
        _ => None,
    }
}

/// Name of a movable helper: a function declaration, or a single
/// `const|let|var` declarator initialised with an arrow function.
fn helper_name(scan: &Scan, chunk: Chunk) -> Option<&str> {
    let name = declared_name(scan, chunk)?;
    if scan.kind(chunk.first) == &TokenKind::Function {
        let close = scan.matching(scan.function_body_open(chunk)?)?;
        let whole = close == chunk.last
            || (close + 1 == chunk.last && scan.kind(chunk.last) == &TokenKind::Semicolon);
        return whole.then_some(name);
    }

    let top_level = |i: &usize| scan.nesting(*i) == 0;
    if (chunk.first..=chunk.last)
        .filter(top_level)
        .any(|i| scan.kind(i) == &TokenKind::Comma)
    {
        return None;
    }
    let eq = (chunk.first + 2..=chunk.last)
        .filter(top_level)
        .find(|&i| scan.kind(i) == &TokenKind::Eq)?;
    let is_arrow = match scan.kind(eq + 1) {
        TokenKind::LParen => scan
            .matching(eq + 1)
            .is_some_and(|close| scan.kind(close + 1) == &TokenKind::Arrow),
        TokenKind::Identifier(_) => scan.kind(eq + 2) == &TokenKind::Arrow,
        _ => false,
    };
    is_arrow.then_some(name)
}

/// `name` is already declared directly in the main body.
fn declared_in_body(scan: &Scan, main: MainBody, name: &str) -> bool {
    let depth = scan.brace_depth(main.open) + 1;
    (main.open + 1..main.close).any(|i| {
        scan.brace_depth(i) == depth
            && scan.kind(i).is_declaration_keyword()
            && scan.ident(i + 1) == Some(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested(text: &str) -> (String, Vec<String>) {
        match nest_helpers(text) {
            Rewrite::Applied {
                text,
                fix: Fix::NestedHelpers { names },
            } => (text, names),
            other => panic!("expected a rewrite, got {other:?}"),
        }
    }

    #[test]
    fn test_moves_helpers_in_order() {
        let (text, names) = nested(
            "function Title() {\n  return <h1>Hi</h1>;\n}\nconst Row = ({ label }) => <li>{label}</li>;\nexport default function App() {\n  return <div><Title /><Row label=\"a\" /></div>;\n}\n",
        );
        assert_eq!(names, vec!["Title".to_string(), "Row".to_string()]);
        assert_eq!(
            text,
            "export default function App() {\nfunction Title() {\n  return <h1>Hi</h1>;\n}\nconst Row = ({ label }) => <li>{label}</li>;\n  return <div><Title /><Row label=\"a\" /></div>;\n}\n"
        );
    }

    #[test]
    fn test_default_export_by_name() {
        let (text, names) = nested(
            "const Badge = () => <span />;\nfunction App() {\n  return <Badge />;\n}\nexport default App;\n",
        );
        assert_eq!(names, vec!["Badge".to_string()]);
        assert!(text.starts_with("function App() {\nconst Badge = () => <span />;\n"));
    }

    #[test]
    fn test_helpers_using_each_other_move_together() {
        let text = "const Icon = () => <i />;\nconst Toolbar = () => <Icon />;\nexport default function App() {\n  return <div><Icon /><Toolbar /></div>;\n}\n";
        let (out, names) = nested(text);
        assert_eq!(names, vec!["Icon".to_string(), "Toolbar".to_string()]);
        assert!(out.starts_with("export default function App() {\nconst Icon"));
    }

    #[test]
    fn test_helper_shared_with_a_constant_stays() {
        let text = "const format = (n) => n.toFixed(2);\nconst TOTAL = format(3);\nexport default function App() {\n  return <p>{format(TOTAL)}</p>;\n}\n";
        assert_eq!(nest_helpers(text), Rewrite::Unchanged);
    }

    #[test]
    fn test_non_function_values_stay() {
        let text = "const items = [1, 2];\nexport default function App() {\n  return <p>{items.length}</p>;\n}\n";
        assert_eq!(nest_helpers(text), Rewrite::Unchanged);
    }

    #[test]
    fn test_already_nested_is_noop() {
        let text = "export default function App() {\n  const Row = () => <li />;\n  return <Row />;\n}\n";
        assert_eq!(nest_helpers(text), Rewrite::Unchanged);
    }

    #[test]
    fn test_name_clash_with_body_declaration_stays() {
        let text = "const Row = () => <li />;\nexport default function App() {\n  const Row = () => <tr />;\n  return <Row />;\n}\n";
        assert_eq!(nest_helpers(text), Rewrite::Unchanged);
    }
}
