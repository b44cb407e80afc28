//! Pass b: external imports and named re-exports.
//!
//! Imports of packages are removed because the runtime supplies them
//! through shims; every binding they introduced is recorded so the
//! transpiler can re-link it. Only a single default export survives at
//! the entry, so `export { … }` lists and `export *` are dropped, except
//! that `export { X as default }` becomes `export default X;`.

use canvas_lexer::TokenKind;
use canvas_types::SpecifierKind;

use crate::report::{ExternalBinding, Fix, ImportedName};
use crate::scan::{apply_edits, line_range, Chunk, Edit, Scan};

const STYLESHEET_SUFFIXES: &[&str] = &[".css", ".scss", ".sass", ".less"];

/// Output of [`remove_external_imports`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRemoval {
    pub text: String,
    pub bindings: Vec<ExternalBinding>,
    /// Import statements removed (external, type-only and stylesheet).
    pub imports: usize,
    pub reexports: usize,
    /// Local name of a rewritten `export { X as default }`.
    pub default_reexport: Option<String>,
}

impl ImportRemoval {
    pub fn fixes(&self) -> Vec<Fix> {
        let mut fixes = Vec::new();
        if self.imports > 0 {
            fixes.push(Fix::RemovedImports {
                count: self.imports,
            });
        }
        if self.reexports > 0 {
            fixes.push(Fix::RemovedReexports {
                count: self.reexports,
            });
        }
        if let Some(local) = &self.default_reexport {
            fixes.push(Fix::RewroteDefaultReexport {
                local: local.clone(),
            });
        }
        fixes
    }
}

/// Remove top-level external imports and named re-exports. Returns `None`
/// when the text has neither.
pub fn remove_external_imports<S: AsRef<str>>(
    text: &str,
    alias_prefixes: &[S],
) -> Option<ImportRemoval> {
    let scan = Scan::new(text);
    let chunks = scan.chunks();
    let has_default_export = chunks.iter().any(|c| {
        scan.kind(c.first) == &TokenKind::Export && scan.kind(c.first + 1) == &TokenKind::Default
    });

    let mut removal = ImportRemoval::default();
    let mut edits = Vec::new();
    let remove = |edits: &mut Vec<Edit>, first: usize, end: usize| {
        let (lo, hi) = line_range(text, scan.lo(first), scan.hi(end));
        edits.push(Edit::remove(lo, hi));
    };

    for chunk in chunks {
        match scan.kind(chunk.first) {
            TokenKind::Import => {
                let Some(import) = read_import(&scan, chunk) else {
                    continue;
                };
                let external =
                    SpecifierKind::classify(&import.source, alias_prefixes).is_external();
                let stylesheet = STYLESHEET_SUFFIXES
                    .iter()
                    .any(|suffix| import.source.ends_with(suffix));
                match import.clause {
                    _ if import.type_only => {}
                    None if external || stylesheet => {}
                    Some((start, from)) if external => {
                        removal
                            .bindings
                            .extend(import_bindings(&scan, start, from, &import.source));
                    }
                    _ => continue,
                }
                remove(&mut edits, chunk.first, import.end);
                removal.imports += 1;
            }
            TokenKind::Export => match scan.kind(chunk.first + 1) {
                TokenKind::LBrace => {
                    let open = chunk.first + 1;
                    let Some(close) = scan.matching(open) else {
                        continue;
                    };
                    let pairs = specifier_pairs(&scan, open, close);
                    if let Some(source) = from_clause(&scan, close + 1) {
                        // `export { default } from "./App"` is the entry's own
                        // default export.
                        if pairs.iter().any(|(_, exported)| exported == "default") {
                            continue;
                        }
                        remove(&mut edits, chunk.first, statement_end(&scan, source));
                        removal.reexports += 1;
                        continue;
                    }
                    let end = if scan.kind(close + 1) == &TokenKind::Semicolon {
                        close + 1
                    } else {
                        close
                    };
                    let default_local = pairs
                        .iter()
                        .find(|(_, exported)| exported == "default")
                        .map(|(local, _)| local.clone());
                    match default_local {
                        Some(local) if !has_default_export && removal.default_reexport.is_none() => {
                            edits.push(Edit {
                                lo: scan.lo(chunk.first),
                                hi: scan.hi(end),
                                replacement: format!("export default {local};"),
                            });
                            removal.default_reexport = Some(local);
                        }
                        _ => {
                            remove(&mut edits, chunk.first, end);
                            removal.reexports += 1;
                        }
                    }
                }
                TokenKind::Star => {
                    let Some(source) = (chunk.first + 2..=chunk.last)
                        .find_map(|i| from_clause(&scan, i))
                    else {
                        continue;
                    };
                    remove(&mut edits, chunk.first, statement_end(&scan, source));
                    removal.reexports += 1;
                }
                TokenKind::Identifier(word)
                    if word == "type" && scan.kind(chunk.first + 2) == &TokenKind::LBrace =>
                {
                    let Some(close) = scan.matching(chunk.first + 2) else {
                        continue;
                    };
                    let end = match from_clause(&scan, close + 1) {
                        Some(source) => statement_end(&scan, source),
                        None if scan.kind(close + 1) == &TokenKind::Semicolon => close + 1,
                        None => close,
                    };
                    remove(&mut edits, chunk.first, end);
                    removal.reexports += 1;
                }
                _ => {}
            },
            _ => {}
        }
    }

    if edits.is_empty() {
        return None;
    }
    removal.text = apply_edits(text, edits);
    Some(removal)
}

// ── Statement Shapes ──

struct ImportStmt {
    source: String,
    /// Token range of the import clause, `import` exclusive to `from`
    /// exclusive. `None` for side-effect imports.
    clause: Option<(usize, usize)>,
    type_only: bool,
    /// Last token of the statement.
    end: usize,
}

fn read_import(scan: &Scan, chunk: Chunk) -> Option<ImportStmt> {
    let first = chunk.first;
    // `import(…)` and `import.meta` are expressions.
    if matches!(scan.kind(first + 1), TokenKind::LParen | TokenKind::Dot) {
        return None;
    }
    if let TokenKind::String(source) = scan.kind(first + 1) {
        return Some(ImportStmt {
            source: source.clone(),
            clause: None,
            type_only: false,
            end: statement_end(scan, first + 1),
        });
    }
    let source_index = (first + 1..=chunk.last)
        .filter(|&i| scan.nesting(i) == 0)
        .find_map(|i| from_clause(scan, i))?;
    let TokenKind::String(source) = scan.kind(source_index) else {
        return None;
    };
    let from = source_index - 1;
    // `import type from "x"` and `import type, { a } from "x"` bind a
    // default import named `type`.
    let type_only = scan.ident(first + 1) == Some("type")
        && from > first + 2
        && scan.kind(first + 2) != &TokenKind::Comma;
    Some(ImportStmt {
        source: source.clone(),
        clause: Some((first + 1, from)),
        type_only,
        end: statement_end(scan, source_index),
    })
}

/// Index of the source string when a `from "…"` clause starts at `index`.
fn from_clause(scan: &Scan, index: usize) -> Option<usize> {
    (scan.ident(index) == Some("from") && matches!(scan.kind(index + 1), TokenKind::String(_)))
        .then_some(index + 1)
}

/// Last token of an import/export statement whose source string is at
/// `source`: import attributes and the `;` belong to it.
fn statement_end(scan: &Scan, source: usize) -> usize {
    let mut end = source;
    if matches!(scan.ident(end + 1), Some("with" | "assert"))
        && !scan.newline_before(end + 1)
        && scan.kind(end + 2) == &TokenKind::LBrace
    {
        if let Some(close) = scan.matching(end + 2) {
            end = close;
        }
    }
    if scan.kind(end + 1) == &TokenKind::Semicolon {
        end += 1;
    }
    end
}

/// `(name, alias)` pairs of a `{ a, b as c, type T }` list; type-only
/// entries are skipped.
fn specifier_pairs(scan: &Scan, open: usize, close: usize) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut group: Vec<&str> = Vec::new();
    for i in open + 1..=close {
        if i == close || scan.kind(i) == &TokenKind::Comma {
            match group.as_slice() {
                ["type", _] | ["type", _, "as", _] => {}
                [name] => pairs.push((name.to_string(), name.to_string())),
                [name, "as", alias] => pairs.push((name.to_string(), alias.to_string())),
                _ => {}
            }
            group.clear();
        } else if let Some(word) = scan.kind(i).as_property_name() {
            group.push(word);
        }
    }
    pairs
}

fn import_bindings(scan: &Scan, start: usize, from: usize, source: &str) -> Vec<ExternalBinding> {
    let binding = |local: &str, imported: ImportedName| ExternalBinding {
        local: local.to_string(),
        imported,
        source: source.to_string(),
    };
    let mut bindings = Vec::new();
    let mut i = start;
    while i < from {
        match scan.kind(i) {
            TokenKind::Identifier(local) => {
                bindings.push(binding(local.as_str(), ImportedName::Default));
                i += 1;
            }
            TokenKind::Star => {
                if let (Some("as"), Some(local)) = (scan.ident(i + 1), scan.ident(i + 2)) {
                    bindings.push(binding(local, ImportedName::Namespace));
                }
                i += 3;
            }
            TokenKind::LBrace => {
                let close = scan.matching(i).unwrap_or(from);
                for (imported, local) in specifier_pairs(scan, i, close) {
                    let imported = if imported == "default" {
                        ImportedName::Default
                    } else {
                        ImportedName::Named(imported)
                    };
                    bindings.push(binding(&local, imported));
                }
                i = close + 1;
            }
            _ => i += 1,
        }
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_types::DEFAULT_ALIAS_PREFIXES;
    use pretty_assertions::assert_eq;

    fn run(text: &str) -> Option<ImportRemoval> {
        remove_external_imports(text, &DEFAULT_ALIAS_PREFIXES)
    }

    #[test]
    fn test_removes_package_imports_and_records_bindings() {
        let removal = run(
            "import React, { useState, type FC } from \"react\";\nimport * as Icons from \"lucide-react\";\nimport Card from \"./Card\";\n",
        )
        .unwrap();
        assert_eq!(removal.text, "import Card from \"./Card\";\n");
        assert_eq!(removal.imports, 2);
        let locals: Vec<(&str, &ImportedName)> = removal
            .bindings
            .iter()
            .map(|b| (b.local.as_str(), &b.imported))
            .collect();
        assert_eq!(
            locals,
            vec![
                ("React", &ImportedName::Default),
                ("useState", &ImportedName::Named("useState".into())),
                ("Icons", &ImportedName::Namespace),
            ]
        );
    }

    #[test]
    fn test_alias_imports_are_kept() {
        assert_eq!(run("import { cn } from \"@/lib/utils\";\nconst a = 1;\n"), None);
    }

    #[test]
    fn test_type_only_and_stylesheet_imports_leave_no_bindings() {
        let removal =
            run("import type { Props } from \"./types\";\nimport \"./app.css\";\nconst a = 1;\n")
                .unwrap();
        assert_eq!(removal.text, "const a = 1;\n");
        assert_eq!(removal.imports, 2);
        assert!(removal.bindings.is_empty());
    }

    #[test]
    fn test_aliased_named_import() {
        let removal = run("import { default as Router, Link as A } from \"react-router-dom\"\n").unwrap();
        assert_eq!(removal.bindings[0].imported, ImportedName::Default);
        assert_eq!(removal.bindings[0].local, "Router");
        assert_eq!(removal.bindings[1].imported, ImportedName::Named("Link".into()));
        assert_eq!(removal.bindings[1].local, "A");
    }

    #[test]
    fn test_default_reexport_is_rewritten() {
        let removal = run("function App() {}\nexport { App as default };\n").unwrap();
        assert_eq!(removal.text, "function App() {}\nexport default App;\n");
        assert_eq!(removal.default_reexport.as_deref(), Some("App"));
    }

    #[test]
    fn test_named_reexports_are_dropped() {
        let removal = run(
            "export default function App() {}\nexport { Button, Card };\nexport * from \"./ui\";\nexport type { Props } from \"./types\";\n",
        )
        .unwrap();
        assert_eq!(removal.text, "export default function App() {}\n");
        assert_eq!(removal.reexports, 3);
    }

    #[test]
    fn test_import_attributes_belong_to_the_statement() {
        let removal = run("import data from \"pkg/data.json\" with { type: \"json\" };\nconst a = 1;\n").unwrap();
        assert_eq!(removal.text, "const a = 1;\n");
    }

    #[test]
    fn test_nested_import_words_are_ignored() {
        assert_eq!(run("const label = \"import x from 'y'\";\n"), None);
    }
}
