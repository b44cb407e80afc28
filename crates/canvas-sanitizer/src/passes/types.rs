//! Pass c: inline type annotations.
//!
//! Only a few unambiguous shapes are rewritten:
//!
//! * parameter annotations, `(name: Type, other?: Type)`, including
//!   destructured parameters `({ a, b }: Props)`;
//! * variable annotations, `const name: Type = …`;
//! * return types, `(…): Type {` and `(…): Type =>`;
//! * assertions, `expr as Type` and `expr as const`.
//!
//! A type is a named type (capitalised or a primitive keyword) with
//! optional qualification, type arguments and `[]` suffixes, or a union of
//! those and literals. Anything else is left for the parser to skip.

use canvas_lexer::TokenKind;

use crate::census::{census, census_of};
use crate::report::{Fix, Rewrite, SanitizeWarning};
use crate::scan::{apply_edits, Edit, Scan};

const PRIMITIVE_TYPES: &[&str] = &[
    "string",
    "number",
    "boolean",
    "any",
    "unknown",
    "never",
    "object",
    "undefined",
    "bigint",
    "symbol",
];

pub fn strip_type_annotations(text: &str) -> Rewrite {
    let scan = Scan::new(text);
    let chunks = scan.chunks();
    let mut edits = Vec::new();

    for i in 0..scan.len() {
        let edit = match scan.kind(i) {
            TokenKind::Colon => annotation(&scan, i),
            TokenKind::Identifier(word) if word == "as" => {
                let in_module_clause = Scan::chunk_of(&chunks, i).is_some_and(|chunk| {
                    scan.kind(chunk.first) == &TokenKind::Import
                        || (scan.kind(chunk.first) == &TokenKind::Export
                            && matches!(
                                scan.kind(chunk.first + 1),
                                TokenKind::LBrace | TokenKind::Star
                            ))
                });
                if in_module_clause {
                    None
                } else {
                    assertion(&scan, i)
                }
            }
            _ => None,
        };
        edits.extend(edit);
    }

    if edits.is_empty() {
        return Rewrite::Unchanged;
    }
    let count = edits.len();
    let stripped = apply_edits(text, edits);
    let before = census_of(&scan);
    let after = census(&stripped);
    if before != after {
        return Rewrite::Refused(SanitizeWarning::TypeStripRefused { before, after });
    }
    Rewrite::Applied {
        text: stripped,
        fix: Fix::StrippedTypeAnnotations { count },
    }
}

/// Annotation introduced by the `:` at `colon`.
fn annotation(scan: &Scan, colon: usize) -> Option<Edit> {
    let (target, optional) = match scan.kind(colon.checked_sub(1)?) {
        TokenKind::Question => (colon.checked_sub(2)?, true),
        _ => (colon - 1, false),
    };
    let start = if optional { colon - 1 } else { colon };
    let end = type_end(scan, colon + 1)?;
    let next = scan.kind(end + 1);

    let accepted = match scan.kind(target) {
        TokenKind::Identifier(_) => {
            let before = scan.kind(target.checked_sub(1)?);
            let is_param = match before {
                TokenKind::LParen | TokenKind::Comma => in_parameter_list(scan, target),
                TokenKind::DotDotDot => {
                    matches!(
                        scan.kind(target.checked_sub(2)?),
                        TokenKind::LParen | TokenKind::Comma
                    ) && in_parameter_list(scan, target)
                }
                _ => false,
            };
            if is_param {
                ends_parameter(next)
            } else {
                !optional
                    && matches!(before, TokenKind::Const | TokenKind::Let | TokenKind::Var)
                    && ends_declarator(scan, end)
            }
        }
        // Destructuring patterns.
        TokenKind::RBrace | TokenKind::RBracket => {
            let open = scan.opening(target)?;
            let before = scan.kind(open.checked_sub(1)?);
            match before {
                TokenKind::LParen | TokenKind::Comma => {
                    in_parameter_list(scan, open) && ends_parameter(next)
                }
                TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                    !optional && ends_declarator(scan, end)
                }
                _ => false,
            }
        }
        // Return types.
        TokenKind::RParen => !optional && matches!(next, TokenKind::Arrow | TokenKind::LBrace),
        _ => false,
    };

    accepted.then(|| Edit::remove(scan.lo(start), scan.hi(end)))
}

/// `expr as Type` with the `as` at `index`.
fn assertion(scan: &Scan, index: usize) -> Option<Edit> {
    let previous = index.checked_sub(1)?;
    let prev_kind = scan.kind(previous);
    if scan.newline_before(index) || !(prev_kind.ends_expression() || prev_kind == &TokenKind::RBrace) {
        return None;
    }
    let end = match scan.kind(index + 1) {
        TokenKind::Const => index + 1,
        _ => type_end(scan, index + 1)?,
    };
    Some(Edit::remove(scan.hi(previous), scan.hi(end)))
}

/// The token at `index` sits directly inside the parentheses of a
/// function's parameter list.
fn in_parameter_list(scan: &Scan, index: usize) -> bool {
    let Some(open) = scan.enclosing(index) else {
        return false;
    };
    if scan.kind(open) != &TokenKind::LParen {
        return false;
    }
    scan.matching(open).is_some_and(|close| {
        matches!(
            scan.kind(close + 1),
            TokenKind::Arrow | TokenKind::LBrace | TokenKind::Colon
        )
    })
}

fn ends_parameter(next: &TokenKind) -> bool {
    matches!(next, TokenKind::Comma | TokenKind::RParen | TokenKind::Eq)
}

fn ends_declarator(scan: &Scan, end: usize) -> bool {
    matches!(
        scan.kind(end + 1),
        TokenKind::Eq | TokenKind::Semicolon | TokenKind::Comma | TokenKind::Eof
    ) || scan.newline_before(end + 1)
}

// ── Type Shapes ──

/// Last token of the type starting at `start`.
fn type_end(scan: &Scan, start: usize) -> Option<usize> {
    let mut end = type_atom_end(scan, start)?;
    while matches!(scan.kind(end + 1), TokenKind::Pipe | TokenKind::Amp) {
        end = type_atom_end(scan, end + 2)?;
    }
    Some(end)
}

fn type_atom_end(scan: &Scan, start: usize) -> Option<usize> {
    let mut end = match scan.kind(start) {
        TokenKind::Identifier(name) if is_type_name(name) => {
            let mut end = start;
            while scan.kind(end + 1) == &TokenKind::Dot && scan.ident(end + 2).is_some() {
                end += 2;
            }
            if scan.kind(end + 1) == &TokenKind::Less {
                end = scan.matching_angle(end + 1)?;
            }
            end
        }
        TokenKind::Null
        | TokenKind::Void
        | TokenKind::True
        | TokenKind::False
        | TokenKind::String(_)
        | TokenKind::Number(_) => start,
        _ => return None,
    };
    while scan.kind(end + 1) == &TokenKind::LBracket && scan.kind(end + 2) == &TokenKind::RBracket {
        end += 2;
    }
    Some(end)
}

fn is_type_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) || PRIMITIVE_TYPES.contains(&name)
}
