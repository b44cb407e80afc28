//! Token-level view of a source text shared by the passes.
//!
//! Every structural question the passes ask (where does this brace close,
//! is this keyword at the top level, which statement does this token belong
//! to) is answered from the workspace lexer's tokens, so string contents,
//! template literals and JSX text never confuse them.

use canvas_lexer::{Lexer, Token, TokenKind};
use canvas_types::SourceFile;

/// A run of tokens forming one top-level statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub first: usize,
    /// Inclusive.
    pub last: usize,
}

pub(crate) struct Scan {
    tokens: Vec<Token>,
    /// Number of open `{` before each token.
    brace_depth: Vec<u32>,
    /// Number of open brackets of any kind before each token.
    nesting: Vec<u32>,
}

impl Scan {
    pub fn new(text: &str) -> Self {
        let file = SourceFile::new("<sanitize>", text);
        let mut tokens = Lexer::new(&file).lex().tokens;
        tokens.retain(|t| t.kind != TokenKind::Eof);

        let mut brace_depth = Vec::with_capacity(tokens.len());
        let mut nesting = Vec::with_capacity(tokens.len());
        let (mut braces, mut brackets) = (0u32, 0u32);
        for token in &tokens {
            if matches!(
                token.kind,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket
            ) {
                brackets = brackets.saturating_sub(1);
                if token.kind == TokenKind::RBrace {
                    braces = braces.saturating_sub(1);
                }
            }
            brace_depth.push(braces);
            nesting.push(brackets);
            match token.kind {
                TokenKind::LBrace => {
                    braces += 1;
                    brackets += 1;
                }
                TokenKind::LParen | TokenKind::LBracket => brackets += 1,
                _ => {}
            }
        }
        Self {
            tokens,
            brace_depth,
            nesting,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn kind(&self, index: usize) -> &TokenKind {
        self.tokens
            .get(index)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Identifier text at `index`, if the token is an identifier.
    pub fn ident(&self, index: usize) -> Option<&str> {
        match self.kind(index) {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn newline_before(&self, index: usize) -> bool {
        self.tokens.get(index).is_some_and(|t| t.newline_before)
    }

    /// Byte offset where the token starts.
    pub fn lo(&self, index: usize) -> usize {
        self.tokens.get(index).map_or(0, |t| t.span.lo as usize)
    }

    /// Byte offset just past the token.
    pub fn hi(&self, index: usize) -> usize {
        self.tokens.get(index).map_or(0, |t| t.span.hi as usize)
    }

    pub fn brace_depth(&self, index: usize) -> u32 {
        self.brace_depth.get(index).copied().unwrap_or(0)
    }

    pub fn nesting(&self, index: usize) -> u32 {
        self.nesting.get(index).copied().unwrap_or(0)
    }

    /// Index of the bracket closing the one opened at `open`.
    pub fn matching(&self, open: usize) -> Option<usize> {
        let closer = match self.kind(open) {
            TokenKind::LBrace => TokenKind::RBrace,
            TokenKind::LParen => TokenKind::RParen,
            TokenKind::LBracket => TokenKind::RBracket,
            _ => return None,
        };
        let level = self.nesting(open);
        (open + 1..self.len()).find(|&i| self.nesting(i) == level && self.kind(i) == &closer)
    }

    /// Index of the bracket opened by the closer at `close`.
    pub fn opening(&self, close: usize) -> Option<usize> {
        if !matches!(
            self.kind(close),
            TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket
        ) {
            return None;
        }
        let level = self.nesting(close);
        (0..close).rev().find(|&i| self.nesting(i) == level)
    }

    /// Index of the innermost bracket containing the token at `index`.
    pub fn enclosing(&self, index: usize) -> Option<usize> {
        let level = self.nesting(index).checked_sub(1)?;
        (0..index).rev().find(|&i| self.nesting(i) == level)
    }

    /// Index of the `>` closing a type argument list opened at `open`.
    pub fn matching_angle(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for i in open..self.len() {
            match self.kind(i) {
                TokenKind::Less => depth += 1,
                TokenKind::Greater => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace => return None,
                _ => {}
            }
        }
        None
    }

    /// Split the top level into statements.
    ///
    /// A statement starts at the first token, after a top-level `;`, or at
    /// a declaration keyword that begins a new line or follows a `}`.
    pub fn chunks(&self) -> Vec<Chunk> {
        let mut starts = Vec::new();
        for i in 0..self.len() {
            if self.nesting(i) != 0 {
                continue;
            }
            let starts_here = i == 0
                || (self.kind(i - 1) == &TokenKind::Semicolon && self.nesting(i - 1) == 0)
                || (self.begins_statement(i)
                    && (self.newline_before(i) || self.kind(i - 1) == &TokenKind::RBrace));
            if starts_here {
                starts.push(i);
            }
        }
        starts
            .iter()
            .enumerate()
            .map(|(n, &first)| {
                let last = starts.get(n + 1).map_or(self.len() - 1, |next| next - 1);
                Chunk { first, last }
            })
            .collect()
    }

    fn begins_statement(&self, index: usize) -> bool {
        match self.kind(index) {
            TokenKind::Import
            | TokenKind::Export
            | TokenKind::Const
            | TokenKind::Let
            | TokenKind::Var
            | TokenKind::Function
            | TokenKind::Class
            | TokenKind::If
            | TokenKind::For
            | TokenKind::While
            | TokenKind::Switch
            | TokenKind::Try
            | TokenKind::Return
            | TokenKind::Throw => true,
            TokenKind::Identifier(word) => {
                matches!(word.as_str(), "type" | "interface" | "declare")
                    && matches!(self.kind(index + 1), TokenKind::Identifier(_))
            }
            _ => false,
        }
    }

    /// Chunk containing the token at `index`.
    pub fn chunk_of(chunks: &[Chunk], index: usize) -> Option<Chunk> {
        chunks
            .iter()
            .copied()
            .find(|c| c.first <= index && index <= c.last)
    }

    /// Identifier tokens named `name` within `from..=to`.
    pub fn mentions(&self, name: &str, from: usize, to: usize) -> bool {
        (from..=to.min(self.len().saturating_sub(1))).any(|i| self.ident(i) == Some(name))
    }

    /// Body `{` of the first function (declaration, expression or arrow
    /// with a block body) found at the chunk's own nesting level.
    pub fn function_body_open(&self, chunk: Chunk) -> Option<usize> {
        let level = self.nesting(chunk.first);
        for i in chunk.first..=chunk.last {
            if self.nesting(i) != level {
                continue;
            }
            match self.kind(i) {
                TokenKind::Function => {
                    let params = (i + 1..=chunk.last)
                        .find(|&j| self.nesting(j) == level && self.kind(j) == &TokenKind::LParen)?;
                    let close = self.matching(params)?;
                    return (close + 1..=chunk.last)
                        .find(|&j| self.nesting(j) == level && self.kind(j) == &TokenKind::LBrace);
                }
                TokenKind::Arrow => {
                    return (self.kind(i + 1) == &TokenKind::LBrace).then_some(i + 1);
                }
                _ => {}
            }
        }
        None
    }
}

/// Byte range `[lo, hi)` widened to whole lines when the range is the only
/// thing on them, so removing it leaves no blank line behind.
pub(crate) fn line_range(text: &str, lo: usize, hi: usize) -> (usize, usize) {
    let line_start = text[..lo].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[hi..].find('\n').map_or(text.len(), |i| hi + i);
    let blank_before = text[line_start..lo].trim().is_empty();
    let blank_after = text[hi..line_end].trim().is_empty();
    if blank_before && blank_after {
        let end = if line_end < text.len() { line_end + 1 } else { line_end };
        (line_start, end)
    } else {
        (lo, hi)
    }
}

/// A text replacement at a byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub lo: usize,
    pub hi: usize,
    pub replacement: String,
}

impl Edit {
    pub fn remove(lo: usize, hi: usize) -> Self {
        Self {
            lo,
            hi,
            replacement: String::new(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            lo: at,
            hi: at,
            replacement: text.into(),
        }
    }
}

/// Apply non-overlapping edits; overlapping ones after the first are dropped.
pub(crate) fn apply_edits(text: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.lo, e.hi));
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.lo < cursor || edit.hi > text.len() {
            continue;
        }
        out.push_str(&text[cursor..edit.lo]);
        out.push_str(&edit.replacement);
        cursor = edit.hi;
    }
    out.push_str(&text[cursor..]);
    out
}
