//! Core parser infrastructure: token cursor, error reporting, helpers.

use canvas_lexer::token::{Token, TokenKind};
use canvas_types::ast::{Ident, Module};
use canvas_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Span};

/// Maximum nesting of expressions, statements and elements.
pub const MAX_NESTING_DEPTH: u32 = 128;

/// The TSX parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and attempts recovery when possible.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    source_file: &'src SourceFile,
    errors: Diagnostics,
    /// Current nesting depth (see [`MAX_NESTING_DEPTH`]).
    pub(crate) depth: u32,
    /// `in` is not a binary operator (inside a `for (...)` head).
    pub(crate) no_in: bool,
    /// Span of the first default export, for duplicate detection.
    pub(crate) default_export: Option<Span>,
}

/// Result of parsing.
pub struct ParseResult {
    /// `None` when any error was reported.
    pub module: Option<Module>,
    pub errors: Diagnostics,
}

/// A saved cursor position for speculative parsing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    pos: usize,
    errors: usize,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        let mut tokens = tokens;
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = source_file.source.len() as u32;
            tokens.push(Token::new(TokenKind::Eof, Span::point(end, 1, 1)));
        }
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: Diagnostics::empty(),
            depth: 0,
            no_in: false,
            default_export: None,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        // `new` guarantees a trailing Eof, so the last token always exists.
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::dummy()
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// The current token is the contextual identifier `word`.
    pub(crate) fn check_word(&self, word: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Identifier(name) if name == word)
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// A line break precedes the token `n` positions ahead.
    pub(crate) fn newline_before_ahead(&self, n: usize) -> bool {
        self.tokens
            .get(self.pos + n)
            .is_some_and(|t| t.newline_before)
    }

    /// Absolute index of the current token.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Index just past the bracket matching the one at index `from`, or
    /// `None` if it is never closed.
    pub(crate) fn matching_close(&self, from: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(from) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    /// Kind of the token at an absolute index.
    pub(crate) fn kind_at(&self, index: usize) -> &TokenKind {
        self.tokens
            .get(index)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Move the cursor to an absolute index (from [`Parser::matching_close`]).
    pub(crate) fn seek(&mut self, index: usize) {
        self.pos = index.min(self.tokens.len() - 1);
    }

    // ── Speculation ───────────────────────────────────────────────────────────

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            errors: self.errors.total_errors,
        }
    }

    /// Return to `checkpoint`, forgetting errors reported since.
    pub(crate) fn rewind(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.errors.truncate(checkpoint.errors);
    }

    /// Errors were reported since `checkpoint`.
    pub(crate) fn failed_since(&self, checkpoint: Checkpoint) -> bool {
        self.errors.total_errors > checkpoint.errors
    }

    // ── Statement Termination ─────────────────────────────────────────────────

    /// Consume a `;`, or accept its automatic insertion before a line
    /// break, a `}` or the end of file.
    pub(crate) fn consume_semicolon(&mut self) {
        if self.eat(&TokenKind::Semicolon) {
            return;
        }
        if self.at_end() || self.check(&TokenKind::RBrace) || self.peek().newline_before {
            return;
        }
        self.error_at_current(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("expected ';', got '{}'", self.peek_kind()),
        );
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check(expected) {
            return Some(self.advance());
        }
        let closer = matches!(
            expected,
            TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket
        );
        let code = if closer && self.at_end() {
            ErrorCode::UNCLOSED_DELIMITER
        } else {
            ErrorCode::UNEXPECTED_TOKEN
        };
        self.error_at_current(
            code,
            format!("expected '{}', got '{}'", expected, self.peek_kind()),
        );
        None
    }

    /// Expect an identifier token.
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected identifier, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Expect an identifier or a keyword used as a property name
    /// (`obj.default`, `{ if: 1 }`, `import { default as X }`).
    pub(crate) fn expect_property_name(&mut self) -> Option<Ident> {
        let name = self.peek_kind().as_property_name().map(str::to_string);
        match name {
            Some(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            None => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected property name, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Expect a string literal token. Returns the value and its span.
    pub(crate) fn expect_string_literal(&mut self) -> Option<(String, Span)> {
        match self.peek_kind().clone() {
            TokenKind::String(s) => {
                let span = self.advance().span;
                Some((s, span))
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected string literal, got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }

    /// Expect the contextual identifier `word` (`from`, `as`, `of`).
    pub(crate) fn expect_word(&mut self, word: &str) -> Option<Span> {
        if self.check_word(word) {
            return Some(self.advance().span);
        }
        self.error_at_current(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("expected '{word}', got '{}'", self.peek_kind()),
        );
        None
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Enter one nesting level; reports an error past [`MAX_NESTING_DEPTH`].
    pub(crate) fn enter(&mut self) -> Option<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.depth -= 1;
            self.error_at_current(
                ErrorCode::NESTING_LIMIT_EXCEEDED,
                format!("maximum nesting depth is {MAX_NESTING_DEPTH}"),
            );
            return None;
        }
        Some(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.line).unwrap_or("");
        let error = Diagnostic::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(error);
    }

    /// Report syntax the pipeline deliberately does not support.
    pub(crate) fn unsupported(&mut self, what: &str, span: Span) {
        self.error_at(
            ErrorCode::UNSUPPORTED_SYNTAX,
            format!("{what} are not supported"),
            span,
        );
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.saturated()
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until we reach a synchronization point.
    /// Used after an error to resume at a known-good position.
    pub(crate) fn synchronize(&mut self) {
        let start = self.pos;
        while !self.at_end() {
            if self.pos > start && self.peek().newline_before {
                return;
            }
            match self.peek_kind() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                TokenKind::Const
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::Function
                | TokenKind::Return
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Import
                | TokenKind::Export
                    if self.pos > start =>
                {
                    return
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a [`Module`].
    pub fn parse(mut self) -> ParseResult {
        let module = self.parse_module();
        let module = if self.errors.has_errors() {
            None
        } else {
            Some(module)
        };
        ParseResult {
            module,
            errors: self.errors,
        }
    }
}

/// Lex and parse one source file.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = canvas_lexer::Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file).parse();
    if lexed.errors.has_errors() {
        let mut errors = lexed.errors;
        errors.extend(result.errors);
        result.errors = errors;
        result.module = None;
    }
    result
}
