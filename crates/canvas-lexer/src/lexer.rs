//! Core TSX lexer: converts source text to a token stream.
//!
//! Features:
//! - The operators, punctuation and literals of the supported TSX subset
//! - Template literals with `${expr}` substitutions via a mode stack
//! - JSX tags and children via the same mode stack: a `<` starts a tag
//!   when the previous token cannot end an expression
//! - Line and block comments stripped; line breaks recorded on the next
//!   token for automatic semicolon insertion
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use canvas_types::{Diagnostic, Diagnostics, ErrorCode, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// Who owns the `}` that closes a code region at brace depth zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    /// Top-level code; never popped.
    Root,
    /// A `{expr}` container inside JSX.
    Jsx,
    /// A `${expr}` substitution inside a template literal.
    Template,
}

/// Lexer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Ordinary code. `brace_depth` counts nested `{}` so we know when the
    /// region's own closing `}` is reached.
    Code { brace_depth: u32, closer: Closer },
    /// Between `<` (or `</`) and the matching `>` / `/>`.
    JsxTag { closing: bool },
    /// Between an opening tag's `>` and its closing tag.
    JsxChildren,
}

/// The TSX lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting up to
/// [`canvas_types::MAX_ERRORS`] errors along the way.
pub struct Lexer<'src> {
    text: &'src str,
    source: &'src [u8],
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in characters).
    col: u32,
    errors: Diagnostics,
    mode_stack: Vec<Mode>,
    /// The previous token can end an expression, so `<` compares.
    expr_end: bool,
    /// A JSX element just closed; it counts as an expression end.
    element_closed: bool,
    /// A line break was skipped since the previous token.
    saw_newline: bool,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: Diagnostics,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            text: &source_file.source,
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: Diagnostics::empty(),
            mode_stack: vec![Mode::Code {
                brace_depth: 0,
                closer: Closer::Root,
            }],
            expr_end: false,
            element_closed: false,
            saw_newline: false,
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.saturated() {
                break;
            }

            let mut token = match self.current_mode() {
                Mode::Code { .. } => self.scan_code(),
                Mode::JsxTag { closing } => self.scan_tag(closing),
                Mode::JsxChildren => self.scan_children(),
            };
            token.newline_before = std::mem::take(&mut self.saw_newline);
            self.expr_end =
                token.kind.ends_expression() || std::mem::take(&mut self.element_closed);

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        // Ensure token stream always ends with Eof
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        self.mode_stack.last().copied().unwrap_or(Mode::Code {
            brace_depth: 0,
            closer: Closer::Root,
        })
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.text.get(self.pos..)?.chars().next()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if ch & 0xC0 != 0x80 {
            // Continuation bytes of a UTF-8 sequence don't move the column.
            self.col += 1;
        }
        Some(ch)
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        for _ in 0..ch.len_utf8() {
            self.advance();
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current_span(&self) -> Span {
        Span::point(self.pos as u32, self.line, self.col)
    }

    fn span_from(&self, start: Start) -> Span {
        Span::new(start.pos as u32, self.pos as u32, start.line, start.col)
    }

    fn start(&self) -> Start {
        Start {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    fn token(&self, kind: TokenKind, start: Start) -> Token {
        Token::new(kind, self.span_from(start))
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.line).unwrap_or("");
        let err = Diagnostic::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(err);
    }

    fn emit_error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let source_line = self.source_file.line(span.line).unwrap_or("");
        let err = Diagnostic::new(&self.source_file.name, code, message, span, source_line)
            .with_suggestion(suggestion);
        self.errors.push(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace and comments, remembering line breaks.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b'\n') => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some(b' ' | b'\t' | b'\r') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => self.skip_block_comment(),
                // Non-breaking and other unicode spaces show up in pasted code.
                Some(b) if b >= 0x80 && self.peek_char().is_some_and(char::is_whitespace) => {
                    if self.peek_char() == Some('\u{2028}') || self.peek_char() == Some('\u{2029}')
                    {
                        self.saw_newline = true;
                    }
                    self.advance_char();
                }
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start = self.start();
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "Unterminated block comment",
                        span,
                        "Close the comment with */",
                    );
                    return;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(b'\n') => {
                    self.saw_newline = true;
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Code-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in code mode.
    fn scan_code(&mut self) -> Token {
        self.skip_trivia();

        // If we've hit the error cap, stop immediately
        if self.at_end() || self.errors.saturated() {
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let start = self.start();
        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };

        if is_ident_start(ch) {
            return self.scan_identifier(start, false);
        }
        if ch.is_ascii_digit() || (ch == b'.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.scan_number(start);
        }

        self.advance();
        match ch {
            b'"' | b'\'' => self.scan_string(start, ch),
            b'`' => self.scan_template(start, true),

            b'<' => {
                let next = self.peek();
                let opens_tag = next.is_some_and(|c| is_ident_start(c) || c == b'>');
                if !self.expr_end && opens_tag {
                    self.push_mode(Mode::JsxTag { closing: false });
                    self.token(TokenKind::JsxLt, start)
                } else if self.eat(b'=') {
                    self.token(TokenKind::LessEq, start)
                } else {
                    self.token(TokenKind::Less, start)
                }
            }
            b'>' => {
                if self.eat(b'=') {
                    self.token(TokenKind::GreaterEq, start)
                } else {
                    self.token(TokenKind::Greater, start)
                }
            }

            b'=' => {
                if self.eat(b'=') {
                    if self.eat(b'=') {
                        self.token(TokenKind::EqEqEq, start)
                    } else {
                        self.token(TokenKind::EqEq, start)
                    }
                } else if self.eat(b'>') {
                    self.token(TokenKind::Arrow, start)
                } else {
                    self.token(TokenKind::Eq, start)
                }
            }
            b'!' => {
                if self.eat(b'=') {
                    if self.eat(b'=') {
                        self.token(TokenKind::BangEqEq, start)
                    } else {
                        self.token(TokenKind::BangEq, start)
                    }
                } else {
                    self.token(TokenKind::Bang, start)
                }
            }
            b'+' => {
                if self.eat(b'+') {
                    self.token(TokenKind::PlusPlus, start)
                } else if self.eat(b'=') {
                    self.token(TokenKind::PlusEq, start)
                } else {
                    self.token(TokenKind::Plus, start)
                }
            }
            b'-' => {
                if self.eat(b'-') {
                    self.token(TokenKind::MinusMinus, start)
                } else if self.eat(b'=') {
                    self.token(TokenKind::MinusEq, start)
                } else {
                    self.token(TokenKind::Minus, start)
                }
            }
            b'*' => {
                if self.eat(b'*') {
                    self.token(TokenKind::StarStar, start)
                } else if self.eat(b'=') {
                    self.token(TokenKind::StarEq, start)
                } else {
                    self.token(TokenKind::Star, start)
                }
            }
            b'/' => {
                // Comments were consumed as trivia, so this is division.
                if self.eat(b'=') {
                    self.token(TokenKind::SlashEq, start)
                } else {
                    self.token(TokenKind::Slash, start)
                }
            }
            b'%' => {
                if self.eat(b'=') {
                    self.token(TokenKind::PercentEq, start)
                } else {
                    self.token(TokenKind::Percent, start)
                }
            }
            b'&' => {
                if self.eat(b'&') {
                    if self.eat(b'=') {
                        self.token(TokenKind::AmpAmpEq, start)
                    } else {
                        self.token(TokenKind::AmpAmp, start)
                    }
                } else {
                    self.token(TokenKind::Amp, start)
                }
            }
            b'|' => {
                if self.eat(b'|') {
                    if self.eat(b'=') {
                        self.token(TokenKind::PipePipeEq, start)
                    } else {
                        self.token(TokenKind::PipePipe, start)
                    }
                } else {
                    self.token(TokenKind::Pipe, start)
                }
            }
            b'?' => {
                if self.eat(b'?') {
                    if self.eat(b'=') {
                        self.token(TokenKind::QuestionQuestionEq, start)
                    } else {
                        self.token(TokenKind::QuestionQuestion, start)
                    }
                } else if self.peek() == Some(b'.')
                    && !self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                {
                    // `a?.5:1` is a conditional, not optional chaining.
                    self.advance();
                    self.token(TokenKind::QuestionDot, start)
                } else {
                    self.token(TokenKind::Question, start)
                }
            }
            b'.' => {
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.advance();
                    self.advance();
                    self.token(TokenKind::DotDotDot, start)
                } else {
                    self.token(TokenKind::Dot, start)
                }
            }

            b'(' => self.token(TokenKind::LParen, start),
            b')' => self.token(TokenKind::RParen, start),
            b'[' => self.token(TokenKind::LBracket, start),
            b']' => self.token(TokenKind::RBracket, start),
            b',' => self.token(TokenKind::Comma, start),
            b';' => self.token(TokenKind::Semicolon, start),
            b':' => self.token(TokenKind::Colon, start),

            b'{' => {
                if let Some(Mode::Code { brace_depth, .. }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                self.token(TokenKind::LBrace, start)
            }
            b'}' => self.scan_close_brace(start),

            _ => {
                // Rewind so a multi-byte character is skipped whole.
                self.pos = start.pos;
                self.line = start.line;
                self.col = start.col;
                let bad = self.advance_char().unwrap_or('?');
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("Unexpected character '{bad}'"),
                    span,
                );
                // Error recovery: skip the character and try again
                self.scan_code()
            }
        }
    }

    /// Handle a `}` in code mode: it either closes a nested block or ends a
    /// JSX container / template substitution.
    fn scan_close_brace(&mut self, start: Start) -> Token {
        match self.current_mode() {
            Mode::Code {
                brace_depth: 0,
                closer: Closer::Jsx,
            } => {
                self.pop_mode();
                self.token(TokenKind::RBrace, start)
            }
            Mode::Code {
                brace_depth: 0,
                closer: Closer::Template,
            } => {
                self.pop_mode();
                self.scan_template(start, false)
            }
            _ => {
                if let Some(Mode::Code { brace_depth, .. }) = self.mode_stack.last_mut() {
                    *brace_depth = brace_depth.saturating_sub(1);
                }
                self.token(TokenKind::RBrace, start)
            }
        }
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self, start: Start) -> Token {
        if self.peek() == Some(b'0') {
            let radix = match self.peek_at(1) {
                Some(b'x' | b'X') => Some(16),
                Some(b'o' | b'O') => Some(8),
                Some(b'b' | b'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.advance();
                let digits_start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_hexdigit() || c == b'_')
                {
                    self.advance();
                }
                let digits: String = self.text[digits_start..self.pos]
                    .chars()
                    .filter(|c| *c != '_')
                    .collect();
                let span = self.span_from(start);
                return match u64::from_str_radix(&digits, radix) {
                    Ok(value) => Token::new(TokenKind::Number(value as f64), span),
                    Err(_) => {
                        self.emit_error(
                            ErrorCode::UNEXPECTED_CHARACTER,
                            format!("Invalid number literal '{}'", &self.text[start.pos..self.pos]),
                            span,
                        );
                        Token::new(TokenKind::Number(0.0), span)
                    }
                };
            }
        }

        self.skip_digits();
        if self.peek() == Some(b'.') && self.peek_at(1) != Some(b'.') {
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..=sign {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let span = self.span_from(start);
        let text: String = self.text[start.pos..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        let value: f64 = text.parse().unwrap_or(0.0);
        Token::new(TokenKind::Number(value), span)
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == b'_') {
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    /// Scan an identifier. Inside a JSX tag, `-` is an identifier character
    /// and reserved words stay identifiers (`<label for="x">`).
    fn scan_identifier(&mut self, start: Start, in_tag: bool) -> Token {
        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) || (in_tag && ch == b'-') {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.text[start.pos..self.pos];
        let kind = if in_tag {
            TokenKind::Identifier(text.to_string())
        } else {
            TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
        };
        self.token(kind, start)
    }

    // ─────────────────────────────────────────────────────────────
    // String & template literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a quoted string after its opening quote.
    fn scan_string(&mut self, start: Start, quote: u8) -> Token {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    let span = self.span_from(start);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated string literal",
                        span,
                        format!("Close the string with {}", quote as char),
                    );
                    return Token::new(TokenKind::String(buf), span);
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return self.token(TokenKind::String(buf), start);
                }
                Some(b'\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(_) => {
                    if let Some(ch) = self.advance_char() {
                        buf.push(ch);
                    }
                }
            }
        }
    }

    /// Scan template text after a backtick (`head == true`) or after the
    /// `}` closing a substitution.
    fn scan_template(&mut self, start: Start, head: bool) -> Token {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start);
                    self.emit_error_with_suggestion(
                        ErrorCode::UNTERMINATED_TEMPLATE,
                        "Unterminated template literal",
                        span,
                        "Close the template with `",
                    );
                    let kind = if head {
                        TokenKind::NoSubstitutionTemplate(buf)
                    } else {
                        TokenKind::TemplateTail(buf)
                    };
                    return Token::new(kind, span);
                }
                Some(b'`') => {
                    self.advance();
                    let kind = if head {
                        TokenKind::NoSubstitutionTemplate(buf)
                    } else {
                        TokenKind::TemplateTail(buf)
                    };
                    return self.token(kind, start);
                }
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    self.advance();
                    self.advance();
                    self.push_mode(Mode::Code {
                        brace_depth: 0,
                        closer: Closer::Template,
                    });
                    let kind = if head {
                        TokenKind::TemplateHead(buf)
                    } else {
                        TokenKind::TemplateMiddle(buf)
                    };
                    return self.token(kind, start);
                }
                Some(b'\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(b'\r') => {
                    // Template line breaks are normalised to \n.
                    self.advance();
                    if self.peek() != Some(b'\n') {
                        buf.push('\n');
                    }
                }
                Some(_) => {
                    if let Some(ch) = self.advance_char() {
                        buf.push(ch);
                    }
                }
            }
        }
    }

    /// Scan an escape sequence starting at the `\`.
    /// Returns `None` for a line continuation or an invalid escape.
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let start = self.start();
        self.advance(); // consume the '\'

        let ch = self.advance_char();
        match ch {
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('r') => Some('\r'),
            Some('b') => Some('\u{8}'),
            Some('f') => Some('\u{c}'),
            Some('v') => Some('\u{b}'),
            Some('0') if !self.peek().is_some_and(|c| c.is_ascii_digit()) => Some('\0'),
            Some('\n') => None,
            Some('\r') => {
                self.eat(b'\n');
                None
            }
            Some('x') => {
                let value = self.scan_hex_digits(2, 2);
                self.escaped_char(value, start)
            }
            Some('u') => {
                let value = if self.eat(b'{') {
                    let value = self.scan_hex_digits(1, 6);
                    if !self.eat(b'}') {
                        None
                    } else {
                        value
                    }
                } else {
                    self.scan_hex_digits(4, 4)
                };
                self.escaped_char(value, start)
            }
            // Any other escaped character stands for itself.
            Some(other) => Some(other),
            None => {
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::INVALID_ESCAPE,
                    "Unexpected end of file in escape sequence",
                    span,
                );
                None
            }
        }
    }

    fn scan_hex_digits(&mut self, min: usize, max: usize) -> Option<u32> {
        let digits_start = self.pos;
        while self.pos - digits_start < max && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.advance();
        }
        let digits = &self.text[digits_start..self.pos];
        if digits.len() < min {
            return None;
        }
        u32::from_str_radix(digits, 16).ok()
    }

    fn escaped_char(&mut self, value: Option<u32>, start: Start) -> Option<char> {
        match value.and_then(char::from_u32) {
            Some(ch) => Some(ch),
            None => {
                let span = self.span_from(start);
                let text = self.text[start.pos..self.pos].to_string();
                self.emit_error(
                    ErrorCode::INVALID_ESCAPE,
                    format!("Invalid escape sequence '{text}'"),
                    span,
                );
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // JSX scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token inside `<tag ...>`.
    fn scan_tag(&mut self, closing: bool) -> Token {
        self.skip_trivia();
        if self.at_end() || self.errors.saturated() {
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let start = self.start();
        let Some(ch) = self.peek() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };
        if is_ident_start(ch) {
            return self.scan_identifier(start, true);
        }

        self.advance();
        match ch {
            b'"' | b'\'' => self.scan_attribute_string(start, ch),
            b'{' => {
                self.push_mode(Mode::Code {
                    brace_depth: 0,
                    closer: Closer::Jsx,
                });
                self.token(TokenKind::LBrace, start)
            }
            b'>' => {
                self.pop_mode();
                if closing {
                    // `</name>` also ends the children of the element.
                    if self.current_mode() == Mode::JsxChildren {
                        self.pop_mode();
                    }
                    self.element_closed = true;
                } else {
                    self.push_mode(Mode::JsxChildren);
                }
                self.token(TokenKind::Greater, start)
            }
            b'/' if self.peek() == Some(b'>') => {
                self.advance();
                self.pop_mode();
                self.element_closed = true;
                self.token(TokenKind::JsxSelfClose, start)
            }
            b'<' => {
                // An element used directly as an attribute value.
                self.push_mode(Mode::JsxTag { closing: false });
                self.token(TokenKind::JsxLt, start)
            }
            b'=' => self.token(TokenKind::Eq, start),
            b'.' => self.token(TokenKind::Dot, start),
            b':' => self.token(TokenKind::Colon, start),
            _ => {
                self.pos = start.pos;
                self.line = start.line;
                self.col = start.col;
                let bad = self.advance_char().unwrap_or('?');
                let span = self.span_from(start);
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("Unexpected character '{bad}' in tag"),
                    span,
                );
                self.scan_tag(closing)
            }
        }
    }

    /// JSX attribute strings have no escapes; the text is kept raw.
    fn scan_attribute_string(&mut self, start: Start, quote: u8) -> Token {
        let text_start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == quote {
                let text = self.text[text_start..self.pos].to_string();
                self.advance();
                return self.token(TokenKind::String(text), start);
            }
            self.advance();
        }
        let span = self.span_from(start);
        self.emit_error(
            ErrorCode::UNTERMINATED_STRING,
            "Unterminated attribute string",
            span,
        );
        Token::new(TokenKind::String(self.text[text_start..].to_string()), span)
    }

    /// Scan one token between an opening and a closing tag.
    fn scan_children(&mut self) -> Token {
        if self.at_end() {
            return Token::new(TokenKind::Eof, self.current_span());
        }

        let start = self.start();
        match self.peek() {
            Some(b'{') => {
                self.advance();
                self.push_mode(Mode::Code {
                    brace_depth: 0,
                    closer: Closer::Jsx,
                });
                self.token(TokenKind::LBrace, start)
            }
            Some(b'<') if self.peek_at(1) == Some(b'/') => {
                self.advance();
                self.advance();
                self.push_mode(Mode::JsxTag { closing: true });
                self.token(TokenKind::JsxCloseStart, start)
            }
            Some(b'<') => {
                self.advance();
                self.push_mode(Mode::JsxTag { closing: false });
                self.token(TokenKind::JsxLt, start)
            }
            _ => {
                while let Some(ch) = self.peek() {
                    if ch == b'{' || ch == b'<' {
                        break;
                    }
                    self.advance();
                }
                let text = self.text[start.pos..self.pos].to_string();
                self.token(TokenKind::JsxText(text), start)
            }
        }
    }
}

/// Position where a token starts.
#[derive(Debug, Clone, Copy)]
struct Start {
    pos: usize,
    line: u32,
    col: u32,
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$' || ch >= 0x80
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
