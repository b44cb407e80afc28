//! TypeScript type syntax.
//!
//! Types never reach the AST: annotations, type arguments, `as` casts and
//! type-only declarations are recognised here and skipped. Only enough
//! structure is tracked to find where each type ends.

use canvas_lexer::token::TokenKind;
use canvas_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Types
    // ══════════════════════════════════════════════════════════════════════════

    /// Skip one type, including unions and conditional types.
    pub(crate) fn skip_type(&mut self) -> Option<()> {
        self.enter()?;
        let result = self.skip_type_inner();
        self.leave();
        result
    }

    fn skip_type_inner(&mut self) -> Option<()> {
        self.skip_union()?;
        // `T extends U ? X : Y`
        if self.check(&TokenKind::Extends) && !self.peek().newline_before {
            self.advance();
            self.skip_union()?;
            self.expect(&TokenKind::Question)?;
            self.skip_type()?;
            self.expect(&TokenKind::Colon)?;
            self.skip_type()?;
        }
        Some(())
    }

    /// `[|] A | B & C`
    fn skip_union(&mut self) -> Option<()> {
        if matches!(self.peek_kind(), TokenKind::Pipe | TokenKind::Amp) {
            self.advance();
        }
        self.skip_postfix_type()?;
        while matches!(self.peek_kind(), TokenKind::Pipe | TokenKind::Amp) {
            self.advance();
            self.skip_postfix_type()?;
        }
        Some(())
    }

    /// `T[]`, `T[K]`
    fn skip_postfix_type(&mut self) -> Option<()> {
        self.skip_primary_type()?;
        while self.check(&TokenKind::LBracket) && !self.peek().newline_before {
            self.advance();
            if !self.eat(&TokenKind::RBracket) {
                self.skip_type()?;
                self.expect(&TokenKind::RBracket)?;
            }
        }
        Some(())
    }

    fn skip_primary_type(&mut self) -> Option<()> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(word) => match word.as_str() {
                "keyof" | "readonly" | "unique" if self.starts_type_ahead() => {
                    self.advance();
                    self.skip_postfix_type()
                }
                "infer" if matches!(self.look_ahead(1), TokenKind::Identifier(_)) => {
                    self.advance();
                    self.advance();
                    Some(())
                }
                // `asserts value is T` / `asserts value`
                "asserts" if matches!(self.look_ahead(1), TokenKind::Identifier(_)) => {
                    self.advance();
                    self.advance();
                    self.skip_type_predicate()
                }
                "abstract" if self.look_ahead(1) == &TokenKind::New => {
                    self.advance();
                    self.skip_primary_type()
                }
                _ => {
                    self.advance();
                    self.skip_qualified_rest()?;
                    self.skip_type_predicate()
                }
            },
            TokenKind::Typeof => {
                self.advance();
                self.expect_property_name()?;
                self.skip_qualified_rest()
            }
            TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::NoSubstitutionTemplate(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::Void
            | TokenKind::This => {
                self.advance();
                Some(())
            }
            TokenKind::Minus if matches!(self.look_ahead(1), TokenKind::Number(_)) => {
                self.advance();
                self.advance();
                Some(())
            }
            TokenKind::TemplateHead(_) => self.skip_template_type(),
            // Object and tuple types.
            TokenKind::LBrace | TokenKind::LBracket => self.skip_balanced(),
            TokenKind::LParen => {
                let is_function = self
                    .matching_close(self.position())
                    .is_some_and(|end| self.kind_at(end) == &TokenKind::Arrow);
                if is_function {
                    self.skip_function_type()
                } else {
                    self.advance();
                    self.skip_type()?;
                    self.expect(&TokenKind::RParen)?;
                    Some(())
                }
            }
            // `<T>(value: T) => T`
            TokenKind::Less => {
                self.skip_type_parameters()?;
                self.skip_function_type()
            }
            // `new (...args: A) => T`
            TokenKind::New => {
                self.advance();
                if self.check(&TokenKind::Less) {
                    self.skip_type_parameters()?;
                }
                self.skip_function_type()
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected a type, got '{other}'"),
                );
                None
            }
        }
    }

    /// A type operator like `keyof` is followed by an operand rather than
    /// being a plain type name.
    fn starts_type_ahead(&self) -> bool {
        !matches!(
            self.look_ahead(1),
            TokenKind::Comma
                | TokenKind::Greater
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Semicolon
                | TokenKind::Eq
                | TokenKind::Pipe
                | TokenKind::Amp
                | TokenKind::Eof
        )
    }

    /// `.Name` segments and type arguments after a type name.
    fn skip_qualified_rest(&mut self) -> Option<()> {
        while self.check(&TokenKind::Dot) {
            self.advance();
            self.expect_property_name()?;
        }
        if self.check(&TokenKind::Less) {
            self.skip_type_arguments()?;
        }
        Some(())
    }

    /// `value is T` in a return type position.
    fn skip_type_predicate(&mut self) -> Option<()> {
        if self.check_word("is") && !self.peek().newline_before {
            self.advance();
            self.skip_type()?;
        }
        Some(())
    }

    /// `(params) => T` with the `(` at the cursor.
    fn skip_function_type(&mut self) -> Option<()> {
        if !self.check(&TokenKind::LParen) {
            self.expect(&TokenKind::LParen)?;
        }
        self.skip_balanced()?;
        self.expect(&TokenKind::Arrow)?;
        self.skip_type()
    }

    /// `` `prefix-${T}` `` template literal types.
    fn skip_template_type(&mut self) -> Option<()> {
        self.advance();
        loop {
            self.skip_type()?;
            match self.peek_kind() {
                TokenKind::TemplateMiddle(_) => {
                    self.advance();
                }
                TokenKind::TemplateTail(_) => {
                    self.advance();
                    return Some(());
                }
                other => {
                    let message = format!("expected '}}' in template type, got '{other}'");
                    self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                    return None;
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Type Argument & Parameter Lists
    // ══════════════════════════════════════════════════════════════════════════

    /// `<A, B<C>>`
    pub(crate) fn skip_type_arguments(&mut self) -> Option<()> {
        self.expect(&TokenKind::Less)?;
        loop {
            self.skip_type()?;
            if !self.eat(&TokenKind::Comma) || self.check(&TokenKind::Greater) {
                break;
            }
        }
        self.expect(&TokenKind::Greater)?;
        Some(())
    }

    /// `<T extends Base = Default, const U>`
    pub(crate) fn skip_type_parameters(&mut self) -> Option<()> {
        self.expect(&TokenKind::Less)?;
        while !self.check(&TokenKind::Greater) && !self.at_end() {
            // Variance and const modifiers.
            if self.check(&TokenKind::Const)
                || ((self.check(&TokenKind::In) || self.check_word("out"))
                    && matches!(self.look_ahead(1), TokenKind::Identifier(_)))
            {
                self.advance();
            }
            self.expect_identifier()?;
            if self.eat(&TokenKind::Extends) {
                self.skip_type()?;
            }
            if self.eat(&TokenKind::Eq) {
                self.skip_type()?;
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Greater)?;
        Some(())
    }

    /// Skip a bracketed group (`(…)`, `[…]` or `{…}`) starting at the cursor.
    pub(crate) fn skip_balanced(&mut self) -> Option<()> {
        match self.matching_close(self.position()) {
            Some(end) => {
                self.seek(end);
                Some(())
            }
            None => {
                self.error_at_current(
                    ErrorCode::UNCLOSED_DELIMITER,
                    format!("'{}' is never closed", self.peek_kind()),
                );
                None
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Type-Only Declarations
    // ══════════════════════════════════════════════════════════════════════════

    /// `type X<T> = …;`, `interface X extends Y { … }` or `declare …`.
    pub(crate) fn skip_type_declaration(&mut self) -> Option<()> {
        let keyword = self.advance();
        let word = keyword.kind.as_property_name().unwrap_or_default().to_string();
        match word.as_str() {
            "type" => {
                self.expect_identifier()?;
                if self.check(&TokenKind::Less) {
                    self.skip_type_parameters()?;
                }
                self.expect(&TokenKind::Eq)?;
                self.skip_type()?;
                self.consume_semicolon();
            }
            "interface" => {
                self.expect_identifier()?;
                if self.check(&TokenKind::Less) {
                    self.skip_type_parameters()?;
                }
                if self.eat(&TokenKind::Extends) {
                    loop {
                        self.skip_type()?;
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                if !self.check(&TokenKind::LBrace) {
                    self.expect(&TokenKind::LBrace)?;
                }
                self.skip_balanced()?;
            }
            // `declare const x: T;`, `declare module "m" { … }`
            _ => self.skip_ambient_declaration()?,
        }
        Some(())
    }

    fn skip_ambient_declaration(&mut self) -> Option<()> {
        let mut first = true;
        while !self.at_end() {
            if !first && self.peek().newline_before {
                break;
            }
            first = false;
            match self.peek_kind() {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    let block = self.check(&TokenKind::LBrace);
                    self.skip_balanced()?;
                    if block {
                        break;
                    }
                }
                TokenKind::Semicolon => {
                    self.advance();
                    break;
                }
                TokenKind::RBrace => break,
                _ => {
                    self.advance();
                }
            }
        }
        Some(())
    }
}
