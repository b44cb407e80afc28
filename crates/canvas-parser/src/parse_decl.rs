//! Function and binding-pattern parsing.
//!
//! Handles function declarations and expressions, arrow functions,
//! parameter lists (defaults, rest, optional markers, annotations) and
//! the identifier/object/array binding patterns shared by declarations,
//! parameters, `catch` clauses and `for … of` heads.

use std::rc::Rc;

use canvas_lexer::token::TokenKind;
use canvas_types::ast::*;
use canvas_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Functions
    // ══════════════════════════════════════════════════════════════════════════

    /// `function Name<T>(params): Ret { body }`
    pub(crate) fn parse_function_decl(&mut self) -> Option<Rc<Function>> {
        if !matches!(self.look_ahead(1), TokenKind::Identifier(_) | TokenKind::Star) {
            self.advance();
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected function name, got '{}'", self.peek_kind()),
            );
            return None;
        }
        self.parse_function_expr()
    }

    /// `function [Name]<T>(params): Ret { body }`
    pub(crate) fn parse_function_expr(&mut self) -> Option<Rc<Function>> {
        let start = self.expect(&TokenKind::Function)?.span;
        if self.check(&TokenKind::Star) {
            self.unsupported("generator functions", self.current_span());
            return None;
        }
        let name = match self.peek_kind() {
            TokenKind::Identifier(_) => Some(self.expect_identifier()?),
            _ => None,
        };
        if self.check(&TokenKind::Less) {
            self.skip_type_parameters()?;
        }
        let (params, rest) = self.parse_params()?;
        self.skip_return_type()?;
        let body = self.parse_block()?;
        Some(Rc::new(Function {
            name,
            params,
            rest,
            body: FunctionBody::Block(body),
            is_arrow: false,
            span: start.merge(self.previous_span()),
        }))
    }

    /// Method shorthand inside an object literal: `name(params) { body }`.
    pub(crate) fn parse_method(&mut self, name: Option<Ident>, start: Span) -> Option<Rc<Function>> {
        if self.check(&TokenKind::Less) {
            self.skip_type_parameters()?;
        }
        let (params, rest) = self.parse_params()?;
        self.skip_return_type()?;
        let body = self.parse_block()?;
        Some(Rc::new(Function {
            name,
            params,
            rest,
            body: FunctionBody::Block(body),
            is_arrow: false,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `x => body`: the single identifier is at the cursor.
    pub(crate) fn parse_simple_arrow(&mut self) -> Option<Rc<Function>> {
        let param = self.expect_identifier()?;
        let start = param.span;
        self.expect(&TokenKind::Arrow)?;
        let body = self.parse_arrow_body()?;
        Some(Rc::new(Function {
            name: None,
            params: vec![Param {
                pattern: Pattern::Ident(param),
                default: None,
            }],
            rest: None,
            body,
            is_arrow: true,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `(params): Ret => body`: the `(` is at the cursor.
    pub(crate) fn parse_paren_arrow(&mut self) -> Option<Rc<Function>> {
        let start = self.current_span();
        let (params, rest) = self.parse_params()?;
        self.skip_return_type()?;
        self.expect(&TokenKind::Arrow)?;
        let body = self.parse_arrow_body()?;
        Some(Rc::new(Function {
            name: None,
            params,
            rest,
            body,
            is_arrow: true,
            span: start.merge(self.previous_span()),
        }))
    }

    fn parse_arrow_body(&mut self) -> Option<FunctionBody> {
        if self.check(&TokenKind::LBrace) {
            Some(FunctionBody::Block(self.parse_block()?))
        } else {
            // `in` is an operator again inside a concise body.
            let no_in = std::mem::replace(&mut self.no_in, false);
            let body = self.parse_assignment();
            self.no_in = no_in;
            Some(FunctionBody::Expr(Box::new(body?)))
        }
    }

    /// `: Type` after a parameter list.
    fn skip_return_type(&mut self) -> Option<()> {
        if self.eat(&TokenKind::Colon) {
            self.skip_type()?;
        }
        Some(())
    }

    /// `( [param {, param}] [, ...rest] )`
    pub(crate) fn parse_params(&mut self) -> Option<(Vec<Param>, Option<Pattern>)> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut rest = None;
        while !self.check(&TokenKind::RParen) && !self.at_end() {
            if self.eat(&TokenKind::DotDotDot) {
                let pattern = self.parse_binding_pattern()?;
                self.eat(&TokenKind::Question);
                if self.eat(&TokenKind::Colon) {
                    self.skip_type()?;
                }
                rest = Some(pattern);
                self.eat(&TokenKind::Comma);
                break;
            }
            // `this: Window` parameters are type-only.
            if self.check(&TokenKind::This) && self.look_ahead(1) == &TokenKind::Colon {
                self.advance();
                self.advance();
                self.skip_type()?;
            } else {
                let pattern = self.parse_binding_pattern()?;
                self.eat(&TokenKind::Question);
                if self.eat(&TokenKind::Colon) {
                    self.skip_type()?;
                }
                let default = if self.eat(&TokenKind::Eq) {
                    Some(self.parse_assignment()?)
                } else {
                    None
                };
                params.push(Param { pattern, default });
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some((params, rest))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Binding Patterns
    // ══════════════════════════════════════════════════════════════════════════

    /// `name` | `{ a, b: c = 1, ...rest }` | `[x, , y = 2, ...rest]`
    pub(crate) fn parse_binding_pattern(&mut self) -> Option<Pattern> {
        self.enter()?;
        let pattern = match self.peek_kind() {
            TokenKind::LBrace => self.parse_object_pattern(),
            TokenKind::LBracket => self.parse_array_pattern(),
            _ => self.expect_identifier().map(Pattern::Ident),
        };
        self.leave();
        pattern
    }

    fn parse_object_pattern(&mut self) -> Option<Pattern> {
        self.expect(&TokenKind::LBrace)?;
        let mut props = Vec::new();
        let mut rest = None;
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            if self.eat(&TokenKind::DotDotDot) {
                rest = Some(Box::new(Pattern::Ident(self.expect_identifier()?)));
                self.eat(&TokenKind::Comma);
                break;
            }
            let (key, shorthand) = self.parse_pattern_key()?;
            let value = if self.eat(&TokenKind::Colon) {
                self.parse_binding_pattern()?
            } else {
                match shorthand {
                    Some(ident) => Pattern::Ident(ident),
                    None => {
                        self.error_at_current(
                            ErrorCode::UNEXPECTED_TOKEN,
                            format!("expected ':', got '{}'", self.peek_kind()),
                        );
                        return None;
                    }
                }
            };
            let default = self.parse_pattern_default()?;
            props.push(ObjectPatternProp {
                key,
                value,
                default,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Some(Pattern::Object { props, rest })
    }

    /// Key of an object pattern property. Returns the identifier too when
    /// the key can stand alone as a shorthand binding.
    fn parse_pattern_key(&mut self) -> Option<(PropKey, Option<Ident>)> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some((PropKey::Named(name.clone()), Some(Ident::new(name, span))))
            }
            TokenKind::String(s) => {
                self.advance();
                Some((PropKey::Named(s), None))
            }
            TokenKind::Number(n) => {
                self.advance();
                Some((PropKey::Named(number_key(n)), None))
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.expect(&TokenKind::RBracket)?;
                Some((PropKey::Computed(Box::new(expr)), None))
            }
            _ => {
                let ident = self.expect_property_name()?;
                Some((PropKey::Named(ident.name), None))
            }
        }
    }

    fn parse_array_pattern(&mut self) -> Option<Pattern> {
        self.expect(&TokenKind::LBracket)?;
        let mut elems = Vec::new();
        let mut rest = None;
        while !self.check(&TokenKind::RBracket) && !self.at_end() {
            if self.eat(&TokenKind::Comma) {
                elems.push(None);
                continue;
            }
            if self.eat(&TokenKind::DotDotDot) {
                rest = Some(Box::new(self.parse_binding_pattern()?));
                self.eat(&TokenKind::Comma);
                break;
            }
            let pattern = self.parse_binding_pattern()?;
            let default = self.parse_pattern_default()?;
            elems.push(Some(PatternElem { pattern, default }));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Some(Pattern::Array { elems, rest })
    }

    fn parse_pattern_default(&mut self) -> Option<Option<Expr>> {
        if self.eat(&TokenKind::Eq) {
            Some(Some(self.parse_assignment()?))
        } else {
            Some(None)
        }
    }

    /// Report that an arrow function is `async`.
    pub(crate) fn reject_async(&mut self, span: Span) {
        self.unsupported("async functions", span);
    }
}

/// Property name for a numeric key: `1` not `1.0`.
pub(crate) fn number_key(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
